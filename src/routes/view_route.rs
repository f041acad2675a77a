/// Address of a conversation view: `/{topic_slug}` or `/{topic_slug}/{session_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRoute {
    pub topic_slug: String,
    pub session_id: Option<String>,
}

impl ViewRoute {
    pub fn new(topic_slug: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            topic_slug: topic_slug.into(),
            session_id: session_id.filter(|s| !s.is_empty()),
        }
    }

    /// The topic's base address, without a session.
    pub fn base(topic_slug: &str) -> Self {
        Self::new(topic_slug, None)
    }

    pub fn path(&self) -> String {
        match &self.session_id {
            Some(id) => format!("/{}/{id}", self.topic_slug),
            None => format!("/{}", self.topic_slug),
        }
    }

    /// Parses `/slug` or `/slug/session`. Anything else is `None`.
    pub fn parse(path: &str) -> Option<Self> {
        let mut parts = path.trim_matches('/').split('/');
        let slug = parts.next().filter(|s| !s.is_empty())?;
        let session = parts.next().map(str::to_string);
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(slug, session))
    }
}

impl std::fmt::Display for ViewRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

/// Host-side navigation the controller may request.
pub trait Navigator: Send + Sync {
    /// Swap the current address for `route` without adding a history entry.
    fn replace(&self, route: &ViewRoute);

    /// Throw away the current view and load `route` from scratch.
    fn reload(&self, route: &ViewRoute);
}
