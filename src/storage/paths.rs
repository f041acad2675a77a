use chrono::{DateTime, Utc};

/// Kind of binary a user can attach to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Voice,
}

impl MediaKind {
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "webp",
            MediaKind::Voice => "webm",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/webp",
            MediaKind::Voice => "audio/webm",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MediaKind::Image => "image",
            MediaKind::Voice => "voice message",
        })
    }
}

/// Object path for an upload, namespaced by session and kind and named
/// after the upload time in milliseconds.
///
/// Images: `{session_id}/images/{ms}.webp`. Voice: `{session_id}/{ms}.webm`.
pub fn media_object_path(session_id: &str, kind: MediaKind, at: DateTime<Utc>) -> String {
    let stamp = at.timestamp_millis();
    let ext = kind.extension();
    match kind {
        MediaKind::Image => format!("{session_id}/images/{stamp}.{ext}"),
        MediaKind::Voice => format!("{session_id}/{stamp}.{ext}"),
    }
}
