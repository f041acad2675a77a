use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix of every provisional (not yet confirmed) message id.
pub const PROVISIONAL_ID_PREFIX: &str = "temp-";

fn default_true() -> bool {
    true
}

/// The subject of a conversation, e.g. a character. Read-only for the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Topic {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub subtitle: Option<String>,
    pub avatar_url: Option<String>,
    pub intro_url: Option<String>,
    pub welcome_message: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Durable binding between a topic and the backend thread currently in use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: String,
    pub topic_id: String,
    pub thread_id: String,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: String, topic_id: String, thread_id: String) -> Self {
        let now = Utc::now();
        Self { id, topic_id, thread_id, created_at: now, last_active_at: now }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
    Image,
    Audio,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Image => "image",
            ContentType::Audio => "audio",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub session_id: String,
    pub thread_id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Opening assistant message built from a topic's welcome text. Lives only
    /// on the client and is never sent to the conversation backend.
    pub fn opening(session_id: &str, thread_id: &str, welcome_message: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            thread_id: thread_id.to_string(),
            role: MessageRole::Assistant,
            content_type: ContentType::Text,
            content: Some(welcome_message.to_string()),
            media_url: None,
            created_at: Utc::now(),
        }
    }

    /// User message inserted before the backend has acknowledged it.
    pub fn provisional(
        session_id: &str,
        thread_id: &str,
        content_type: ContentType,
        content: Option<String>,
        media_url: Option<String>,
    ) -> Self {
        Self {
            id: format!("{PROVISIONAL_ID_PREFIX}{}", uuid::Uuid::new_v4()),
            session_id: session_id.to_string(),
            thread_id: thread_id.to_string(),
            role: MessageRole::User,
            content_type,
            content,
            media_url,
            created_at: Utc::now(),
        }
    }
}

/// What the local cache remembers about a topic's conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub session_id: String,
    pub thread_id: String,
}
