use thiserror::Error;

use crate::models::{Message, Topic};
use crate::storage::MediaKind;

/// Lifecycle of one mounted conversation view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    NotStarted,
    Initializing,
    Ready,
    /// A send, reset or wipe is in flight; further actions are ignored.
    Sending,
    /// Initialization failed; terminal for this view.
    Errored,
    /// Session deleted; the host reloads the topic's base address.
    Wiped,
}

/// The single user-visible error message of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("Conversation not found")]
    NotFound,
    #[error("Failed to connect to server")]
    ConnectionFailed,
    #[error("Failed to send message")]
    SendFailed,
    #[error("Failed to upload {0}")]
    UploadFailed(MediaKind),
    #[error("Failed to reset chat")]
    ResetFailed,
    #[error("Failed to wipe session")]
    WipeFailed,
}

/// Everything a UI needs to render a conversation view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    pub phase: Phase,
    pub topic: Option<Topic>,
    pub messages: Vec<Message>,
    pub session_id: Option<String>,
    pub thread_id: Option<String>,
    pub error: Option<ViewError>,
}

impl ChatState {
    pub fn is_sending(&self) -> bool {
        self.phase == Phase::Sending
    }
}

/// What a controller action ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// Not applicable right now (busy, no session, blank input); no side effects.
    Ignored,
    /// Attempted and failed; the view's error is set.
    Failed,
}
