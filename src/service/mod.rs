pub mod chat_state;
pub mod session_controller;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use crate::cache::LocalSessionCache;
use crate::config::SessionAuthority;
use crate::db::DataGateway;
use crate::gateway::ConversationGateway;
use crate::routes::view_route::Navigator;
use crate::storage::MediaKind;

pub use chat_state::{ChatState, Outcome, Phase, ViewError};
pub use session_controller::SessionController;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBuckets {
    pub image: String,
    pub voice: String,
}

impl MediaBuckets {
    pub fn for_kind(&self, kind: MediaKind) -> &str {
        match kind {
            MediaKind::Image => &self.image,
            MediaKind::Voice => &self.voice,
        }
    }
}

/// Process-wide collaborators, built once at startup and handed to every
/// controller. Tests substitute fakes here.
#[derive(Clone)]
pub struct ChatServices {
    pub data: Arc<dyn DataGateway>,
    pub conversation: Arc<dyn ConversationGateway>,
    pub cache: LocalSessionCache,
    pub navigator: Arc<dyn Navigator>,
    pub authority: SessionAuthority,
    pub buckets: MediaBuckets,
}
