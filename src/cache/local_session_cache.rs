use std::sync::Arc;

use tracing::{debug, warn};

use super::kv_store::KeyValueStore;
use crate::models::StoredSession;

const STORAGE_KEY_PREFIX: &str = "chat_session_";

/// Remembers `{session_id, thread_id}` per topic slug across restarts.
///
/// Every operation is best-effort: storage failures and unreadable entries
/// are logged and treated as "nothing cached". Nothing here ever returns an
/// error to the caller.
#[derive(Clone)]
pub struct LocalSessionCache {
    store: Arc<dyn KeyValueStore>,
}

impl LocalSessionCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn storage_key(topic_slug: &str) -> String {
        format!("{STORAGE_KEY_PREFIX}{topic_slug}")
    }

    pub fn read(&self, topic_slug: &str) -> Option<StoredSession> {
        let key = Self::storage_key(topic_slug);
        let raw = match self.store.get(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read cached session for {topic_slug}: {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(stored) => Some(stored),
            Err(e) => {
                warn!("Ignoring unreadable cached session for {topic_slug}: {e}");
                None
            }
        }
    }

    pub fn write(&self, topic_slug: &str, session_id: &str, thread_id: &str) {
        let stored = StoredSession {
            session_id: session_id.to_string(),
            thread_id: thread_id.to_string(),
        };
        let value = match serde_json::to_string(&stored) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to encode cached session for {topic_slug}: {e}");
                return;
            }
        };
        match self.store.set(&Self::storage_key(topic_slug), &value) {
            Ok(()) => debug!("Cached session {session_id} for {topic_slug}"),
            Err(e) => warn!("Failed to cache session for {topic_slug}: {e}"),
        }
    }

    /// Replaces the thread id of an existing entry; does nothing when the
    /// topic has no cached session.
    pub fn update_thread_id(&self, topic_slug: &str, thread_id: &str) {
        if let Some(stored) = self.read(topic_slug) {
            self.write(topic_slug, &stored.session_id, thread_id);
        }
    }

    pub fn clear(&self, topic_slug: &str) {
        if let Err(e) = self.store.remove(&Self::storage_key(topic_slug)) {
            warn!("Failed to clear cached session for {topic_slug}: {e}");
        }
    }
}
