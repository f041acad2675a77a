pub mod history_repository;
pub mod session_repository;
pub mod topic_repository;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{Session, Topic};
use crate::storage::ObjectStorage;

use history_repository::HistoryRepository;
use session_repository::{new_thread_id, SessionRepository};
use topic_repository::TopicRepository;

/// Durable store of topics and sessions, plus the media bucket.
#[async_trait]
pub trait DataGateway: Send + Sync {
    /// Active topic by slug. `Ok(None)` is a normal "not found".
    async fn get_topic_by_slug(&self, slug: &str) -> Result<Option<Topic>, AppError>;

    /// New session bound to `topic_id` with a never-used thread id.
    async fn create_session(&self, topic_id: &str) -> Result<Session, AppError>;

    /// Session by id. Bumps its last-active time on a best-effort basis.
    async fn get_session(&self, id: &str) -> Result<Option<Session>, AppError>;

    /// Gives the session a fresh thread id and returns it. The session id
    /// and its message history stay where they are.
    async fn reset_session(&self, id: &str) -> Result<String, AppError>;

    /// Removes every history row of every thread, then the session itself
    /// (messages cascade). Only failing to remove the session is an error.
    async fn delete_session(&self, id: &str) -> Result<(), AppError>;

    /// Write-once upload; returns the public URL.
    async fn upload_binary(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError>;
}

/// [`DataGateway`] over Postgres and an [`ObjectStorage`] backend.
#[derive(Clone)]
pub struct PgDataGateway {
    topics: TopicRepository,
    sessions: SessionRepository,
    history: HistoryRepository,
    storage: Arc<dyn ObjectStorage>,
}

impl PgDataGateway {
    pub fn new(pool: PgPool, storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            topics: TopicRepository::new(pool.clone()),
            sessions: SessionRepository::new(pool.clone()),
            history: HistoryRepository::new(pool),
            storage,
        }
    }
}

#[async_trait]
impl DataGateway for PgDataGateway {
    async fn get_topic_by_slug(&self, slug: &str) -> Result<Option<Topic>, AppError> {
        self.topics.find_active_by_slug(slug).await
    }

    async fn create_session(&self, topic_id: &str) -> Result<Session, AppError> {
        let session = Session::new(
            uuid::Uuid::new_v4().to_string(),
            topic_id.to_string(),
            new_thread_id(),
        );
        let saved = self.sessions.save(&session).await?;
        info!("Created session {} for topic {topic_id}", saved.id);
        Ok(saved)
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>, AppError> {
        let session = self.sessions.find_by_id(id).await?;
        if session.is_some() {
            if let Err(e) = self.sessions.touch(id).await {
                warn!("Ignoring failed activity update for session {id}: {e}");
            }
        }
        Ok(session)
    }

    async fn reset_session(&self, id: &str) -> Result<String, AppError> {
        let thread_id = new_thread_id();
        if self.sessions.replace_thread(id, &thread_id).await? == 0 {
            return Err(AppError::not_found("session", id));
        }
        info!("Session {id} moved to thread {thread_id}");
        Ok(thread_id)
    }

    async fn delete_session(&self, id: &str) -> Result<(), AppError> {
        match self.history.delete_for_session(id).await {
            Ok(n) => info!("Deleted {n} history rows for session {id}"),
            Err(e) => warn!("Continuing session delete after history cleanup failed: {e}"),
        }
        let removed = self.sessions.delete(id).await?;
        info!("Deleted session {id} ({removed} row)");
        Ok(())
    }

    async fn upload_binary(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        self.storage.put(bucket, path, bytes, content_type).await
    }
}
