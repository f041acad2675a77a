use chrono::Utc;
use sqlx::PgPool;
use tracing::error;

use crate::errors::AppError;
use crate::models::Session;

const THREAD_ID_PREFIX: &str = "thread_";

/// Fresh backend thread id: a fixed prefix plus a random v4 UUID, so it can
/// never collide with a thread used before.
pub fn new_thread_id() -> String {
    format!("{THREAD_ID_PREFIX}{}", uuid::Uuid::new_v4().simple())
}

#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Session>, AppError> {
        sqlx::query_as::<_, Session>(
            "SELECT id, topic_id, thread_id, created_at, last_active_at FROM sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to find session {id}: {e}");
            AppError::db_query(format!("Failed to find session {id}"), e)
        })
    }

    pub async fn save(&self, session: &Session) -> Result<Session, AppError> {
        sqlx::query(
            "INSERT INTO sessions (id, topic_id, thread_id, created_at, last_active_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&session.id)
        .bind(&session.topic_id)
        .bind(&session.thread_id)
        .bind(session.created_at)
        .bind(session.last_active_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to save session {}: {e}", session.id);
            AppError::db_query("Failed to save session", e)
        })?;
        Ok(session.clone())
    }

    pub async fn touch(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE sessions SET last_active_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to update session activity {id}: {e}");
                AppError::db_query("Failed to update session activity", e)
            })?;
        Ok(())
    }

    /// Points the session at `thread_id`. Returns the number of rows changed.
    pub async fn replace_thread(&self, id: &str, thread_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE sessions SET thread_id = $1, last_active_at = $2 WHERE id = $3",
        )
        .bind(thread_id)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to reset session {id}: {e}");
            AppError::db_query(format!("Failed to reset session {id}"), e)
        })?;
        Ok(result.rows_affected())
    }

    /// Deletes the session row; dependent messages go with it via cascade.
    pub async fn delete(&self, id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete session {id}: {e}");
                AppError::db_query(format!("Failed to delete session {id}"), e)
            })?;
        Ok(result.rows_affected())
    }
}
