use sqlx::PgPool;
use tracing::error;

use crate::errors::AppError;

/// `LIKE` pattern matching the history rows of every thread a session has
/// had. The backend keys those rows `{session_id}_{thread_id}`.
/// `%`, `_` and `\` inside the id are escaped so they match literally.
pub fn history_key_pattern(session_id: &str) -> String {
    let mut pattern = String::with_capacity(session_id.len() + 2);
    for c in session_id.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push_str("\\_%");
    pattern
}

/// Backend-owned conversation memory, touched only for bulk deletion.
#[derive(Clone)]
pub struct HistoryRepository {
    pool: PgPool,
}

impl HistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn delete_for_session(&self, session_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM chat_histories WHERE session_id LIKE $1 ESCAPE '\\'")
            .bind(history_key_pattern(session_id))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to delete history for session {session_id}: {e}");
                AppError::db_query(format!("Failed to delete history for session {session_id}"), e)
            })?;
        Ok(result.rows_affected())
    }
}
