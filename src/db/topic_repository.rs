use sqlx::PgPool;
use tracing::error;

use crate::errors::AppError;
use crate::models::Topic;

#[derive(Clone)]
pub struct TopicRepository {
    pool: PgPool,
}

impl TopicRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active topic with the given slug. Inactive topics read as absent.
    pub async fn find_active_by_slug(&self, slug: &str) -> Result<Option<Topic>, AppError> {
        sqlx::query_as::<_, Topic>(
            "SELECT id, slug, name, subtitle, avatar_url, intro_url, welcome_message, is_active
             FROM topics
             WHERE slug = $1 AND is_active = TRUE",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to find topic {slug}: {e}");
            AppError::db_query(format!("Failed to find topic {slug}"), e)
        })
    }
}
