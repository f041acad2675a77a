use thiserror::Error;

/// Top-level error for every gateway, repository and store in the crate.
/// All variants carry a human-readable message for display/logging.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Database errors ──────────────────────────────────────────────────────
    #[error("Database connection failed: {0}")]
    DatabaseConnectionFailed(#[source] sqlx::Error),

    #[error("Database query failed: {message}")]
    DatabaseQueryFailed {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Record not found: {entity_type} with id '{id}'")]
    NotFound { entity_type: String, id: String },

    // ── Remote service errors ────────────────────────────────────────────────
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Conversation backend returned {status}: {message}")]
    Gateway { status: u16, message: String },

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    // ── Local persistence ────────────────────────────────────────────────────
    #[error("Local storage failed: {0}")]
    Persistence(String),

    // ── Configuration ────────────────────────────────────────────────────────
    #[error("{0} must be set")]
    MissingConfig(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidConfig { key: String, value: String },
}

impl AppError {
    pub fn db_query(message: impl Into<String>, source: sqlx::Error) -> Self {
        AppError::DatabaseQueryFailed { message: message.into(), source }
    }

    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        AppError::NotFound { entity_type: entity_type.into(), id: id.into() }
    }
}
