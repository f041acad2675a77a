use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_IMAGE_BUCKET: &str = "user-uploads";
const DEFAULT_VOICE_BUCKET: &str = "voice-recordings";
const CACHE_DIR_NAME: &str = "entity-chat";

/// Which side owns the session lifecycle (load, reset, wipe).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionAuthority {
    /// Sessions are read and written through the data store; opening
    /// messages are built on the client from the loaded topic.
    #[default]
    DataStore,
    /// The conversation backend handles `load`/`reset`/`wipe` events and
    /// returns the resulting ids and opening message.
    Server,
}

impl std::str::FromStr for SessionAuthority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "datastore" | "data_store" | "db" => Ok(SessionAuthority::DataStore),
            "server" | "backend" => Ok(SessionAuthority::Server),
            other => Err(AppError::InvalidConfig {
                key: "SESSION_AUTHORITY".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Where uploaded media goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    Http { base_url: String, api_key: String },
    Directory(PathBuf),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    pub conversation_api_url: String,
    pub request_timeout: Duration,
    pub storage: StorageTarget,
    pub image_bucket: String,
    pub voice_bucket: String,
    /// `None` when no platform data directory exists; the cache then lives in memory.
    pub session_cache_dir: Option<PathBuf>,
    pub session_authority: SessionAuthority,
}

impl AppConfig {
    /// Reads configuration from the process environment. Call
    /// `dotenvy::dotenv()` beforehand to pick up a `.env` file.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required =
            |key: &str| get(key).ok_or_else(|| AppError::MissingConfig(key.to_string()));

        let storage = match get("STORAGE_URL") {
            Some(base_url) => StorageTarget::Http {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key: get("STORAGE_API_KEY").unwrap_or_default(),
            },
            None => StorageTarget::Directory(
                get("MEDIA_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./media")),
            ),
        };

        let session_cache_dir = get("SESSION_CACHE_DIR")
            .map(PathBuf::from)
            .or_else(|| dirs::data_local_dir().map(|d| d.join(CACHE_DIR_NAME)));

        let session_authority = match get("SESSION_AUTHORITY") {
            Some(v) => v.parse()?,
            None => SessionAuthority::default(),
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), DEFAULT_MAX_CONNECTIONS)?,
            run_migrations: parse_or("RUN_MIGRATIONS", get("RUN_MIGRATIONS"), false)?,
            conversation_api_url: required("CONVERSATION_API_URL")?,
            request_timeout: Duration::from_secs(parse_or(
                "REQUEST_TIMEOUT_SECS",
                get("REQUEST_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
            )?),
            storage,
            image_bucket: get("IMAGE_BUCKET").unwrap_or_else(|| DEFAULT_IMAGE_BUCKET.to_string()),
            voice_bucket: get("VOICE_BUCKET").unwrap_or_else(|| DEFAULT_VOICE_BUCKET.to_string()),
            session_cache_dir,
            session_authority,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, AppError> {
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| AppError::InvalidConfig {
            key: key.to_string(),
            value: v,
        }),
    }
}
