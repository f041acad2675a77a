use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use entity_chat::cache::{FileKeyValueStore, KeyValueStore, LocalSessionCache, MemoryKeyValueStore};
use entity_chat::cli::{self, Args, TerminalNavigator};
use entity_chat::config::{AppConfig, StorageTarget};
use entity_chat::db::PgDataGateway;
use entity_chat::errors::AppError;
use entity_chat::gateway::HttpConversationGateway;
use entity_chat::service::{ChatServices, MediaBuckets};
use entity_chat::storage::{FsObjectStorage, HttpObjectStorage, ObjectStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Logs go to stderr so they don't interleave with the transcript
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "entity_chat=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let route = args
        .route()
        .with_context(|| format!("'{}' is not a topic slug or view address", args.topic))?;

    let config = AppConfig::from_env()?;

    // ── Database ──────────────────────────────────────────────────────────────
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(AppError::DatabaseConnectionFailed)?;

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Migrations applied");
    }
    info!("Database connection established");

    // ── Dependency wiring ─────────────────────────────────────────────────────
    let client = HttpConversationGateway::build_client(config.request_timeout)?;

    let storage: Arc<dyn ObjectStorage> = match &config.storage {
        StorageTarget::Http { base_url, api_key } => {
            Arc::new(HttpObjectStorage::new(client.clone(), base_url, api_key))
        }
        StorageTarget::Directory(root) => {
            info!("Storing media under {}", root.display());
            Arc::new(FsObjectStorage::new(root.clone()))
        }
    };

    let store: Arc<dyn KeyValueStore> = match &config.session_cache_dir {
        Some(dir) => Arc::new(FileKeyValueStore::new(dir.clone())),
        None => Arc::new(MemoryKeyValueStore::new()),
    };

    let navigator = Arc::new(TerminalNavigator::default());
    let services = ChatServices {
        data: Arc::new(PgDataGateway::new(pool, storage)),
        conversation: Arc::new(HttpConversationGateway::new(client, &config.conversation_api_url)),
        cache: LocalSessionCache::new(store),
        navigator: navigator.clone(),
        authority: config.session_authority,
        buckets: MediaBuckets {
            image: config.image_bucket.clone(),
            voice: config.voice_bucket.clone(),
        },
    };

    info!("Opening {route} ({:?} authority)", config.session_authority);
    cli::run(services, navigator, route).await
}
