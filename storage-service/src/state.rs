//! Application state.

use std::sync::Arc;

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use redis::aio::ConnectionManager;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::blob::{BlobStore, FsBlobStore};
use crate::kv::KvStore;
use crate::registry::SchemaRegistry;

/// Shared application state: configuration, the immutable schema registry
/// and the three storage bindings. Everything is cheaply cloneable and
/// read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<SchemaRegistry>,
    pub db: SqlitePool,
    pub kv: Option<ConnectionManager>,
    pub blobs: Arc<dyn BlobStore>,
}

impl AppState {
    /// Connects all storage bindings and ensures the system tables exist.
    ///
    /// The redis binding is optional: a missing or unreachable REDIS_URL
    /// leaves `kv` empty and key-value endpoints fail per request.
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        let registry = Arc::new(SchemaRegistry::with_system_tables());

        let db = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .map_err(|e| {
                AppError::BindingUnavailable(format!(
                    "cannot open database {}: {e}",
                    config.database_url
                ))
            })?;

        ensure_system_tables(&db, &registry).await?;

        let kv = match &config.redis_url {
            Some(url) => match connect_redis(url).await {
                Ok(conn) => Some(conn),
                Err(e) => {
                    tracing::warn!(error = %e, "redis binding unavailable, key-value endpoints disabled");
                    None
                }
            },
            None => {
                tracing::info!("REDIS_URL not set, key-value endpoints disabled");
                None
            }
        };

        let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(config.blob_root.clone()));

        Ok(Self {
            config,
            registry,
            db,
            kv,
            blobs,
        })
    }

    /// Key-value accessor, or `BindingUnavailable` when redis is not bound.
    pub fn kv_store(&self) -> AppResult<KvStore> {
        self.kv
            .clone()
            .map(KvStore::new)
            .ok_or_else(|| AppError::BindingUnavailable("key-value store is not configured".into()))
    }
}

/// Creates the registry tables if they do not exist.
pub async fn ensure_system_tables(db: &SqlitePool, registry: &SchemaRegistry) -> AppResult<()> {
    for def in registry.definitions() {
        sqlx::query(&def.create_table_sql()).execute(db).await?;
        tracing::debug!(table = %def.physical_name, "system table ensured");
    }
    tracing::info!(count = registry.len(), "system tables ensured");
    Ok(())
}

async fn connect_redis(url: &str) -> AppResult<ConnectionManager> {
    let client = redis::Client::open(url).map_err(AppError::from)?;
    let conn = ConnectionManager::new(client).await?;
    Ok(conn)
}
