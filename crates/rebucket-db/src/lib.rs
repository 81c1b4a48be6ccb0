//! # rebucket-db
//!
//! Database layer for Rebucket. Manages connections to:
//! - **PostgreSQL** — Attachment metadata (stored paths, recorded size variants)
//! - **Redis** — Shared redirect cache (optional; in-process cache otherwise)

pub mod metadata;
pub mod postgres;
pub mod redis_cache;
pub mod redis_pool;
pub mod repository;

pub use metadata::PgMetadataStore;
pub use redis_cache::RedisCacheBackend;

use rebucket_common::error::RebucketResult;
use rebucket_core::{CacheBackend, MemoryCacheBackend};
use sqlx::PgPool;
use std::sync::Arc;

/// Shared database state passed through Axum extractors.
#[derive(Clone)]
pub struct Database {
    pub pg: PgPool,
    pub redis: Option<redis::aio::ConnectionManager>,
}

impl Database {
    /// Connect to all configured database backends.
    pub async fn connect(config: &rebucket_common::config::AppConfig) -> RebucketResult<Self> {
        tracing::info!("Connecting to PostgreSQL...");
        let pg = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .connect(&config.database.url)
            .await?;

        tracing::info!("Connected to PostgreSQL");

        let redis = match config.redis.url.as_deref() {
            Some(url) => {
                tracing::info!("Connecting to Redis...");
                let redis_client = redis::Client::open(url)?;
                let conn = redis::aio::ConnectionManager::new(redis_client).await?;
                tracing::info!("Connected to Redis");
                Some(conn)
            }
            None => {
                tracing::info!("No Redis URL configured — redirect cache is in-process only");
                None
            }
        };

        Ok(Self { pg, redis })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> RebucketResult<()> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pg)
            .await
            .map_err(sqlx::Error::from)?;
        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Metadata store over the attachment tables.
    pub fn metadata_store(&self) -> Arc<PgMetadataStore> {
        Arc::new(PgMetadataStore::new(self.pg.clone()))
    }

    /// Redis-backed cache when configured, otherwise a process-local one.
    pub fn cache_backend(&self) -> Arc<dyn CacheBackend> {
        match &self.redis {
            Some(conn) => Arc::new(RedisCacheBackend::new(conn.clone())),
            None => Arc::new(MemoryCacheBackend::new()),
        }
    }
}
