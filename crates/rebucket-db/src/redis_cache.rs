//! Redis-backed redirect cache, shared by every Rebucket process.

use async_trait::async_trait;
use rebucket_core::{CacheBackend, CacheError};
use redis::aio::ConnectionManager;
use std::time::Duration;

use crate::redis_pool;

#[derive(Clone)]
pub struct RedisCacheBackend {
    conn: ConnectionManager,
}

impl RedisCacheBackend {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        redis_pool::get(&mut conn, key)
            .await
            .map_err(CacheError::backend)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // SETEX rejects a zero expiry.
        let ttl_secs = ttl.as_secs().max(1);
        redis_pool::set_ex(&mut conn, key, value, ttl_secs)
            .await
            .map_err(CacheError::backend)
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        redis_pool::del(&mut conn, key)
            .await
            .map_err(CacheError::backend)
    }
}
