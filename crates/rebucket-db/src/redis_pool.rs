//! Redis connection helpers.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Set a key with expiration.
pub async fn set_ex(
    conn: &mut ConnectionManager,
    key: &str,
    value: &str,
    ttl_secs: u64,
) -> Result<(), redis::RedisError> {
    conn.set_ex(key, value, ttl_secs).await
}

/// Get a value by key.
pub async fn get(
    conn: &mut ConnectionManager,
    key: &str,
) -> Result<Option<String>, redis::RedisError> {
    conn.get(key).await
}

/// Delete a key. Returns `true` if it existed.
pub async fn del(conn: &mut ConnectionManager, key: &str) -> Result<bool, redis::RedisError> {
    let removed: u64 = conn.del(key).await?;
    Ok(removed > 0)
}
