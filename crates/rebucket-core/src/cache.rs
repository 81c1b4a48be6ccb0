//! Advisory redirect cache.
//!
//! Entries map a hashed, lowercased filename to a resolved URL. Identical
//! basenames under different legacy paths share one entry. A backend failure
//! or a malformed value is a miss, never an error.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use crate::error::CacheError;

const KEY_PREFIX: &str = "rebucket:redirect:";

/// Key-value backend with per-entry TTL.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get the value for a key. Returns `None` if not found or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Set a value with a TTL, overwriting any previous value.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Delete a key. Returns `true` if the key existed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;
}

/// Cache key for a filename: prefix plus hex SHA-256 of its lowercase form.
pub fn cache_key(filename: &str) -> String {
    let digest = Sha256::digest(filename.to_lowercase().as_bytes());
    format!("{KEY_PREFIX}{}", hex::encode(digest))
}

#[derive(Clone)]
pub struct RedirectCache {
    backend: Arc<dyn CacheBackend>,
}

impl RedirectCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub async fn get(&self, filename: &str) -> Option<String> {
        let key = cache_key(filename);
        match self.backend.get(&key).await {
            Ok(Some(url)) if !url.trim().is_empty() => Some(url),
            Ok(Some(_)) => {
                tracing::debug!(filename, "Ignoring empty cached redirect");
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(filename, error = %e, "Redirect cache read failed");
                None
            }
        }
    }

    /// Write-through after a successful resolution. Failures are logged and dropped.
    pub async fn set(&self, filename: &str, url: &str, ttl: Duration) {
        let key = cache_key(filename);
        if let Err(e) = self.backend.set(&key, url, ttl).await {
            tracing::warn!(filename, error = %e, "Redirect cache write failed");
        }
    }

    /// Drop the entry for `filename` so the next request resolves afresh.
    pub async fn purge(&self, filename: &str) -> Result<bool, CacheError> {
        self.backend.delete(&cache_key(filename)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCacheBackend;
    use crate::testing::FailingCacheBackend;

    #[test]
    fn key_is_case_insensitive_and_prefixed() {
        let a = cache_key("Photo.JPG");
        let b = cache_key("photo.jpg");
        assert_eq!(a, b);
        assert!(a.starts_with(KEY_PREFIX));
        assert_eq!(a.len(), KEY_PREFIX.len() + 64);
        assert_ne!(cache_key("photo.jpg"), cache_key("photo.png"));
    }

    #[tokio::test]
    async fn set_then_get_returns_url() {
        let cache = RedirectCache::new(Arc::new(MemoryCacheBackend::new()));
        let url = "https://example.com/uploads/2024/05/photo.jpg";
        cache.set("photo.jpg", url, Duration::from_secs(60)).await;
        assert_eq!(cache.get("photo.jpg").await.as_deref(), Some(url));
        assert_eq!(cache.get("PHOTO.jpg").await.as_deref(), Some(url));
    }

    #[tokio::test]
    async fn empty_value_is_a_miss() {
        let backend = Arc::new(MemoryCacheBackend::new());
        backend
            .set(&cache_key("photo.jpg"), "  ", Duration::from_secs(60))
            .await
            .unwrap();
        let cache = RedirectCache::new(backend);
        assert_eq!(cache.get("photo.jpg").await, None);
    }

    #[tokio::test]
    async fn backend_failure_degrades_to_miss() {
        let cache = RedirectCache::new(Arc::new(FailingCacheBackend));
        cache.set("photo.jpg", "https://x/y.jpg", Duration::from_secs(60)).await;
        assert_eq!(cache.get("photo.jpg").await, None);
        assert!(cache.purge("photo.jpg").await.is_err());
    }

    #[tokio::test]
    async fn purge_removes_entry() {
        let cache = RedirectCache::new(Arc::new(MemoryCacheBackend::new()));
        cache.set("photo.jpg", "https://x/y.jpg", Duration::from_secs(60)).await;
        assert!(cache.purge("photo.jpg").await.unwrap());
        assert_eq!(cache.get("photo.jpg").await, None);
        assert!(!cache.purge("photo.jpg").await.unwrap());
    }
}
