//! In-memory collaborators and a cache backend conformance suite.
//!
//! Used by this crate's tests and by downstream crates that need a
//! [`MetadataStore`] without a database.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rebucket_common::models::{AttachmentId, SizeVariant};

use crate::cache::CacheBackend;
use crate::error::{CacheError, StoreError};
use crate::memory::MemoryCacheBackend;
use crate::store::{MetadataStore, StoredFile};

#[derive(Debug, Clone)]
struct Record {
    stored_path: String,
    original_filename: Option<String>,
    sizes: Vec<SizeVariant>,
}

impl Record {
    fn original_name(&self) -> String {
        self.original_filename.clone().unwrap_or_else(|| {
            self.stored_path
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string()
        })
    }
}

/// [`MetadataStore`] over a map, counting every call it serves.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    records: Mutex<BTreeMap<i64, Record>>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: i64, stored_path: &str) {
        self.put(id, stored_path, None);
    }

    pub fn insert_with_original(&self, id: i64, stored_path: &str, original: &str) {
        self.put(id, stored_path, Some(original.to_string()));
    }

    /// Record a size variant. No-op for unknown ids.
    pub fn add_size(&self, id: i64, filename: &str, width: u32, height: u32) {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(record) = records.get_mut(&id) {
            record.sizes.push(SizeVariant {
                filename: filename.to_string(),
                width,
                height,
            });
        }
    }

    /// Make every subsequent query fail until switched back.
    pub fn fail_queries(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of store calls served so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn put(&self, id: i64, stored_path: &str, original_filename: Option<String>) {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.insert(
            id,
            Record {
                stored_path: stored_path.to_string(),
                original_filename,
                sizes: Vec::new(),
            },
        );
    }

    fn record(&self, id: AttachmentId) -> Result<Option<Record>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::backend(std::io::Error::other("store offline")));
        }
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(&id.0).cloned())
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn find_most_recent_by_suffix(
        &self,
        suffix: &str,
    ) -> Result<Option<AttachmentId>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::backend(std::io::Error::other("store offline")));
        }
        let suffix = suffix.to_lowercase();
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records
            .iter()
            .rev()
            .find(|(_, record)| record.stored_path.to_lowercase().ends_with(&suffix))
            .map(|(id, _)| AttachmentId(*id)))
    }

    async fn stored_relative_path(&self, id: AttachmentId) -> Result<Option<String>, StoreError> {
        Ok(self.record(id)?.map(|record| record.stored_path))
    }

    async fn size_variants(&self, id: AttachmentId) -> Result<Vec<SizeVariant>, StoreError> {
        Ok(self.record(id)?.map(|record| record.sizes).unwrap_or_default())
    }

    async fn canonical_original_filename(
        &self,
        id: AttachmentId,
    ) -> Result<Option<String>, StoreError> {
        Ok(self.record(id)?.map(|record| record.original_name()))
    }

    async fn stored_file(&self, id: AttachmentId) -> Result<Option<StoredFile>, StoreError> {
        Ok(self.record(id)?.map(|record| StoredFile {
            original_filename: Some(record.original_name()),
            relative_path: record.stored_path,
        }))
    }
}

/// [`CacheBackend`] whose every call fails.
#[derive(Debug, Default)]
pub struct FailingCacheBackend;

#[async_trait]
impl CacheBackend for FailingCacheBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::backend(std::io::Error::other("cache offline")))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::backend(std::io::Error::other("cache offline")))
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Err(CacheError::backend(std::io::Error::other("cache offline")))
    }
}

/// [`MemoryCacheBackend`] that also remembers the TTL of the last write per key.
#[derive(Debug, Default)]
pub struct RecordingCacheBackend {
    inner: MemoryCacheBackend,
    ttls: Mutex<HashMap<String, Duration>>,
}

impl RecordingCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl_for(&self, key: &str) -> Option<Duration> {
        let ttls = self.ttls.lock().unwrap_or_else(PoisonError::into_inner);
        ttls.get(key).copied()
    }

    pub fn writes(&self) -> usize {
        let ttls = self.ttls.lock().unwrap_or_else(PoisonError::into_inner);
        ttls.len()
    }
}

#[async_trait]
impl CacheBackend for RecordingCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        {
            let mut ttls = self.ttls.lock().unwrap_or_else(PoisonError::into_inner);
            ttls.insert(key.to_string(), ttl);
        }
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.inner.delete(key).await
    }
}

/// Run the cache backend conformance test suite.
///
/// Call this from your backend's test module with a fresh backend instance.
///
/// # Errors
///
/// Returns an error if the backend reports one.
pub async fn run_cache_conformance_tests(backend: &dyn CacheBackend) -> Result<(), CacheError> {
    let ttl = Duration::from_secs(3600);

    assert!(backend.get("conformance:missing").await?.is_none(), "missing key should be None");

    backend.set("conformance:key", "first", ttl).await?;
    assert_eq!(backend.get("conformance:key").await?.as_deref(), Some("first"));

    backend.set("conformance:key", "second", ttl).await?;
    assert_eq!(
        backend.get("conformance:key").await?.as_deref(),
        Some("second"),
        "set should overwrite"
    );

    assert!(backend.delete("conformance:key").await?, "delete should report existing key");
    assert!(backend.get("conformance:key").await?.is_none());
    assert!(!backend.delete("conformance:key").await?, "second delete should report absence");
    Ok(())
}
