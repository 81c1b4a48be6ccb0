use async_trait::async_trait;
use rebucket_common::models::{AttachmentId, SizeVariant};

use crate::error::StoreError;

/// Where an attachment's canonical file lives and the name it was uploaded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Path relative to the upload root.
    pub relative_path: String,
    /// Same value [`MetadataStore::canonical_original_filename`] returns.
    pub original_filename: Option<String>,
}

/// Read-only view of the attachment metadata store.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Most recently created attachment (highest id) whose stored path ends with
    /// `suffix`, compared case-insensitively. `suffix` includes the leading `/`.
    async fn find_most_recent_by_suffix(
        &self,
        suffix: &str,
    ) -> Result<Option<AttachmentId>, StoreError>;

    /// Stored path of the canonical file relative to the upload root.
    async fn stored_relative_path(&self, id: AttachmentId) -> Result<Option<String>, StoreError>;

    /// Recorded resized renditions. Unknown ids yield an empty list.
    async fn size_variants(&self, id: AttachmentId) -> Result<Vec<SizeVariant>, StoreError>;

    /// Filename the attachment was originally uploaded under.
    async fn canonical_original_filename(
        &self,
        id: AttachmentId,
    ) -> Result<Option<String>, StoreError>;

    /// Stored path and original filename together. The default issues both
    /// single-field lookups; backends that keep them in one row override it
    /// with a single read.
    async fn stored_file(&self, id: AttachmentId) -> Result<Option<StoredFile>, StoreError> {
        let Some(relative_path) = self.stored_relative_path(id).await? else {
            return Ok(None);
        };
        let original_filename = self.canonical_original_filename(id).await?;
        Ok(Some(StoredFile {
            relative_path,
            original_filename,
        }))
    }
}
