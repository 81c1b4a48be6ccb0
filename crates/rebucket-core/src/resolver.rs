//! Filename → current URL resolution against the metadata store.
//!
//! Store failures are logged and reported as `None`, so callers can move on to
//! their next fallback without special-casing errors.

use rebucket_common::models::{AttachmentId, SizeVariant};
use std::sync::Arc;

use crate::matcher::scaled_candidate;
use crate::store::{MetadataStore, StoredFile};

#[derive(Clone)]
pub struct AttachmentResolver {
    store: Arc<dyn MetadataStore>,
    base_url: String,
}

impl AttachmentResolver {
    /// `base_url` is the public URL of the upload root; a trailing `/` is optional.
    pub fn new(store: Arc<dyn MetadataStore>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { store, base_url }
    }

    /// Most recent attachment stored under `filename`, falling back to its
    /// `-scaled` counterpart for large image types.
    pub async fn find_attachment_id(&self, filename: &str) -> Option<AttachmentId> {
        if let Some(id) = self.lookup_suffix(filename).await {
            return Some(id);
        }

        let scaled = scaled_candidate(filename)?;
        let id = self.lookup_suffix(&scaled).await?;
        tracing::debug!(filename, scaled = %scaled, %id, "Matched scaled original");
        Some(id)
    }

    /// URL of `wanted` if it is the attachment's original or one of its
    /// recorded size variants. Never fabricates a URL.
    pub async fn resolve_url_for_attachment(
        &self,
        id: AttachmentId,
        wanted: &str,
    ) -> Option<String> {
        let file = self.stored_file(id).await?;
        let stored = file.relative_path.as_str();
        let stored_name = basename(stored);

        let is_original = stored_name.eq_ignore_ascii_case(wanted)
            || scaled_candidate(wanted)
                .is_some_and(|scaled| scaled.eq_ignore_ascii_case(stored_name))
            || file
                .original_filename
                .as_deref()
                .is_some_and(|original| original.eq_ignore_ascii_case(wanted));
        if is_original {
            return Some(self.url_for(stored));
        }

        let variant = self
            .size_variants(id)
            .await
            .into_iter()
            .find(|variant| variant.filename == wanted)?;
        Some(self.url_for(&format!("{}{}", directory_of(stored), variant.filename)))
    }

    /// Unverified guess: `filename` in the same directory as the original.
    pub async fn guess_url_from_directory(
        &self,
        id: AttachmentId,
        filename: &str,
    ) -> Option<String> {
        if filename.is_empty() {
            return None;
        }
        let stored = self.stored_path(id).await?;
        Some(self.url_for(&format!("{}{filename}", directory_of(&stored))))
    }

    fn url_for(&self, relative: &str) -> String {
        format!("{}/{}", self.base_url, relative.trim_start_matches('/'))
    }

    async fn lookup_suffix(&self, filename: &str) -> Option<AttachmentId> {
        match self
            .store
            .find_most_recent_by_suffix(&format!("/{filename}"))
            .await
        {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(filename, error = %e, "Attachment lookup failed");
                None
            }
        }
    }

    async fn stored_path(&self, id: AttachmentId) -> Option<String> {
        match self.store.stored_relative_path(id).await {
            Ok(Some(path)) if !path.trim().is_empty() => Some(path),
            Ok(_) => {
                tracing::debug!(%id, "Attachment has no stored path");
                None
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, "Stored path lookup failed");
                None
            }
        }
    }

    async fn stored_file(&self, id: AttachmentId) -> Option<StoredFile> {
        match self.store.stored_file(id).await {
            Ok(Some(file)) if !file.relative_path.trim().is_empty() => Some(file),
            Ok(_) => {
                tracing::debug!(%id, "Attachment has no stored path");
                None
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, "Stored file lookup failed");
                None
            }
        }
    }

    async fn size_variants(&self, id: AttachmentId) -> Vec<SizeVariant> {
        self.store.size_variants(id).await.unwrap_or_else(|e| {
            tracing::warn!(%id, error = %e, "Size variant lookup failed");
            Vec::new()
        })
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Directory part including the trailing `/`, or `""` for root-level files.
fn directory_of(path: &str) -> &str {
    path.rfind('/').map_or("", |at| &path[..=at])
}
