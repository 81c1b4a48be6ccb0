//! [`MetadataStore`] over the PostgreSQL attachment tables.

use async_trait::async_trait;
use rebucket_common::models::{AttachmentId, AttachmentRow, SizeVariant};
use rebucket_core::{MetadataStore, StoreError, StoredFile};
use sqlx::PgPool;

use crate::repository::attachments;

#[derive(Clone)]
pub struct PgMetadataStore {
    pool: PgPool,
}

impl PgMetadataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    async fn find_most_recent_by_suffix(
        &self,
        suffix: &str,
    ) -> Result<Option<AttachmentId>, StoreError> {
        let id = attachments::find_latest_by_path_suffix(&self.pool, suffix)
            .await
            .map_err(StoreError::backend)?;
        Ok(id.map(AttachmentId))
    }

    async fn stored_relative_path(&self, id: AttachmentId) -> Result<Option<String>, StoreError> {
        let row = attachments::find_by_id(&self.pool, id.0)
            .await
            .map_err(StoreError::backend)?;
        Ok(row.map(|row| row.stored_path))
    }

    async fn size_variants(&self, id: AttachmentId) -> Result<Vec<SizeVariant>, StoreError> {
        let rows = attachments::list_sizes(&self.pool, id.0)
            .await
            .map_err(StoreError::backend)?;
        Ok(rows.into_iter().map(SizeVariant::from).collect())
    }

    async fn canonical_original_filename(
        &self,
        id: AttachmentId,
    ) -> Result<Option<String>, StoreError> {
        let Some(row) = attachments::find_by_id(&self.pool, id.0)
            .await
            .map_err(StoreError::backend)?
        else {
            return Ok(None);
        };

        match original_name(&row) {
            Some(original) => Ok(Some(original)),
            None => Err(StoreError::Corrupt {
                id: row.id,
                message: "stored path has no filename".into(),
            }),
        }
    }

    async fn stored_file(&self, id: AttachmentId) -> Result<Option<StoredFile>, StoreError> {
        let row = attachments::find_by_id(&self.pool, id.0)
            .await
            .map_err(StoreError::backend)?;
        Ok(row.map(stored_file))
    }
}

/// Recorded upload name, falling back to the stored basename.
fn original_name(row: &AttachmentRow) -> Option<String> {
    let original = match row.original_filename.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => row.stored_path.rsplit('/').next().unwrap_or_default(),
    };
    (!original.is_empty()).then(|| original.to_string())
}

fn stored_file(row: AttachmentRow) -> StoredFile {
    StoredFile {
        original_filename: original_name(&row),
        relative_path: row.stored_path,
    }
}
