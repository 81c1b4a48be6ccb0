//! Attachment metadata models.
//!
//! These mirror what the metadata store records about an uploaded media file:
//! where its canonical file lives and which resized renditions were generated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of an attachment. Positive, monotonically assigned, so the
/// highest id is the most recently created attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(pub i64);

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored attachment row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttachmentRow {
    pub id: i64,
    /// Path of the canonical file relative to the upload root, e.g. `2024/03/photo.jpg`.
    pub stored_path: String,
    /// Name the file was uploaded under, when it differs from the stored basename
    /// (large images are stored as `<stem>-scaled.<ext>`).
    pub original_filename: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A recorded resized rendition of an attachment.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttachmentSizeRow {
    pub attachment_id: i64,
    /// Size name as registered by the CMS (`thumbnail`, `medium`, `large`, ...).
    pub size_name: String,
    pub filename: String,
    pub width: i32,
    pub height: i32,
}

/// A size variant as consumed by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeVariant {
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

impl From<AttachmentSizeRow> for SizeVariant {
    fn from(row: AttachmentSizeRow) -> Self {
        Self {
            filename: row.filename,
            width: u32::try_from(row.width).unwrap_or(0),
            height: u32::try_from(row.height).unwrap_or(0),
        }
    }
}
