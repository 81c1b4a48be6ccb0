//! Attachment repository — read-only metadata queries.
//!
//! The CMS writes these tables when files are uploaded; the redirect
//! resolver only ever reads them.

use rebucket_common::models::{AttachmentRow, AttachmentSizeRow};
use sqlx::PgPool;

// ============================================================
// Read
// ============================================================

/// Find an attachment by ID.
pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<AttachmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AttachmentRow>("SELECT * FROM attachments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Find the most recent attachment whose stored path ends with `suffix`
/// (case-insensitive). Wildcards in `suffix` are matched literally.
pub async fn find_latest_by_path_suffix(
    pool: &PgPool,
    suffix: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id FROM attachments
        WHERE stored_path ILIKE $1 ESCAPE '\'
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(suffix_pattern(suffix))
    .fetch_optional(pool)
    .await
}

/// List the recorded size variants of an attachment.
pub async fn list_sizes(
    pool: &PgPool,
    attachment_id: i64,
) -> Result<Vec<AttachmentSizeRow>, sqlx::Error> {
    sqlx::query_as::<_, AttachmentSizeRow>(
        "SELECT * FROM attachment_sizes WHERE attachment_id = $1 ORDER BY width, height",
    )
    .bind(attachment_id)
    .fetch_all(pool)
    .await
}

// ============================================================
// Helpers
// ============================================================

/// `LIKE` pattern matching any value that ends with `suffix`.
fn suffix_pattern(suffix: &str) -> String {
    format!("%{}", escape_like(suffix))
}

/// Escape `LIKE` metacharacters using `\` as the escape character.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
