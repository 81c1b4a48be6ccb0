//! PostgreSQL setup and connection helpers.

use sqlx::PgPool;

/// Health check — verify the database is reachable and the attachment table
/// is readable. An empty table still counts as healthy.
pub async fn health_check(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1 FROM attachments LIMIT 1")
        .fetch_optional(pool)
        .await
        .is_ok()
}
