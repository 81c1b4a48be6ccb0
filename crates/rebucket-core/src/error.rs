//! Collaborator failure types.
//!
//! Neither error ever escapes [`crate::RedirectController`]; both are logged and
//! then treated as a miss for the call that produced them.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a [`crate::MetadataStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Metadata store query failed: {0}")]
    Backend(#[source] BoxError),

    #[error("Metadata for attachment {id} is unusable: {message}")]
    Corrupt { id: i64, message: String },
}

impl StoreError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// Failure reported by a [`crate::CacheBackend`] implementation.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Backend(#[source] BoxError),
}

impl CacheError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}
