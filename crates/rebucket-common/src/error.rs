//! Centralized error types for Rebucket.
//!
//! Uses `thiserror` for the infrastructure failures that can stop the service
//! from starting. Per-request failures never surface here: the redirect path
//! degrades to the ordinary not-found response instead.

/// Core application error type used by startup and tooling code.
#[derive(Debug, thiserror::Error)]
pub enum RebucketError {
    // === Configuration ===
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {message}")]
    Validation { message: String },

    // === Infrastructure errors ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl RebucketError {
    /// Shorthand for a [`RebucketError::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Error code string, used as a structured log field.
    pub fn error_code(&self) -> &str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Redis(_) => "CACHE_ERROR",
        }
    }
}

/// Convenience type alias for Results using RebucketError.
pub type RebucketResult<T> = Result<T, RebucketError>;
