//! Application configuration loaded from environment variables and config files.
//!
//! Supports `.env` files for development and environment variables for production.
//! Config precedence: env vars > .env file > config.toml > defaults

use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::error::{RebucketError, RebucketResult};

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// 14 days.
pub const DEFAULT_CONFIRMED_TTL_SECS: u64 = 14 * 24 * 60 * 60;
/// 2 days.
pub const DEFAULT_GUESS_TTL_SECS: u64 = 2 * 24 * 60 * 60;
pub const DEFAULT_NAMESPACE: &str = "/src/files/";
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 7] =
    ["jpg", "jpeg", "png", "gif", "webp", "svg", "pdf"];

/// Get the global application configuration.
///
/// # Panics
/// Panics if config has not been initialized via [`init`].
pub fn get() -> &'static AppConfig {
    CONFIG.get().expect("Config not initialized. Call rebucket_common::config::init() first.")
}

/// Initialize the global configuration from environment.
///
/// Should be called once at application startup, before any other code accesses config.
pub fn init() -> RebucketResult<&'static AppConfig> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    let cfg = defaults()?
        // Optional config file
        .add_source(config::File::with_name("config").required(false))
        // Environment variables (REBUCKET_SERVER__PORT, REBUCKET_DATABASE__URL, etc.)
        .add_source(
            config::Environment::with_prefix("REBUCKET")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("redirect.allowed_extensions")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = cfg.try_deserialize()?;
    app_config.validate()?;
    Ok(CONFIG.get_or_init(|| app_config))
}

/// Builder pre-populated with every default value.
pub fn defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("database.max_connections", 10)?
        .set_default("database.min_connections", 1)?
        .set_default("uploads.base_url", "http://localhost:8080/src/files")?
        .set_default("uploads.base_dir", "./data/uploads")?
        .set_default("redirect.namespace", DEFAULT_NAMESPACE)?
        .set_default("redirect.confirmed_ttl_secs", DEFAULT_CONFIRMED_TTL_SECS)?
        .set_default("redirect.guess_ttl_secs", DEFAULT_GUESS_TTL_SECS)?
        .set_default("redirect.allowed_extensions", DEFAULT_ALLOWED_EXTENSIONS.to_vec())
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    pub uploads: UploadsConfig,
    pub redirect: RedirectConfig,
}

impl AppConfig {
    /// Reject values the redirect pipeline cannot work with.
    pub fn validate(&self) -> RebucketResult<()> {
        if self.redirect.namespace.trim_matches('/').is_empty() {
            return Err(RebucketError::validation("redirect.namespace must name a path segment"));
        }
        if self.redirect.confirmed_ttl_secs == 0 || self.redirect.guess_ttl_secs == 0 {
            return Err(RebucketError::validation("redirect TTLs must be greater than zero"));
        }
        if self.redirect.allowed_extensions.is_empty() {
            return Err(RebucketError::validation(
                "redirect.allowed_extensions must not be empty",
            ));
        }
        self.uploads.mount_path()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RedisConfig {
    /// Redis connection URL — optional; omit to keep redirect cache entries in-process.
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadsConfig {
    /// Public base URL of the upload root (e.g. `https://example.com/uploads`).
    /// Resolved redirects are this URL joined with the attachment's stored path.
    pub base_url: String,
    /// Local directory holding the upload tree, served under the base URL's path.
    pub base_dir: String,
}

impl UploadsConfig {
    /// URL path of `base_url` without the trailing slash (`""` for a root mount).
    pub fn mount_path(&self) -> RebucketResult<String> {
        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            RebucketError::validation(format!("uploads.base_url is not a valid URL: {e}"))
        })?;
        Ok(parsed.path().trim_end_matches('/').to_string())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedirectConfig {
    /// Path segment a request must contain to be considered (case-insensitive).
    pub namespace: String,
    /// Cache lifetime of redirects backed by recorded metadata.
    pub confirmed_ttl_secs: u64,
    /// Cache lifetime of directory-guess redirects.
    pub guess_ttl_secs: u64,
    /// File extensions eligible for redirection, without the dot.
    pub allowed_extensions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(overrides: &[(&str, &str)]) -> AppConfig {
        let mut builder = defaults()
            .unwrap()
            .set_override("database.url", "postgres://localhost/rebucket")
            .unwrap();
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value).unwrap();
        }
        builder.build().unwrap().try_deserialize().unwrap()
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = load(&[]);
        assert_eq!(cfg.redirect.namespace, "/src/files/");
        assert_eq!(cfg.redirect.confirmed_ttl_secs, 1_209_600);
        assert_eq!(cfg.redirect.guess_ttl_secs, 172_800);
        assert_eq!(cfg.redirect.allowed_extensions.len(), 7);
        assert!(cfg.redis.url.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn mount_path_strips_trailing_slash() {
        let cfg = load(&[("uploads.base_url", "https://example.com/uploads/")]);
        assert_eq!(cfg.uploads.mount_path().unwrap(), "/uploads");

        let root = load(&[("uploads.base_url", "https://cdn.example.com")]);
        assert_eq!(root.uploads.mount_path().unwrap(), "");
    }

    #[test]
    fn validate_rejects_unusable_values() {
        let cfg = load(&[("redirect.namespace", "/")]);
        assert!(matches!(cfg.validate(), Err(RebucketError::Validation { .. })));

        let cfg = load(&[("redirect.guess_ttl_secs", "0")]);
        assert!(cfg.validate().is_err());

        let cfg = load(&[("uploads.base_url", "not a url")]);
        assert!(cfg.validate().is_err());
    }
}
