//! Static redirect settings, resolved once at startup.

use rebucket_common::config::{
    DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_CONFIRMED_TTL_SECS, DEFAULT_GUESS_TTL_SECS,
    DEFAULT_NAMESPACE, RedirectConfig,
};
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RedirectSettings {
    /// Namespace segment, normalized to `/segment/` form and lowercased.
    pub namespace: String,
    /// TTL for redirects confirmed by recorded metadata.
    pub confirmed_ttl: Duration,
    /// TTL for unverified directory guesses.
    pub guess_ttl: Duration,
    /// Lowercased extensions, without the dot.
    pub allowed_extensions: HashSet<String>,
}

impl Default for RedirectSettings {
    fn default() -> Self {
        Self::new(
            DEFAULT_NAMESPACE,
            Duration::from_secs(DEFAULT_CONFIRMED_TTL_SECS),
            Duration::from_secs(DEFAULT_GUESS_TTL_SECS),
            DEFAULT_ALLOWED_EXTENSIONS,
        )
    }
}

impl RedirectSettings {
    pub fn new<I, S>(
        namespace: &str,
        confirmed_ttl: Duration,
        guess_ttl: Duration,
        extensions: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            namespace: normalize_namespace(namespace),
            confirmed_ttl,
            guess_ttl,
            allowed_extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    pub fn from_config(cfg: &RedirectConfig) -> Self {
        Self::new(
            &cfg.namespace,
            Duration::from_secs(cfg.confirmed_ttl_secs),
            Duration::from_secs(cfg.guess_ttl_secs),
            &cfg.allowed_extensions,
        )
    }
}

/// `src/files` and `/SRC/files/` both become `/src/files/`.
fn normalize_namespace(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    format!("/{}/", trimmed.to_ascii_lowercase())
}
