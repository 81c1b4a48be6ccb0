//! Request path eligibility.
//!
//! A path is a resolution candidate when it sits under the upload namespace,
//! is not already date-bucketed, and names a file with a whitelisted extension.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::settings::RedirectSettings;

/// A `/YYYY/MM/` segment anywhere in the path.
static DATE_BUCKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[0-9]{4}/[0-9]{2}/").expect("static pattern"));

#[derive(Debug, Clone)]
pub struct PathClassifier {
    namespace: String,
    allowed_extensions: HashSet<String>,
}

impl PathClassifier {
    pub fn new(settings: &RedirectSettings) -> Self {
        Self {
            namespace: settings.namespace.clone(),
            allowed_extensions: settings.allowed_extensions.clone(),
        }
    }

    /// Whether `path` should go through resolution. Pure.
    pub fn is_eligible(&self, path: &str) -> bool {
        if !self.is_in_namespace(path) || self.is_already_bucketed(path) {
            return false;
        }

        let Some(filename) = filename(path) else {
            return false;
        };
        match filename.rsplit_once('.') {
            Some((_, ext)) => self.allowed_extensions.contains(&ext.to_ascii_lowercase()),
            None => false,
        }
    }

    pub fn is_in_namespace(&self, path: &str) -> bool {
        path.to_ascii_lowercase().contains(&self.namespace)
    }

    /// True when a `/YYYY/MM/` segment appears anywhere after the first
    /// occurrence of the namespace. Redirect targets always carry one, so
    /// they never resolve again.
    pub fn is_already_bucketed(&self, path: &str) -> bool {
        let lowered = path.to_ascii_lowercase();
        let Some(at) = lowered.find(&self.namespace) else {
            return false;
        };
        // Keep the namespace's trailing `/` so a bucket right after it matches.
        DATE_BUCKET.is_match(&lowered[at + self.namespace.len().saturating_sub(1)..])
    }
}

/// Final path segment, `None` when the path ends in `/` or is empty.
pub fn filename(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    (!name.is_empty()).then_some(name)
}
