//! Per-request orchestration.
//!
//! A not-found request moves through
//! `Classified → CacheChecked → Resolving{strategy}` and ends in one of the
//! terminal [`Outcome`]s. The controller only computes the outcome; the HTTP
//! layer turns [`Outcome::Resolved`] into a `301`.

use rebucket_common::models::AttachmentId;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheBackend, RedirectCache};
use crate::classifier::{filename, PathClassifier};
use crate::matcher::match_thumbnail;
use crate::resolver::AttachmentResolver;
use crate::settings::RedirectSettings;
use crate::store::MetadataStore;

/// The event that triggers resolution: a finished response plus its request path.
pub trait NotFoundSignal {
    fn is_not_found(&self) -> bool;

    /// Raw URL path of the request, without query string.
    fn request_path(&self) -> &str;
}

/// How a redirect target was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Served from the redirect cache.
    Cached,
    /// The filename itself matched an attachment.
    Direct,
    /// A thumbnail matched a recorded size variant of its original.
    SizeVariant,
    /// A thumbnail was assumed to sit next to its original.
    DirectoryGuess,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cached => "cached",
            Self::Direct => "direct",
            Self::SizeVariant => "size_variant",
            Self::DirectoryGuess => "directory_guess",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub url: String,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not a not-found response, or the path is not a resolution candidate.
    NotApplicable,
    /// Every strategy missed; the not-found response stands.
    Unresolved,
    /// Issue a permanent redirect to `url`.
    Resolved(Redirect),
}

impl Outcome {
    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            Self::Resolved(redirect) => Some(&redirect.url),
            _ => None,
        }
    }
}

pub struct RedirectController {
    classifier: PathClassifier,
    resolver: AttachmentResolver,
    cache: RedirectCache,
    confirmed_ttl: Duration,
    guess_ttl: Duration,
}

impl RedirectController {
    pub fn new(
        settings: &RedirectSettings,
        base_url: impl Into<String>,
        store: Arc<dyn MetadataStore>,
        cache: Arc<dyn CacheBackend>,
    ) -> Self {
        Self {
            classifier: PathClassifier::new(settings),
            resolver: AttachmentResolver::new(store, base_url),
            cache: RedirectCache::new(cache),
            confirmed_ttl: settings.confirmed_ttl,
            guess_ttl: settings.guess_ttl,
        }
    }

    /// Entry point for the HTTP layer.
    pub async fn handle<S: NotFoundSignal + ?Sized>(&self, signal: &S) -> Outcome {
        if !signal.is_not_found() {
            return Outcome::NotApplicable;
        }
        self.resolve_path(signal.request_path()).await
    }

    /// Resolve a request path that is already known to be a not-found.
    pub async fn resolve_path(&self, path: &str) -> Outcome {
        if !self.classifier.is_eligible(path) {
            tracing::debug!(path, "Path not eligible for redirect");
            return Outcome::NotApplicable;
        }
        let Some(name) = filename(path) else {
            return Outcome::NotApplicable;
        };

        if let Some(url) = self.cache.get(name).await {
            return self.resolved(path, url, Strategy::Cached);
        }

        if let Some(url) = self.resolve_direct(name).await {
            self.cache.set(name, &url, self.confirmed_ttl).await;
            return self.resolved(path, url, Strategy::Direct);
        }

        if let Some(thumbnail) = match_thumbnail(name) {
            let original = thumbnail.original_filename();
            tracing::debug!(
                path,
                original = %original,
                strategy = Strategy::SizeVariant.as_str(),
                "Resolving"
            );
            if let Some(id) = self.resolver.find_attachment_id(&original).await {
                if let Some(url) = self.resolver.resolve_url_for_attachment(id, name).await {
                    self.cache.set(name, &url, self.confirmed_ttl).await;
                    return self.resolved(path, url, Strategy::SizeVariant);
                }
                if let Some(url) = self.guess(id, name).await {
                    self.cache.set(name, &url, self.guess_ttl).await;
                    return self.resolved(path, url, Strategy::DirectoryGuess);
                }
            }
        }

        tracing::debug!(path, "No attachment matched");
        Outcome::Unresolved
    }

    async fn resolve_direct(&self, name: &str) -> Option<String> {
        tracing::debug!(filename = name, strategy = Strategy::Direct.as_str(), "Resolving");
        let id = self.resolver.find_attachment_id(name).await?;
        self.resolver.resolve_url_for_attachment(id, name).await
    }

    async fn guess(&self, id: AttachmentId, name: &str) -> Option<String> {
        tracing::debug!(
            filename = name,
            %id,
            strategy = Strategy::DirectoryGuess.as_str(),
            "Resolving"
        );
        self.resolver.guess_url_from_directory(id, name).await
    }

    fn resolved(&self, path: &str, url: String, strategy: Strategy) -> Outcome {
        tracing::info!(
            path,
            target = %url,
            strategy = strategy.as_str(),
            "Redirecting legacy media path"
        );
        Outcome::Resolved(Redirect { url, strategy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::cache_key;
    use crate::testing::{FailingCacheBackend, InMemoryMetadataStore, RecordingCacheBackend};

    const BASE: &str = "https://example.com/uploads";

    struct Missed(&'static str);

    impl NotFoundSignal for Missed {
        fn is_not_found(&self) -> bool {
            true
        }

        fn request_path(&self) -> &str {
            self.0
        }
    }

    struct Found(&'static str);

    impl NotFoundSignal for Found {
        fn is_not_found(&self) -> bool {
            false
        }

        fn request_path(&self) -> &str {
            self.0
        }
    }

    fn setup() -> (RedirectController, Arc<InMemoryMetadataStore>, Arc<RecordingCacheBackend>) {
        let store = Arc::new(InMemoryMetadataStore::new());
        let cache = Arc::new(RecordingCacheBackend::new());
        let controller = RedirectController::new(
            &RedirectSettings::default(),
            BASE,
            store.clone(),
            cache.clone(),
        );
        (controller, store, cache)
    }

    fn resolved(url: &str, strategy: Strategy) -> Outcome {
        Outcome::Resolved(Redirect {
            url: url.to_string(),
            strategy,
        })
    }

    #[tokio::test]
    async fn found_responses_are_not_applicable() {
        let (controller, store, _) = setup();
        store.insert(42, "2024/05/photo.jpg");
        assert_eq!(controller.handle(&Found("/src/files/photo.jpg")).await, Outcome::NotApplicable);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn direct_original_redirect() {
        let (controller, store, cache) = setup();
        store.insert(42, "2024/05/photo.jpg");

        let outcome = controller.handle(&Missed("/src/files/photo.jpg")).await;
        assert_eq!(
            outcome,
            resolved("https://example.com/uploads/2024/05/photo.jpg", Strategy::Direct)
        );
        assert_eq!(
            cache.ttl_for(&cache_key("photo.jpg")),
            Some(Duration::from_secs(14 * 86_400))
        );
    }

    #[tokio::test]
    async fn thumbnail_with_recorded_variant() {
        let (controller, store, cache) = setup();
        store.insert(42, "2024/05/photo.jpg");
        store.add_size(42, "photo-300x200.jpg", 300, 200);

        let outcome = controller.handle(&Missed("/src/files/photo-300x200.jpg")).await;
        assert_eq!(
            outcome,
            resolved("https://example.com/uploads/2024/05/photo-300x200.jpg", Strategy::SizeVariant)
        );
        assert_eq!(
            cache.ttl_for(&cache_key("photo-300x200.jpg")),
            Some(Duration::from_secs(14 * 86_400))
        );
    }

    #[tokio::test]
    async fn thumbnail_without_variant_uses_directory_guess() {
        let (controller, store, cache) = setup();
        store.insert(42, "2024/05/photo.jpg");

        let outcome = controller.handle(&Missed("/src/files/photo-300x200.jpg")).await;
        assert_eq!(
            outcome,
            resolved(
                "https://example.com/uploads/2024/05/photo-300x200.jpg",
                Strategy::DirectoryGuess
            )
        );
        let ttl = cache.ttl_for(&cache_key("photo-300x200.jpg")).unwrap();
        assert_eq!(ttl, Duration::from_secs(2 * 86_400));
        assert!(ttl < Duration::from_secs(14 * 86_400));
    }

    #[tokio::test]
    async fn bucketed_path_is_not_applicable() {
        let (controller, store, cache) = setup();
        store.insert(42, "2023/11/old.jpg");

        let outcome = controller.handle(&Missed("/src/files/2023/11/old.jpg")).await;
        assert_eq!(outcome, Outcome::NotApplicable);
        assert_eq!(store.calls(), 0);
        assert_eq!(cache.writes(), 0);
    }

    #[tokio::test]
    async fn scaled_original_redirect() {
        let (controller, store, _) = setup();
        store.insert(9, "2024/02/bigphoto-scaled.jpg");

        let outcome = controller.handle(&Missed("/src/files/bigphoto.jpg")).await;
        assert_eq!(
            outcome,
            resolved("https://example.com/uploads/2024/02/bigphoto-scaled.jpg", Strategy::Direct)
        );
    }

    #[tokio::test]
    async fn thumbnail_of_scaled_original() {
        let (controller, store, _) = setup();
        store.insert(9, "2024/02/bigphoto-scaled.jpg");
        store.add_size(9, "bigphoto-300x200.jpg", 300, 200);

        let outcome = controller.handle(&Missed("/src/files/bigphoto-300x200.jpg")).await;
        assert_eq!(
            outcome,
            resolved(
                "https://example.com/uploads/2024/02/bigphoto-300x200.jpg",
                Strategy::SizeVariant
            )
        );
    }

    #[tokio::test]
    async fn cache_hit_skips_the_store() {
        let (controller, store, _) = setup();
        store.insert(42, "2024/05/photo.jpg");

        let first = controller.handle(&Missed("/src/files/photo.jpg")).await;
        let calls_after_first = store.calls();
        assert!(calls_after_first > 0);

        let second = controller.handle(&Missed("/other/src/files/PHOTO.jpg")).await;
        assert_eq!(store.calls(), calls_after_first);
        assert_eq!(second.redirect_url(), first.redirect_url());
        assert!(matches!(second, Outcome::Resolved(Redirect { strategy: Strategy::Cached, .. })));
    }

    #[tokio::test]
    async fn resolution_is_idempotent_without_cache() {
        let store = Arc::new(InMemoryMetadataStore::new());
        store.insert(42, "2024/05/photo.jpg");
        let controller = RedirectController::new(
            &RedirectSettings::default(),
            BASE,
            store.clone(),
            Arc::new(FailingCacheBackend),
        );

        let first = controller.resolve_path("/src/files/photo.jpg").await;
        let second = controller.resolve_path("/src/files/photo.jpg").await;
        assert_eq!(first, second);
        assert_eq!(
            first.redirect_url(),
            Some("https://example.com/uploads/2024/05/photo.jpg")
        );
    }

    #[tokio::test]
    async fn unknown_file_is_unresolved() {
        let (controller, store, cache) = setup();
        store.insert(42, "2024/05/photo.jpg");

        assert_eq!(controller.handle(&Missed("/src/files/nothing.jpg")).await, Outcome::Unresolved);
        assert_eq!(
            controller.handle(&Missed("/src/files/nothing-300x200.jpg")).await,
            Outcome::Unresolved
        );
        assert_eq!(cache.writes(), 0);
    }

    #[tokio::test]
    async fn store_outage_leaves_not_found_standing() {
        let (controller, store, cache) = setup();
        store.insert(42, "2024/05/photo.jpg");
        store.fail_queries(true);

        assert_eq!(controller.handle(&Missed("/src/files/photo.jpg")).await, Outcome::Unresolved);
        assert_eq!(
            controller.handle(&Missed("/src/files/photo-300x200.jpg")).await,
            Outcome::Unresolved
        );
        assert_eq!(cache.writes(), 0);
    }

    #[tokio::test]
    async fn malformed_cache_entry_triggers_fresh_resolution() {
        let (controller, store, cache) = setup();
        store.insert(42, "2024/05/photo.jpg");
        cache
            .set(&cache_key("photo.jpg"), "", Duration::from_secs(60))
            .await
            .unwrap();

        let outcome = controller.handle(&Missed("/src/files/photo.jpg")).await;
        assert!(matches!(outcome, Outcome::Resolved(Redirect { strategy: Strategy::Direct, .. })));
        assert!(store.calls() > 0);
    }

    #[tokio::test]
    async fn ineligible_extension_is_not_applicable() {
        let (controller, store, _) = setup();
        store.insert(1, "2024/05/readme.txt");
        assert_eq!(
            controller.handle(&Missed("/src/files/readme.txt")).await,
            Outcome::NotApplicable
        );
        assert_eq!(
            controller.handle(&Missed("/elsewhere/photo.jpg")).await,
            Outcome::NotApplicable
        );
    }

    #[tokio::test]
    async fn nested_bucketed_target_never_redirects_to_itself() {
        let store = Arc::new(InMemoryMetadataStore::new());
        let cache = Arc::new(RecordingCacheBackend::new());
        store.insert(42, "gallery/2023/11/old.jpg");
        let controller = RedirectController::new(
            &RedirectSettings::default(),
            "https://example.com/src/files",
            store.clone(),
            cache.clone(),
        );

        let outcome = controller.resolve_path("/src/files/gallery/2023/11/old.jpg").await;
        assert_eq!(outcome, Outcome::NotApplicable);
        assert_eq!(store.calls(), 0);
        assert_eq!(cache.writes(), 0);

        // The flat legacy path still resolves, and its target is itself ineligible.
        let legacy = controller.resolve_path("/src/files/old.jpg").await;
        let target = legacy.redirect_url().map(str::to_string);
        assert_eq!(
            target.as_deref(),
            Some("https://example.com/src/files/gallery/2023/11/old.jpg")
        );
        assert_eq!(
            controller.resolve_path("https://example.com/src/files/gallery/2023/11/old.jpg").await,
            Outcome::NotApplicable
        );
    }
}
