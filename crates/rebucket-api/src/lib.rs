//! # rebucket-api
//!
//! HTTP layer for Rebucket. Serves the upload tree and turns not-found
//! responses for legacy media paths into permanent redirects.

pub mod middleware;
pub mod routes;

use axum::Router;
use rebucket_core::RedirectController;
use rebucket_db::Database;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Resolves not-found media paths to their current location.
    pub controller: Arc<RedirectController>,
    /// Where the upload tree is mounted and read from.
    pub uploads: UploadsMount,
}

#[derive(Debug, Clone)]
pub struct UploadsMount {
    /// URL path the tree is served under, without trailing `/` (`""` for root).
    pub mount_path: String,
    /// Local directory holding the tree.
    pub base_dir: PathBuf,
}

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::files::router(&state.uploads))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::redirect_on_not_found,
        ))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::compression::CompressionLayer::new())
        .with_state(state)
}
