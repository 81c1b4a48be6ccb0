//! Static upload serving.
//!
//! Serves the upload tree under the URL path of the configured base URL.
//! Missing files answer `404`, which is what the redirect middleware keys on.

use axum::Router;
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::{AppState, UploadsMount};

pub fn router(uploads: &UploadsMount) -> Router<Arc<AppState>> {
    let serve = ServeDir::new(&uploads.base_dir);

    // Axum does not nest at the root; a root mount serves through the fallback.
    if uploads.mount_path.is_empty() {
        Router::new().fallback_service(serve)
    } else {
        Router::new().nest_service(&uploads.mount_path, serve)
    }
}
