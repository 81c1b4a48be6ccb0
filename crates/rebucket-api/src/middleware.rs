//! Middleware — not-found detection and permanent redirect emission.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rebucket_core::{NotFoundSignal, Outcome};
use std::sync::Arc;

use crate::AppState;

/// A finished response paired with the path of the request that produced it.
struct MissedRequest<'a> {
    status: StatusCode,
    path: &'a str,
}

impl NotFoundSignal for MissedRequest<'_> {
    fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    fn request_path(&self) -> &str {
        self.path
    }
}

/// Run the inner service; when a GET or HEAD ends in `404`, ask the redirect
/// controller for the file's current location and answer `301` if it has one.
/// Every other outcome passes the original response through untouched.
pub async fn redirect_on_not_found(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let eligible_method = request.method() == Method::GET || request.method() == Method::HEAD;
    // Path only; the query string never takes part in resolution.
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;
    if !eligible_method {
        return response;
    }

    let signal = MissedRequest {
        status: response.status(),
        path: &path,
    };
    match state.controller.handle(&signal).await {
        Outcome::Resolved(redirect) => match HeaderValue::from_str(&redirect.url) {
            Ok(location) => {
                (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
            }
            Err(e) => {
                tracing::warn!(
                    path,
                    target = %redirect.url,
                    error = %e,
                    "Resolved URL is not a valid Location header"
                );
                response
            }
        },
        Outcome::NotApplicable | Outcome::Unresolved => response,
    }
}

#[cfg(test)]
mod tests {
    use crate::{build_router, AppState, UploadsMount};
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use rebucket_core::testing::InMemoryMetadataStore;
    use rebucket_core::{MemoryCacheBackend, RedirectController, RedirectSettings};
    use rebucket_db::Database;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tower::ServiceExt;

    const BASE: &str = "https://example.com/uploads";

    fn app(base_dir: PathBuf) -> (axum::Router, Arc<InMemoryMetadataStore>) {
        let store = Arc::new(InMemoryMetadataStore::new());
        store.insert(42, "2024/05/photo.jpg");

        let controller = RedirectController::new(
            &RedirectSettings::default(),
            BASE,
            store.clone(),
            Arc::new(MemoryCacheBackend::new()),
        );
        let pg = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://rebucket@localhost/rebucket")
            .unwrap();
        let state = AppState {
            db: Database { pg, redis: None },
            controller: Arc::new(controller),
            uploads: UploadsMount {
                mount_path: "/src/files".into(),
                base_dir,
            },
        };
        (build_router(state), store)
    }

    fn missing_dir() -> PathBuf {
        std::env::temp_dir().join("rebucket-api-tests-missing")
    }

    async fn send(router: axum::Router, method: Method, uri: &str) -> axum::response::Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        router.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn legacy_path_redirects_permanently() {
        let (router, _) = app(missing_dir());
        let response = send(router, Method::GET, "/src/files/photo.jpg?ver=3").await;

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://example.com/uploads/2024/05/photo.jpg"
        );
    }

    #[tokio::test]
    async fn head_requests_redirect_too() {
        let (router, _) = app(missing_dir());
        let response = send(router, Method::HEAD, "/src/files/photo.jpg").await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    }

    #[tokio::test]
    async fn unknown_file_keeps_not_found() {
        let (router, _) = app(missing_dir());
        let response = send(router, Method::GET, "/src/files/nothing.jpg").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bucketed_path_keeps_not_found() {
        let (router, store) = app(missing_dir());
        let response = send(router, Method::GET, "/src/files/2023/11/old.jpg").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn non_get_methods_are_left_alone() {
        let (router, store) = app(missing_dir());
        let response = send(router, Method::POST, "/src/files/photo.jpg").await;
        assert_ne!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn existing_files_are_served() {
        let dir = std::env::temp_dir().join(format!("rebucket-api-tests-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("photo.jpg"), b"jpeg").unwrap();

        let (router, store) = app(dir.clone());
        let response = send(router, Method::GET, "/src/files/photo.jpg").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.calls(), 0);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
