use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, head, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build and configure the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Whole-cache routes; the trailing-slash alias matches the original
        // listing endpoint exactly, since axum does not redirect
        .route("/cache", get(handlers::list_keys))
        .route("/cache", post(handlers::hash_and_store))
        .route("/cache/", get(handlers::list_keys))
        // Per-key routes
        .route("/cache/{key}", put(handlers::put_blob))
        .route("/cache/{key}", get(handlers::get_blob))
        .route("/cache/{key}", head(handlers::head_blob))
        .route("/cache/{key}", delete(handlers::delete_blob))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, Bytes};
    use axum::http::{Method, Request, StatusCode};
    use quartz::{MetadataLedger, ObjectStore};
    use std::sync::Arc;
    use tower::ServiceExt;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    fn test_router(dir: &std::path::Path) -> Router {
        let store = Arc::new(ObjectStore::new(dir).unwrap());
        let ledger = Arc::new(MetadataLedger::new(dir));
        build_router(AppState::new(store, ledger))
    }

    async fn send(router: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Bytes) {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path());

        let (status, body) = send(&router, Method::GET, "/health", "").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn put_get_head_delete_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path());

        let (status, body) = send(&router, Method::PUT, "/cache/foo", "hello").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(&body[..], b"File stored successfully");

        let (status, body) = send(&router, Method::GET, "/cache/foo", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"hello");

        let (status, _) = send(&router, Method::HEAD, "/cache/foo", "").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&router, Method::DELETE, "/cache/foo", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"File deleted successfully");

        let (status, _) = send(&router, Method::GET, "/cache/foo", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn put_records_metadata_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path());

        send(&router, Method::PUT, "/cache/tracked", "hello").await;

        let ledger = MetadataLedger::new(dir.path());
        let record = ledger.load("tracked").await.unwrap();
        assert_eq!(record.key, "tracked");
        let blob_size = std::fs::metadata(dir.path().join("tracked.gz")).unwrap().len();
        assert_eq!(record.size, blob_size);
    }

    #[tokio::test]
    async fn put_succeeds_even_when_metadata_cannot_be_saved() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path());

        // Occupy the sidecar path with a directory so the ledger cannot
        // publish its record; the blob write must still win.
        std::fs::create_dir(dir.path().join("stubborn.meta")).unwrap();

        let (status, body) = send(&router, Method::PUT, "/cache/stubborn", "hello").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(&body[..], b"File stored successfully");

        let (status, body) = send(&router, Method::GET, "/cache/stubborn", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn post_succeeds_even_when_metadata_cannot_be_saved() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path());

        std::fs::create_dir(dir.path().join(format!("{HELLO_SHA256}.meta"))).unwrap();

        let (status, body) = send(&router, Method::POST, "/cache", "hello").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["hash"], HELLO_SHA256);

        let (status, body) =
            send(&router, Method::GET, &format!("/cache/{HELLO_SHA256}"), "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn post_stores_under_sha256_of_body() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path());

        let (status, body) = send(&router, Method::POST, "/cache", "hello").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["hash"], HELLO_SHA256);
        assert_eq!(json["message"], "File stored successfully");

        let (status, body) =
            send(&router, Method::GET, &format!("/cache/{HELLO_SHA256}"), "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn list_returns_logical_keys_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path());

        send(&router, Method::PUT, "/cache/one", "1").await;
        send(&router, Method::PUT, "/cache/two", "2").await;

        for uri in ["/cache", "/cache/"] {
            let (status, body) = send(&router, Method::GET, uri, "").await;
            assert_eq!(status, StatusCode::OK);
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["count"], 2);
            assert_eq!(json["keys"], serde_json::json!(["one", "two"]));
        }
    }

    #[tokio::test]
    async fn missing_key_maps_to_404() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path());

        let (status, _) = send(&router, Method::GET, "/cache/ghost", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&router, Method::HEAD, "/cache/ghost", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&router, Method::DELETE, "/cache/ghost", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(&body[..], b"File not found");
    }

    #[tokio::test]
    async fn traversal_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path());

        // %2e%2e%2f decodes to "../" inside the routed segment
        let (status, _) = send(&router, Method::PUT, "/cache/%2e%2e%2fescape", "x").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&router, Method::GET, "/cache/%2e%2e%2fescape", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
