/// Simulated backend routes

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{self, ServerState};

pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route(
            "/metrics",
            get(handlers::get_metrics).options(handlers::preflight),
        )
        .route("/api/health", get(handlers::health_check))
        // Deliberately stricter than the Go backend: OPTIONS never counts as a
        // metrics hit, and unknown non-OPTIONS paths get 404 instead of an empty 200
        .fallback(handlers::fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let state = ServerState::new();
        let app = create_router(state.clone());

        let response = app.oneshot(request(Method::GET, "/metrics")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/json"));

        let json = body_json(response).await;
        assert_eq!(json["request_count"], 1);
        assert!(json["cpu_usage"].as_u64().unwrap() < 100);
        assert!(json["latency_ms"].as_u64().unwrap() < 300);
        assert!(json["memory_usage_mb"].as_u64().unwrap() >= 100);
        assert_eq!(state.request_count(), 1);
    }

    #[tokio::test]
    async fn test_request_count_increments_across_requests() {
        let state = ServerState::new();

        for _ in 0..3 {
            let response = create_router(state.clone())
                .oneshot(request(Method::GET, "/metrics"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let json = body_json(
            create_router(state.clone())
                .oneshot(request(Method::GET, "/metrics"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(json["request_count"], 4);
    }

    #[tokio::test]
    async fn test_preflight_on_any_path() {
        for path in ["/metrics", "/anything/else"] {
            let response = create_router(ServerState::new())
                .oneshot(request(Method::OPTIONS, path))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let headers = response.headers();
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, OPTIONS");
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
        }
    }

    #[tokio::test]
    async fn test_preflight_does_not_count_as_metrics_hit() {
        let state = ServerState::new();
        create_router(state.clone())
            .oneshot(request(Method::OPTIONS, "/metrics"))
            .await
            .unwrap();
        assert_eq!(state.request_count(), 0);
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = create_router(ServerState::new())
            .oneshot(request(Method::GET, "/api/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json, serde_json::json!({"success": true, "data": "healthy"}));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let response = create_router(ServerState::new())
            .oneshot(request(Method::GET, "/nope"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
