/// Simulated backend handlers
/// Every `/metrics` hit produces a fresh random sample

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use rand::Rng;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SimulatedMetrics {
    pub cpu_usage: u32,
    pub latency_ms: u32,
    pub memory_usage_mb: u32,
    pub request_count: u64,
}

/// Shared across requests; only the hit counter lives here
#[derive(Debug, Default)]
pub struct ServerState {
    request_count: AtomicU64,
}

impl ServerState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    fn next_sample(&self) -> SimulatedMetrics {
        let request_count = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        let mut rng = rand::thread_rng();

        SimulatedMetrics {
            cpu_usage: rng.gen_range(0..100),
            latency_ms: rng.gen_range(0..300),
            memory_usage_mb: rng.gen_range(100..4000),
            request_count,
        }
    }
}

fn allow_any_origin(response: &mut Response) {
    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn get_metrics(State(state): State<Arc<ServerState>>) -> Response {
    let started = Instant::now();

    let metrics = state.next_sample();
    tracing::info!("Handling /metrics request");

    let mut response = Json(metrics).into_response();
    allow_any_origin(&mut response);

    tracing::info!(
        "Metrics served in {}",
        humantime::format_duration(started.elapsed())
    );

    response
}

pub async fn health_check() -> Json<ApiResponse<String>> {
    Json(ApiResponse::ok("healthy".to_string()))
}

/// CORS preflight
pub async fn preflight() -> Response {
    tracing::info!("Handling preflight OPTIONS request");

    let mut response = StatusCode::OK.into_response();
    allow_any_origin(&mut response);
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

/// Preflight for any path, 404 for everything else
pub async fn fallback(method: Method, uri: Uri) -> Response {
    if method == Method::OPTIONS {
        return preflight().await;
    }

    tracing::debug!("No route for {} {}", method, uri.path());
    StatusCode::NOT_FOUND.into_response()
}
