//! HTTP gateway (Axum) in front of the [`Analyzer`](crate::pipeline::Analyzer).
//!
//! Routes:
//! - `POST /analyze` runs (or serves from memory) one claim analysis
//! - `GET /memory/stats` reports cache counters
//! - `POST /memory/prune` removes expired entries
//! - `GET /healthz` liveness

pub mod error;
pub mod handler;
pub mod state;


use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{analyze_handler, prune_handler, stats_handler};
pub use state::AppState;

/// Response header carrying the cache outcome of a request.
pub const STATUS_HEADER: &str = "x-claimguard-status";
pub const STATUS_HIT: &str = "HIT";
pub const STATUS_MISS: &str = "MISS";
pub const STATUS_HEALTHY: &str = "healthy";

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/analyze", post(analyze_handler))
        .route("/memory/stats", get(stats_handler))
        .route("/memory/prune", post(prune_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(STATUS_HEADER, HeaderValue::from_static(STATUS_HEALTHY));

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}
