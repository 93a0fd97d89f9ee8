use std::time::Instant;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::error::GatewayError;
use super::state::AppState;
use super::{STATUS_HEADER, STATUS_HIT, STATUS_MISS};
use crate::constants::{MAX_CLAIM_CHARS, MIN_CLAIM_CHARS};
use crate::memory::CacheStats;
use crate::model::{AnalysisRequest, AnalysisResponse};

#[derive(Debug, Serialize, Deserialize)]
pub struct PruneResponse {
    pub removed: usize,
}

#[instrument(skip(state, request), fields(url = tracing::field::Empty))]
pub async fn analyze_handler(
    State(state): State<AppState>,
    Json(request): Json<serde_json::Value>,
) -> Result<Response, GatewayError> {
    let request: AnalysisRequest = serde_json::from_value(request)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))?;
    if let Some(url) = &request.url {
        tracing::Span::current().record("url", tracing::field::display(url));
    }

    let claim = validate_claim(&request.claim)?;
    let started = Instant::now();

    let analysis = state.analyzer.analyze(claim).await;

    let cached = analysis.cached;
    let processing_time = started.elapsed().as_secs_f64();
    info!(
        verdict = %analysis.final_verdict,
        cached = cached,
        processing_time = processing_time,
        "Analysis served"
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        STATUS_HEADER,
        HeaderValue::from_static(if cached { STATUS_HIT } else { STATUS_MISS }),
    );

    let body = AnalysisResponse {
        analysis,
        processing_time,
        cached,
    };
    Ok((StatusCode::OK, headers, Json(body)).into_response())
}

#[instrument(skip(state))]
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<CacheStats>, GatewayError> {
    Ok(Json(state.memory().stats().await?))
}

#[instrument(skip(state))]
pub async fn prune_handler(State(state): State<AppState>) -> Result<Json<PruneResponse>, GatewayError> {
    let removed = state.memory().prune_expired().await?;
    Ok(Json(PruneResponse { removed }))
}

/// Trims `claim` and checks its length in characters.
pub(crate) fn validate_claim(claim: &str) -> Result<&str, GatewayError> {
    let claim = claim.trim();
    let len = claim.chars().count();

    if !(MIN_CLAIM_CHARS..=MAX_CLAIM_CHARS).contains(&len) {
        return Err(GatewayError::InvalidRequest(format!(
            "claim must be between {} and {} characters, got {}",
            MIN_CLAIM_CHARS, MAX_CLAIM_CHARS, len
        )));
    }

    Ok(claim)
}
