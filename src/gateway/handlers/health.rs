//! Health check handler

use std::sync::Arc;

use axum::extract::State;

use super::super::state::AppState;
use super::super::types::{ApiResult, HealthResponse, ok};

/// Health check endpoint
///
/// Always 200 while the process serves requests. An open circuit is reported
/// as `degraded`, not as an outage: every dependency has a fallback.
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    ok(HealthResponse::from_breakers(state.breakers.snapshots()))
}
