//! Fault injection for the simulated dependencies (`mock-api` builds only)

use std::sync::Arc;

use axum::extract::State;
use tracing::warn;

use super::super::state::AppState;
use super::super::types::{ApiResult, ValidatedJson, ok};
use crate::external::FaultSettings;
use crate::resilience::CircuitBreakerState;

/// POST /internal/mock/faults
///
/// Fields left out keep their current value. Returns the breaker snapshots so
/// a caller can see the effect of earlier faults.
pub async fn set_faults(
    State(state): State<Arc<AppState>>,
    ValidatedJson(settings): ValidatedJson<FaultSettings>,
) -> ApiResult<Vec<CircuitBreakerState>> {
    warn!(?settings, "[MOCK] fault settings changed");
    state.simulated.apply(&settings);
    ok(state.breakers.snapshots())
}
