//! Asynchronous provider callbacks
//!
//! Settlement is single-winner: a second callback for the same reference
//! gets `reference_not_found`. Top-ups queued by the payment breaker never
//! reached the gateway and get `invalid_state_transition`.

use std::sync::Arc;

use axum::extract::State;
use tracing::info;

use super::super::state::AppState;
use super::super::types::{
    ApiResult, KycResponse, KycWebhookRequest, PaymentWebhookRequest, TransactionResponse,
    ValidatedJson, ok,
};

/// POST /api/v1/webhooks/payment
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<PaymentWebhookRequest>,
) -> ApiResult<TransactionResponse> {
    info!(reference_id = %req.reference_id, status = ?req.status, "payment webhook");
    let tx = state
        .coordinator
        .settle_top_up(req.reference_id, req.outcome())?;
    ok(tx.into())
}

/// POST /api/v1/webhooks/kyc
pub async fn kyc_webhook(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<KycWebhookRequest>,
) -> ApiResult<KycResponse> {
    info!(kyc_id = %req.kyc_id, decision = ?req.decision, "kyc webhook");
    let record = state.kyc.complete_review(req.kyc_id, &req.decision())?;
    ok(record.into())
}
