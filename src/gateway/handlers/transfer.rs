//! Money-moving handlers

use std::sync::Arc;

use axum::{Extension, extract::State};

use super::super::middleware::AuthenticatedUser;
use super::super::state::AppState;
use super::super::types::{
    ApiResult, TopUpApiRequest, TopUpResponse, TransferApiRequest, TransferResponse,
    ValidatedJson, created,
};

/// Top up a wallet from an external payment method
///
/// POST /api/v1/wallets/topup
///
/// A queued top-up (payment gateway circuit open) still answers 201 with
/// `fallbackApplied: true`; the amount sits in the pending balance until the
/// retry worker or the payment webhook settles it.
pub async fn top_up(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(req): ValidatedJson<TopUpApiRequest>,
) -> ApiResult<TopUpResponse> {
    let receipt = state.coordinator.top_up(&user.user_id, req.into()).await?;
    created(receipt.into())
}

/// Wallet-to-wallet transfer
///
/// POST /api/v1/wallets/transfer
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(req): ValidatedJson<TransferApiRequest>,
) -> ApiResult<TransferResponse> {
    let receipt = state
        .coordinator
        .transfer(&user.user_id, req.into())
        .await?;
    created(receipt.into())
}
