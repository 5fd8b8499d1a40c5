//! KYC handlers

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::super::middleware::AuthenticatedUser;
use super::super::state::AppState;
use super::super::types::{
    ApiResponse, ApiResult, KycNotSubmitted, KycResponse, SubmitKycRequest,
    ValidatedJson, created, ok,
};

/// Submit KYC
///
/// POST /api/v1/kyc
pub async fn submit_kyc(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(req): ValidatedJson<SubmitKycRequest>,
) -> ApiResult<KycResponse> {
    let record = state.kyc.submit(&user.user_id, req.into()).await?;
    created(record.into())
}

/// Caller's KYC status
///
/// GET /api/v1/kyc
pub async fn get_kyc_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Response {
    match state.kyc.status_for_user(&user.user_id) {
        Some(record) => (
            StatusCode::OK,
            Json(ApiResponse::success(KycResponse::from(record))),
        )
            .into_response(),
        None => (
            StatusCode::OK,
            Json(ApiResponse::success(KycNotSubmitted {
                status: "not_submitted",
            })),
        )
            .into_response(),
    }
}

/// Submissions waiting for a human reviewer
///
/// GET /internal/kyc/manual-review
pub async fn manual_review_queue(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<KycResponse>> {
    let queue = state
        .kyc
        .manual_review_queue()
        .into_iter()
        .map(KycResponse::from)
        .collect();
    ok(queue)
}
