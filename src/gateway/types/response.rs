//! API Response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `ApiError`: Error response, built from [`WalletError`]
//! - `error_codes`: Numeric error code constants
//! - Response DTOs (amounts as currency-formatted strings)

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core_types::{KycId, ReferenceId, TransactionId, UserId, WalletId};
use crate::error::{ErrorKind, WalletError};
use crate::fee::PaymentMethod;
use crate::kyc::{DocumentType, KycRecord, KycStatus, ReviewChannel};
use crate::ledger::{Transaction, TransactionStatus, TransactionType};
use crate::money::{Currency, format_amount};
use crate::resilience::{BreakerState, CircuitBreakerState};
use crate::transfer::{TopUpReceipt, TopUpStatus, TransferReceipt};
use crate::wallet::{BalanceSnapshot, Wallet, WalletStatus};

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success only)
/// - error: stable error slug (error only)
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
            error: None,
        }
    }

    /// Create error response
    pub fn error(code: i32, error: &'static str, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
            error: Some(error),
        }
    }
}

pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// 200 OK
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

/// 201 Created
pub fn created<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub error: &'static str,
    pub msg: String,
}

impl ApiError {
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: error_codes::MISSING_AUTH,
            error: "unauthenticated",
            msg: msg.into(),
        }
    }

    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: error_codes::AUTH_FAILED,
            error: "auth_failed",
            msg: msg.into(),
        }
    }
}

impl From<WalletError> for ApiError {
    fn from(e: WalletError) -> Self {
        let kind = e.kind();
        if kind == ErrorKind::Internal {
            tracing::error!(error = %e, "internal error");
        }
        Self {
            status: StatusCode::from_u16(e.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            code: error_codes::for_kind(kind),
            error: e.code(),
            msg: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiResponse::<()>::error(self.code, self.error, self.msg));
        (self.status, body).into_response()
    }
}

/// Standard API error codes
pub mod error_codes {
    use crate::error::ErrorKind;

    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const BUSINESS_RULE: i32 = 1002;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const AUTH_FAILED: i32 = 2002;
    pub const PERMISSION_DENIED: i32 = 2003;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4004;
    pub const CONFLICT: i32 = 4009;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;

    pub fn for_kind(kind: ErrorKind) -> i32 {
        match kind {
            ErrorKind::Validation => INVALID_PARAMETER,
            ErrorKind::Domain => BUSINESS_RULE,
            ErrorKind::Permission => PERMISSION_DENIED,
            ErrorKind::NotFound => NOT_FOUND,
            ErrorKind::Conflict => CONFLICT,
            ErrorKind::DependencyUnavailable => SERVICE_UNAVAILABLE,
            ErrorKind::Internal => INTERNAL_ERROR,
        }
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KycResponse {
    #[serde(rename = "kycID")]
    pub kyc_id: KycId,
    pub status: KycStatus,
    pub verified_at: Option<DateTime<Utc>>,
    pub document_type: DocumentType,
    pub country: String,
    pub submitted_at: DateTime<Utc>,
    pub review_channel: ReviewChannel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion_at: Option<DateTime<Utc>>,
}

impl From<KycRecord> for KycResponse {
    fn from(r: KycRecord) -> Self {
        Self {
            kyc_id: r.id,
            status: r.status,
            verified_at: r.verified_at,
            document_type: r.document_type,
            country: r.country,
            submitted_at: r.submitted_at,
            review_channel: r.review_channel,
            rejection_reason: r.rejection_reason,
            estimated_completion_at: r.estimated_completion_at,
        }
    }
}

/// `GET /api/v1/kyc` for a user who never submitted
#[derive(Debug, Serialize)]
pub struct KycNotSubmitted {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    #[serde(rename = "walletID")]
    pub wallet_id: WalletId,
    #[serde(rename = "userID")]
    pub user_id: UserId,
    pub currency: Currency,
    pub status: WalletStatus,
    pub available_balance: String,
    pub pending_balance: String,
    pub total_balance: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Wallet> for WalletResponse {
    fn from(w: Wallet) -> Self {
        Self {
            wallet_id: w.id,
            user_id: w.user_id,
            currency: w.currency,
            status: w.status,
            available_balance: format_amount(w.available_balance, w.currency),
            pending_balance: format_amount(w.pending_balance, w.currency),
            total_balance: format_amount(w.total_balance, w.currency),
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    #[serde(rename = "walletID")]
    pub wallet_id: WalletId,
    pub currency: Currency,
    pub available_balance: String,
    pub pending_balance: String,
    pub total_balance: String,
}

impl From<BalanceSnapshot> for BalanceResponse {
    fn from(b: BalanceSnapshot) -> Self {
        Self {
            wallet_id: b.wallet_id,
            currency: b.currency,
            available_balance: format_amount(b.available, b.currency),
            pending_balance: format_amount(b.pending, b.currency),
            total_balance: format_amount(b.total, b.currency),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpResponse {
    #[serde(rename = "transactionID")]
    pub transaction_id: TransactionId,
    #[serde(rename = "referenceID")]
    pub reference_id: ReferenceId,
    pub status: TopUpStatus,
    pub amount: String,
    pub fee: String,
    pub currency: Currency,
    /// Total balance after the top-up
    pub new_balance: String,
    pub available_balance: String,
    pub pending_balance: String,
    pub fallback_applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

impl From<TopUpReceipt> for TopUpResponse {
    fn from(r: TopUpReceipt) -> Self {
        let c = r.currency;
        Self {
            transaction_id: r.transaction_id,
            reference_id: r.reference_id,
            status: r.status,
            amount: format_amount(r.amount, c),
            fee: format_amount(r.fee, c),
            currency: c,
            new_balance: format_amount(r.new_balance.total, c),
            available_balance: format_amount(r.new_balance.available, c),
            pending_balance: format_amount(r.new_balance.pending, c),
            fallback_applied: r.fallback_applied,
            retry_after_seconds: r.retry_after.map(|d| d.as_secs()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    #[serde(rename = "transactionID")]
    pub transaction_id: TransactionId,
    #[serde(rename = "referenceID")]
    pub reference_id: ReferenceId,
    pub status: TransactionStatus,
    pub amount: String,
    pub fee: String,
    pub currency: Currency,
    pub source_new_balance: String,
    pub dest_new_balance: String,
}

impl From<TransferReceipt> for TransferResponse {
    fn from(r: TransferReceipt) -> Self {
        let c = r.currency;
        Self {
            transaction_id: r.transaction_id,
            reference_id: r.reference_id,
            status: r.status,
            amount: format_amount(r.amount, c),
            fee: format_amount(r.fee, c),
            currency: c,
            source_new_balance: format_amount(r.source_new_balance.total, c),
            dest_new_balance: format_amount(r.dest_new_balance.total, c),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    #[serde(rename = "transactionID")]
    pub transaction_id: TransactionId,
    #[serde(rename = "walletID")]
    pub wallet_id: WalletId,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub amount: String,
    pub currency: Currency,
    pub fee: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(rename = "counterpartyWalletID", skip_serializing_if = "Option::is_none")]
    pub counterparty_wallet_id: Option<WalletId>,
    #[serde(rename = "referenceID")]
    pub reference_id: ReferenceId,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub fallback_applied: bool,
}

impl From<Transaction> for TransactionResponse {
    fn from(t: Transaction) -> Self {
        Self {
            transaction_id: t.id,
            wallet_id: t.wallet_id,
            tx_type: t.tx_type,
            amount: format_amount(t.amount, t.currency),
            currency: t.currency,
            fee: format_amount(t.fee, t.currency),
            payment_method: t.payment_method,
            counterparty_wallet_id: t.counterparty_wallet_id,
            reference_id: t.reference_id,
            status: t.status,
            created_at: t.created_at,
            completed_at: t.completed_at,
            failure_reason: t.failure_reason,
            fallback_applied: t.fallback_applied,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    #[serde(rename = "walletID")]
    pub wallet_id: WalletId,
    pub transactions: Vec<TransactionResponse>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "ok" when every circuit is closed, else "degraded"
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp_ms: i64,
    pub dependencies: Vec<CircuitBreakerState>,
}

impl HealthResponse {
    pub fn from_breakers(dependencies: Vec<CircuitBreakerState>) -> Self {
        let degraded = dependencies
            .iter()
            .any(|d| d.state != BreakerState::Closed);
        Self {
            status: if degraded { "degraded" } else { "ok" },
            version: env!("GIT_HASH"),
            timestamp_ms: Utc::now().timestamp_millis(),
            dependencies,
        }
    }
}
