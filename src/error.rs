//! Wallet Error Types
//!
//! One error enum for the whole money path. Every variant maps to an
//! [`ErrorKind`] (the taxonomy class), a stable string `code()` used in API
//! responses, and an HTTP status.

use thiserror::Error;

use crate::balance::BalanceError;
use crate::core_types::{KycId, ReferenceId, WalletId};

/// Error taxonomy class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input
    Validation,
    /// Ownership or KYC precondition failed
    Permission,
    /// Unknown wallet / record
    NotFound,
    /// Duplicate submission or illegal state transition
    Conflict,
    /// Business-rule violation (insufficient balance, frozen wallet, ...)
    Domain,
    /// External dependency failed below the breaker threshold
    DependencyUnavailable,
    /// Invariant broken inside the engine
    Internal,
}

impl ErrorKind {
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::Validation | ErrorKind::Domain => 400,
            ErrorKind::Permission => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::DependencyUnavailable => 503,
            ErrorKind::Internal => 500,
        }
    }
}

/// Wallet error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalletError {
    // === Validation Errors ===
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Malformed request: {0}")]
    InvalidRequest(String),

    #[error("Country not supported: {0}")]
    InvalidCountry(String),

    #[error("Unsupported document type: {0}")]
    InvalidDocumentType(String),

    #[error("Invalid date of birth: {0}")]
    InvalidDateOfBirth(String),

    #[error("Currency not supported: {0}")]
    InvalidCurrency(String),

    #[error("Amount must be greater than zero and within currency precision")]
    InvalidAmount,

    #[error("Unknown payment method: {0}")]
    InvalidPaymentMethod(String),

    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: String, actual: String },

    #[error("Source and destination wallet cannot be the same")]
    SameWallet,

    // === Permission Errors ===
    #[error("Verified KYC is required before creating a wallet")]
    KycRequired,

    #[error("Wallet {0} does not belong to the caller")]
    WalletAccessDenied(WalletId),

    // === Not Found ===
    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletId),

    #[error("KYC record not found: {0}")]
    KycNotFound(KycId),

    #[error("Payment reference not found: {0}")]
    ReferenceNotFound(ReferenceId),

    // === Conflict ===
    #[error("KYC already submitted for this user")]
    DuplicateKyc,

    #[error("Wallet already exists for currency {0}")]
    DuplicateWallet(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    // === Domain ===
    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Wallet {0} is frozen")]
    WalletFrozen(WalletId),

    #[error("Wallet {0} is closed")]
    WalletClosed(WalletId),

    #[error("Wallet {0} still holds funds")]
    WalletNotEmpty(WalletId),

    #[error("Payment declined: {0}")]
    PaymentDeclined(String),

    #[error("Balance overflow")]
    BalanceOverflow,

    // === Dependency ===
    #[error("Dependency {dependency} unavailable: {reason}")]
    DependencyUnavailable { dependency: String, reason: String },

    #[error("All notification services are unavailable")]
    AllNotificationServicesUnavailable,

    // === System ===
    #[error("Internal system error: {0}")]
    Internal(String),
}

impl WalletError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::MissingField(_)
            | WalletError::InvalidRequest(_)
            | WalletError::InvalidCountry(_)
            | WalletError::InvalidDocumentType(_)
            | WalletError::InvalidDateOfBirth(_)
            | WalletError::InvalidCurrency(_)
            | WalletError::InvalidAmount
            | WalletError::InvalidPaymentMethod(_)
            | WalletError::CurrencyMismatch { .. }
            | WalletError::SameWallet => ErrorKind::Validation,
            WalletError::KycRequired | WalletError::WalletAccessDenied(_) => ErrorKind::Permission,
            WalletError::WalletNotFound(_)
            | WalletError::KycNotFound(_)
            | WalletError::ReferenceNotFound(_) => ErrorKind::NotFound,
            WalletError::DuplicateKyc
            | WalletError::DuplicateWallet(_)
            | WalletError::InvalidStateTransition(_) => ErrorKind::Conflict,
            WalletError::InsufficientBalance
            | WalletError::WalletFrozen(_)
            | WalletError::WalletClosed(_)
            | WalletError::WalletNotEmpty(_)
            | WalletError::PaymentDeclined(_)
            | WalletError::BalanceOverflow => ErrorKind::Domain,
            WalletError::DependencyUnavailable { .. }
            | WalletError::AllNotificationServicesUnavailable => {
                ErrorKind::DependencyUnavailable
            }
            WalletError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            WalletError::MissingField(_) => "missing_field",
            WalletError::InvalidRequest(_) => "invalid_request",
            WalletError::InvalidCountry(_) => "invalid_country",
            WalletError::InvalidDocumentType(_) => "invalid_document_type",
            WalletError::InvalidDateOfBirth(_) => "invalid_date_of_birth",
            WalletError::InvalidCurrency(_) => "invalid_currency",
            WalletError::InvalidAmount => "invalid_amount",
            WalletError::InvalidPaymentMethod(_) => "invalid_payment_method",
            WalletError::CurrencyMismatch { .. } => "currency_mismatch",
            WalletError::SameWallet => "same_wallet",
            WalletError::KycRequired => "kyc_required",
            WalletError::WalletAccessDenied(_) => "wallet_access_denied",
            WalletError::WalletNotFound(_) => "wallet_not_found",
            WalletError::KycNotFound(_) => "kyc_not_found",
            WalletError::ReferenceNotFound(_) => "reference_not_found",
            WalletError::DuplicateKyc => "kyc_already_submitted",
            WalletError::DuplicateWallet(_) => "wallet_already_exists",
            WalletError::InvalidStateTransition(_) => "invalid_state_transition",
            WalletError::InsufficientBalance => "insufficient_balance",
            WalletError::WalletFrozen(_) => "wallet_frozen",
            WalletError::WalletClosed(_) => "wallet_closed",
            WalletError::WalletNotEmpty(_) => "wallet_not_empty",
            WalletError::PaymentDeclined(_) => "payment_declined",
            WalletError::BalanceOverflow => "balance_overflow",
            WalletError::DependencyUnavailable { .. } => "dependency_unavailable",
            WalletError::AllNotificationServicesUnavailable => {
                "all_notification_services_unavailable"
            }
            WalletError::Internal(_) => "internal_error",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        self.kind().http_status()
    }
}

impl From<BalanceError> for WalletError {
    fn from(e: BalanceError) -> Self {
        match e {
            BalanceError::Insufficient => WalletError::InsufficientBalance,
            BalanceError::Overflow => WalletError::BalanceOverflow,
            BalanceError::NonPositive => WalletError::InvalidAmount,
            BalanceError::PendingUnderflow => {
                WalletError::Internal("pending balance underflow".to_string())
            }
        }
    }
}

pub type WalletResult<T> = Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(WalletError::KycRequired.code(), "kyc_required");
        assert_eq!(
            WalletError::InsufficientBalance.code(),
            "insufficient_balance"
        );
        assert_eq!(
            WalletError::CurrencyMismatch {
                expected: "THB".into(),
                actual: "USD".into()
            }
            .code(),
            "currency_mismatch"
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(WalletError::MissingField("country".into()).http_status(), 400);
        assert_eq!(WalletError::KycRequired.http_status(), 403);
        assert_eq!(WalletError::WalletNotFound(WalletId::new()).http_status(), 404);
        assert_eq!(WalletError::DuplicateKyc.http_status(), 409);
        assert_eq!(WalletError::InsufficientBalance.http_status(), 400);
        assert_eq!(
            WalletError::AllNotificationServicesUnavailable.http_status(),
            503
        );
        assert_eq!(WalletError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn test_balance_error_mapping() {
        assert_eq!(
            WalletError::from(BalanceError::Insufficient),
            WalletError::InsufficientBalance
        );
        assert_eq!(
            WalletError::from(BalanceError::Overflow).kind(),
            ErrorKind::Domain
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            WalletError::InsufficientBalance.to_string(),
            "Insufficient balance"
        );
    }
}
