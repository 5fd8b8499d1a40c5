//! External dependency adapters
//!
//! Interface boundary for the three unreliable collaborators: payment
//! gateway, notification providers (SMS, email) and the KYC provider.
//! Callers never use these directly; they go through
//! [`crate::resilience`], which adds timeouts, the circuit breaker and the
//! fallback path.

pub mod simulated;

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::core_types::{ReferenceId, UserId, WalletId};
use crate::fee::PaymentMethod;
use crate::kyc::KycSubmission;
use crate::money::Currency;

pub use simulated::{
    FaultSettings, SimulatedDependencies, SimulatedKycProvider, SimulatedNotificationChannel,
    SimulatedPaymentGateway,
};

/// Failure of an external call
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DependencyError {
    /// Transport or provider failure
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// The provider answered and said no (card declined, identity rejected)
    #[error("rejected: {0}")]
    Rejected(String),
}

impl DependencyError {
    /// Whether this counts against the dependency's health
    #[inline]
    pub fn is_fault(&self) -> bool {
        !matches!(self, DependencyError::Rejected(_))
    }
}

// ============================================================================
// Payment gateway
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRequest {
    /// Idempotency key, reused on every retry of the same top-up
    pub reference_id: ReferenceId,
    pub wallet_id: WalletId,
    pub user_id: UserId,
    pub amount: Decimal,
    pub currency: Currency,
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeStatus {
    /// Funds captured
    Settled,
    /// Accepted, settlement confirmed later by webhook
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeReceipt {
    pub provider_reference: String,
    pub status: ChargeStatus,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Get adapter name for logging and breaker registration
    fn name(&self) -> &'static str;

    /// Charge the external funding source.
    ///
    /// # Idempotency
    /// Charging the same `reference_id` twice must not capture funds twice.
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, DependencyError>;
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub user_id: UserId,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, notification: &Notification) -> Result<(), DependencyError>;
}

// ============================================================================
// KYC provider
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KycDecision {
    Verified,
    /// Asynchronous provider: the result arrives through the KYC webhook
    Pending,
}

#[async_trait]
pub trait KycProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Verify a submission. A rejection is `Err(DependencyError::Rejected)`.
    async fn verify(&self, submission: &KycSubmission) -> Result<KycDecision, DependencyError>;
}
