//! Simulated external dependencies
//!
//! In-process stand-ins for the payment gateway, SMS/email providers and the
//! KYC provider. Each carries runtime fault switches (toggled from tests or
//! the `mock-api` fault endpoint) and call counters.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ulid::Ulid;

use super::{
    ChargeReceipt, ChargeRequest, ChargeStatus, DependencyError, KycDecision, KycProvider,
    Notification, NotificationChannel, PaymentGateway,
};
use crate::kyc::KycSubmission;

/// Shared fault switch block
#[derive(Debug, Default)]
struct Faults {
    /// Every call fails with `Unavailable`
    fail: AtomicBool,
    /// Added latency per call, in milliseconds
    latency_ms: AtomicU64,
    calls: AtomicUsize,
}

impl Faults {
    async fn enter(&self) -> Result<(), DependencyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(DependencyError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Payment gateway
// ============================================================================

#[derive(Debug, Default)]
pub struct SimulatedPaymentGateway {
    faults: Faults,
    /// Decline every charge (business rejection)
    decline: AtomicBool,
    /// Accept charges as pending instead of settling them
    defer_settlement: AtomicBool,
}

impl SimulatedPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.faults.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_decline(&self, decline: bool) {
        self.decline.store(decline, Ordering::SeqCst);
    }

    pub fn set_defer_settlement(&self, defer: bool) {
        self.defer_settlement.store(defer, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        self.faults
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn call_count(&self) -> usize {
        self.faults.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    fn name(&self) -> &'static str {
        "payment_gateway"
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, DependencyError> {
        self.faults.enter().await?;
        if self.decline.load(Ordering::SeqCst) {
            return Err(DependencyError::Rejected("card declined".to_string()));
        }
        let status = if self.defer_settlement.load(Ordering::SeqCst) {
            ChargeStatus::Pending
        } else {
            ChargeStatus::Settled
        };
        debug!(
            reference_id = %request.reference_id,
            amount = %request.amount,
            currency = %request.currency,
            ?status,
            "simulated charge"
        );
        Ok(ChargeReceipt {
            provider_reference: format!("sim_pay_{}", Ulid::new()),
            status,
        })
    }
}

// ============================================================================
// Notification channels
// ============================================================================

#[derive(Debug)]
pub struct SimulatedNotificationChannel {
    name: &'static str,
    faults: Faults,
    delivered: AtomicUsize,
}

impl SimulatedNotificationChannel {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            faults: Faults::default(),
            delivered: AtomicUsize::new(0),
        }
    }

    pub fn sms() -> Self {
        Self::new("sms")
    }

    pub fn email() -> Self {
        Self::new("email")
    }

    pub fn set_fail(&self, fail: bool) {
        self.faults.fail.store(fail, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.faults.calls.load(Ordering::SeqCst)
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationChannel for SimulatedNotificationChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn send(&self, notification: &Notification) -> Result<(), DependencyError> {
        self.faults.enter().await?;
        self.delivered.fetch_add(1, Ordering::SeqCst);
        debug!(
            channel = self.name,
            user_id = %notification.user_id,
            subject = %notification.subject,
            "simulated notification delivered"
        );
        Ok(())
    }
}

// ============================================================================
// KYC provider
// ============================================================================

#[derive(Debug, Default)]
pub struct SimulatedKycProvider {
    faults: Faults,
    reject: AtomicBool,
    /// Answer `Pending`, as an asynchronous provider would
    defer: AtomicBool,
}

impl SimulatedKycProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.faults.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn set_defer(&self, defer: bool) {
        self.defer.store(defer, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.faults.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KycProvider for SimulatedKycProvider {
    fn name(&self) -> &'static str {
        "kyc_provider"
    }

    async fn verify(&self, submission: &KycSubmission) -> Result<KycDecision, DependencyError> {
        self.faults.enter().await?;
        if self.reject.load(Ordering::SeqCst) {
            return Err(DependencyError::Rejected(format!(
                "document {} could not be verified",
                submission.document_type
            )));
        }
        if self.defer.load(Ordering::SeqCst) {
            return Ok(KycDecision::Pending);
        }
        Ok(KycDecision::Verified)
    }
}

// ============================================================================
// Bundle + fault settings
// ============================================================================

/// Fault switches for every simulated dependency. `None` leaves a switch as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FaultSettings {
    pub payment_fail: Option<bool>,
    pub payment_decline: Option<bool>,
    pub payment_defer: Option<bool>,
    pub payment_latency_ms: Option<u64>,
    pub sms_fail: Option<bool>,
    pub email_fail: Option<bool>,
    pub kyc_fail: Option<bool>,
    pub kyc_reject: Option<bool>,
    pub kyc_defer: Option<bool>,
}

/// All simulated dependencies of one process
#[derive(Debug, Clone)]
pub struct SimulatedDependencies {
    pub payment: Arc<SimulatedPaymentGateway>,
    pub sms: Arc<SimulatedNotificationChannel>,
    pub email: Arc<SimulatedNotificationChannel>,
    pub kyc: Arc<SimulatedKycProvider>,
}

impl Default for SimulatedDependencies {
    fn default() -> Self {
        Self {
            payment: Arc::new(SimulatedPaymentGateway::new()),
            sms: Arc::new(SimulatedNotificationChannel::sms()),
            email: Arc::new(SimulatedNotificationChannel::email()),
            kyc: Arc::new(SimulatedKycProvider::new()),
        }
    }
}

impl SimulatedDependencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&self, settings: &FaultSettings) {
        if let Some(v) = settings.payment_fail {
            self.payment.set_fail(v);
        }
        if let Some(v) = settings.payment_decline {
            self.payment.set_decline(v);
        }
        if let Some(v) = settings.payment_defer {
            self.payment.set_defer_settlement(v);
        }
        if let Some(ms) = settings.payment_latency_ms {
            self.payment.set_latency(Duration::from_millis(ms));
        }
        if let Some(v) = settings.sms_fail {
            self.sms.set_fail(v);
        }
        if let Some(v) = settings.email_fail {
            self.email.set_fail(v);
        }
        if let Some(v) = settings.kyc_fail {
            self.kyc.set_fail(v);
        }
        if let Some(v) = settings.kyc_reject {
            self.kyc.set_reject(v);
        }
        if let Some(v) = settings.kyc_defer {
            self.kyc.set_defer(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{ReferenceId, WalletId};
    use crate::fee::PaymentMethod;
    use crate::money::Currency;
    use rust_decimal::Decimal;

    fn charge_request() -> ChargeRequest {
        ChargeRequest {
            reference_id: ReferenceId::new(),
            wallet_id: WalletId::new(),
            user_id: "u1".to_string(),
            amount: Decimal::from(100),
            currency: Currency::Thb,
            method: PaymentMethod::Card,
        }
    }

    #[tokio::test]
    async fn test_payment_switches() {
        let gateway = SimulatedPaymentGateway::new();
        let receipt = gateway.charge(&charge_request()).await.unwrap();
        assert_eq!(receipt.status, ChargeStatus::Settled);

        gateway.set_defer_settlement(true);
        let receipt = gateway.charge(&charge_request()).await.unwrap();
        assert_eq!(receipt.status, ChargeStatus::Pending);

        gateway.set_decline(true);
        assert!(matches!(
            gateway.charge(&charge_request()).await,
            Err(DependencyError::Rejected(_))
        ));

        gateway.set_fail(true);
        assert!(matches!(
            gateway.charge(&charge_request()).await,
            Err(DependencyError::Unavailable(_))
        ));
        assert_eq!(gateway.call_count(), 4);
    }

    #[tokio::test]
    async fn test_apply_fault_settings() {
        let deps = SimulatedDependencies::new();
        let settings: FaultSettings =
            serde_json::from_str(r#"{"smsFail": true, "kycDefer": true}"#).unwrap();
        deps.apply(&settings);

        let n = Notification {
            user_id: "u1".into(),
            subject: "s".into(),
            body: "b".into(),
        };
        assert!(deps.sms.send(&n).await.is_err());
        assert!(deps.email.send(&n).await.is_ok());
        assert_eq!(deps.email.delivered_count(), 1);
        assert_eq!(deps.sms.delivered_count(), 0);

        assert!(serde_json::from_str::<FaultSettings>(r#"{"bogus": true}"#).is_err());
    }
}
