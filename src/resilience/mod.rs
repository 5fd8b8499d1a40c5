//! Resilience layer
//!
//! Every call into an external dependency goes through a [`CircuitBreaker`]
//! from the shared [`BreakerRegistry`]. Each wrapper owns the fallback for
//! its dependency:
//!
//! | Dependency      | Fallback when the circuit is open                 |
//! |-----------------|---------------------------------------------------|
//! | payment gateway | charge queued for retry (`status: "queued"`)      |
//! | SMS             | email, else `all_notification_services_unavailable` |
//! | KYC provider    | manual review with an estimated completion time   |

pub mod breaker;
pub mod kyc;
pub mod notification;
pub mod payment;
pub mod registry;

pub use breaker::{
    BreakerConfig, BreakerState, CallOutcome, CircuitBreaker, CircuitBreakerState, DegradedReason,
};
pub use kyc::{KycVerification, ResilientKycVerifier};
pub use notification::{DeliveryChannel, NotificationDispatcher};
pub use payment::{PaymentOutcome, ResilientPaymentGateway};
pub use registry::BreakerRegistry;

/// Breaker names
pub mod dependency {
    pub const PAYMENT_GATEWAY: &str = "payment_gateway";
    pub const SMS: &str = "sms";
    pub const EMAIL: &str = "email";
    pub const KYC_PROVIDER: &str = "kyc_provider";
}
