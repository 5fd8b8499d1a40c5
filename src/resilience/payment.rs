use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::breaker::{CallOutcome, CircuitBreaker};
use crate::error::{WalletError, WalletResult};
use crate::external::{ChargeRequest, ChargeStatus, PaymentGateway};

/// Outcome of a charge after the breaker and fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Settled { provider_reference: String },
    /// Gateway accepted the charge; settlement arrives by webhook
    Pending { provider_reference: String },
    /// Breaker fallback: charge parked for the retry worker
    Queued { retry_after: Duration },
}

/// Payment gateway behind a circuit breaker. An open circuit turns a charge
/// into a queued, successful outcome.
pub struct ResilientPaymentGateway {
    gateway: Arc<dyn PaymentGateway>,
    breaker: Arc<CircuitBreaker>,
    retry_after: Duration,
}

impl ResilientPaymentGateway {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        breaker: Arc<CircuitBreaker>,
        retry_after: Duration,
    ) -> Self {
        Self {
            gateway,
            breaker,
            retry_after,
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// # Errors
    /// * `PaymentDeclined` - the gateway rejected the charge
    /// * `DependencyUnavailable` - the gateway failed and the circuit is still closed
    pub async fn charge(&self, request: &ChargeRequest) -> WalletResult<PaymentOutcome> {
        match self.breaker.call(self.gateway.charge(request)).await {
            CallOutcome::Completed(receipt) => Ok(match receipt.status {
                ChargeStatus::Settled => PaymentOutcome::Settled {
                    provider_reference: receipt.provider_reference,
                },
                ChargeStatus::Pending => PaymentOutcome::Pending {
                    provider_reference: receipt.provider_reference,
                },
            }),
            CallOutcome::Rejected(reason) => {
                info!(reference_id = %request.reference_id, %reason, "charge declined");
                Err(WalletError::PaymentDeclined(reason))
            }
            CallOutcome::Failed(err) => Err(WalletError::DependencyUnavailable {
                dependency: self.gateway.name().to_string(),
                reason: err.to_string(),
            }),
            CallOutcome::Degraded(reason) => {
                warn!(
                    reference_id = %request.reference_id,
                    ?reason,
                    retry_after_secs = self.retry_after.as_secs(),
                    "payment gateway degraded, charge queued"
                );
                Ok(PaymentOutcome::Queued {
                    retry_after: self.retry_after,
                })
            }
        }
    }
}
