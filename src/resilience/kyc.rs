use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;

use super::breaker::{CallOutcome, CircuitBreaker};
use crate::error::{WalletError, WalletResult};
use crate::external::{KycDecision, KycProvider};
use crate::kyc::KycSubmission;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KycVerification {
    Verified,
    Rejected(String),
    /// Provider will call back
    AwaitingProvider,
    /// Breaker fallback
    ManualReview {
        estimated_completion_at: DateTime<Utc>,
    },
}

/// KYC provider behind a circuit breaker, falling back to manual review
pub struct ResilientKycVerifier {
    provider: Arc<dyn KycProvider>,
    breaker: Arc<CircuitBreaker>,
    manual_review_sla: Duration,
}

impl ResilientKycVerifier {
    pub fn new(
        provider: Arc<dyn KycProvider>,
        breaker: Arc<CircuitBreaker>,
        manual_review_sla: Duration,
    ) -> Self {
        Self {
            provider,
            breaker,
            manual_review_sla,
        }
    }

    pub async fn verify(&self, submission: &KycSubmission) -> WalletResult<KycVerification> {
        match self.breaker.call(self.provider.verify(submission)).await {
            CallOutcome::Completed(KycDecision::Verified) => Ok(KycVerification::Verified),
            CallOutcome::Completed(KycDecision::Pending) => Ok(KycVerification::AwaitingProvider),
            CallOutcome::Rejected(reason) => Ok(KycVerification::Rejected(reason)),
            CallOutcome::Failed(err) => Err(WalletError::DependencyUnavailable {
                dependency: self.provider.name().to_string(),
                reason: err.to_string(),
            }),
            CallOutcome::Degraded(reason) => {
                let sla = chrono::Duration::from_std(self.manual_review_sla)
                    .unwrap_or_else(|_| chrono::Duration::hours(24));
                let estimated_completion_at = Utc::now() + sla;
                warn!(
                    user_id = %submission.user_id,
                    ?reason,
                    %estimated_completion_at,
                    "kyc provider degraded, queued for manual review"
                );
                Ok(KycVerification::ManualReview {
                    estimated_completion_at,
                })
            }
        }
    }
}
