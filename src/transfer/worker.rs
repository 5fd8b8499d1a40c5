//! Payment Retry Worker
//!
//! Background worker that re-drives top-ups the payment breaker parked as
//! `queued`. Gateway-pending top-ups are left to the payment webhook.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::coordinator::TransferCoordinator;

/// Configuration for the retry worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How often to scan for due retries
    pub scan_interval: Duration,
    /// Maximum top-ups to retry per scan
    pub batch_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(10),
            batch_size: 100,
        }
    }
}

pub struct PaymentRetryWorker {
    coordinator: Arc<TransferCoordinator>,
    config: WorkerConfig,
}

impl PaymentRetryWorker {
    pub fn new(coordinator: Arc<TransferCoordinator>, config: WorkerConfig) -> Self {
        Self {
            coordinator,
            config,
        }
    }

    /// Run the retry loop forever
    pub async fn run(&self) -> ! {
        info!(
            scan_interval_secs = self.config.scan_interval.as_secs(),
            batch_size = self.config.batch_size,
            "Starting payment retry worker"
        );

        loop {
            let resolved = self.scan_and_retry().await;
            if resolved > 0 {
                info!(resolved, "Retry scan complete");
            }
            tokio::time::sleep(self.config.scan_interval).await;
        }
    }

    /// Run a single scan. Returns how many top-ups left the retry queue.
    pub async fn scan_and_retry(&self) -> usize {
        let due = self.coordinator.due_retries(self.config.batch_size);
        if due.is_empty() {
            return 0;
        }
        debug!(count = due.len(), "Retrying queued top-ups");

        let mut resolved = 0;
        for pending in &due {
            match self.coordinator.retry_top_up(pending).await {
                Ok(true) => resolved += 1,
                Ok(false) => {
                    debug!(reference_id = %pending.reference_id, "Gateway still degraded")
                }
                Err(e) => warn!(
                    reference_id = %pending.reference_id,
                    attempts = pending.attempts + 1,
                    error = %e,
                    "Top-up retry failed"
                ),
            }
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::WalletId;
    use crate::external::SimulatedDependencies;
    use crate::kyc::KycLookup;
    use crate::ledger::TransactionStatus;
    use crate::resilience::{
        BreakerConfig, BreakerRegistry, NotificationDispatcher, ResilientPaymentGateway,
        dependency,
    };
    use crate::transfer::{TopUpRequest, TopUpStatus};
    use crate::wallet::WalletRegistry;
    use rust_decimal::Decimal;

    struct AllVerified;

    impl KycLookup for AllVerified {
        fn is_verified(&self, _user_id: &str) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_queued_top_up_settles_after_recovery() {
        let deps = SimulatedDependencies::new();
        let breakers = BreakerRegistry::new(BreakerConfig {
            failure_threshold: 1,
            cooldown: Duration::from_millis(30),
            call_timeout: Duration::from_secs(1),
        });
        let coordinator = Arc::new(TransferCoordinator::new(
            Arc::new(WalletRegistry::new(Arc::new(AllVerified))),
            ResilientPaymentGateway::new(
                deps.payment.clone(),
                breakers.breaker(dependency::PAYMENT_GATEWAY),
                Duration::ZERO,
            ),
            Arc::new(NotificationDispatcher::new(
                deps.sms.clone(),
                breakers.breaker(dependency::SMS),
                deps.email.clone(),
                breakers.breaker(dependency::EMAIL),
            )),
        ));
        let wallet: WalletId = coordinator
            .registry()
            .create_wallet("alice", "USD")
            .unwrap()
            .id;

        // Threshold 1: the first failure trips and queues
        deps.payment.set_fail(true);
        let receipt = coordinator
            .top_up(
                "alice",
                TopUpRequest {
                    wallet_id: wallet,
                    amount: Decimal::new(4250, 2),
                    currency: "USD".into(),
                    payment_method: "card".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(receipt.status, TopUpStatus::Queued);

        let worker = PaymentRetryWorker::new(
            coordinator.clone(),
            WorkerConfig {
                scan_interval: Duration::from_millis(10),
                batch_size: 10,
            },
        );

        deps.payment.set_fail(false);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(worker.scan_and_retry().await, 1);
        assert_eq!(coordinator.pending_top_up_count(), 0);

        let balance = coordinator.registry().get_balance(wallet, "alice").unwrap();
        assert_eq!(balance.available, Decimal::new(4250, 2));
        assert_eq!(balance.pending, Decimal::ZERO);
        let history = coordinator.history(wallet, "alice").unwrap();
        assert_eq!(history[0].status, TransactionStatus::Completed);
        assert!(history[0].fallback_applied);

        // Nothing left to do
        assert_eq!(worker.scan_and_retry().await, 0);
    }
}
