//! Transfer Coordinator
//!
//! The only component that mutates balances. Every mutation happens inside
//! the wallet mutex together with the ledger append that records it, and no
//! `.await` ever runs while a wallet lock is held.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::types::{
    PendingTopUp, SettlementOutcome, TopUpReceipt, TopUpRequest, TopUpStatus, TransferReceipt,
    TransferRequest,
};
use crate::core_types::{ReferenceId, WalletId};
use crate::error::{WalletError, WalletResult};
use crate::external::{ChargeRequest, Notification};
use crate::fee::{self, FeeOperation, PaymentMethod};
use crate::ledger::{Transaction, TransactionStatus};
use crate::logging::AUDIT_TARGET;
use crate::money::{self, Currency, MoneyError};
use crate::resilience::{NotificationDispatcher, PaymentOutcome, ResilientPaymentGateway};
use crate::wallet::WalletRegistry;

pub struct TransferCoordinator {
    registry: Arc<WalletRegistry>,
    payments: ResilientPaymentGateway,
    notifier: Arc<NotificationDispatcher>,
    pending_top_ups: DashMap<ReferenceId, PendingTopUp>,
}

impl TransferCoordinator {
    pub fn new(
        registry: Arc<WalletRegistry>,
        payments: ResilientPaymentGateway,
        notifier: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            registry,
            payments,
            notifier,
            pending_top_ups: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<WalletRegistry> {
        &self.registry
    }

    /// Top up a wallet from an external funding source.
    ///
    /// Validation order: wallet exists, owned, amount, currency, method, active.
    /// The fee is computed and reported but not deducted.
    pub async fn top_up(&self, user_id: &str, req: TopUpRequest) -> WalletResult<TopUpReceipt> {
        let handle = self.registry.owned_handle(req.wallet_id, user_id)?;
        let amount = validate_amount(req.amount, handle.currency)?;
        let currency = parse_currency(&req.currency)?;
        if currency != handle.currency {
            return Err(WalletError::CurrencyMismatch {
                expected: handle.currency.to_string(),
                actual: currency.to_string(),
            });
        }
        let method: PaymentMethod = req
            .payment_method
            .parse()
            .map_err(|_| WalletError::InvalidPaymentMethod(req.payment_method.clone()))?;
        handle.lock().ensure_active(handle.id)?;

        let fee = fee::calculate_fee(FeeOperation::TopUp(method), amount, currency);
        let charge = ChargeRequest {
            reference_id: ReferenceId::new(),
            wallet_id: handle.id,
            user_id: user_id.to_string(),
            amount,
            currency,
            method,
        };

        // External call: no lock held, nothing written yet
        let outcome = self.payments.charge(&charge).await?;

        let (status, retry_after) = match &outcome {
            PaymentOutcome::Settled { .. } => (TopUpStatus::Completed, None),
            PaymentOutcome::Pending { .. } => (TopUpStatus::Pending, None),
            PaymentOutcome::Queued { retry_after } => (TopUpStatus::Queued, Some(*retry_after)),
        };
        let fallback_applied = status == TopUpStatus::Queued;

        let (tx_id, new_balance) = {
            let mut account = handle.lock();
            // The wallet may have changed state while the charge was in flight
            match account.ensure_active(handle.id) {
                Ok(()) => {}
                Err(WalletError::WalletFrozen(_)) => {
                    // Funds were captured; a freeze blocks spending, not crediting
                    warn!(
                        target: AUDIT_TARGET,
                        wallet_id = %handle.id,
                        reference_id = %charge.reference_id,
                        %amount,
                        "wallet frozen during charge, crediting captured funds"
                    );
                }
                Err(e @ WalletError::WalletClosed(_)) => {
                    error!(
                        target: AUDIT_TARGET,
                        wallet_id = %handle.id,
                        reference_id = %charge.reference_id,
                        %amount,
                        "charge captured for a closed wallet, needs reconciliation"
                    );
                    return Err(e);
                }
                Err(e) => return Err(e),
            }
            if status == TopUpStatus::Completed {
                account.balance.credit(amount)?;
            } else {
                account.balance.credit_pending(amount)?;
            }
            let tx_status = if status == TopUpStatus::Completed {
                TransactionStatus::Completed
            } else {
                TransactionStatus::Pending
            };
            let tx_id = account.ledger.append(Transaction::top_up(
                handle.id,
                amount,
                currency,
                fee,
                method,
                charge.reference_id,
                tx_status,
                fallback_applied,
            ));
            account.touch();
            (tx_id, handle.balance_snapshot(&account))
        };

        if status != TopUpStatus::Completed {
            self.pending_top_ups.insert(
                charge.reference_id,
                PendingTopUp {
                    reference_id: charge.reference_id,
                    wallet_id: handle.id,
                    user_id: user_id.to_string(),
                    amount,
                    currency,
                    method,
                    queued: fallback_applied,
                    attempts: 0,
                    next_attempt_at: Utc::now() + retry_delay(retry_after),
                },
            );
        }

        info!(
            target: AUDIT_TARGET,
            wallet_id = %handle.id,
            reference_id = %charge.reference_id,
            %amount,
            %fee,
            %currency,
            %method,
            %status,
            "top-up recorded"
        );

        if status == TopUpStatus::Completed {
            self.notify(
                user_id,
                "Top-up received",
                format!(
                    "{} {} was added to your wallet",
                    money::format_amount(amount, currency),
                    currency
                ),
            );
        }

        Ok(TopUpReceipt {
            transaction_id: tx_id,
            reference_id: charge.reference_id,
            status,
            amount,
            fee,
            currency,
            new_balance,
            fallback_applied,
            retry_after,
        })
    }

    /// Move `amount` from one wallet to another; the sender also pays the fee.
    ///
    /// Preconditions, each short-circuiting in this order: source exists and
    /// is owned, destination exists, distinct wallets, same currency, valid
    /// amount, both active, sufficient available balance.
    pub async fn transfer(&self, user_id: &str, req: TransferRequest) -> WalletResult<TransferReceipt> {
        let source = self.registry.owned_handle(req.from_wallet_id, user_id)?;
        let dest = self.registry.handle(req.to_wallet_id)?;
        if source.id == dest.id {
            return Err(WalletError::SameWallet);
        }
        if source.currency != dest.currency {
            return Err(WalletError::CurrencyMismatch {
                expected: source.currency.to_string(),
                actual: dest.currency.to_string(),
            });
        }
        let currency = source.currency;
        let amount = validate_amount(req.amount, currency)?;
        let fee = fee::calculate_fee(FeeOperation::Transfer, amount, currency);
        let debit = amount.checked_add(fee).ok_or(WalletError::BalanceOverflow)?;
        let reference_id = ReferenceId::new();

        let (out_id, source_new_balance, dest_new_balance) = {
            // Global lock order: ascending wallet id
            let (mut src, mut dst) = if source.id < dest.id {
                let src = source.lock();
                let dst = dest.lock();
                (src, dst)
            } else {
                let dst = dest.lock();
                let src = source.lock();
                (src, dst)
            };

            src.ensure_active(source.id)?;
            dst.ensure_active(dest.id)?;

            // Stage both sides, then commit together
            let mut src_balance = src.balance;
            let mut dst_balance = dst.balance;
            src_balance.debit(debit)?;
            dst_balance.credit(amount)?;
            src.balance = src_balance;
            dst.balance = dst_balance;

            let (out, incoming) =
                Transaction::transfer_pair(source.id, dest.id, amount, currency, fee, reference_id);
            let out_id = src.ledger.append(out);
            dst.ledger.append(incoming);
            src.touch();
            dst.touch();

            (
                out_id,
                source.balance_snapshot(&src),
                dest.balance_snapshot(&dst),
            )
        };

        info!(
            target: AUDIT_TARGET,
            reference_id = %reference_id,
            from = %source.id,
            to = %dest.id,
            %amount,
            %fee,
            %currency,
            "transfer committed"
        );

        self.notify(
            &dest.user_id,
            "Money received",
            format!(
                "You received {} {}",
                money::format_amount(amount, currency),
                currency
            ),
        );

        Ok(TransferReceipt {
            transaction_id: out_id,
            reference_id,
            status: TransactionStatus::Completed,
            amount,
            fee,
            currency,
            source_new_balance,
            dest_new_balance,
        })
    }

    /// Ledger of a wallet, oldest first
    pub fn history(&self, wallet_id: WalletId, user_id: &str) -> WalletResult<Vec<Transaction>> {
        self.registry.history(wallet_id, user_id)
    }

    /// Resolve a gateway-pending top-up reported by the payment webhook:
    /// credit available or release the pending funds.
    ///
    /// # Errors
    /// - `ReferenceNotFound` when the reference is unknown or already settled
    /// - `InvalidStateTransition` when the top-up is queued for retry; its
    ///   charge never reached the gateway, so only the retry worker settles it
    pub fn settle_top_up(
        &self,
        reference_id: ReferenceId,
        outcome: SettlementOutcome,
    ) -> WalletResult<Transaction> {
        match self.pending_top_ups.remove_if(&reference_id, |_, p| !p.queued) {
            Some((_, pending)) => self.apply_settlement(pending, outcome),
            None if self.pending_top_ups.contains_key(&reference_id) => {
                warn!(%reference_id, "settlement rejected, top-up is queued for retry");
                Err(WalletError::InvalidStateTransition(format!(
                    "top-up {} is queued for retry",
                    reference_id
                )))
            }
            None => Err(WalletError::ReferenceNotFound(reference_id)),
        }
    }

    fn apply_settlement(
        &self,
        pending: PendingTopUp,
        outcome: SettlementOutcome,
    ) -> WalletResult<Transaction> {
        let reference_id = pending.reference_id;
        let handle = self.registry.handle(pending.wallet_id)?;

        let tx = {
            let mut account = handle.lock();
            let mut balance = account.balance;
            match &outcome {
                SettlementOutcome::Completed => balance.settle_pending(pending.amount)?,
                SettlementOutcome::Failed { .. } => balance.release_pending(pending.amount)?,
            }
            let tx = account.ledger.pending_mut(reference_id).ok_or_else(|| {
                WalletError::Internal(format!("no pending ledger entry for {}", reference_id))
            })?;
            match &outcome {
                SettlementOutcome::Completed => tx.complete()?,
                SettlementOutcome::Failed { reason } => tx.fail(reason.clone())?,
            }
            let tx = tx.clone();
            account.balance = balance;
            account.touch();
            tx
        };

        info!(
            target: AUDIT_TARGET,
            reference_id = %reference_id,
            wallet_id = %pending.wallet_id,
            amount = %pending.amount,
            status = %tx.status,
            attempts = pending.attempts,
            "pending top-up settled"
        );

        if tx.status == TransactionStatus::Completed {
            self.notify(
                &pending.user_id,
                "Top-up received",
                format!(
                    "{} {} was added to your wallet",
                    money::format_amount(pending.amount, pending.currency),
                    pending.currency
                ),
            );
        }
        Ok(tx)
    }

    /// Pending top-ups parked by the breaker and due for a retry
    pub fn due_retries(&self, limit: usize) -> Vec<PendingTopUp> {
        let now = Utc::now();
        let mut due: Vec<PendingTopUp> = self
            .pending_top_ups
            .iter()
            .filter(|e| e.queued && e.next_attempt_at <= now)
            .map(|e| e.value().clone())
            .collect();
        due.sort_by_key(|p| p.next_attempt_at);
        due.truncate(limit);
        due
    }

    pub fn pending_top_up_count(&self) -> usize {
        self.pending_top_ups.len()
    }

    /// Re-drive one queued top-up through the payment gateway.
    ///
    /// Returns `true` when the top-up left the retry queue.
    pub async fn retry_top_up(&self, pending: &PendingTopUp) -> WalletResult<bool> {
        let charge = ChargeRequest {
            reference_id: pending.reference_id,
            wallet_id: pending.wallet_id,
            user_id: pending.user_id.clone(),
            amount: pending.amount,
            currency: pending.currency,
            method: pending.method,
        };

        match self.payments.charge(&charge).await {
            Ok(PaymentOutcome::Settled { provider_reference }) => {
                let Some((_, entry)) = self.pending_top_ups.remove(&pending.reference_id) else {
                    error!(
                        target: AUDIT_TARGET,
                        reference_id = %pending.reference_id,
                        wallet_id = %pending.wallet_id,
                        amount = %pending.amount,
                        %provider_reference,
                        "charge captured with no pending top-up, needs reconciliation"
                    );
                    return Err(WalletError::ReferenceNotFound(pending.reference_id));
                };
                self.apply_settlement(entry, SettlementOutcome::Completed)?;
                Ok(true)
            }
            Ok(PaymentOutcome::Pending { provider_reference }) => {
                // Gateway owns it now; the webhook settles it
                if let Some(mut entry) = self.pending_top_ups.get_mut(&pending.reference_id) {
                    entry.queued = false;
                }
                debug!(reference_id = %pending.reference_id, %provider_reference, "retry accepted as pending");
                Ok(true)
            }
            Ok(PaymentOutcome::Queued { retry_after }) => {
                self.reschedule(pending.reference_id, Some(retry_after));
                Ok(false)
            }
            Err(WalletError::PaymentDeclined(reason)) => {
                let (_, entry) = self
                    .pending_top_ups
                    .remove(&pending.reference_id)
                    .ok_or(WalletError::ReferenceNotFound(pending.reference_id))?;
                self.apply_settlement(entry, SettlementOutcome::Failed { reason })?;
                Ok(true)
            }
            Err(e) => {
                self.reschedule(pending.reference_id, None);
                Err(e)
            }
        }
    }

    fn reschedule(&self, reference_id: ReferenceId, retry_after: Option<std::time::Duration>) {
        if let Some(mut entry) = self.pending_top_ups.get_mut(&reference_id) {
            entry.attempts += 1;
            entry.next_attempt_at = Utc::now() + retry_delay(retry_after);
        }
    }

    /// Fire-and-forget notification. Delivery failure never touches money.
    fn notify(&self, user_id: &str, subject: &str, body: String) {
        let notifier = self.notifier.clone();
        let notification = Notification {
            user_id: user_id.to_string(),
            subject: subject.to_string(),
            body,
        };
        tokio::spawn(async move {
            match notifier.send(&notification).await {
                Ok(channel) => {
                    debug!(user_id = %notification.user_id, ?channel, "notification sent")
                }
                Err(e) => {
                    warn!(user_id = %notification.user_id, error = %e, "notification dropped")
                }
            }
        });
    }
}

fn validate_amount(amount: Decimal, currency: Currency) -> WalletResult<Decimal> {
    money::validate_amount(amount, currency).map_err(|e| match e {
        MoneyError::InvalidAmount | MoneyError::PrecisionOverflow { .. } => {
            WalletError::InvalidAmount
        }
        MoneyError::UnsupportedCurrency(c) => WalletError::InvalidCurrency(c),
    })
}

fn parse_currency(code: &str) -> WalletResult<Currency> {
    code.parse()
        .map_err(|_| WalletError::InvalidCurrency(code.to_string()))
}

fn retry_delay(retry_after: Option<std::time::Duration>) -> chrono::Duration {
    retry_after
        .and_then(|d| chrono::Duration::from_std(d).ok())
        .unwrap_or_else(|| chrono::Duration::seconds(30))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::SimulatedDependencies;
    use crate::kyc::KycLookup;
    use crate::resilience::{BreakerConfig, BreakerRegistry, dependency};
    use std::time::Duration;

    struct AllVerified;

    impl KycLookup for AllVerified {
        fn is_verified(&self, _user_id: &str) -> bool {
            true
        }
    }

    struct Fixture {
        coordinator: TransferCoordinator,
        deps: SimulatedDependencies,
    }

    fn fixture() -> Fixture {
        let deps = SimulatedDependencies::new();
        let breakers = BreakerRegistry::new(BreakerConfig {
            failure_threshold: 3,
            cooldown: Duration::from_secs(60),
            call_timeout: Duration::from_secs(1),
        });
        let registry = Arc::new(WalletRegistry::new(Arc::new(AllVerified)));
        let payments = ResilientPaymentGateway::new(
            deps.payment.clone(),
            breakers.breaker(dependency::PAYMENT_GATEWAY),
            Duration::from_secs(60),
        );
        let notifier = Arc::new(NotificationDispatcher::new(
            deps.sms.clone(),
            breakers.breaker(dependency::SMS),
            deps.email.clone(),
            breakers.breaker(dependency::EMAIL),
        ));
        Fixture {
            coordinator: TransferCoordinator::new(registry, payments, notifier),
            deps,
        }
    }

    fn top_up_req(wallet_id: WalletId, amount: i64, method: &str) -> TopUpRequest {
        TopUpRequest {
            wallet_id,
            amount: Decimal::from(amount),
            currency: "THB".into(),
            payment_method: method.into(),
        }
    }

    #[tokio::test]
    async fn test_top_up_credits_amount_reports_fee() {
        let f = fixture();
        let w = f.coordinator.registry().create_wallet("alice", "THB").unwrap();

        let receipt = f
            .coordinator
            .top_up("alice", top_up_req(w.id, 5000, "bank_transfer"))
            .await
            .unwrap();
        assert_eq!(receipt.status, TopUpStatus::Completed);
        assert_eq!(receipt.fee, Decimal::from(5));
        assert_eq!(receipt.new_balance.available, Decimal::from(5000));
        assert_eq!(receipt.new_balance.total, Decimal::from(5000));
        assert!(!receipt.fallback_applied);
    }

    #[tokio::test]
    async fn test_top_up_validation_order() {
        let f = fixture();
        let reg = f.coordinator.registry();
        let w = reg.create_wallet("alice", "THB").unwrap();

        let missing = WalletId::new();
        assert_eq!(
            f.coordinator.top_up("alice", top_up_req(missing, 10, "card")).await,
            Err(WalletError::WalletNotFound(missing))
        );
        assert_eq!(
            f.coordinator.top_up("bob", top_up_req(w.id, 10, "card")).await,
            Err(WalletError::WalletAccessDenied(w.id))
        );
        assert_eq!(
            f.coordinator.top_up("alice", top_up_req(w.id, 0, "bogus")).await,
            Err(WalletError::InvalidAmount)
        );
        let mut req = top_up_req(w.id, 10, "bogus");
        req.currency = "USD".into();
        assert!(matches!(
            f.coordinator.top_up("alice", req).await,
            Err(WalletError::CurrencyMismatch { .. })
        ));
        assert_eq!(
            f.coordinator.top_up("alice", top_up_req(w.id, 10, "bogus")).await,
            Err(WalletError::InvalidPaymentMethod("bogus".into()))
        );
        // Three decimals on THB
        let mut req = top_up_req(w.id, 10, "card");
        req.amount = Decimal::new(10001, 3);
        assert_eq!(
            f.coordinator.top_up("alice", req).await,
            Err(WalletError::InvalidAmount)
        );
        assert_eq!(f.deps.payment.call_count(), 0);
    }

    #[tokio::test]
    async fn test_declined_top_up_changes_nothing() {
        let f = fixture();
        let w = f.coordinator.registry().create_wallet("alice", "THB").unwrap();
        f.deps.payment.set_decline(true);

        assert!(matches!(
            f.coordinator.top_up("alice", top_up_req(w.id, 100, "card")).await,
            Err(WalletError::PaymentDeclined(_))
        ));
        assert!(f.coordinator.history(w.id, "alice").unwrap().is_empty());
        assert_eq!(
            f.coordinator.registry().get_balance(w.id, "alice").unwrap().total,
            Decimal::ZERO
        );
    }

    #[tokio::test]
    async fn test_queued_top_up_waits_for_retry_worker() {
        let f = fixture();
        let w = f.coordinator.registry().create_wallet("alice", "THB").unwrap();
        f.deps.payment.set_fail(true);

        for _ in 0..2 {
            assert!(matches!(
                f.coordinator.top_up("alice", top_up_req(w.id, 100, "card")).await,
                Err(WalletError::DependencyUnavailable { .. })
            ));
        }
        let receipt = f
            .coordinator
            .top_up("alice", top_up_req(w.id, 100, "card"))
            .await
            .unwrap();
        assert_eq!(receipt.status, TopUpStatus::Queued);
        assert!(receipt.fallback_applied);
        assert_eq!(receipt.retry_after, Some(Duration::from_secs(60)));
        assert_eq!(receipt.new_balance.pending, Decimal::from(100));
        assert_eq!(receipt.new_balance.available, Decimal::ZERO);
        assert_eq!(f.deps.payment.call_count(), 2);

        // Not yet due
        assert!(f.coordinator.due_retries(10).is_empty());
        let pending = f
            .coordinator
            .pending_top_ups
            .get(&receipt.reference_id)
            .unwrap()
            .clone();

        // Still open: stays queued and is rescheduled
        assert_eq!(f.coordinator.retry_top_up(&pending).await, Ok(false));
        assert_eq!(f.coordinator.pending_top_up_count(), 1);

        // The charge never reached the gateway, so a settlement report for it
        // is refused and the funds stay pending
        assert!(matches!(
            f.coordinator
                .settle_top_up(receipt.reference_id, SettlementOutcome::Completed),
            Err(WalletError::InvalidStateTransition(_))
        ));
        let balance = f.coordinator.registry().get_balance(w.id, "alice").unwrap();
        assert_eq!(balance.available, Decimal::ZERO);
        assert_eq!(balance.pending, Decimal::from(100));
        assert_eq!(f.coordinator.pending_top_up_count(), 1);
        assert_eq!(
            f.coordinator.history(w.id, "alice").unwrap()[0].status,
            TransactionStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_gateway_pending_top_up_settles_once() {
        let f = fixture();
        let w = f.coordinator.registry().create_wallet("alice", "THB").unwrap();
        f.deps.payment.set_defer_settlement(true);

        let receipt = f
            .coordinator
            .top_up("alice", top_up_req(w.id, 100, "card"))
            .await
            .unwrap();
        assert_eq!(receipt.status, TopUpStatus::Pending);

        let tx = f
            .coordinator
            .settle_top_up(receipt.reference_id, SettlementOutcome::Completed)
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Completed);
        let balance = f.coordinator.registry().get_balance(w.id, "alice").unwrap();
        assert_eq!(balance.available, Decimal::from(100));
        assert_eq!(balance.pending, Decimal::ZERO);

        assert_eq!(
            f.coordinator
                .settle_top_up(receipt.reference_id, SettlementOutcome::Completed),
            Err(WalletError::ReferenceNotFound(receipt.reference_id))
        );
    }

    #[tokio::test]
    async fn test_wallet_frozen_during_charge_is_still_credited() {
        let f = fixture();
        let reg = f.coordinator.registry().clone();
        let w = reg.create_wallet("alice", "THB").unwrap();
        f.deps.payment.set_latency(Duration::from_millis(200));

        let (receipt, frozen) = tokio::join!(
            f.coordinator.top_up("alice", top_up_req(w.id, 300, "card")),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                reg.freeze(w.id, "alice")
            }
        );
        assert!(frozen.is_ok());
        let receipt = receipt.unwrap();
        assert_eq!(receipt.status, TopUpStatus::Completed);
        assert_eq!(receipt.new_balance.available, Decimal::from(300));

        // Frozen wallets refuse new top-ups up front
        assert_eq!(
            f.coordinator
                .top_up("alice", top_up_req(w.id, 300, "card"))
                .await,
            Err(WalletError::WalletFrozen(w.id))
        );
    }

    #[tokio::test]
    async fn test_wallet_closed_during_charge_is_not_credited() {
        let f = fixture();
        let reg = f.coordinator.registry().clone();
        let w = reg.create_wallet("alice", "THB").unwrap();
        f.deps.payment.set_latency(Duration::from_millis(200));

        let (result, closed) = tokio::join!(
            f.coordinator.top_up("alice", top_up_req(w.id, 300, "card")),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                reg.close(w.id, "alice")
            }
        );
        assert!(closed.is_ok());
        assert_eq!(result, Err(WalletError::WalletClosed(w.id)));
        assert!(f.coordinator.history(w.id, "alice").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pending_top_up_failed_settlement_releases_funds() {
        let f = fixture();
        let w = f.coordinator.registry().create_wallet("alice", "THB").unwrap();
        f.deps.payment.set_defer_settlement(true);

        let receipt = f
            .coordinator
            .top_up("alice", top_up_req(w.id, 250, "digital_wallet"))
            .await
            .unwrap();
        assert_eq!(receipt.status, TopUpStatus::Pending);
        assert!(!receipt.fallback_applied);
        // Gateway-pending top-ups wait for the webhook, never the retry worker
        assert!(f.coordinator.due_retries(10).is_empty());

        let tx = f
            .coordinator
            .settle_top_up(
                receipt.reference_id,
                SettlementOutcome::Failed {
                    reason: "insufficient funds at issuer".into(),
                },
            )
            .unwrap();
        assert_eq!(tx.status, TransactionStatus::Failed);

        let balance = f.coordinator.registry().get_balance(w.id, "alice").unwrap();
        assert_eq!(balance.total, Decimal::ZERO);
        let history = f.coordinator.history(w.id, "alice").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, TransactionStatus::Failed);
    }

    #[tokio::test]
    async fn test_transfer_moves_amount_plus_fee() {
        let f = fixture();
        let reg = f.coordinator.registry();
        let a = reg.create_wallet("alice", "THB").unwrap();
        let b = reg.create_wallet("bob", "THB").unwrap();
        f.coordinator
            .top_up("alice", top_up_req(a.id, 5000, "bank_transfer"))
            .await
            .unwrap();

        let receipt = f
            .coordinator
            .transfer(
                "alice",
                TransferRequest {
                    from_wallet_id: a.id,
                    to_wallet_id: b.id,
                    amount: Decimal::from(1000),
                },
            )
            .await
            .unwrap();
        assert_eq!(receipt.fee, Decimal::from(5));
        assert_eq!(receipt.source_new_balance.available, Decimal::from(3995));
        assert_eq!(receipt.dest_new_balance.available, Decimal::from(1000));

        let out = f.coordinator.history(a.id, "alice").unwrap();
        let incoming = f.coordinator.history(b.id, "bob").unwrap();
        assert_eq!(out.last().unwrap().reference_id, incoming[0].reference_id);
        assert_eq!(out.last().unwrap().id, receipt.transaction_id);
    }

    #[tokio::test]
    async fn test_transfer_preconditions() {
        let f = fixture();
        let reg = f.coordinator.registry();
        let a = reg.create_wallet("alice", "THB").unwrap();
        let usd = reg.create_wallet("bob", "USD").unwrap();
        let b = reg.create_wallet("bob", "THB").unwrap();
        f.coordinator
            .top_up("alice", top_up_req(a.id, 100, "bank_transfer"))
            .await
            .unwrap();

        let req = |from, to, amount: i64| TransferRequest {
            from_wallet_id: from,
            to_wallet_id: to,
            amount: Decimal::from(amount),
        };

        assert_eq!(
            f.coordinator.transfer("bob", req(a.id, b.id, 10)).await,
            Err(WalletError::WalletAccessDenied(a.id))
        );
        let ghost = WalletId::new();
        assert_eq!(
            f.coordinator.transfer("alice", req(a.id, ghost, 10)).await,
            Err(WalletError::WalletNotFound(ghost))
        );
        assert_eq!(
            f.coordinator.transfer("alice", req(a.id, a.id, 10)).await,
            Err(WalletError::SameWallet)
        );
        assert!(matches!(
            f.coordinator.transfer("alice", req(a.id, usd.id, 10)).await,
            Err(WalletError::CurrencyMismatch { .. })
        ));
        assert_eq!(
            f.coordinator.transfer("alice", req(a.id, b.id, -5)).await,
            Err(WalletError::InvalidAmount)
        );
        // 100 available, 100 + 0.50 fee needed
        assert_eq!(
            f.coordinator.transfer("alice", req(a.id, b.id, 100)).await,
            Err(WalletError::InsufficientBalance)
        );

        reg.freeze(b.id, "bob").unwrap();
        assert_eq!(
            f.coordinator.transfer("alice", req(a.id, b.id, 10)).await,
            Err(WalletError::WalletFrozen(b.id))
        );

        // Nothing moved
        assert_eq!(reg.get_balance(a.id, "alice").unwrap().available, Decimal::from(100));
        assert_eq!(reg.get_balance(b.id, "bob").unwrap().total, Decimal::ZERO);
        assert_eq!(f.coordinator.history(a.id, "alice").unwrap().len(), 1);
    }
}
