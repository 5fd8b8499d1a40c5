//! Coordinator request/receipt types

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::core_types::{ReferenceId, TransactionId, UserId, WalletId};
use crate::fee::PaymentMethod;
use crate::ledger::TransactionStatus;
use crate::money::Currency;
use crate::wallet::BalanceSnapshot;

/// Top-up input. Currency and method stay raw so that validation runs in
/// the documented order with the right error codes.
#[derive(Debug, Clone, PartialEq)]
pub struct TopUpRequest {
    pub wallet_id: WalletId,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub from_wallet_id: WalletId,
    pub to_wallet_id: WalletId,
    pub amount: Decimal,
}

/// Client-facing top-up status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TopUpStatus {
    /// Settled and credited to available
    Completed,
    /// Accepted by the gateway, credited to pending
    Pending,
    /// Gateway degraded, credited to pending and parked for retry
    Queued,
}

impl fmt::Display for TopUpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TopUpStatus::Completed => "completed",
            TopUpStatus::Pending => "pending",
            TopUpStatus::Queued => "queued",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopUpReceipt {
    pub transaction_id: TransactionId,
    pub reference_id: ReferenceId,
    pub status: TopUpStatus,
    pub amount: Decimal,
    /// Reported, not deducted
    pub fee: Decimal,
    pub currency: Currency,
    pub new_balance: BalanceSnapshot,
    pub fallback_applied: bool,
    pub retry_after: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    /// Id of the `transfer_out` leg
    pub transaction_id: TransactionId,
    pub reference_id: ReferenceId,
    pub status: TransactionStatus,
    pub amount: Decimal,
    pub fee: Decimal,
    pub currency: Currency,
    pub source_new_balance: BalanceSnapshot,
    pub dest_new_balance: BalanceSnapshot,
}

/// Final word on a pending top-up (worker or payment webhook)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    Completed,
    Failed { reason: String },
}

/// Top-up waiting for settlement
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTopUp {
    pub reference_id: ReferenceId,
    pub wallet_id: WalletId,
    pub user_id: UserId,
    pub amount: Decimal,
    pub currency: Currency,
    pub method: PaymentMethod,
    /// Parked by the breaker fallback; the retry worker re-drives it.
    /// `false` means the gateway owns it and the webhook settles it.
    pub queued: bool,
    pub attempts: u32,
    pub next_attempt_at: DateTime<Utc>,
}
