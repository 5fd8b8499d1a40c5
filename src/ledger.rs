//! Ledger - per-wallet transaction log
//!
//! Append-only. A [`Transaction`] is written in the same critical section as
//! the balance mutation it records and only ever moves
//! `pending -> completed | failed`.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_types::{ReferenceId, TransactionId, WalletId};
use crate::error::{WalletError, WalletResult};
use crate::fee::PaymentMethod;
use crate::money::Currency;

/// Transaction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "topup")]
    TopUp,
    #[serde(rename = "transfer_out")]
    TransferOut,
    #[serde(rename = "transfer_in")]
    TransferIn,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::TopUp => "topup",
            TransactionType::TransferOut => "transfer_out",
            TransactionType::TransferIn => "transfer_in",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction FSM states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ledger record
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub wallet_id: WalletId,
    pub tx_type: TransactionType,
    pub amount: Decimal,
    pub currency: Currency,
    pub fee: Decimal,
    /// Top-up only
    pub payment_method: Option<PaymentMethod>,
    /// Transfer only
    pub counterparty_wallet_id: Option<WalletId>,
    /// Transfer correlation id (shared by both legs) or top-up payment reference
    pub reference_id: ReferenceId,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    /// Set when the payment breaker queued the charge
    pub fallback_applied: bool,
}

impl Transaction {
    fn new(
        wallet_id: WalletId,
        tx_type: TransactionType,
        amount: Decimal,
        currency: Currency,
        fee: Decimal,
        reference_id: ReferenceId,
        status: TransactionStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            wallet_id,
            tx_type,
            amount,
            currency,
            fee,
            payment_method: None,
            counterparty_wallet_id: None,
            reference_id,
            status,
            created_at: now,
            completed_at: (status == TransactionStatus::Completed).then_some(now),
            failure_reason: None,
            fallback_applied: false,
        }
    }

    /// Top-up record. `status` is `Completed` for a settled charge, `Pending`
    /// otherwise.
    #[allow(clippy::too_many_arguments)]
    pub fn top_up(
        wallet_id: WalletId,
        amount: Decimal,
        currency: Currency,
        fee: Decimal,
        method: PaymentMethod,
        reference_id: ReferenceId,
        status: TransactionStatus,
        fallback_applied: bool,
    ) -> Self {
        let mut tx = Self::new(
            wallet_id,
            TransactionType::TopUp,
            amount,
            currency,
            fee,
            reference_id,
            status,
        );
        tx.payment_method = Some(method);
        tx.fallback_applied = fallback_applied;
        tx
    }

    /// Both legs of a transfer. The fee is carried by the outgoing leg only.
    pub fn transfer_pair(
        from: WalletId,
        to: WalletId,
        amount: Decimal,
        currency: Currency,
        fee: Decimal,
        reference_id: ReferenceId,
    ) -> (Self, Self) {
        let mut out = Self::new(
            from,
            TransactionType::TransferOut,
            amount,
            currency,
            fee,
            reference_id,
            TransactionStatus::Completed,
        );
        out.counterparty_wallet_id = Some(to);

        let mut incoming = Self::new(
            to,
            TransactionType::TransferIn,
            amount,
            currency,
            Decimal::ZERO,
            reference_id,
            TransactionStatus::Completed,
        );
        incoming.counterparty_wallet_id = Some(from);
        (out, incoming)
    }

    fn transition(&mut self, to: TransactionStatus) -> WalletResult<()> {
        if self.status != TransactionStatus::Pending || to == TransactionStatus::Pending {
            return Err(WalletError::InvalidStateTransition(format!(
                "transaction {} {} -> {}",
                self.id, self.status, to
            )));
        }
        self.status = to;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn complete(&mut self) -> WalletResult<()> {
        self.transition(TransactionStatus::Completed)
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> WalletResult<()> {
        self.transition(TransactionStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        Ok(())
    }
}

/// Append-only transaction log of one wallet, oldest first
#[derive(Debug, Default, Clone)]
pub struct WalletLedger {
    entries: Vec<Transaction>,
}

impl WalletLedger {
    pub fn append(&mut self, tx: Transaction) -> TransactionId {
        let id = tx.id;
        self.entries.push(tx);
        id
    }

    pub fn entries(&self) -> &[Transaction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending entry for a payment reference. Completed entries are immutable
    /// and never handed out mutably.
    pub fn pending_mut(&mut self, reference_id: ReferenceId) -> Option<&mut Transaction> {
        self.entries
            .iter_mut()
            .rev()
            .find(|tx| tx.reference_id == reference_id && tx.status == TransactionStatus::Pending)
    }
}
