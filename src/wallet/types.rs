use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::balance::Balance;
use crate::core_types::{UserId, WalletId};
use crate::error::{WalletError, WalletResult};
use crate::ledger::WalletLedger;
use crate::money::Currency;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletStatus {
    Active,
    Frozen,
    Closed,
}

impl WalletStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletStatus::Active => "active",
            WalletStatus::Frozen => "frozen",
            WalletStatus::Closed => "closed",
        }
    }

    /// `active <-> frozen`, `active | frozen -> closed`
    pub fn can_transition_to(&self, to: WalletStatus) -> bool {
        matches!(
            (self, to),
            (WalletStatus::Active, WalletStatus::Frozen)
                | (WalletStatus::Frozen, WalletStatus::Active)
                | (WalletStatus::Active, WalletStatus::Closed)
                | (WalletStatus::Frozen, WalletStatus::Closed)
        )
    }
}

impl fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only wallet view
#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    pub id: WalletId,
    pub user_id: UserId,
    pub currency: Currency,
    pub status: WalletStatus,
    pub available_balance: Decimal,
    pub pending_balance: Decimal,
    pub total_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Balance view of one wallet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceSnapshot {
    pub wallet_id: WalletId,
    pub currency: Currency,
    pub available: Decimal,
    pub pending: Decimal,
    pub total: Decimal,
}

/// Mutable wallet state, guarded by the per-wallet mutex
#[derive(Debug)]
pub struct WalletAccount {
    pub status: WalletStatus,
    pub balance: Balance,
    pub ledger: WalletLedger,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WalletAccount {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            status: WalletStatus::Active,
            balance: Balance::default(),
            ledger: WalletLedger::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Money may only move through an active wallet
    pub fn ensure_active(&self, id: WalletId) -> WalletResult<()> {
        match self.status {
            WalletStatus::Active => Ok(()),
            WalletStatus::Frozen => Err(WalletError::WalletFrozen(id)),
            WalletStatus::Closed => Err(WalletError::WalletClosed(id)),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for WalletAccount {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use WalletStatus::*;
        assert!(Active.can_transition_to(Frozen));
        assert!(Frozen.can_transition_to(Active));
        assert!(Frozen.can_transition_to(Closed));
        assert!(!Closed.can_transition_to(Active));
        assert!(!Closed.can_transition_to(Frozen));
        assert!(!Active.can_transition_to(Active));
    }

    #[test]
    fn test_ensure_active() {
        let id = WalletId::new();
        let mut account = WalletAccount::new();
        assert!(account.ensure_active(id).is_ok());
        account.status = WalletStatus::Frozen;
        assert_eq!(account.ensure_active(id), Err(WalletError::WalletFrozen(id)));
        account.status = WalletStatus::Closed;
        assert_eq!(account.ensure_active(id), Err(WalletError::WalletClosed(id)));
    }
}
