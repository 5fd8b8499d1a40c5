/// ENFORCED BALANCE TYPE - Used by the wallet arena
///
/// This is the SINGLE source of truth for balance operations.
/// ALL balance mutations MUST go through these methods.
///
/// # Enforcement Strategy:
/// 1. Fields are PRIVATE - no direct access
/// 2. All mutations return Result - errors are explicit
/// 3. Version auto-increments - audit trail / optimistic readers
/// 4. checked_add/sub - overflow protection
/// 5. Validation happens before any field is touched
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BalanceError {
    #[error("Insufficient funds")]
    Insufficient,
    #[error("Insufficient pending funds")]
    PendingUnderflow,
    #[error("Balance overflow")]
    Overflow,
    #[error("Amount must be positive")]
    NonPositive,
}

/// Balance of a single wallet
///
/// # Invariants (ENFORCED by private fields):
/// - available >= 0, pending >= 0
/// - total = available + pending
/// - version increments on every successful mutation, never on failure
///
/// # Usage:
/// ```ignore
/// let mut balance = Balance::default();
/// balance.credit(5000)?;          // available = 5000
/// balance.debit(1005)?;           // available = 3995
/// balance.credit_pending(200)?;   // pending = 200, total = 4195
/// balance.settle_pending(200)?;   // available = 4195, pending = 0
/// ```
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Balance {
    available: Decimal, // PRIVATE - ONLY modified through credit/debit/settle_pending
    pending: Decimal,   // PRIVATE - ONLY modified through credit_pending/settle/release
    version: u64,       // PRIVATE - Incremented on every mutation
}

impl Balance {
    // ============================================================
    // READ-ONLY GETTERS (safe to expose)
    // ============================================================

    #[inline(always)]
    pub const fn available(&self) -> Decimal {
        self.available
    }

    #[inline(always)]
    pub const fn pending(&self) -> Decimal {
        self.pending
    }

    /// Get total balance (available + pending)
    #[inline(always)]
    pub fn total(&self) -> Decimal {
        self.available + self.pending
    }

    #[inline(always)]
    pub const fn version(&self) -> u64 {
        self.version
    }

    // ============================================================
    // VALIDATED MUTATIONS (ENFORCED operations)
    // ============================================================

    fn positive(amount: Decimal) -> Result<(), BalanceError> {
        if amount <= Decimal::ZERO {
            return Err(BalanceError::NonPositive);
        }
        Ok(())
    }

    /// Credit available balance (settled top-up, transfer-in)
    pub fn credit(&mut self, amount: Decimal) -> Result<(), BalanceError> {
        Self::positive(amount)?;
        let available = self
            .available
            .checked_add(amount)
            .ok_or(BalanceError::Overflow)?;
        // total must stay representable too
        available
            .checked_add(self.pending)
            .ok_or(BalanceError::Overflow)?;
        self.available = available;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Check a debit without applying it
    pub fn can_debit(&self, amount: Decimal) -> Result<(), BalanceError> {
        Self::positive(amount)?;
        if self.available < amount {
            return Err(BalanceError::Insufficient);
        }
        Ok(())
    }

    /// Debit available balance (transfer-out, amount + fee)
    pub fn debit(&mut self, amount: Decimal) -> Result<(), BalanceError> {
        self.can_debit(amount)?;
        self.available = self
            .available
            .checked_sub(amount)
            .ok_or(BalanceError::Insufficient)?;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Credit pending balance (queued or unsettled top-up)
    pub fn credit_pending(&mut self, amount: Decimal) -> Result<(), BalanceError> {
        Self::positive(amount)?;
        let pending = self
            .pending
            .checked_add(amount)
            .ok_or(BalanceError::Overflow)?;
        pending
            .checked_add(self.available)
            .ok_or(BalanceError::Overflow)?;
        self.pending = pending;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Move pending funds to available (settlement confirmed)
    pub fn settle_pending(&mut self, amount: Decimal) -> Result<(), BalanceError> {
        Self::positive(amount)?;
        if self.pending < amount {
            return Err(BalanceError::PendingUnderflow);
        }
        // total unchanged, so no overflow possible on available
        self.pending -= amount;
        self.available += amount;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }

    /// Drop pending funds (settlement failed)
    pub fn release_pending(&mut self, amount: Decimal) -> Result<(), BalanceError> {
        Self::positive(amount)?;
        if self.pending < amount {
            return Err(BalanceError::PendingUnderflow);
        }
        self.pending -= amount;
        self.version = self.version.wrapping_add(1);
        Ok(())
    }
}

// ============================================================
// TESTS - Prove enforcement works
// ============================================================
