use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{info, warn};

use super::types::{BalanceSnapshot, Wallet, WalletAccount, WalletStatus};
use crate::core_types::{UserId, WalletId};
use crate::error::{WalletError, WalletResult};
use crate::kyc::KycLookup;
use crate::ledger::Transaction;
use crate::money::Currency;

/// Arena entry. Identity fields are immutable and readable without the lock.
#[derive(Debug)]
pub struct WalletHandle {
    pub id: WalletId,
    pub user_id: UserId,
    pub currency: Currency,
    account: Mutex<WalletAccount>,
}

impl WalletHandle {
    /// Lock the mutable state. A poisoned lock is recovered: every balance
    /// mutation validates before writing, so the state behind it is whole.
    pub fn lock(&self) -> MutexGuard<'_, WalletAccount> {
        self.account.lock().unwrap_or_else(|poisoned| {
            warn!(wallet_id = %self.id, "wallet lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub fn ensure_owner(&self, user_id: &str) -> WalletResult<()> {
        if self.user_id != user_id {
            return Err(WalletError::WalletAccessDenied(self.id));
        }
        Ok(())
    }

    pub fn view(&self, account: &WalletAccount) -> Wallet {
        Wallet {
            id: self.id,
            user_id: self.user_id.clone(),
            currency: self.currency,
            status: account.status,
            available_balance: account.balance.available(),
            pending_balance: account.balance.pending(),
            total_balance: account.balance.total(),
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }

    pub fn balance_snapshot(&self, account: &WalletAccount) -> BalanceSnapshot {
        BalanceSnapshot {
            wallet_id: self.id,
            currency: self.currency,
            available: account.balance.available(),
            pending: account.balance.pending(),
            total: account.balance.total(),
        }
    }
}

/// Wallet arena keyed by id, one mutex per wallet
pub struct WalletRegistry {
    wallets: DashMap<WalletId, Arc<WalletHandle>>,
    by_owner: DashMap<(UserId, Currency), WalletId>,
    kyc: Arc<dyn KycLookup>,
}

impl WalletRegistry {
    pub fn new(kyc: Arc<dyn KycLookup>) -> Self {
        Self {
            wallets: DashMap::new(),
            by_owner: DashMap::new(),
            kyc,
        }
    }

    /// # Errors
    /// * `KycRequired` - no verified KYC record for the user
    /// * `InvalidCurrency` - unsupported currency code
    /// * `DuplicateWallet` - the user already holds a wallet in this currency
    pub fn create_wallet(&self, user_id: &str, currency: &str) -> WalletResult<Wallet> {
        if !self.kyc.is_verified(user_id) {
            return Err(WalletError::KycRequired);
        }
        let currency: Currency = currency
            .parse()
            .map_err(|_| WalletError::InvalidCurrency(currency.to_string()))?;

        match self.by_owner.entry((user_id.to_string(), currency)) {
            Entry::Occupied(_) => Err(WalletError::DuplicateWallet(currency.to_string())),
            Entry::Vacant(slot) => {
                let handle = Arc::new(WalletHandle {
                    id: WalletId::new(),
                    user_id: user_id.to_string(),
                    currency,
                    account: Mutex::new(WalletAccount::new()),
                });
                let wallet = handle.view(&handle.lock());
                self.wallets.insert(handle.id, handle);
                slot.insert(wallet.id);

                info!(wallet_id = %wallet.id, user_id, %currency, "wallet created");
                Ok(wallet)
            }
        }
    }

    /// Arena lookup without an ownership check
    pub fn handle(&self, wallet_id: WalletId) -> WalletResult<Arc<WalletHandle>> {
        self.wallets
            .get(&wallet_id)
            .map(|h| h.clone())
            .ok_or(WalletError::WalletNotFound(wallet_id))
    }

    /// Arena lookup for the wallet's owner
    pub fn owned_handle(&self, wallet_id: WalletId, user_id: &str) -> WalletResult<Arc<WalletHandle>> {
        let handle = self.handle(wallet_id)?;
        handle.ensure_owner(user_id)?;
        Ok(handle)
    }

    pub fn get_wallet(&self, wallet_id: WalletId, user_id: &str) -> WalletResult<Wallet> {
        let handle = self.owned_handle(wallet_id, user_id)?;
        let account = handle.lock();
        Ok(handle.view(&account))
    }

    pub fn get_balance(&self, wallet_id: WalletId, user_id: &str) -> WalletResult<BalanceSnapshot> {
        let handle = self.owned_handle(wallet_id, user_id)?;
        let account = handle.lock();
        Ok(handle.balance_snapshot(&account))
    }

    /// Ledger of one wallet, oldest first
    pub fn history(&self, wallet_id: WalletId, user_id: &str) -> WalletResult<Vec<Transaction>> {
        let handle = self.owned_handle(wallet_id, user_id)?;
        let account = handle.lock();
        Ok(account.ledger.entries().to_vec())
    }

    /// Wallets of a user, ordered by currency
    pub fn list_wallets(&self, user_id: &str) -> Vec<Wallet> {
        let mut ids: Vec<(Currency, WalletId)> = self
            .by_owner
            .iter()
            .filter(|e| e.key().0 == user_id)
            .map(|e| (e.key().1, *e.value()))
            .collect();
        ids.sort();

        ids.into_iter()
            .filter_map(|(_, id)| self.handle(id).ok())
            .map(|h| h.view(&h.lock()))
            .collect()
    }

    pub fn freeze(&self, wallet_id: WalletId, user_id: &str) -> WalletResult<Wallet> {
        self.set_status(wallet_id, user_id, WalletStatus::Frozen)
    }

    pub fn unfreeze(&self, wallet_id: WalletId, user_id: &str) -> WalletResult<Wallet> {
        self.set_status(wallet_id, user_id, WalletStatus::Active)
    }

    /// Close a wallet. Terminal; requires a zero total balance.
    pub fn close(&self, wallet_id: WalletId, user_id: &str) -> WalletResult<Wallet> {
        self.set_status(wallet_id, user_id, WalletStatus::Closed)
    }

    fn set_status(&self, wallet_id: WalletId, user_id: &str, to: WalletStatus) -> WalletResult<Wallet> {
        let handle = self.owned_handle(wallet_id, user_id)?;
        let mut account = handle.lock();

        if account.status == WalletStatus::Closed {
            return Err(WalletError::WalletClosed(wallet_id));
        }
        if !account.status.can_transition_to(to) {
            return Err(WalletError::InvalidStateTransition(format!(
                "wallet {} {} -> {}",
                wallet_id, account.status, to
            )));
        }
        if to == WalletStatus::Closed && !account.balance.total().is_zero() {
            return Err(WalletError::WalletNotEmpty(wallet_id));
        }

        let from = account.status;
        account.status = to;
        account.touch();
        info!(wallet_id = %wallet_id, %from, %to, "wallet status changed");
        Ok(handle.view(&account))
    }
}
