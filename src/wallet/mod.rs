//! Wallet registry
//!
//! Owns every wallet. Wallets live in an arena keyed by [`WalletId`]; each
//! wallet's balance and ledger sit behind its own mutex. Operations touching
//! two wallets lock them in ascending id order.
//!
//! [`WalletId`]: crate::core_types::WalletId

pub mod registry;
pub mod types;

pub use registry::{WalletHandle, WalletRegistry};
pub use types::{BalanceSnapshot, Wallet, WalletAccount, WalletStatus};
