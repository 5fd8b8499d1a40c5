//! Gateway HTTP handlers
//!
//! One submodule per resource. Handlers stay thin: extract, call the engine,
//! map the result into the response envelope.

mod health;
mod kyc;
#[cfg(feature = "mock-api")]
mod mock;
mod transfer;
mod wallet;
mod webhook;

pub use health::health_check;
pub use kyc::{get_kyc_status, manual_review_queue, submit_kyc};
#[cfg(feature = "mock-api")]
pub use mock::set_faults;
pub use transfer::{create_transfer, top_up};
pub use wallet::{
    close_wallet, create_wallet, freeze_wallet, get_balance, get_transactions, get_wallet,
    list_wallets, unfreeze_wallet,
};
pub use webhook::{kyc_webhook, payment_webhook};

use std::str::FromStr;

use crate::core_types::WalletId;
use crate::error::WalletError;

/// Parse a `{walletID}` path segment
fn parse_wallet_id(raw: &str) -> Result<WalletId, WalletError> {
    WalletId::from_str(raw.trim())
        .map_err(|_| WalletError::InvalidRequest(format!("invalid walletID: {}", raw)))
}
