//! Wallet Ledger - multi-currency digital wallet engine
//!
//! KYC-gated wallets, top-ups and wallet-to-wallet transfers over a
//! per-wallet append-only ledger, with every external dependency behind a
//! circuit breaker and a fallback.
//!
//! # Modules
//!
//! - [`core_types`] - ULID identifiers (WalletId, TransactionId, etc.)
//! - [`money`] - Currencies, minor-unit scales, amount formatting
//! - [`fee`] - Fee policy
//! - [`balance`] - Enforced balance type
//! - [`ledger`] - Transactions and the per-wallet ledger
//! - [`error`] - `WalletError` taxonomy
//! - [`external`] - Dependency traits and simulated implementations
//! - [`resilience`] - Circuit breakers and fallbacks
//! - [`kyc`] - KYC gate
//! - [`wallet`] - Wallet registry
//! - [`transfer`] - Top-ups, transfers, settlement, retry worker
//! - [`gateway`] - HTTP API
//! - [`config`] / [`logging`] - Ambient setup

// Core types - must be first!
pub mod core_types;

// Money primitives
pub mod balance;
pub mod fee;
pub mod ledger;
pub mod money;

pub mod error;

// Dependencies and resilience
pub mod external;
pub mod resilience;

// Engine
pub mod kyc;
pub mod transfer;
pub mod wallet;

// Service
pub mod config;
pub mod gateway;
pub mod logging;

// Convenient re-exports at crate root
pub use balance::Balance;
pub use core_types::{KycId, ReferenceId, TransactionId, UserId, WalletId};
pub use error::{ErrorKind, WalletError, WalletResult};
pub use kyc::KycGate;
pub use ledger::{Transaction, TransactionStatus, TransactionType, WalletLedger};
pub use money::Currency;
pub use transfer::TransferCoordinator;
pub use wallet::WalletRegistry;
