//! Transfer Coordinator
//!
//! Orchestrates every balance mutation: top-ups, wallet-to-wallet transfers
//! and settlement of pending top-ups.
//!
//! # Top-up
//!
//! ```text
//! validate -> charge (breaker) --settled--> credit available, tx completed
//!                              --pending--> credit pending,   tx pending --webhook--> completed | failed
//!                              --queued---> credit pending,   tx pending --retry worker / webhook--> ...
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Lock Order**: multi-wallet operations lock in ascending `WalletId` order
//! 2. **No Await Under Lock**: the critical section cannot be cancelled halfway
//! 3. **Stage Then Commit**: both balances are computed before either is written
//! 4. **Fee Asymmetry**: top-up fees are reported, transfer fees are debited

pub mod coordinator;
pub mod types;
pub mod worker;

pub use coordinator::TransferCoordinator;
pub use types::{
    PendingTopUp, SettlementOutcome, TopUpReceipt, TopUpRequest, TopUpStatus, TransferReceipt,
    TransferRequest,
};
pub use worker::{PaymentRetryWorker, WorkerConfig};
