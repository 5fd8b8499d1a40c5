//! KYC gate
//!
//! Identity verification that gates wallet creation. A record moves
//! `pending -> verified | rejected` exactly once; a rejected user may submit
//! again, a pending or verified one may not.

pub mod gate;
pub mod types;

pub use gate::{KycGate, KycLookup};
pub use types::{
    DocumentType, KycApplication, KycRecord, KycStatus, KycSubmission, ReviewChannel,
    ReviewDecision,
};
