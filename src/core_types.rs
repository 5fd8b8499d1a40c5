//! Core types used throughout the system
//!
//! Identifiers are ULID-backed newtypes: monotonic, sortable, and generated
//! without coordination. Sortability matters for [`WalletId`], whose `Ord`
//! defines the global lock order for multi-wallet operations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// User ID - opaque identity asserted by the upstream auth layer.
pub type UserId = String;

macro_rules! ulid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(ulid::Ulid);

        impl $name {
            /// Generate a new unique identifier
            pub fn new() -> Self {
                Self(ulid::Ulid::new())
            }

            /// Get the inner ULID value
            pub fn inner(&self) -> ulid::Ulid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(ulid::Ulid::from_string(s)?))
            }
        }
    };
}

ulid_id!(
    /// Wallet ID - also the lock-ordering key for transfers
    WalletId
);

ulid_id!(
    /// Ledger entry ID - one per Transaction record
    TransactionId
);

ulid_id!(
    /// KYC record ID
    KycId
);

ulid_id!(
    /// Correlation id shared by both legs of a transfer, or the payment
    /// reference of a top-up
    ReferenceId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_sortable() {
        let a = WalletId::new();
        let b = WalletId::new();
        assert_ne!(a, b);
        // Same-millisecond ULIDs are random-ordered, but never equal
        assert!(a < b || b < a);
    }

    #[test]
    fn test_display_parse_roundtrip() {
        let id = ReferenceId::new();
        let parsed: ReferenceId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-ulid".parse::<KycId>().is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let id = TransactionId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
}
