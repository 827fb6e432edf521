//! # Core Domain Entities
//!
//! Identifier newtypes and scalar value types used across subsystems.
//!
//! ## Clusters
//!
//! - **Identity**: `AccountId`, `MessageId`, `EntryId`, `WithdrawalId`
//! - **Value**: `Credits`
//! - **Time**: `Timestamp` (milliseconds since the Unix epoch)

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// CLUSTER A: VALUE & TIME
// =============================================================================

/// Platform credits. Balances and escrowed amounts are never negative.
pub type Credits = u64;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Milliseconds in one hour.
pub const MS_PER_HOUR: u64 = 60 * 60 * 1000;

/// Convert a window expressed in hours to milliseconds.
#[must_use]
pub const fn hours_to_ms(hours: u32) -> u64 {
    hours as u64 * MS_PER_HOUR
}

// =============================================================================
// CLUSTER B: IDENTITY
// =============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
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

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// A ledger account. Fans and creators are both accounts.
    AccountId
);

define_id!(
    /// A paid message (the escrowed transaction unit).
    MessageId
);

define_id!(
    /// One entry in a message's conversation.
    EntryId
);

define_id!(
    /// A creator payout request.
    WithdrawalId
);
