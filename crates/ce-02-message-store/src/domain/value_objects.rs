//! # Domain Value Objects
//!
//! Closed enums describing a message and its conversation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message escrow status.
///
/// ```text
///              ┌──→ REPLIED    (creator paid)
/// PENDING ─────┼──→ EXPIRED    (sender refunded, reconciler only)
///              └──→ CANCELLED  (sender refunded, creator only)
/// ```
///
/// Every non-pending state is terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageStatus {
    /// Credits held in escrow, awaiting the creator.
    #[default]
    Pending,
    /// Creator replied; credits paid to the creator.
    Replied,
    /// Creator rejected; credits refunded to the sender.
    Cancelled,
    /// Response window lapsed; credits refunded to the sender.
    Expired,
}

impl MessageStatus {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: MessageStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Replied)
                | (Self::Pending, Self::Cancelled)
                | (Self::Pending, Self::Expired)
        )
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Replied => "REPLIED",
            Self::Cancelled => "CANCELLED",
            Self::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

/// What the sender paid for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Timed escrow: paid out only when the creator replies in time.
    #[default]
    Regular,
    /// Instant-delivery digital product. Settles at creation.
    ProductPurchase,
    /// Tip. Settles at creation.
    Tip,
}

impl MessageKind {
    /// Products and tips bypass PENDING and settle at creation.
    pub fn settles_immediately(&self) -> bool {
        matches!(self, Self::ProductPurchase | Self::Tip)
    }
}

/// Author of a conversation entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The paying fan.
    Sender,
    /// The creator being paid.
    Creator,
}

/// How an entry came to exist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryOrigin {
    /// Typed by a person.
    #[default]
    Manual,
    /// Generated welcome reply. Never counts as creator engagement.
    AutoWelcome,
}
