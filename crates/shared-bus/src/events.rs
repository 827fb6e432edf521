//! # Escrow Events
//!
//! Defines all event types that flow through the shared bus.
//!
//! Events are published after a transition has committed. Delivery is best
//! effort: a dropped event never rolls back the transition that produced it.

use serde::{Deserialize, Serialize};
use shared_types::{AccountId, Credits, MessageId, Timestamp, WithdrawalId};

/// Subsystem identifiers used as event sources.
pub mod subsystem {
    /// Ledger (ce-01).
    pub const LEDGER: u8 = 1;
    /// Message Store (ce-02).
    pub const MESSAGE_STORE: u8 = 2;
    /// Escrow engine (ce-03).
    pub const ESCROW: u8 = 3;
}

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowEvent {
    // =========================================================================
    // MESSAGE LIFECYCLE
    // =========================================================================
    /// A paid message was created.
    /// Target: the creator.
    MessageCreated {
        /// The new message.
        message_id: MessageId,
        /// Paying account.
        sender: AccountId,
        /// Receiving creator.
        creator: AccountId,
        /// Credits held or settled.
        amount: Credits,
        /// True for products and tips, which settle at creation.
        settled: bool,
    },

    /// The creator posted a reply that keeps the message pending.
    /// Target: the sender.
    ReplyPosted {
        /// The message replied to.
        message_id: MessageId,
        /// Paying account.
        sender: AccountId,
        /// Replying creator.
        creator: AccountId,
    },

    // =========================================================================
    // SETTLEMENT
    // =========================================================================
    /// PENDING → REPLIED. The creator was paid.
    /// Target: the sender.
    MessageReplied {
        /// The settled message.
        message_id: MessageId,
        /// Paying account.
        sender: AccountId,
        /// Paid creator.
        creator: AccountId,
        /// Credits paid out.
        amount: Credits,
        /// Settlement time.
        reply_at: Timestamp,
    },

    /// PENDING → CANCELLED. The sender was refunded.
    /// Target: the sender.
    MessageCancelled {
        /// The cancelled message.
        message_id: MessageId,
        /// Refunded account.
        sender: AccountId,
        /// Cancelling creator.
        creator: AccountId,
        /// Credits refunded.
        amount: Credits,
    },

    /// PENDING → EXPIRED. The sender was refunded by the reconciler.
    /// Target: both parties.
    MessageExpired {
        /// The expired message.
        message_id: MessageId,
        /// Refunded account.
        sender: AccountId,
        /// Creator who missed the window.
        creator: AccountId,
        /// Credits refunded.
        amount: Credits,
    },

    /// The sender rated a replied message.
    /// Target: the creator.
    MessageRated {
        /// The rated message.
        message_id: MessageId,
        /// Rated creator.
        creator: AccountId,
        /// Stars, 1 to 5.
        stars: u8,
    },

    // =========================================================================
    // PAYOUTS
    // =========================================================================
    /// A creator withdrawal reached the payout rail.
    WithdrawalCompleted {
        /// The withdrawal record.
        withdrawal_id: WithdrawalId,
        /// Withdrawing creator.
        creator: AccountId,
        /// Credits moved off-platform.
        amount: Credits,
    },

    // =========================================================================
    // CRITICAL EVENTS (DLQ)
    // =========================================================================
    /// Critical error requiring operator attention.
    CriticalError {
        /// The subsystem that encountered the error.
        subsystem_id: u8,
        /// Accounts halted by the failure.
        accounts: Vec<AccountId>,
        /// Error description.
        error: String,
    },
}

impl EscrowEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::MessageCreated { .. } | Self::ReplyPosted { .. } => EventTopic::Messages,
            Self::MessageReplied { .. }
            | Self::MessageCancelled { .. }
            | Self::MessageExpired { .. } => EventTopic::Settlement,
            Self::MessageRated { .. } => EventTopic::Ratings,
            Self::WithdrawalCompleted { .. } => EventTopic::Payouts,
            Self::CriticalError { .. } => EventTopic::DeadLetterQueue,
        }
    }

    /// Get the originating subsystem ID.
    #[must_use]
    pub fn source_subsystem(&self) -> u8 {
        match self {
            Self::WithdrawalCompleted { .. } => subsystem::LEDGER,
            Self::ReplyPosted { .. } => subsystem::MESSAGE_STORE,
            Self::MessageCreated { .. }
            | Self::MessageReplied { .. }
            | Self::MessageCancelled { .. }
            | Self::MessageExpired { .. }
            | Self::MessageRated { .. } => subsystem::ESCROW,
            Self::CriticalError { subsystem_id, .. } => *subsystem_id,
        }
    }

    /// Accounts that should be told about this event.
    ///
    /// The party that caused the event is not notified, except for expiry
    /// which nobody triggered by hand.
    #[must_use]
    pub fn recipients(&self) -> Vec<AccountId> {
        match self {
            Self::MessageCreated { creator, .. } | Self::MessageRated { creator, .. } => {
                vec![*creator]
            }
            Self::ReplyPosted { sender, .. }
            | Self::MessageReplied { sender, .. }
            | Self::MessageCancelled { sender, .. } => vec![*sender],
            Self::MessageExpired { sender, creator, .. } => vec![*sender, *creator],
            Self::WithdrawalCompleted { creator, .. } => vec![*creator],
            Self::CriticalError { .. } => Vec::new(),
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Message creation and partial replies.
    Messages,
    /// Terminal transitions with a ledger effect.
    Settlement,
    /// Post-settlement ratings.
    Ratings,
    /// Creator withdrawals.
    Payouts,
    /// Dead Letter Queue for critical errors.
    DeadLetterQueue,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Only events addressed to this account. `None` means any recipient.
    pub recipient: Option<AccountId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            recipient: None,
        }
    }

    /// Create a filter for events addressed to one account.
    #[must_use]
    pub fn for_recipient(account: AccountId) -> Self {
        Self {
            topics: Vec::new(),
            recipient: Some(account),
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &EscrowEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let recipient_match = self
            .recipient
            .map_or(true, |account| event.recipients().contains(&account));

        topic_match && recipient_match
    }
}
