//! # Domain Errors
//!
//! Error types for the Message Store.

use super::value_objects::MessageStatus;
use shared_types::{EntryId, MessageId};
use thiserror::Error;

/// Message store error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Message does not exist.
    #[error("Message not found: {0}")]
    NotFound(MessageId),

    /// Conversation entry does not exist.
    #[error("Entry {entry_id} not found in message {message_id}")]
    EntryNotFound {
        /// Owning message
        message_id: MessageId,
        /// Missing entry
        entry_id: EntryId,
    },

    /// Operation not allowed in the message's current status.
    #[error("Invalid transition on {message_id}: cannot {action} while {from}")]
    InvalidTransition {
        /// Target message
        message_id: MessageId,
        /// Status at the time of the attempt
        from: MessageStatus,
        /// Attempted operation
        action: String,
    },

    /// Only the original author may edit an entry.
    #[error("Entry {0} may only be edited by its author")]
    NotAuthor(EntryId),

    /// Rating is write-once.
    #[error("Message already rated: {0}")]
    AlreadyRated(MessageId),

    /// Transient storage failure. Safe to retry.
    #[error("Message store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Only transient storage faults may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
