//! Error types for the Escrow engine

use crate::ports::StorageError;
use ce_01_ledger::LedgerError;
use ce_02_message_store::{MessageStatus, StoreError};
use shared_types::{AccountId, Credits, EntryId, MessageId, Timestamp};
use std::fmt;
use thiserror::Error;

/// Escrow engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscrowError {
    /// Sender cannot cover the amount
    #[error("Insufficient funds in {account}: required {required}, available {available}")]
    InsufficientFunds {
        account: AccountId,
        required: Credits,
        available: Credits,
    },

    /// Operation not allowed in the message's current status
    #[error("Invalid transition on {message_id}: cannot {action} while {status}")]
    InvalidTransition {
        message_id: MessageId,
        status: MessageStatus,
        action: String,
    },

    /// Response window lapsed
    #[error("Message {message_id} expired at {expires_at}")]
    Expired {
        message_id: MessageId,
        expires_at: Timestamp,
    },

    /// Completing needs new content or an earlier manual reply
    #[error("Cannot complete {0} without content or a prior reply")]
    CompletionRequiresReply(MessageId),

    /// Reconciler asked to expire a message before its deadline
    #[error("Message {message_id} not due until {expires_at}")]
    NotYetExpired {
        message_id: MessageId,
        expires_at: Timestamp,
    },

    /// A regular message to this creator is still pending
    #[error("A pending message from {sender} to {creator} already exists")]
    DuplicateRequest { sender: AccountId, creator: AccountId },

    /// The same product was bought before
    #[error("Product already purchased from {creator}")]
    AlreadyPurchased { creator: AccountId },

    /// Rating is write-once
    #[error("Message already rated: {0}")]
    AlreadyRated(MessageId),

    /// Wrong party or wrong role for the operation
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Message does not exist
    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    /// Conversation entry does not exist
    #[error("Entry {entry_id} not found in message {message_id}")]
    EntryNotFound {
        message_id: MessageId,
        entry_id: EntryId,
    },

    /// Ledger account does not exist
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Malformed request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Zero amounts are never escrowed
    #[error("Invalid amount: must be positive")]
    InvalidAmount,

    /// Stars outside 1..=5
    #[error("Invalid rating {0}: must be between 1 and 5")]
    InvalidRating(u8),

    /// Account frozen pending manual reconciliation
    #[error("Account halted pending reconciliation: {0}")]
    AccountHalted(AccountId),

    /// Transient storage failure. Safe to retry.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A debit was left unmatched. Affected accounts are halted.
    #[error("Ledger corruption ({amount} credits unmatched): {detail}")]
    LedgerCorruption {
        accounts: Vec<AccountId>,
        amount: Credits,
        detail: String,
    },

    /// Payout rail refused a withdrawal. The debit was reversed.
    #[error("Payout failed: {0}")]
    PayoutFailed(String),
}

/// Closed classification callers map to user-facing messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InsufficientFunds,
    InvalidTransition,
    Expired,
    DuplicateRequest,
    AlreadyPurchased,
    AlreadyRated,
    NotAuthorized,
    NotFound,
    InvalidInput,
    AccountHalted,
    StorageUnavailable,
    LedgerCorruption,
    PayoutFailed,
}

impl ErrorKind {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientFunds => "insufficient_funds",
            Self::InvalidTransition => "invalid_transition",
            Self::Expired => "expired",
            Self::DuplicateRequest => "duplicate_request",
            Self::AlreadyPurchased => "already_purchased",
            Self::AlreadyRated => "already_rated",
            Self::NotAuthorized => "not_authorized",
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::AccountHalted => "account_halted",
            Self::StorageUnavailable => "storage_unavailable",
            Self::LedgerCorruption => "ledger_corruption",
            Self::PayoutFailed => "payout_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EscrowError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::InvalidTransition { .. }
            | Self::CompletionRequiresReply(_)
            | Self::NotYetExpired { .. } => ErrorKind::InvalidTransition,
            Self::Expired { .. } => ErrorKind::Expired,
            Self::DuplicateRequest { .. } => ErrorKind::DuplicateRequest,
            Self::AlreadyPurchased { .. } => ErrorKind::AlreadyPurchased,
            Self::AlreadyRated(_) => ErrorKind::AlreadyRated,
            Self::NotAuthorized(_) => ErrorKind::NotAuthorized,
            Self::MessageNotFound(_) | Self::EntryNotFound { .. } | Self::AccountNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::InvalidInput(_) | Self::InvalidAmount | Self::InvalidRating(_) => {
                ErrorKind::InvalidInput
            }
            Self::AccountHalted(_) => ErrorKind::AccountHalted,
            Self::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            Self::LedgerCorruption { .. } => ErrorKind::LedgerCorruption,
            Self::PayoutFailed(_) => ErrorKind::PayoutFailed,
        }
    }

    /// Only transient storage faults may be retried.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::StorageUnavailable
    }
}

impl From<LedgerError> for EscrowError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AccountNotFound(account) => Self::AccountNotFound(account),
            LedgerError::InsufficientFunds {
                account,
                required,
                available,
            } => Self::InsufficientFunds {
                account,
                required,
                available,
            },
            LedgerError::InvalidAmount => Self::InvalidAmount,
            LedgerError::AccountHalted(account) => Self::AccountHalted(account),
            LedgerError::StorageUnavailable(reason) => Self::StorageUnavailable(reason),
            LedgerError::Corruption {
                accounts,
                amount,
                detail,
            } => Self::LedgerCorruption {
                accounts,
                amount,
                detail,
            },
            LedgerError::PayoutFailed(reason) => Self::PayoutFailed(reason),
            other @ (LedgerError::AccountExists(_)
            | LedgerError::BelowMinimum { .. }
            | LedgerError::BalanceOverflow(_)
            | LedgerError::NotHalted(_)) => Self::InvalidInput(other.to_string()),
        }
    }
}

impl From<StoreError> for EscrowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::MessageNotFound(id),
            StoreError::EntryNotFound {
                message_id,
                entry_id,
            } => Self::EntryNotFound {
                message_id,
                entry_id,
            },
            StoreError::InvalidTransition {
                message_id,
                from,
                action,
            } => Self::InvalidTransition {
                message_id,
                status: from,
                action,
            },
            StoreError::NotAuthor(entry_id) => {
                Self::NotAuthorized(format!("entry {entry_id} belongs to the other party"))
            }
            StoreError::AlreadyRated(id) => Self::AlreadyRated(id),
            StoreError::Unavailable(reason) => Self::StorageUnavailable(reason),
        }
    }
}

impl From<StorageError> for EscrowError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable(reason) => Self::StorageUnavailable(reason),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

/// Result type for escrow operations
pub type EscrowResult<T> = Result<T, EscrowError>;
