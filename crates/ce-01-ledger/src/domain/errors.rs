//! # Domain Errors
//!
//! Error types for the Ledger.

use shared_types::{AccountId, Credits};
use thiserror::Error;

/// Ledger error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Account does not exist.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account was already opened.
    #[error("Account already exists: {0}")]
    AccountExists(AccountId),

    /// Debit would drive the balance negative.
    #[error("Insufficient funds in {account}: required {required}, available {available}")]
    InsufficientFunds {
        /// Debited account
        account: AccountId,
        /// Requested debit
        required: Credits,
        /// Balance at the time of the request
        available: Credits,
    },

    /// Zero amounts are never moved.
    #[error("Invalid amount: movements must be positive")]
    InvalidAmount,

    /// Withdrawal below the configured minimum.
    #[error("Withdrawal of {amount} below minimum {minimum}")]
    BelowMinimum {
        /// Requested amount
        amount: Credits,
        /// Configured minimum
        minimum: Credits,
    },

    /// Credit would overflow the balance.
    #[error("Balance overflow on {0}")]
    BalanceOverflow(AccountId),

    /// Account is halted pending manual reconciliation.
    #[error("Account halted pending reconciliation: {0}")]
    AccountHalted(AccountId),

    /// Resume requested for an account that is not halted.
    #[error("Account is not halted: {0}")]
    NotHalted(AccountId),

    /// Transient storage failure. Safe to retry.
    #[error("Ledger storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A debit could not be matched by its credit nor reversed.
    #[error("Ledger corruption ({amount} credits unmatched): {detail}")]
    Corruption {
        /// Accounts halted because of the corruption
        accounts: Vec<AccountId>,
        /// Credits left unmatched
        amount: Credits,
        /// Operator-facing description
        detail: String,
    },

    /// The payout rail rejected a withdrawal. The debit was reversed.
    #[error("Payout failed: {0}")]
    PayoutFailed(String),
}

impl LedgerError {
    /// Only transient storage faults may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }

    /// Whether this error means credits are unaccounted for.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corruption { .. })
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_message() {
        let err = LedgerError::InsufficientFunds {
            account: AccountId::new(),
            required: 250,
            available: 100,
        };
        let text = err.to_string();
        assert!(text.contains("required 250"));
        assert!(text.contains("available 100"));
    }

    #[test]
    fn test_only_storage_errors_retry() {
        assert!(LedgerError::StorageUnavailable("down".into()).is_retryable());
        assert!(!LedgerError::InvalidAmount.is_retryable());
        assert!(!LedgerError::AccountHalted(AccountId::new()).is_retryable());
    }

    #[test]
    fn test_corruption_flag() {
        let err = LedgerError::Corruption {
            accounts: vec![AccountId::new()],
            amount: 5,
            detail: "reversal failed".into(),
        };
        assert!(err.is_corruption());
        assert!(err.to_string().contains("5 credits unmatched"));
    }
}
