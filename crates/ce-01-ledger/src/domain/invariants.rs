//! # Domain Invariants
//!
//! Rules every balance change must satisfy before it is applied.

use super::entities::Account;
use super::errors::{LedgerError, LedgerResult};
use shared_types::Credits;

/// Invariant: movements are strictly positive.
pub fn invariant_positive_amount(amount: Credits) -> LedgerResult<()> {
    if amount == 0 {
        return Err(LedgerError::InvalidAmount);
    }
    Ok(())
}

/// Invariant: balances are never negative.
///
/// A debit larger than the balance fails before any mutation.
pub fn invariant_sufficient_funds(account: &Account, amount: Credits) -> LedgerResult<()> {
    if account.balance < amount {
        return Err(LedgerError::InsufficientFunds {
            account: account.id,
            required: amount,
            available: account.balance,
        });
    }
    Ok(())
}

/// Invariant: credits are never created by wrapping arithmetic.
///
/// Returns the new balance.
pub fn invariant_no_overflow(account: &Account, amount: Credits) -> LedgerResult<Credits> {
    account
        .balance
        .checked_add(amount)
        .ok_or(LedgerError::BalanceOverflow(account.id))
}

/// Invariant: halted accounts are frozen.
pub fn invariant_active(account: &Account) -> LedgerResult<()> {
    if account.is_halted() {
        return Err(LedgerError::AccountHalted(account.id));
    }
    Ok(())
}
