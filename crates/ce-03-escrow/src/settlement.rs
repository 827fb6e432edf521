//! Applies the ledger effect chosen by `domain::authorize`.

use crate::domain::LedgerEffect;
use crate::error::EscrowResult;
use ce_01_ledger::{LedgerApi, MovementReason};
use ce_02_message_store::Message;

/// Move the escrowed amount of `message` as `effect` dictates.
///
/// Runs inside `MessageStore::resolve_pending`, so a failure here leaves the
/// message PENDING.
pub fn apply_effect<L: LedgerApi>(
    ledger: &L,
    message: &Message,
    effect: LedgerEffect,
) -> EscrowResult<()> {
    match effect {
        LedgerEffect::CreditCreator => {
            ledger.credit(message.creator, message.amount, MovementReason::Settlement)?;
        }
        LedgerEffect::RefundSender => {
            ledger.credit(message.sender, message.amount, MovementReason::Refund)?;
        }
        LedgerEffect::None => {}
    }
    Ok(())
}
