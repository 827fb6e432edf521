//! # Purchase/Duplicate Guard
//!
//! Admission rules checked before any credits move. Pure: never mutates.

use crate::error::{EscrowError, EscrowResult};
use ce_02_message_store::{Message, MessageKind, MessageStatus};
use shared_types::AccountId;

/// What a new message would look like.
#[derive(Clone, Copy, Debug)]
pub struct Admission<'a> {
    /// Paying account.
    pub sender: AccountId,
    /// Receiving creator.
    pub creator: AccountId,
    /// Requested kind.
    pub kind: MessageKind,
    /// Opening text; identifies the product for purchases.
    pub content: &'a str,
}

/// Check a new message against the sender's existing messages to the same creator.
///
/// - A regular message is refused while another regular one is PENDING.
/// - A product purchase is refused if the same product was bought before.
/// - Tips always pass.
pub fn admit(request: &Admission<'_>, prior: &[Message]) -> EscrowResult<()> {
    let same_pair = |m: &&Message| m.sender == request.sender && m.creator == request.creator;

    match request.kind {
        MessageKind::Regular => {
            let pending = prior.iter().filter(same_pair).any(|m| {
                m.kind == MessageKind::Regular && m.status == MessageStatus::Pending
            });
            if pending {
                return Err(EscrowError::DuplicateRequest {
                    sender: request.sender,
                    creator: request.creator,
                });
            }
        }
        MessageKind::ProductPurchase => {
            let bought = prior.iter().filter(same_pair).any(|m| {
                m.kind == MessageKind::ProductPurchase && m.original_content == request.content
            });
            if bought {
                return Err(EscrowError::AlreadyPurchased {
                    creator: request.creator,
                });
            }
        }
        MessageKind::Tip => {}
    }
    Ok(())
}
