//! # Escrow State Machine
//!
//! The single authority deciding whether a transition may happen and what it
//! does to the ledger.
//!
//! | Transition | Actor | Precondition | Ledger effect |
//! |------------|-------|--------------|---------------|
//! | Complete | creator | PENDING, before deadline, content or prior manual reply | credit creator |
//! | Expire | reconciler | PENDING, at or past deadline | refund sender |
//! | Cancel | creator | PENDING, before deadline | refund sender |
//! | PartialReply | creator | PENDING, before deadline, content | none |

use crate::error::{EscrowError, EscrowResult};
use ce_02_message_store::{Message, MessageStatus};
use shared_types::Timestamp;

/// A requested change to a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    /// PENDING → REPLIED.
    Complete,
    /// PENDING → EXPIRED.
    Expire,
    /// PENDING → CANCELLED.
    Cancel,
    /// Reply that keeps the message PENDING.
    PartialReply,
}

impl Transition {
    /// Status after the transition commits.
    pub fn target_status(&self) -> MessageStatus {
        match self {
            Self::Complete => MessageStatus::Replied,
            Self::Expire => MessageStatus::Expired,
            Self::Cancel => MessageStatus::Cancelled,
            Self::PartialReply => MessageStatus::Pending,
        }
    }

    /// Verb used in error messages.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Expire => "expire",
            Self::Cancel => "cancel",
            Self::PartialReply => "reply",
        }
    }

    fn is_reply(&self) -> bool {
        matches!(self, Self::Complete | Self::PartialReply)
    }

    fn allowed_actor(&self) -> Actor {
        match self {
            Self::Expire => Actor::Reconciler,
            Self::Complete | Self::Cancel | Self::PartialReply => Actor::Creator,
        }
    }
}

/// Who is asking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Actor {
    /// The paying party.
    Sender,
    /// The creator being paid.
    Creator,
    /// The expiration reconciler.
    Reconciler,
}

/// Credits to move when a transition commits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LedgerEffect {
    /// Pay the escrowed amount to the creator.
    CreditCreator,
    /// Return the escrowed amount to the sender.
    RefundSender,
    /// No credits move.
    None,
}

/// Decide whether `actor` may apply `transition` to `message` at `now`.
///
/// `has_content` is whether the request carries text or an attachment.
pub fn authorize(
    message: &Message,
    transition: Transition,
    actor: Actor,
    now: Timestamp,
    has_content: bool,
) -> EscrowResult<LedgerEffect> {
    if actor != transition.allowed_actor() {
        return Err(EscrowError::NotAuthorized(format!(
            "{:?} cannot {} message {}",
            actor,
            transition.action(),
            message.id
        )));
    }

    if message.status.is_terminal() {
        if transition.is_reply() && message.status == MessageStatus::Expired {
            return Err(EscrowError::Expired {
                message_id: message.id,
                expires_at: message.expires_at,
            });
        }
        return Err(EscrowError::InvalidTransition {
            message_id: message.id,
            status: message.status,
            action: transition.action().to_string(),
        });
    }

    if transition.is_reply() && now >= message.expires_at {
        return Err(EscrowError::Expired {
            message_id: message.id,
            expires_at: message.expires_at,
        });
    }

    // Past the deadline only the reconciler may settle.
    if transition == Transition::Cancel && now >= message.expires_at {
        return Err(EscrowError::InvalidTransition {
            message_id: message.id,
            status: message.status,
            action: transition.action().to_string(),
        });
    }

    match transition {
        Transition::Complete => {
            if !has_content && !message.has_manual_creator_reply() {
                return Err(EscrowError::CompletionRequiresReply(message.id));
            }
            Ok(LedgerEffect::CreditCreator)
        }
        Transition::PartialReply => {
            if !has_content {
                return Err(EscrowError::InvalidInput(
                    "a reply needs text or an attachment".to_string(),
                ));
            }
            Ok(LedgerEffect::None)
        }
        Transition::Expire => {
            if now < message.expires_at {
                return Err(EscrowError::NotYetExpired {
                    message_id: message.id,
                    expires_at: message.expires_at,
                });
            }
            Ok(LedgerEffect::RefundSender)
        }
        Transition::Cancel => Ok(LedgerEffect::RefundSender),
    }
}
