//! # Inbound Ports
//!
//! API trait defining what the Escrow engine can do.
//!
//! Every operation names the acting account explicitly.

use crate::error::EscrowResult;
use crate::reconciler::ReconcileReport;
use async_trait::async_trait;
use ce_01_ledger::Withdrawal;
use ce_02_message_store::{Attachment, ConversationEntry, Message, MessageKind, MessageQuery, Rating};
use shared_types::{AccountId, Credits, EntryId, MessageId};

/// A new paid message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateMessageRequest {
    /// Paying account.
    pub sender: AccountId,
    /// Receiving creator.
    pub creator: AccountId,
    /// Credits to escrow or settle.
    pub amount: Credits,
    /// Regular, product or tip.
    pub kind: MessageKind,
    /// Opening text. Identifies the product for purchases.
    pub content: String,
    /// Optional file returned by `upload_attachment`.
    pub attachment: Option<Attachment>,
}

impl CreateMessageRequest {
    /// A regular escrowed message.
    pub fn regular(sender: AccountId, creator: AccountId, amount: Credits, content: impl Into<String>) -> Self {
        Self {
            sender,
            creator,
            amount,
            kind: MessageKind::Regular,
            content: content.into(),
            attachment: None,
        }
    }

    /// An instant product purchase.
    pub fn product(sender: AccountId, creator: AccountId, amount: Credits, product: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::ProductPurchase,
            ..Self::regular(sender, creator, amount, product)
        }
    }

    /// An instant tip.
    pub fn tip(sender: AccountId, creator: AccountId, amount: Credits, note: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Tip,
            ..Self::regular(sender, creator, amount, note)
        }
    }
}

/// A creator reply.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplyRequest {
    /// Reply text.
    pub content: Option<String>,
    /// Reply file.
    pub attachment: Option<Attachment>,
    /// Settle the message (PENDING → REPLIED) instead of keeping it open.
    pub complete: bool,
}

impl ReplyRequest {
    /// A reply that keeps the thread open.
    pub fn partial(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// A reply that settles the message.
    pub fn complete(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            complete: true,
            ..Self::default()
        }
    }

    /// Settle with no new content. Needs an earlier manual reply.
    pub fn close() -> Self {
        Self {
            complete: true,
            ..Self::default()
        }
    }

    /// Whether the request carries text or a file.
    pub fn has_content(&self) -> bool {
        self.content
            .as_deref()
            .map_or(false, |c| !c.trim().is_empty())
            || self.attachment.is_some()
    }
}

/// Escrow API - inbound port.
#[async_trait]
pub trait EscrowApi: Send + Sync {
    /// Create a message, debiting the sender.
    ///
    /// Regular messages hold the amount in escrow; products and tips pay the
    /// creator immediately.
    async fn create_message(&self, request: CreateMessageRequest) -> EscrowResult<Message>;

    /// Creator reply. `complete` settles the message.
    async fn reply(
        &self,
        creator: AccountId,
        message_id: MessageId,
        reply: ReplyRequest,
    ) -> EscrowResult<Message>;

    /// Creator rejects a PENDING message, refunding the sender.
    async fn cancel(&self, creator: AccountId, message_id: MessageId) -> EscrowResult<Message>;

    /// Messages where `account` participates, newest first. Reconciles first.
    async fn list_messages(&self, account: AccountId, filter: MessageQuery)
        -> EscrowResult<Vec<Message>>;

    /// One message. Reconciles first.
    async fn get_message(&self, account: AccountId, message_id: MessageId) -> EscrowResult<Message>;

    /// Sender rates a REPLIED message. Write-once.
    async fn rate(
        &self,
        sender: AccountId,
        message_id: MessageId,
        stars: u8,
        review: Option<String>,
    ) -> EscrowResult<Rating>;

    /// Mark the thread read.
    async fn mark_read(&self, account: AccountId, message_id: MessageId) -> EscrowResult<()>;

    /// Author edits one of their entries.
    async fn edit_entry(
        &self,
        account: AccountId,
        message_id: MessageId,
        entry_id: EntryId,
        content: String,
        attachment: Option<Attachment>,
    ) -> EscrowResult<ConversationEntry>;

    /// Store a file and return a reference to attach.
    async fn upload_attachment(
        &self,
        account: AccountId,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> EscrowResult<Attachment>;

    /// Expire every overdue message.
    async fn reconcile_expired(&self) -> EscrowResult<ReconcileReport>;

    /// Creator moves balance to the payout rail.
    async fn withdraw(&self, creator: AccountId, amount: Credits) -> EscrowResult<Withdrawal>;
}
