//! # Domain Entities
//!
//! The paid message and its conversation.

use super::value_objects::{EntryOrigin, MessageKind, MessageStatus, Role};
use serde::{Deserialize, Serialize};
use shared_types::{AccountId, Credits, EntryId, MessageId, Timestamp};

/// A stored file reference. The store keeps the URL, never the bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Durable URL returned by file storage.
    pub url: String,
    /// MIME type.
    pub content_type: String,
}

/// One entry in a message thread.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    /// Unique identifier.
    pub id: EntryId,
    /// Author.
    pub role: Role,
    /// Manual or auto-generated.
    pub origin: EntryOrigin,
    /// Text, possibly empty when an attachment is present.
    pub content: String,
    /// Optional file.
    pub attachment: Option<Attachment>,
    /// Posting time. Preserved across edits.
    pub timestamp: Timestamp,
    /// Set once the author edits the entry.
    pub edited: bool,
}

impl ConversationEntry {
    /// Whether the entry carries text or a file.
    pub fn has_substance(&self) -> bool {
        !self.content.trim().is_empty() || self.attachment.is_some()
    }
}

/// Post-settlement annotation. Write-once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    /// 1 to 5.
    pub stars: u8,
    /// Optional review text.
    pub review: Option<String>,
    /// When the sender rated.
    pub rated_at: Timestamp,
}

/// The escrowed transaction unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier.
    pub id: MessageId,
    /// Paying account.
    pub sender: AccountId,
    /// Receiving creator.
    pub creator: AccountId,
    /// Escrowed credits. Immutable.
    pub amount: Credits,
    /// Regular, product or tip.
    pub kind: MessageKind,
    /// Escrow status.
    pub status: MessageStatus,
    /// Creation time.
    pub created_at: Timestamp,
    /// Deadline for the creator. Fixed at creation, never extended.
    pub expires_at: Timestamp,
    /// Settlement time for REPLIED messages.
    pub reply_at: Option<Timestamp>,
    /// Whether the latest content has been seen.
    pub is_read: bool,
    /// Sender's rating, once given.
    pub rating: Option<Rating>,
    /// Text the message was created with. Edits never change it.
    pub original_content: String,
    /// Entries in timestamp order.
    pub conversation: Vec<ConversationEntry>,
}

impl Message {
    /// Whether `account` is the sender or the creator.
    pub fn is_participant(&self, account: AccountId) -> bool {
        self.sender == account || self.creator == account
    }

    /// The role `account` plays in this thread.
    pub fn role_of(&self, account: AccountId) -> Option<Role> {
        if account == self.creator {
            Some(Role::Creator)
        } else if account == self.sender {
            Some(Role::Sender)
        } else {
            None
        }
    }

    /// Whether the creator already replied by hand. Welcome replies do not count.
    pub fn has_manual_creator_reply(&self) -> bool {
        self.conversation
            .iter()
            .any(|e| e.role == Role::Creator && e.origin == EntryOrigin::Manual)
    }

    /// Still pending at or past its deadline.
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        self.status == MessageStatus::Pending && now >= self.expires_at
    }

    /// Look up an entry.
    pub fn entry(&self, id: EntryId) -> Option<&ConversationEntry> {
        self.conversation.iter().find(|e| e.id == id)
    }

    /// Insert keeping timestamp order; equal timestamps keep arrival order.
    pub(crate) fn insert_entry(&mut self, entry: ConversationEntry) {
        let at = self
            .conversation
            .partition_point(|e| e.timestamp <= entry.timestamp);
        self.conversation.insert(at, entry);
    }
}

/// Everything needed to create a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageDraft {
    /// Paying account.
    pub sender: AccountId,
    /// Receiving creator.
    pub creator: AccountId,
    /// Credits to escrow or settle.
    pub amount: Credits,
    /// Regular, product or tip.
    pub kind: MessageKind,
    /// Opening text.
    pub content: String,
    /// Opening attachment.
    pub attachment: Option<Attachment>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Creator's response window in milliseconds.
    pub response_window_ms: u64,
}

/// An entry to append.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewEntry {
    /// Author.
    pub role: Role,
    /// Manual or auto-generated.
    pub origin: EntryOrigin,
    /// Text.
    pub content: String,
    /// Optional file.
    pub attachment: Option<Attachment>,
    /// Posting time.
    pub at: Timestamp,
}

impl NewEntry {
    /// A manual entry.
    pub fn manual(role: Role, content: impl Into<String>, attachment: Option<Attachment>, at: Timestamp) -> Self {
        Self {
            role,
            origin: EntryOrigin::Manual,
            content: content.into(),
            attachment,
            at,
        }
    }
}

/// A terminal transition to apply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Terminal status.
    pub status: MessageStatus,
    /// Transition time.
    pub at: Timestamp,
    /// Closing entry appended with a reply.
    pub closing_entry: Option<NewEntry>,
}
