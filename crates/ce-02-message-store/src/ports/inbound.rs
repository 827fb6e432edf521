//! # Inbound Ports
//!
//! Persistence contract for paid messages.

use crate::domain::{
    Attachment, ConversationEntry, Message, MessageDraft, MessageKind, MessageStatus, NewEntry,
    Rating, Resolution, Role, StoreError, StoreResult,
};
use shared_types::{AccountId, EntryId, MessageId, Timestamp};

/// Filter for listing messages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageQuery {
    /// Only messages this account sent or received.
    pub participant: Option<AccountId>,
    /// Narrow `participant` to one side of the thread.
    pub as_role: Option<Role>,
    /// Only messages in this status.
    pub status: Option<MessageStatus>,
    /// Only messages of this kind.
    pub kind: Option<MessageKind>,
}

impl MessageQuery {
    /// Messages where `account` is either party.
    pub fn participant(account: AccountId) -> Self {
        Self {
            participant: Some(account),
            ..Self::default()
        }
    }

    /// Restrict to a status.
    pub fn with_status(mut self, status: MessageStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to one side of the thread.
    pub fn as_role(mut self, role: Role) -> Self {
        self.as_role = Some(role);
        self
    }

    /// Check if a message matches this query.
    pub fn matches(&self, message: &Message) -> bool {
        let participant_match = match (self.participant, self.as_role) {
            (None, _) => true,
            (Some(account), None) => message.is_participant(account),
            (Some(account), Some(Role::Sender)) => message.sender == account,
            (Some(account), Some(Role::Creator)) => message.creator == account,
        };
        participant_match
            && self.status.map_or(true, |s| message.status == s)
            && self.kind.map_or(true, |k| message.kind == k)
    }
}

/// Result of a terminal-transition attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// This call committed the transition.
    Applied(Message),
    /// Another transition committed first; nothing was changed.
    AlreadyResolved(Message),
}

/// Message store - inbound port.
///
/// Closures passed to `create_guarded` and `resolve_pending` run inside the
/// store's critical section and must not call back into the store.
pub trait MessageStore: Send + Sync {
    /// Create a message after `admit` accepts it.
    ///
    /// `admit` receives the sender's existing messages to the same creator and
    /// runs in the same critical section as the insert, so two concurrent
    /// creates cannot both pass it. The ledger debit belongs in `admit`: if it
    /// fails nothing is stored.
    fn create_guarded<E, F>(&self, draft: MessageDraft, admit: F) -> Result<Message, E>
    where
        F: FnOnce(&[Message]) -> Result<(), E>,
        E: From<StoreError>;

    /// Create a message with no admission check.
    fn create(&self, draft: MessageDraft) -> StoreResult<Message> {
        self.create_guarded(draft, |_| Ok::<(), StoreError>(()))
    }

    /// Fetch one message.
    fn get(&self, id: MessageId) -> StoreResult<Message>;

    /// Append an entry. Fails with `InvalidTransition` unless PENDING.
    ///
    /// Marks the thread unread.
    fn append_entry(&self, id: MessageId, entry: NewEntry) -> StoreResult<ConversationEntry>;

    /// Replace an entry's content in place. Allowed in any status.
    ///
    /// Only the original author role may edit. The timestamp is preserved and
    /// `edited` is set. A `None` attachment keeps the existing one.
    fn edit_entry(
        &self,
        id: MessageId,
        entry_id: EntryId,
        author: Role,
        content: String,
        attachment: Option<Attachment>,
    ) -> StoreResult<ConversationEntry>;

    /// Set the read flag.
    fn set_read(&self, id: MessageId, read: bool) -> StoreResult<()>;

    /// Attach a rating. REPLIED only, write-once.
    fn set_rating(&self, id: MessageId, rating: Rating) -> StoreResult<()>;

    /// List matching messages, newest first.
    fn query(&self, query: &MessageQuery) -> StoreResult<Vec<Message>>;

    /// PENDING messages with `expires_at <= now`, optionally for one participant.
    fn overdue(&self, now: Timestamp, participant: Option<AccountId>)
        -> StoreResult<Vec<MessageId>>;

    /// Compare-and-set a PENDING message into a terminal status.
    ///
    /// If the message is no longer PENDING, returns `AlreadyResolved` without
    /// calling `settle`. Otherwise `settle` runs under the row lock (authority
    /// check and ledger effect) and the status flips only if it succeeds.
    fn resolve_pending<E, F>(
        &self,
        id: MessageId,
        resolution: Resolution,
        settle: F,
    ) -> Result<ResolveOutcome, E>
    where
        F: FnOnce(&Message) -> Result<(), E>,
        E: From<StoreError>;
}
