//! In-Memory Message Store Adapter
//!
//! Implements `MessageStore` behind a single `RwLock`. Guarded creates and
//! terminal transitions take the write lock, which makes them the
//! serialization point for duplicate checks and reply/cancel/expire races.

use crate::domain::{
    Attachment, ConversationEntry, EntryOrigin, Message, MessageDraft, MessageStatus, NewEntry,
    Rating, Resolution, Role, StoreError, StoreResult,
};
use crate::ports::{MessageQuery, MessageStore, ResolveOutcome};
use parking_lot::RwLock;
use shared_types::{AccountId, EntryId, MessageId, Timestamp};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// In-memory message store.
pub struct InMemoryMessageStore {
    messages: RwLock<HashMap<MessageId, Message>>,
    /// Fault injection: when false every operation fails as unavailable.
    available: AtomicBool,
}

impl InMemoryMessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the backing store going away or coming back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored messages.
    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    fn check_available(&self) -> StoreResult<()> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("message store offline".to_string()));
        }
        Ok(())
    }

    fn build(draft: MessageDraft) -> Message {
        let instant = draft.kind.settles_immediately();
        let opening = ConversationEntry {
            id: EntryId::new(),
            role: Role::Sender,
            origin: EntryOrigin::Manual,
            content: draft.content.clone(),
            attachment: draft.attachment,
            timestamp: draft.created_at,
            edited: false,
        };
        Message {
            id: MessageId::new(),
            sender: draft.sender,
            creator: draft.creator,
            amount: draft.amount,
            kind: draft.kind,
            status: if instant {
                MessageStatus::Replied
            } else {
                MessageStatus::Pending
            },
            created_at: draft.created_at,
            expires_at: draft.created_at.saturating_add(draft.response_window_ms),
            reply_at: instant.then_some(draft.created_at),
            is_read: false,
            rating: None,
            original_content: draft.content,
            conversation: vec![opening],
        }
    }

    fn materialize(entry: NewEntry) -> ConversationEntry {
        ConversationEntry {
            id: EntryId::new(),
            role: entry.role,
            origin: entry.origin,
            content: entry.content,
            attachment: entry.attachment,
            timestamp: entry.at,
            edited: false,
        }
    }
}

impl Default for InMemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore for InMemoryMessageStore {
    fn create_guarded<E, F>(&self, draft: MessageDraft, admit: F) -> Result<Message, E>
    where
        F: FnOnce(&[Message]) -> Result<(), E>,
        E: From<StoreError>,
    {
        self.check_available()?;
        let mut messages = self.messages.write();

        let prior: Vec<Message> = messages
            .values()
            .filter(|m| m.sender == draft.sender && m.creator == draft.creator)
            .cloned()
            .collect();
        admit(&prior)?;

        let message = Self::build(draft);
        debug!(
            "[ce-02] Stored message {} ({:?}, {})",
            message.id, message.kind, message.status
        );
        messages.insert(message.id, message.clone());
        Ok(message)
    }

    fn get(&self, id: MessageId) -> StoreResult<Message> {
        self.check_available()?;
        self.messages
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn append_entry(&self, id: MessageId, entry: NewEntry) -> StoreResult<ConversationEntry> {
        self.check_available()?;
        let mut messages = self.messages.write();
        let message = messages.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if message.status != MessageStatus::Pending {
            return Err(StoreError::InvalidTransition {
                message_id: id,
                from: message.status,
                action: "append entry".to_string(),
            });
        }

        let entry = Self::materialize(entry);
        message.insert_entry(entry.clone());
        message.is_read = false;
        Ok(entry)
    }

    fn edit_entry(
        &self,
        id: MessageId,
        entry_id: EntryId,
        author: Role,
        content: String,
        attachment: Option<Attachment>,
    ) -> StoreResult<ConversationEntry> {
        self.check_available()?;
        let mut messages = self.messages.write();
        let message = messages.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let entry = message
            .conversation
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or(StoreError::EntryNotFound {
                message_id: id,
                entry_id,
            })?;
        if entry.role != author {
            return Err(StoreError::NotAuthor(entry_id));
        }

        entry.content = content;
        if attachment.is_some() {
            entry.attachment = attachment;
        }
        entry.edited = true;
        Ok(entry.clone())
    }

    fn set_read(&self, id: MessageId, read: bool) -> StoreResult<()> {
        self.check_available()?;
        let mut messages = self.messages.write();
        let message = messages.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        message.is_read = read;
        Ok(())
    }

    fn set_rating(&self, id: MessageId, rating: Rating) -> StoreResult<()> {
        self.check_available()?;
        let mut messages = self.messages.write();
        let message = messages.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if message.status != MessageStatus::Replied {
            return Err(StoreError::InvalidTransition {
                message_id: id,
                from: message.status,
                action: "rate".to_string(),
            });
        }
        if message.rating.is_some() {
            return Err(StoreError::AlreadyRated(id));
        }
        message.rating = Some(rating);
        Ok(())
    }

    fn query(&self, query: &MessageQuery) -> StoreResult<Vec<Message>> {
        self.check_available()?;
        let mut found: Vec<Message> = self
            .messages
            .read()
            .values()
            .filter(|m| query.matches(m))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }

    fn overdue(
        &self,
        now: Timestamp,
        participant: Option<AccountId>,
    ) -> StoreResult<Vec<MessageId>> {
        self.check_available()?;
        let mut due: Vec<(Timestamp, MessageId)> = self
            .messages
            .read()
            .values()
            .filter(|m| m.is_overdue(now))
            .filter(|m| participant.map_or(true, |p| m.is_participant(p)))
            .map(|m| (m.expires_at, m.id))
            .collect();
        due.sort();
        Ok(due.into_iter().map(|(_, id)| id).collect())
    }

    fn resolve_pending<E, F>(
        &self,
        id: MessageId,
        resolution: Resolution,
        settle: F,
    ) -> Result<ResolveOutcome, E>
    where
        F: FnOnce(&Message) -> Result<(), E>,
        E: From<StoreError>,
    {
        self.check_available()?;
        let mut messages = self.messages.write();
        let message = messages.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if message.status != MessageStatus::Pending {
            return Ok(ResolveOutcome::AlreadyResolved(message.clone()));
        }
        if !message.status.can_transition_to(resolution.status) {
            return Err(StoreError::InvalidTransition {
                message_id: id,
                from: message.status,
                action: format!("move to {}", resolution.status),
            }
            .into());
        }

        settle(&*message)?;

        message.status = resolution.status;
        if resolution.status == MessageStatus::Replied {
            message.reply_at = Some(resolution.at);
            if let Some(entry) = resolution.closing_entry {
                message.insert_entry(Self::materialize(entry));
            }
            message.is_read = false;
        }
        info!(
            "[ce-02] Message {} resolved to {}",
            message.id, message.status
        );
        Ok(ResolveOutcome::Applied(message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageKind;

    const HOUR: u64 = 3_600_000;

    fn draft(sender: AccountId, creator: AccountId, kind: MessageKind, at: Timestamp) -> MessageDraft {
        MessageDraft {
            sender,
            creator,
            amount: 100,
            kind,
            content: "hello".to_string(),
            attachment: None,
            created_at: at,
            response_window_ms: 48 * HOUR,
        }
    }

    fn reply(status: MessageStatus, at: Timestamp) -> Resolution {
        Resolution {
            status,
            at,
            closing_entry: (status == MessageStatus::Replied)
                .then(|| NewEntry::manual(Role::Creator, "thanks", None, at)),
        }
    }

    #[test]
    fn test_create_regular_is_pending() {
        let store = InMemoryMessageStore::new();
        let msg = store
            .create(draft(AccountId::new(), AccountId::new(), MessageKind::Regular, 1_000))
            .unwrap();

        assert_eq!(msg.status, MessageStatus::Pending);
        assert_eq!(msg.expires_at, 1_000 + 48 * HOUR);
        assert_eq!(msg.conversation.len(), 1);
        assert_eq!(msg.original_content, "hello");
        assert!(msg.reply_at.is_none());
    }

    #[test]
    fn test_create_tip_settles_immediately() {
        let store = InMemoryMessageStore::new();
        let msg = store
            .create(draft(AccountId::new(), AccountId::new(), MessageKind::Tip, 7))
            .unwrap();

        assert_eq!(msg.status, MessageStatus::Replied);
        assert_eq!(msg.reply_at, Some(7));
    }

    #[test]
    fn test_guard_rejection_stores_nothing() {
        let store = InMemoryMessageStore::new();
        let result: Result<Message, StoreError> = store.create_guarded(
            draft(AccountId::new(), AccountId::new(), MessageKind::Regular, 0),
            |_| Err(StoreError::Unavailable("rejected".into())),
        );

        assert!(result.is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_guard_sees_prior_messages_to_same_creator() {
        let store = InMemoryMessageStore::new();
        let (sender, creator) = (AccountId::new(), AccountId::new());
        store.create(draft(sender, creator, MessageKind::Regular, 0)).unwrap();
        store.create(draft(sender, AccountId::new(), MessageKind::Regular, 0)).unwrap();

        let mut seen = 0;
        store
            .create_guarded(draft(sender, creator, MessageKind::Tip, 1), |prior| {
                seen = prior.len();
                Ok::<(), StoreError>(())
            })
            .unwrap();
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_resolve_applies_once() {
        let store = InMemoryMessageStore::new();
        let msg = store
            .create(draft(AccountId::new(), AccountId::new(), MessageKind::Regular, 0))
            .unwrap();

        let first: ResolveOutcome = store
            .resolve_pending(msg.id, reply(MessageStatus::Replied, 10), |_| Ok::<(), StoreError>(()))
            .unwrap();
        let ResolveOutcome::Applied(replied) = first else {
            panic!("expected applied");
        };
        assert_eq!(replied.status, MessageStatus::Replied);
        assert_eq!(replied.reply_at, Some(10));
        assert_eq!(replied.conversation.len(), 2);

        let mut settled = false;
        let second = store
            .resolve_pending(msg.id, reply(MessageStatus::Expired, 20), |_| {
                settled = true;
                Ok::<(), StoreError>(())
            })
            .unwrap();
        assert!(matches!(second, ResolveOutcome::AlreadyResolved(_)));
        assert!(!settled);
    }

    #[test]
    fn test_failed_settle_leaves_pending() {
        let store = InMemoryMessageStore::new();
        let msg = store
            .create(draft(AccountId::new(), AccountId::new(), MessageKind::Regular, 0))
            .unwrap();

        let result: Result<ResolveOutcome, StoreError> = store
            .resolve_pending(msg.id, reply(MessageStatus::Cancelled, 5), |_| {
                Err(StoreError::Unavailable("ledger down".into()))
            });
        assert!(result.is_err());
        assert_eq!(store.get(msg.id).unwrap().status, MessageStatus::Pending);
    }

    #[test]
    fn test_append_rejected_after_terminal() {
        let store = InMemoryMessageStore::new();
        let msg = store
            .create(draft(AccountId::new(), AccountId::new(), MessageKind::Regular, 0))
            .unwrap();
        store
            .resolve_pending(msg.id, reply(MessageStatus::Cancelled, 5), |_| Ok::<(), StoreError>(()))
            .unwrap();

        let err = store
            .append_entry(msg.id, NewEntry::manual(Role::Sender, "hey", None, 6))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }

    #[test]
    fn test_append_marks_unread() {
        let store = InMemoryMessageStore::new();
        let msg = store
            .create(draft(AccountId::new(), AccountId::new(), MessageKind::Regular, 0))
            .unwrap();
        store.set_read(msg.id, true).unwrap();
        store
            .append_entry(msg.id, NewEntry::manual(Role::Creator, "partial", None, 3))
            .unwrap();

        assert!(!store.get(msg.id).unwrap().is_read);
    }

    #[test]
    fn test_edit_author_only_and_preserves_original() {
        let store = InMemoryMessageStore::new();
        let msg = store
            .create(draft(AccountId::new(), AccountId::new(), MessageKind::Regular, 0))
            .unwrap();
        let entry_id = msg.conversation[0].id;

        let err = store
            .edit_entry(msg.id, entry_id, Role::Creator, "nope".into(), None)
            .unwrap_err();
        assert_eq!(err, StoreError::NotAuthor(entry_id));

        let edited = store
            .edit_entry(msg.id, entry_id, Role::Sender, "hello again".into(), None)
            .unwrap();
        assert!(edited.edited);
        assert_eq!(edited.timestamp, 0);

        let stored = store.get(msg.id).unwrap();
        assert_eq!(stored.original_content, "hello");
        assert_eq!(stored.conversation[0].content, "hello again");
    }

    #[test]
    fn test_edit_keeps_attachment_when_none_given() {
        let store = InMemoryMessageStore::new();
        let mut d = draft(AccountId::new(), AccountId::new(), MessageKind::Regular, 0);
        d.attachment = Some(Attachment {
            url: "https://files/a.png".into(),
            content_type: "image/png".into(),
        });
        let msg = store.create(d).unwrap();
        let entry_id = msg.conversation[0].id;

        let edited = store
            .edit_entry(msg.id, entry_id, Role::Sender, "caption".into(), None)
            .unwrap();
        assert!(edited.attachment.is_some());
    }

    #[test]
    fn test_rating_write_once_and_replied_only() {
        let store = InMemoryMessageStore::new();
        let msg = store
            .create(draft(AccountId::new(), AccountId::new(), MessageKind::Regular, 0))
            .unwrap();
        let rating = Rating {
            stars: 5,
            review: None,
            rated_at: 1,
        };

        assert!(matches!(
            store.set_rating(msg.id, rating.clone()),
            Err(StoreError::InvalidTransition { .. })
        ));

        store
            .resolve_pending(msg.id, reply(MessageStatus::Replied, 1), |_| Ok::<(), StoreError>(()))
            .unwrap();
        store.set_rating(msg.id, rating.clone()).unwrap();
        assert_eq!(
            store.set_rating(msg.id, rating),
            Err(StoreError::AlreadyRated(msg.id))
        );
    }

    #[test]
    fn test_overdue_boundary_and_scope() {
        let store = InMemoryMessageStore::new();
        let sender = AccountId::new();
        let a = store.create(draft(sender, AccountId::new(), MessageKind::Regular, 0)).unwrap();
        let b = store
            .create(draft(AccountId::new(), AccountId::new(), MessageKind::Regular, 0))
            .unwrap();

        assert!(store.overdue(a.expires_at - 1, None).unwrap().is_empty());
        assert_eq!(store.overdue(a.expires_at, None).unwrap().len(), 2);
        assert_eq!(store.overdue(a.expires_at, Some(sender)).unwrap(), vec![a.id]);
        assert!(!store.overdue(b.expires_at, Some(sender)).unwrap().contains(&b.id));
    }

    #[test]
    fn test_query_newest_first() {
        let store = InMemoryMessageStore::new();
        let sender = AccountId::new();
        for at in [10, 30, 20] {
            store.create(draft(sender, AccountId::new(), MessageKind::Regular, at)).unwrap();
        }

        let listed = store.query(&MessageQuery::participant(sender)).unwrap();
        let times: Vec<_> = listed.iter().map(|m| m.created_at).collect();
        assert_eq!(times, vec![30, 20, 10]);

        let as_creator = store
            .query(&MessageQuery::participant(sender).as_role(Role::Creator))
            .unwrap();
        assert!(as_creator.is_empty());
    }

    #[test]
    fn test_unavailable() {
        let store = InMemoryMessageStore::new();
        store.set_available(false);
        let err = store
            .create(draft(AccountId::new(), AccountId::new(), MessageKind::Regular, 0))
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
