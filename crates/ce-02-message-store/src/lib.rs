//! # CE-02 Message Store
//!
//! Paid messages, their conversations and their escrow status.
//!
//! **Subsystem ID:** 2
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Guarantees
//!
//! | Rule | Enforcement |
//! |------|-------------|
//! | One terminal transition per message | `resolve_pending` compare-and-set under the write lock |
//! | Settlement coupled to status | Status flips only if the `settle` closure succeeds |
//! | Duplicate checks are race-free | `create_guarded` runs `admit` and the insert in one critical section |
//! | Deadline fixed at creation | `expires_at = created_at + window`, never rewritten |
//! | Original text immutable | Edits touch entries, never `original_content` |
//!
//! ## Module Structure
//!
//! ```text
//! ce-02-message-store/
//! ├── domain/     # Message, ConversationEntry, MessageStatus, StoreError
//! ├── ports/      # MessageStore, MessageQuery, ResolveOutcome
//! └── adapters/   # InMemoryMessageStore
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::InMemoryMessageStore;
pub use domain::{
    Attachment, ConversationEntry, EntryOrigin, Message, MessageDraft, MessageKind, MessageStatus,
    NewEntry, Rating, Resolution, Role, StoreError, StoreResult,
};
pub use ports::{MessageQuery, MessageStore, ResolveOutcome};
