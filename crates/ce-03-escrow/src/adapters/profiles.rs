//! In-memory creator profiles.

use crate::ports::ProfileDirectory;
use parking_lot::RwLock;
use shared_types::AccountId;
use std::collections::HashMap;

/// Profile fields the engine reads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreatorProfile {
    /// Shown in notifications.
    pub display_name: Option<String>,
    /// Hours the creator has to reply.
    pub response_window_hours: Option<u32>,
    /// Auto-reply appended to new regular messages.
    pub welcome_message: Option<String>,
}

/// Profile directory held in memory.
#[derive(Default)]
pub struct InMemoryProfileDirectory {
    profiles: RwLock<HashMap<AccountId, CreatorProfile>>,
}

impl InMemoryProfileDirectory {
    /// Empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile.
    pub fn set_profile(&self, account: AccountId, profile: CreatorProfile) {
        self.profiles.write().insert(account, profile);
    }

    fn field<T>(&self, account: AccountId, f: impl FnOnce(&CreatorProfile) -> Option<T>) -> Option<T> {
        self.profiles.read().get(&account).and_then(f)
    }
}

impl ProfileDirectory for InMemoryProfileDirectory {
    fn response_window_hours(&self, creator: AccountId) -> Option<u32> {
        self.field(creator, |p| p.response_window_hours)
    }

    fn welcome_message(&self, creator: AccountId) -> Option<String> {
        self.field(creator, |p| p.welcome_message.clone())
            .filter(|w| !w.trim().is_empty())
    }

    fn display_name(&self, account: AccountId) -> Option<String> {
        self.field(account, |p| p.display_name.clone())
    }
}
