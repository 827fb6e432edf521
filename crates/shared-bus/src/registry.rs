//! Live subscription bookkeeping.

use crate::events::{EventFilter, EventTopic};
use parking_lot::Mutex;
use shared_types::AccountId;
use std::collections::HashMap;

/// Identifies subscriptions that asked for the same events.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct FilterKey {
    topics: Vec<EventTopic>,
    recipient: Option<AccountId>,
}

impl From<&EventFilter> for FilterKey {
    fn from(filter: &EventFilter) -> Self {
        Self {
            topics: filter.topics.clone(),
            recipient: filter.recipient,
        }
    }
}

/// Counts live subscriptions per filter.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionRegistry {
    live: Mutex<HashMap<FilterKey, usize>>,
}

impl SubscriptionRegistry {
    pub(crate) fn acquire(&self, key: FilterKey) {
        *self.live.lock().entry(key).or_insert(0) += 1;
    }

    pub(crate) fn release(&self, key: &FilterKey) {
        let mut live = self.live.lock();
        if let Some(count) = live.get_mut(key) {
            *count -= 1;
            if *count == 0 {
                live.remove(key);
            }
        }
    }

    pub(crate) fn count(&self, key: &FilterKey) -> usize {
        self.live.lock().get(key).copied().unwrap_or(0)
    }
}
