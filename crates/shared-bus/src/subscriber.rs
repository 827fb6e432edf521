//! # Event Subscriber
//!
//! The receiving side of the notification bus.

use crate::events::{EscrowEvent, EventFilter};
use crate::registry::{FilterKey, SubscriptionRegistry};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("Event bus closed")]
    Closed,
}

/// A live subscription. Dropping it unregisters it.
pub struct Subscription {
    receiver: broadcast::Receiver<EscrowEvent>,
    filter: EventFilter,
    registry: Arc<SubscriptionRegistry>,
    key: FilterKey,
    lagged: u64,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<EscrowEvent>,
        filter: EventFilter,
        registry: Arc<SubscriptionRegistry>,
        key: FilterKey,
    ) -> Self {
        Self {
            receiver,
            filter,
            registry,
            key,
            lagged: 0,
        }
    }

    /// Next event that passes the filter.
    ///
    /// `None` once the bus has been dropped.
    pub async fn recv(&mut self) -> Option<EscrowEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => self.record_lag(missed),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next queued event that passes the filter, without waiting.
    ///
    /// `Ok(None)` means nothing matching is queued right now.
    pub fn try_recv(&mut self) -> Result<Option<EscrowEvent>, SubscriptionError> {
        use broadcast::error::TryRecvError;
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(TryRecvError::Lagged(missed)) => self.record_lag(missed),
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }

    fn record_lag(&mut self, missed: u64) {
        self.lagged += missed;
        warn!(missed, total = self.lagged, recipient = ?self.filter.recipient, "Subscriber fell behind, notifications lost");
    }

    /// The filter this subscription was created with.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Events lost because this subscriber fell behind.
    #[must_use]
    pub fn lagged(&self) -> u64 {
        self.lagged
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.release(&self.key);
        debug!(topics = ?self.filter.topics, recipient = ?self.filter.recipient, "Subscription dropped");
    }
}
