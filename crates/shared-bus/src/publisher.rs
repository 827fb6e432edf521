//! # Event Publisher
//!
//! The publishing side of the notification bus.

use crate::events::{EscrowEvent, EventFilter, EventTopic};
use crate::registry::{FilterKey, SubscriptionRegistry};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Trait for publishing events to the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a committed event.
    ///
    /// Returns how many subscriptions received it. Never fails: an event
    /// nobody listens for is dropped.
    async fn publish(&self, event: EscrowEvent) -> usize;

    /// Events published since startup, delivered or not.
    fn events_published(&self) -> u64;
}

/// In-process notification bus over `tokio::sync::broadcast`.
///
/// Each subscription buffers up to `capacity` events; a slow subscriber
/// loses the oldest ones and sees the gap in `Subscription::lagged`.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<EscrowEvent>,
    registry: Arc<SubscriptionRegistry>,
    published: Mutex<HashMap<EventTopic, u64>>,
    capacity: usize,
}

impl InMemoryEventBus {
    /// Bus with the default per-subscriber buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Bus buffering `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            registry: Arc::new(SubscriptionRegistry::default()),
            published: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to events matching `filter`.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let key = FilterKey::from(&filter);
        self.registry.acquire(key.clone());
        debug!(topics = ?filter.topics, recipient = ?filter.recipient, "Subscribed to escrow events");
        Subscription::new(self.sender.subscribe(), filter, Arc::clone(&self.registry), key)
    }

    /// Live subscriptions of any filter.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Live subscriptions created with an equal filter.
    #[must_use]
    pub fn subscriptions_for(&self, filter: &EventFilter) -> usize {
        self.registry.count(&FilterKey::from(filter))
    }

    /// Events published on one topic since startup.
    #[must_use]
    pub fn published_on(&self, topic: EventTopic) -> u64 {
        let published = self.published.lock();
        if topic == EventTopic::All {
            published.values().sum()
        } else {
            published.get(&topic).copied().unwrap_or(0)
        }
    }

    /// Per-subscriber buffer size.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: EscrowEvent) -> usize {
        let topic = event.topic();
        let source = event.source_subsystem();
        *self.published.lock().entry(topic).or_insert(0) += 1;

        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(topic = ?topic, source, receivers, "Escrow event published");
                receivers
            }
            Err(broadcast::error::SendError(event)) => {
                warn!(
                    topic = ?topic,
                    source,
                    recipients = ?event.recipients(),
                    "Escrow event dropped, nobody subscribed"
                );
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.published_on(EventTopic::All)
    }
}
