//! Notification sink backed by the shared event bus.

use crate::ports::{NotificationSink, NotifyError};
use async_trait::async_trait;
use shared_bus::{EscrowEvent, EventPublisher};
use std::sync::Arc;
use tracing::debug;

/// Publishes every notification onto an event bus.
///
/// Delivery to the parties is the job of whatever subscribes.
pub struct BusNotifier {
    bus: Arc<dyn EventPublisher>,
}

impl BusNotifier {
    /// Wrap a publisher.
    pub fn new(bus: Arc<dyn EventPublisher>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl NotificationSink for BusNotifier {
    async fn notify(&self, event: EscrowEvent) -> Result<(), NotifyError> {
        let topic = event.topic();
        let receivers = self.bus.publish(event).await;
        debug!("[ce-03] Published {:?} event to {} subscribers", topic, receivers);
        Ok(())
    }
}
