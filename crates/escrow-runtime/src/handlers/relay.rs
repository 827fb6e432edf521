//! # Notification Relay
//!
//! Drains the event bus and hands each committed transition to the delivery
//! transport. In this runtime the transport is the structured log; a push or
//! e-mail worker subscribes the same way.
//!
//! ```text
//! EscrowService ──publish──→ Event Bus ──subscribe──→ NotificationRelay
//!                                                        │
//!                                     ┌──────────────────┼──────────────────┐
//!                                     ▼                  ▼                  ▼
//!                               one line per      CriticalError →    lag counter
//!                                recipient         dlq.critical
//! ```

use escrow_telemetry::{
    log_ledger_event, log_message_event, NOTIFICATIONS_LAGGED, NOTIFICATIONS_RELAYED,
};
use shared_bus::{EscrowEvent, EventFilter, InMemoryEventBus, Subscription, DLQ_TOPIC};
use tracing::{error, info, instrument};

/// Counters for one relay run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Events handed to recipients.
    pub relayed: u64,
    /// Events routed to the dead letter queue.
    pub critical: u64,
    /// Completed creator payouts.
    pub payouts: u64,
    /// Events lost because the relay fell behind.
    pub lagged: u64,
}

/// Relays every bus event to its recipients.
pub struct NotificationRelay {
    subscription: Subscription,
    stats: RelayStats,
}

impl NotificationRelay {
    /// Subscribe to every topic on `bus`.
    pub fn new(bus: &InMemoryEventBus) -> Self {
        Self {
            subscription: bus.subscribe(EventFilter::all()),
            stats: RelayStats::default(),
        }
    }

    /// Relay until the bus closes.
    #[instrument(skip(self), name = "notification_relay")]
    pub async fn run(mut self) -> RelayStats {
        info!("[runtime] Notification relay started");

        while let Some(event) = self.subscription.recv().await {
            self.record_lag();
            self.relay(&event);
        }
        self.record_lag();

        info!(
            relayed = self.stats.relayed,
            critical = self.stats.critical,
            payouts = self.stats.payouts,
            lagged = self.stats.lagged,
            "[runtime] Notification relay stopped"
        );
        self.stats
    }

    fn relay(&mut self, event: &EscrowEvent) {
        let topic = format!("{:?}", event.topic());

        match event {
            EscrowEvent::CriticalError {
                subsystem_id,
                accounts,
                error,
            } => {
                self.stats.critical += 1;
                error!(
                    topic = DLQ_TOPIC,
                    subsystem_id,
                    accounts = ?accounts,
                    "[runtime] Critical escrow error: {}",
                    error
                );
            }
            EscrowEvent::WithdrawalCompleted {
                withdrawal_id,
                creator,
                amount,
            } => {
                self.stats.payouts += 1;
                log_ledger_event!(
                    info,
                    "runtime",
                    "payout relayed",
                    creator,
                    *amount,
                    withdrawal_id = %withdrawal_id,
                    topic = %topic
                );
            }
            other => {
                let message_id = event_subject(other);
                for recipient in other.recipients() {
                    log_message_event!(
                        info,
                        "runtime",
                        "notification relayed",
                        message_id,
                        recipient = %recipient,
                        topic = %topic
                    );
                }
            }
        }

        self.stats.relayed += 1;
        NOTIFICATIONS_RELAYED.with_label_values(&[topic.as_str()]).inc();
    }

    fn record_lag(&mut self) {
        let total = self.subscription.lagged();
        if total > self.stats.lagged {
            NOTIFICATIONS_LAGGED.inc_by(total - self.stats.lagged);
            self.stats.lagged = total;
        }
    }
}

/// The id an event is about, for log correlation.
fn event_subject(event: &EscrowEvent) -> String {
    match event {
        EscrowEvent::MessageCreated { message_id, .. }
        | EscrowEvent::ReplyPosted { message_id, .. }
        | EscrowEvent::MessageReplied { message_id, .. }
        | EscrowEvent::MessageCancelled { message_id, .. }
        | EscrowEvent::MessageExpired { message_id, .. }
        | EscrowEvent::MessageRated { message_id, .. } => message_id.to_string(),
        EscrowEvent::WithdrawalCompleted { withdrawal_id, .. } => withdrawal_id.to_string(),
        EscrowEvent::CriticalError { subsystem_id, .. } => format!("subsystem-{subsystem_id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::EventPublisher;
    use shared_types::{AccountId, MessageId, WithdrawalId};

    fn created() -> EscrowEvent {
        EscrowEvent::MessageCreated {
            message_id: MessageId::new(),
            sender: AccountId::new(),
            creator: AccountId::new(),
            amount: 10,
            settled: false,
        }
    }

    #[tokio::test]
    async fn test_relays_until_bus_closes() {
        let bus = InMemoryEventBus::new();
        let relay = NotificationRelay::new(&bus);

        bus.publish(created()).await;
        bus.publish(EscrowEvent::CriticalError {
            subsystem_id: 1,
            accounts: vec![AccountId::new()],
            error: "ledger mismatch".into(),
        })
        .await;
        drop(bus);

        let stats = relay.run().await;
        assert_eq!(stats.relayed, 2);
        assert_eq!(stats.critical, 1);
        assert_eq!(stats.lagged, 0);
    }

    #[tokio::test]
    async fn test_counts_payouts() {
        let bus = InMemoryEventBus::new();
        let relay = NotificationRelay::new(&bus);

        bus.publish(EscrowEvent::WithdrawalCompleted {
            withdrawal_id: WithdrawalId::new(),
            creator: AccountId::new(),
            amount: 500,
        })
        .await;
        bus.publish(created()).await;
        drop(bus);

        let stats = relay.run().await;
        assert_eq!(stats.relayed, 2);
        assert_eq!(stats.payouts, 1);
        assert_eq!(stats.critical, 0);
    }

    #[tokio::test]
    async fn test_counts_lagged_events() {
        let bus = InMemoryEventBus::with_capacity(2);
        let relay = NotificationRelay::new(&bus);

        for _ in 0..5 {
            bus.publish(created()).await;
        }
        drop(bus);

        let stats = relay.run().await;
        assert_eq!(stats.lagged, 3);
        assert_eq!(stats.relayed, 2);
    }
}
