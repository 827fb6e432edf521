//! # Escrow Metrics
//!
//! Prometheus metrics for monitoring escrow health.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! ce-03-escrow = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `escrow_messages_created_total` - Counter of created messages (by kind)
//! - `escrow_transitions_total` - Counter of committed terminal transitions (by status)
//! - `escrow_requests_rejected_total` - Counter of rejected requests (by error kind)
//! - `escrow_reconcile_passes_total` - Counter of reconciliation passes (by outcome)
//! - `escrow_reconcile_deferred_total` - Counter of expiries left pending after a failed refund
//! - `escrow_notification_failures_total` - Counter of notifications that could not be delivered
//! - `escrow_ledger_corruptions_total` - Counter of unmatched debits

use ce_02_message_store::{MessageKind, MessageStatus};

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Messages created, labeled by kind
    pub static ref MESSAGES_CREATED: IntCounterVec = register_int_counter_vec!(
        "escrow_messages_created_total",
        "Total number of paid messages created",
        &["kind"]
    )
    .expect("Failed to create MESSAGES_CREATED metric");

    /// Terminal transitions, labeled by resulting status
    pub static ref TRANSITIONS: IntCounterVec = register_int_counter_vec!(
        "escrow_transitions_total",
        "Total number of committed terminal transitions",
        &["status"]
    )
    .expect("Failed to create TRANSITIONS metric");

    /// Rejected requests, labeled by error kind
    pub static ref REQUESTS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "escrow_requests_rejected_total",
        "Total number of rejected requests",
        &["kind"]
    )
    .expect("Failed to create REQUESTS_REJECTED metric");

    /// Reconciliation passes, labeled by outcome
    pub static ref RECONCILE_PASSES: IntCounterVec = register_int_counter_vec!(
        "escrow_reconcile_passes_total",
        "Total number of reconciliation passes that found overdue messages",
        &["outcome"]
    )
    .expect("Failed to create RECONCILE_PASSES metric");

    /// Expiries deferred to the next read
    pub static ref RECONCILE_DEFERRED: IntCounter = register_int_counter!(
        "escrow_reconcile_deferred_total",
        "Total number of expiries left pending after a failed refund"
    )
    .expect("Failed to create RECONCILE_DEFERRED metric");

    /// Notifications that could not be delivered
    pub static ref NOTIFICATION_FAILURES: IntCounter = register_int_counter!(
        "escrow_notification_failures_total",
        "Total number of failed notifications"
    )
    .expect("Failed to create NOTIFICATION_FAILURES metric");

    /// Unmatched debits
    pub static ref LEDGER_CORRUPTIONS: IntCounter = register_int_counter!(
        "escrow_ledger_corruptions_total",
        "Total number of unmatched debits"
    )
    .expect("Failed to create LEDGER_CORRUPTIONS metric");
}

fn kind_label(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Regular => "regular",
        MessageKind::ProductPurchase => "product_purchase",
        MessageKind::Tip => "tip",
    }
}

fn status_label(status: MessageStatus) -> &'static str {
    match status {
        MessageStatus::Pending => "pending",
        MessageStatus::Replied => "replied",
        MessageStatus::Cancelled => "cancelled",
        MessageStatus::Expired => "expired",
    }
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a created message
#[cfg(feature = "metrics")]
pub fn record_message_created(kind: MessageKind) {
    MESSAGES_CREATED.with_label_values(&[kind_label(kind)]).inc();
}

/// Record a committed terminal transition
#[cfg(feature = "metrics")]
pub fn record_transition(status: MessageStatus) {
    TRANSITIONS.with_label_values(&[status_label(status)]).inc();
}

/// Record a rejected request
#[cfg(feature = "metrics")]
pub fn record_rejection(kind: &str) {
    REQUESTS_REJECTED.with_label_values(&[kind]).inc();
}

/// Record a reconciliation pass
#[cfg(feature = "metrics")]
pub fn record_reconcile_pass(outcome: &str) {
    RECONCILE_PASSES.with_label_values(&[outcome]).inc();
}

/// Record a deferred expiry
#[cfg(feature = "metrics")]
pub fn record_reconcile_deferred() {
    RECONCILE_DEFERRED.inc();
}

/// Record a failed notification
#[cfg(feature = "metrics")]
pub fn record_notification_failure() {
    NOTIFICATION_FAILURES.inc();
}

/// Record an unmatched debit
#[cfg(feature = "metrics")]
pub fn record_ledger_corruption() {
    LEDGER_CORRUPTIONS.inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_message_created(kind: MessageKind) {
    let _ = kind_label(kind);
}

#[cfg(not(feature = "metrics"))]
pub fn record_transition(status: MessageStatus) {
    let _ = status_label(status);
}

#[cfg(not(feature = "metrics"))]
pub fn record_rejection(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_reconcile_pass(_outcome: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_reconcile_deferred() {}

#[cfg(not(feature = "metrics"))]
pub fn record_notification_failure() {}

#[cfg(not(feature = "metrics"))]
pub fn record_ledger_corruption() {}
