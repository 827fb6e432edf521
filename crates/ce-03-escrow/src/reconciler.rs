//! # Expiration Reconciler
//!
//! Lazy, pull-based expiry. Every read path calls in here first; there is no
//! timer in the engine.
//!
//! ```text
//! overdue(now) ──→ for each id ──→ resolve_pending(EXPIRED)
//!                                      │
//!                                      ├── applied          → expired
//!                                      ├── already resolved → no-op
//!                                      └── refund failed    → deferred (stays PENDING)
//! ```

use crate::domain::{authorize, Actor, Transition};
use crate::error::{EscrowError, EscrowResult};
use crate::metrics;
use crate::settlement::apply_effect;
use ce_01_ledger::LedgerApi;
use ce_02_message_store::{Message, MessageStatus, MessageStore, Resolution, ResolveOutcome};
use shared_types::{AccountId, MessageId, Timestamp};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An expiry that could not be applied this time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeferredExpiry {
    /// Message left PENDING.
    pub message_id: MessageId,
    /// Why the refund did not go through.
    pub error: EscrowError,
}

/// Outcome of one reconciliation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Messages this pass moved to EXPIRED.
    pub expired: Vec<Message>,
    /// Overdue messages another transition resolved first.
    pub already_resolved: usize,
    /// Expiries to retry on the next read.
    pub deferred: Vec<DeferredExpiry>,
}

impl ReconcileReport {
    /// Whether nothing was deferred.
    pub fn is_clean(&self) -> bool {
        self.deferred.is_empty()
    }

    /// Credits refunded by this pass.
    pub fn refunded(&self) -> u64 {
        self.expired.iter().map(|m| m.amount).sum()
    }

    fn outcome_label(&self) -> &'static str {
        match (self.expired.is_empty(), self.deferred.is_empty()) {
            (_, false) => "deferred",
            (false, true) => "expired",
            (true, true) => "idle",
        }
    }
}

/// Drives overdue PENDING messages to EXPIRED.
pub struct ExpirationReconciler<L: LedgerApi, S: MessageStore> {
    ledger: Arc<L>,
    store: Arc<S>,
}

impl<L: LedgerApi, S: MessageStore> ExpirationReconciler<L, S> {
    /// Create a reconciler over a ledger and a store.
    pub fn new(ledger: Arc<L>, store: Arc<S>) -> Self {
        Self { ledger, store }
    }

    /// Expire every overdue message.
    pub fn reconcile(&self, now: Timestamp) -> EscrowResult<ReconcileReport> {
        self.run(now, None)
    }

    /// Expire overdue messages where `account` is a participant.
    pub fn reconcile_for(&self, account: AccountId, now: Timestamp) -> EscrowResult<ReconcileReport> {
        self.run(now, Some(account))
    }

    /// Expire one message if it is overdue.
    pub fn reconcile_message(&self, id: MessageId, now: Timestamp) -> EscrowResult<ReconcileReport> {
        let mut report = ReconcileReport::default();
        if self.store.get(id)?.is_overdue(now) {
            self.expire_one(id, now, &mut report);
        }
        Ok(report)
    }

    fn run(&self, now: Timestamp, participant: Option<AccountId>) -> EscrowResult<ReconcileReport> {
        let overdue = self.store.overdue(now, participant)?;
        let mut report = ReconcileReport::default();
        if overdue.is_empty() {
            return Ok(report);
        }

        debug!("[ce-03] Reconciling {} overdue messages", overdue.len());
        for id in overdue {
            self.expire_one(id, now, &mut report);
        }
        metrics::record_reconcile_pass(report.outcome_label());
        Ok(report)
    }

    fn expire_one(&self, id: MessageId, now: Timestamp, report: &mut ReconcileReport) {
        let resolution = Resolution {
            status: MessageStatus::Expired,
            at: now,
            closing_entry: None,
        };

        let outcome = self.store.resolve_pending(id, resolution, |message| {
            let effect = authorize(message, Transition::Expire, Actor::Reconciler, now, false)?;
            apply_effect(self.ledger.as_ref(), message, effect)
        });

        match outcome {
            Ok(ResolveOutcome::Applied(message)) => {
                info!(
                    message_id = %message.id,
                    sender = %message.sender,
                    amount = message.amount,
                    "[ce-03] Message expired, sender refunded"
                );
                metrics::record_transition(MessageStatus::Expired);
                report.expired.push(message);
            }
            Ok(ResolveOutcome::AlreadyResolved(message)) => {
                debug!(
                    "[ce-03] Message {} already {}, skipping expiry",
                    message.id, message.status
                );
                report.already_resolved += 1;
            }
            Err(error) => {
                warn!(
                    message_id = %id,
                    error = %error,
                    "[ce-03] Expiry deferred, message stays pending"
                );
                metrics::record_reconcile_deferred();
                report.deferred.push(DeferredExpiry {
                    message_id: id,
                    error,
                });
            }
        }
    }
}
