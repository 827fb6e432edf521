//! Payout Rail Adapter
//!
//! In production this would call the card processor's transfer API.

use crate::ports::{PayoutError, PayoutRail, PayoutReceipt, PayoutRequest};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::info;

/// In-memory payout rail for testing and local runs.
pub struct InMemoryPayoutRail {
    sent: RwLock<Vec<PayoutRequest>>,
    next_reference: AtomicU64,
    rejections: AtomicU32,
}

impl InMemoryPayoutRail {
    /// Create a rail that accepts everything.
    pub fn new() -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            next_reference: AtomicU64::new(1),
            rejections: AtomicU32::new(0),
        }
    }

    /// Reject the next `count` payouts.
    pub fn reject_next(&self, count: u32) {
        self.rejections.store(count, Ordering::SeqCst);
    }

    /// Payouts accepted so far.
    pub fn sent(&self) -> Vec<PayoutRequest> {
        self.sent.read().clone()
    }
}

impl Default for InMemoryPayoutRail {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PayoutRail for InMemoryPayoutRail {
    async fn send_payout(&self, request: PayoutRequest) -> Result<PayoutReceipt, PayoutError> {
        let rejected = self
            .rejections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(PayoutError::Rejected("no payout account connected".to_string()));
        }

        let reference = format!("po_{:08}", self.next_reference.fetch_add(1, Ordering::SeqCst));
        info!(
            "[ce-01] Payout {} of {} credits to {}",
            reference, request.amount, request.creator
        );
        self.sent.write().push(request);
        Ok(PayoutReceipt { reference })
    }
}
