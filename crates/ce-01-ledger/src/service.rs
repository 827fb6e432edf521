//! # Withdrawal Service
//!
//! Couples the ledger debit with the payout rail call.
//!
//! ```text
//! debit(creator) ──→ rail.send_payout ──ok──→ [COMPLETED]
//!                          │
//!                          └──err──→ credit(creator) ──ok──→ [FAILED] + PayoutFailed
//!                                          │
//!                                          └──err──→ halt(creator) + Corruption
//! ```

use crate::domain::{
    invariant_positive_amount, LedgerError, LedgerResult, MovementReason, Withdrawal,
    WithdrawalStatus,
};
use crate::ports::{LedgerApi, PayoutRail, PayoutRequest};
use parking_lot::RwLock;
use shared_types::{AccountId, Credits, Timestamp, WithdrawalId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Default minimum withdrawal.
pub const DEFAULT_MIN_WITHDRAWAL: Credits = 100;

/// Creator withdrawals.
pub struct WithdrawalService<L: LedgerApi> {
    ledger: Arc<L>,
    rail: Arc<dyn PayoutRail>,
    withdrawals: RwLock<HashMap<WithdrawalId, Withdrawal>>,
    min_withdrawal: Credits,
}

impl<L: LedgerApi> WithdrawalService<L> {
    /// Create a withdrawal service.
    pub fn new(ledger: Arc<L>, rail: Arc<dyn PayoutRail>) -> Self {
        Self::with_minimum(ledger, rail, DEFAULT_MIN_WITHDRAWAL)
    }

    /// Create a withdrawal service with a custom minimum.
    pub fn with_minimum(ledger: Arc<L>, rail: Arc<dyn PayoutRail>, min_withdrawal: Credits) -> Self {
        Self {
            ledger,
            rail,
            withdrawals: RwLock::new(HashMap::new()),
            min_withdrawal,
        }
    }

    /// Move `amount` of the creator's balance to the payout rail.
    ///
    /// A rail failure reverses the debit and returns `PayoutFailed`.
    pub async fn withdraw(
        &self,
        creator: AccountId,
        amount: Credits,
        now: Timestamp,
    ) -> LedgerResult<Withdrawal> {
        invariant_positive_amount(amount)?;
        if amount < self.min_withdrawal {
            return Err(LedgerError::BelowMinimum {
                amount,
                minimum: self.min_withdrawal,
            });
        }

        let id = WithdrawalId::new();
        self.ledger.debit(creator, amount, MovementReason::Withdrawal)?;

        let request = PayoutRequest {
            withdrawal_id: id,
            creator,
            amount,
        };

        match self.rail.send_payout(request).await {
            Ok(receipt) => {
                let withdrawal = Withdrawal {
                    id,
                    creator,
                    amount,
                    status: WithdrawalStatus::Completed {
                        payout_reference: receipt.reference,
                    },
                    requested_at: now,
                };
                self.withdrawals.write().insert(id, withdrawal.clone());
                info!("[ce-01] Withdrawal {} of {} by {} completed", id, amount, creator);
                Ok(withdrawal)
            }
            Err(rail_err) => {
                warn!(
                    "[ce-01] Payout for withdrawal {} failed ({}), reversing debit",
                    id, rail_err
                );
                self.withdrawals.write().insert(
                    id,
                    Withdrawal {
                        id,
                        creator,
                        amount,
                        status: WithdrawalStatus::Failed {
                            reason: rail_err.to_string(),
                        },
                        requested_at: now,
                    },
                );

                match self
                    .ledger
                    .credit(creator, amount, MovementReason::WithdrawalReversal)
                {
                    Ok(_) => Err(LedgerError::PayoutFailed(rail_err.to_string())),
                    Err(reversal_err) => {
                        let detail = format!(
                            "withdrawal {id} debit of {amount} from {creator} unmatched: payout failed ({rail_err}), reversal failed ({reversal_err})"
                        );
                        if let Err(e) = self.ledger.halt_account(creator, &detail) {
                            error!("[ce-01] Could not halt {}: {}", creator, e);
                        }
                        error!("[ce-01] LEDGER CORRUPTION: {}", detail);
                        Err(LedgerError::Corruption {
                            accounts: vec![creator],
                            amount,
                            detail,
                        })
                    }
                }
            }
        }
    }

    /// Look up one withdrawal.
    pub fn get(&self, id: WithdrawalId) -> Option<Withdrawal> {
        self.withdrawals.read().get(&id).cloned()
    }

    /// A creator's withdrawals, oldest first.
    pub fn withdrawals_for(&self, creator: AccountId) -> Vec<Withdrawal> {
        let mut list: Vec<_> = self
            .withdrawals
            .read()
            .values()
            .filter(|w| w.creator == creator)
            .cloned()
            .collect();
        list.sort_by_key(|w| w.requested_at);
        list
    }
}
