//! In-Memory Ledger Adapter
//!
//! Implements `LedgerApi` with one mutex per account row.

use crate::domain::{
    invariant_positive_amount, Account, CorruptionRecord, Direction, JournalEntry, LedgerError,
    LedgerResult, MovementReason,
};
use crate::ports::LedgerApi;
use parking_lot::{Mutex, RwLock};
use shared_types::{AccountId, Credits};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// In-memory ledger.
///
/// The account map lock is only held long enough to fetch a row handle; the
/// row mutex is the single-writer serialization point for that account.
pub struct InMemoryLedger {
    accounts: RwLock<HashMap<AccountId, Arc<Mutex<Account>>>>,
    journal: Mutex<Vec<JournalEntry>>,
    corruptions: Mutex<Vec<CorruptionRecord>>,
    sequence: AtomicU64,
    /// Fault injection: when false every operation fails as unavailable.
    available: AtomicBool,
    /// Fault injection: number of upcoming credits to fail.
    failing_credits: AtomicU32,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            journal: Mutex::new(Vec::new()),
            corruptions: Mutex::new(Vec::new()),
            sequence: AtomicU64::new(0),
            available: AtomicBool::new(true),
            failing_credits: AtomicU32::new(0),
        }
    }

    /// Create a ledger with pre-funded accounts.
    pub fn with_accounts(accounts: impl IntoIterator<Item = (AccountId, Credits)>) -> Self {
        let ledger = Self::new();
        {
            let mut map = ledger.accounts.write();
            for (id, balance) in accounts {
                map.insert(id, Arc::new(Mutex::new(Account::new(id, balance))));
            }
        }
        ledger
    }

    /// Simulate the backing store going away or coming back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Fail the next `count` credit operations with `StorageUnavailable`.
    pub fn fail_next_credits(&self, count: u32) {
        self.failing_credits.store(count, Ordering::SeqCst);
    }

    /// Number of accounts.
    pub fn account_count(&self) -> usize {
        self.accounts.read().len()
    }

    fn check_available(&self) -> LedgerResult<()> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(LedgerError::StorageUnavailable(
                "ledger store offline".to_string(),
            ));
        }
        Ok(())
    }

    fn check_injected_credit_fault(&self) -> LedgerResult<()> {
        let injected = self
            .failing_credits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(LedgerError::StorageUnavailable(
                "injected credit failure".to_string(),
            ));
        }
        Ok(())
    }

    fn row(&self, account: AccountId) -> LedgerResult<Arc<Mutex<Account>>> {
        self.check_available()?;
        self.accounts
            .read()
            .get(&account)
            .cloned()
            .ok_or(LedgerError::AccountNotFound(account))
    }

    fn record(
        &self,
        account: &Account,
        direction: Direction,
        amount: Credits,
        reason: MovementReason,
    ) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().push(JournalEntry {
            sequence,
            account: account.id,
            direction,
            amount,
            reason,
            balance_after: account.balance,
        });
    }

    /// Halt without consulting availability; used while recording corruption.
    fn force_halt(&self, account: AccountId, reason: &str) {
        let row = self.accounts.read().get(&account).cloned();
        if let Some(row) = row {
            row.lock().halt(reason);
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerApi for InMemoryLedger {
    fn open_account(&self, account: AccountId, opening_balance: Credits) -> LedgerResult<()> {
        self.check_available()?;
        let mut accounts = self.accounts.write();
        if accounts.contains_key(&account) {
            return Err(LedgerError::AccountExists(account));
        }
        accounts.insert(
            account,
            Arc::new(Mutex::new(Account::new(account, opening_balance))),
        );
        info!("[ce-01] Opened account {} with {} credits", account, opening_balance);
        Ok(())
    }

    fn account(&self, account: AccountId) -> LedgerResult<Account> {
        let row = self.row(account)?;
        let snapshot = row.lock().clone();
        Ok(snapshot)
    }

    fn debit(
        &self,
        account: AccountId,
        amount: Credits,
        reason: MovementReason,
    ) -> LedgerResult<Credits> {
        invariant_positive_amount(amount)?;
        let row = self.row(account)?;
        let mut acct = row.lock();
        let balance = acct.apply_debit(amount)?;
        self.record(&acct, Direction::Debit, amount, reason);
        debug!(
            "[ce-01] Debit {} from {} ({:?}), balance {}",
            amount, account, reason, balance
        );
        Ok(balance)
    }

    fn credit(
        &self,
        account: AccountId,
        amount: Credits,
        reason: MovementReason,
    ) -> LedgerResult<Credits> {
        invariant_positive_amount(amount)?;
        self.check_injected_credit_fault()?;
        let row = self.row(account)?;
        let mut acct = row.lock();
        let balance = acct.apply_credit(amount)?;
        self.record(&acct, Direction::Credit, amount, reason);
        debug!(
            "[ce-01] Credit {} to {} ({:?}), balance {}",
            amount, account, reason, balance
        );
        Ok(balance)
    }

    fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Credits,
        reason: MovementReason,
    ) -> LedgerResult<()> {
        invariant_positive_amount(amount)?;
        self.debit(from, amount, reason)?;

        let Err(credit_err) = self.credit(to, amount, reason) else {
            return Ok(());
        };

        warn!(
            "[ce-01] Credit leg of transfer {} -> {} failed ({}), reversing debit",
            from, to, credit_err
        );

        match self.credit(from, amount, MovementReason::Compensation) {
            Ok(_) => Err(credit_err),
            Err(reversal_err) => {
                let detail = format!(
                    "debit of {amount} from {from} unmatched: credit to {to} failed ({credit_err}), reversal failed ({reversal_err})"
                );
                self.force_halt(from, &detail);
                self.force_halt(to, &detail);
                self.corruptions.lock().push(CorruptionRecord {
                    debited: from,
                    intended: to,
                    amount,
                    reason,
                    detail: detail.clone(),
                });
                error!("[ce-01] LEDGER CORRUPTION: {}", detail);
                Err(LedgerError::Corruption {
                    accounts: vec![from, to],
                    amount,
                    detail,
                })
            }
        }
    }

    fn halt_account(&self, account: AccountId, reason: &str) -> LedgerResult<()> {
        let row = self.row(account)?;
        row.lock().halt(reason);
        error!("[ce-01] Account {} halted: {}", account, reason);
        Ok(())
    }

    fn resume_account(&self, account: AccountId) -> LedgerResult<()> {
        let row = self.row(account)?;
        let mut acct = row.lock();
        if !acct.is_halted() {
            return Err(LedgerError::NotHalted(account));
        }
        acct.status = Default::default();
        warn!("[ce-01] Account {} resumed by operator", account);
        Ok(())
    }

    fn total_balance(&self) -> Credits {
        let rows: Vec<_> = self.accounts.read().values().cloned().collect();
        rows.iter().map(|row| row.lock().balance).sum()
    }

    fn journal(&self, account: AccountId) -> Vec<JournalEntry> {
        self.journal
            .lock()
            .iter()
            .filter(|e| e.account == account)
            .cloned()
            .collect()
    }

    fn corruption_records(&self) -> Vec<CorruptionRecord> {
        self.corruptions.lock().clone()
    }
}
