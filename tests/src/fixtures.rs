//! Shared test world.

use std::sync::Arc;

use ce_01_ledger::LedgerApi;
use ce_02_message_store::{MessageQuery, MessageStatus, MessageStore};
use ce_03_escrow::{CreatorProfile, ManualClock};
use escrow_runtime::{EngineContainer, EscrowEngine, RuntimeConfig};
use shared_types::{hours_to_ms, AccountId, Credits, MessageId};

/// Clock start for every world. Arbitrary but non-zero.
pub const EPOCH: u64 = 1_700_000_000_000;

/// A wired engine on a manual clock.
pub struct EscrowWorld {
    /// Everything the runtime would build.
    pub container: EngineContainer,
    /// The clock the engine reads.
    pub clock: Arc<ManualClock>,
}

impl EscrowWorld {
    /// Default configuration.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Custom configuration.
    pub fn with_config(config: RuntimeConfig) -> Self {
        let clock = Arc::new(ManualClock::new(EPOCH));
        let container = EngineContainer::with_clock(config, clock.clone());
        Self { container, clock }
    }

    /// The engine.
    pub fn engine(&self) -> Arc<EscrowEngine> {
        Arc::clone(&self.container.engine)
    }

    /// Open an account with `balance` credits.
    pub fn fan(&self, balance: Credits) -> AccountId {
        let account = AccountId::new();
        self.container
            .ledger
            .open_account(account, balance)
            .expect("open account");
        account
    }

    /// Open a creator account with a response window.
    pub fn creator(&self, window_hours: u32) -> AccountId {
        let account = self.fan(0);
        self.container.profiles.set_profile(
            account,
            CreatorProfile {
                display_name: Some("creator".into()),
                response_window_hours: Some(window_hours),
                welcome_message: None,
            },
        );
        account
    }

    /// Open a creator whose profile carries a welcome message.
    pub fn creator_with_welcome(&self, window_hours: u32, welcome: &str) -> AccountId {
        let account = self.creator(window_hours);
        self.container.profiles.set_profile(
            account,
            CreatorProfile {
                display_name: Some("creator".into()),
                response_window_hours: Some(window_hours),
                welcome_message: Some(welcome.into()),
            },
        );
        account
    }

    /// Current balance.
    pub fn balance(&self, account: AccountId) -> Credits {
        self.container.ledger.balance(account).expect("balance")
    }

    /// Move the clock forward.
    pub fn advance_hours(&self, hours: u32) {
        self.clock.advance(hours_to_ms(hours));
    }

    /// Stored status, read without reconciling.
    pub fn status(&self, id: MessageId) -> MessageStatus {
        self.container.store.get(id).expect("message").status
    }

    /// Credits still held in escrow.
    pub fn escrowed(&self) -> Credits {
        self.container
            .store
            .query(&MessageQuery::default().with_status(MessageStatus::Pending))
            .expect("query")
            .iter()
            .map(|m| m.amount)
            .sum()
    }

    /// Balances plus escrow. Constant across every escrow operation.
    pub fn total_value(&self) -> Credits {
        self.container.ledger.total_balance() + self.escrowed()
    }
}

impl Default for EscrowWorld {
    fn default() -> Self {
        Self::new()
    }
}
