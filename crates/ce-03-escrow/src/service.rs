//! # Escrow Service
//!
//! Implements `EscrowApi` over a ledger, a message store and the outbound
//! ports. Every ledger effect runs inside a store critical section; every
//! notification goes out after the section is released.
//!
//! ```text
//! create_message ──→ reconcile sender  ──→ create_guarded(admit: guard + debit/transfer) ──→ notify
//! reply/cancel   ──→ reconcile message ──→ resolve_pending(settle: authorize + effect) ──→ notify
//! list/get       ──→ reconciler ──→ query ──→ notify expiries
//! ```

use crate::config::EscrowConfig;
use crate::domain::{admit, authorize, validate_rating, Actor, Admission, Transition};
use crate::error::{EscrowError, EscrowResult};
use crate::metrics;
use crate::ports::{
    CreateMessageRequest, EscrowApi, FileStorage, NotificationSink, ProfileDirectory,
    ReplyRequest, TimeSource,
};
use crate::reconciler::{ExpirationReconciler, ReconcileReport};
use crate::settlement::apply_effect;
use async_trait::async_trait;
use ce_01_ledger::{LedgerApi, MovementReason, PayoutRail, Withdrawal, WithdrawalService};
use ce_02_message_store::{
    Attachment, ConversationEntry, EntryOrigin, Message, MessageDraft, MessageKind, MessageQuery,
    MessageStatus, MessageStore, NewEntry, Rating, Resolution, ResolveOutcome, Role,
};
use shared_bus::{subsystem, EscrowEvent};
use shared_types::{hours_to_ms, AccountId, Credits, EntryId, MessageId, Timestamp};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outbound collaborators.
pub struct EscrowPorts {
    /// Creator profile lookups
    pub profiles: Arc<dyn ProfileDirectory>,
    /// Best-effort notification transport
    pub notifier: Arc<dyn NotificationSink>,
    /// Attachment storage
    pub files: Arc<dyn FileStorage>,
    /// Clock
    pub clock: Arc<dyn TimeSource>,
    /// Creator payouts
    pub payout_rail: Arc<dyn PayoutRail>,
}

/// The escrow engine.
pub struct EscrowService<L: LedgerApi, S: MessageStore> {
    config: EscrowConfig,
    ledger: Arc<L>,
    store: Arc<S>,
    reconciler: ExpirationReconciler<L, S>,
    withdrawals: WithdrawalService<L>,
    profiles: Arc<dyn ProfileDirectory>,
    notifier: Arc<dyn NotificationSink>,
    files: Arc<dyn FileStorage>,
    clock: Arc<dyn TimeSource>,
}

impl<L: LedgerApi, S: MessageStore> EscrowService<L, S> {
    /// Wire the engine.
    pub fn new(config: EscrowConfig, ledger: Arc<L>, store: Arc<S>, ports: EscrowPorts) -> Self {
        Self {
            reconciler: ExpirationReconciler::new(ledger.clone(), store.clone()),
            withdrawals: WithdrawalService::with_minimum(
                ledger.clone(),
                ports.payout_rail,
                config.min_withdrawal,
            ),
            config,
            ledger,
            store,
            profiles: ports.profiles,
            notifier: ports.notifier,
            files: ports.files,
            clock: ports.clock,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    /// The ledger backing this engine.
    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// The message store backing this engine.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Withdrawal history.
    pub fn withdrawals(&self) -> &WithdrawalService<L> {
        &self.withdrawals
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    fn check_content(&self, content: &str) -> EscrowResult<()> {
        let chars = content.chars().count();
        if chars > self.config.max_content_chars {
            return Err(EscrowError::InvalidInput(format!(
                "content is {chars} characters, limit is {}",
                self.config.max_content_chars
            )));
        }
        Ok(())
    }

    fn validate_create(&self, request: &CreateMessageRequest) -> EscrowResult<()> {
        if request.sender == request.creator {
            return Err(EscrowError::InvalidInput(
                "cannot send a paid message to yourself".to_string(),
            ));
        }
        if request.amount == 0 {
            return Err(EscrowError::InvalidAmount);
        }
        if request.content.trim().is_empty() && request.attachment.is_none() {
            return Err(EscrowError::InvalidInput(
                "a message needs text or an attachment".to_string(),
            ));
        }
        self.check_content(&request.content)
    }

    fn participant(message: &Message, account: AccountId) -> EscrowResult<Role> {
        message.role_of(account).ok_or_else(|| {
            EscrowError::NotAuthorized(format!("{account} is not part of message {}", message.id))
        })
    }

    fn actor(message: &Message, account: AccountId) -> EscrowResult<Actor> {
        Ok(match Self::participant(message, account)? {
            Role::Creator => Actor::Creator,
            Role::Sender => Actor::Sender,
        })
    }

    /// Error for a transition that lost the race to another one.
    fn lost_race(message: &Message, transition: Transition) -> EscrowError {
        let is_reply = matches!(transition, Transition::Complete | Transition::PartialReply);
        if is_reply && message.status == MessageStatus::Expired {
            EscrowError::Expired {
                message_id: message.id,
                expires_at: message.expires_at,
            }
        } else {
            EscrowError::InvalidTransition {
                message_id: message.id,
                status: message.status,
                action: transition.action().to_string(),
            }
        }
    }

    // =========================================================================
    // SIDE EFFECTS (outside the transaction boundary)
    // =========================================================================

    async fn notify(&self, event: EscrowEvent) {
        if let Err(e) = self.notifier.notify(event).await {
            warn!("[ce-03] Notification dropped: {}", e);
            metrics::record_notification_failure();
        }
    }

    async fn notify_expired(&self, report: &ReconcileReport) {
        for message in &report.expired {
            self.notify(EscrowEvent::MessageExpired {
                message_id: message.id,
                sender: message.sender,
                creator: message.creator,
                amount: message.amount,
            })
            .await;
        }
    }

    async fn raise_alarm(&self, accounts: &[AccountId], amount: Credits, detail: &str) {
        error!(
            amount,
            accounts = ?accounts,
            "[ce-03] LEDGER CORRUPTION, accounts halted: {}",
            detail
        );
        metrics::record_ledger_corruption();
        self.notify(EscrowEvent::CriticalError {
            subsystem_id: subsystem::LEDGER,
            accounts: accounts.to_vec(),
            error: detail.to_string(),
        })
        .await;
    }

    /// Count rejections and alarm on corruption.
    async fn observe<T>(&self, operation: &str, result: EscrowResult<T>) -> EscrowResult<T> {
        if let Err(err) = &result {
            debug!("[ce-03] {} rejected: {}", operation, err);
            metrics::record_rejection(err.kind().as_str());
            if let EscrowError::LedgerCorruption {
                accounts,
                amount,
                detail,
            } = err
            {
                self.raise_alarm(accounts, *amount, detail).await;
            }
        }
        result
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    async fn do_create(&self, request: CreateMessageRequest) -> EscrowResult<Message> {
        self.validate_create(&request)?;
        let now = self.clock.now();

        // Overdue threads must not block the guard or keep credits held.
        let report = self.reconciler.reconcile_for(request.sender, now)?;
        self.notify_expired(&report).await;

        let hours = self
            .config
            .effective_window_hours(self.profiles.response_window_hours(request.creator));
        let instant = request.kind.settles_immediately();

        let admission = Admission {
            sender: request.sender,
            creator: request.creator,
            kind: request.kind,
            content: &request.content,
        };
        let draft = MessageDraft {
            sender: request.sender,
            creator: request.creator,
            amount: request.amount,
            kind: request.kind,
            content: request.content.clone(),
            attachment: request.attachment.clone(),
            created_at: now,
            response_window_ms: hours_to_ms(hours),
        };

        let mut message = self.store.create_guarded(draft, |prior| {
            admit(&admission, prior)?;
            if instant {
                self.ledger.transfer(
                    request.sender,
                    request.creator,
                    request.amount,
                    MovementReason::Purchase,
                )?;
            } else {
                self.ledger
                    .debit(request.sender, request.amount, MovementReason::EscrowHold)?;
            }
            Ok::<(), EscrowError>(())
        })?;

        let creator_name = self
            .profiles
            .display_name(message.creator)
            .unwrap_or_else(|| message.creator.to_string());
        info!(
            message_id = %message.id,
            sender = %message.sender,
            creator = %message.creator,
            amount = message.amount,
            "[ce-03] {:?} message created for {}",
            message.kind,
            creator_name
        );
        metrics::record_message_created(message.kind);

        if message.kind == MessageKind::Regular && self.config.welcome_messages_enabled {
            if let Some(welcome) = self.profiles.welcome_message(message.creator) {
                let entry = NewEntry {
                    role: Role::Creator,
                    origin: EntryOrigin::AutoWelcome,
                    content: welcome,
                    attachment: None,
                    at: now,
                };
                match self.store.append_entry(message.id, entry) {
                    Ok(entry) => {
                        message.conversation.push(entry);
                        message.is_read = false;
                    }
                    Err(e) => warn!("[ce-03] Welcome reply for {} skipped: {}", message.id, e),
                }
            }
        }

        self.notify(EscrowEvent::MessageCreated {
            message_id: message.id,
            sender: message.sender,
            creator: message.creator,
            amount: message.amount,
            settled: instant,
        })
        .await;
        Ok(message)
    }

    async fn do_reply(
        &self,
        account: AccountId,
        id: MessageId,
        reply: ReplyRequest,
    ) -> EscrowResult<Message> {
        if let Some(content) = &reply.content {
            self.check_content(content)?;
        }
        let now = self.clock.now();

        let report = self.reconciler.reconcile_message(id, now)?;
        self.notify_expired(&report).await;

        let current = self.store.get(id)?;
        let actor = Self::actor(&current, account)?;
        let has_content = reply.has_content();

        if !reply.complete {
            authorize(&current, Transition::PartialReply, actor, now, has_content)?;
            let entry = NewEntry::manual(
                Role::Creator,
                reply.content.unwrap_or_default(),
                reply.attachment,
                now,
            );
            self.store.append_entry(id, entry)?;
            info!(message_id = %id, "[ce-03] Partial reply posted");
            self.notify(EscrowEvent::ReplyPosted {
                message_id: id,
                sender: current.sender,
                creator: current.creator,
            })
            .await;
            return Ok(self.store.get(id)?);
        }

        let closing_entry = has_content.then(|| {
            NewEntry::manual(
                Role::Creator,
                reply.content.clone().unwrap_or_default(),
                reply.attachment.clone(),
                now,
            )
        });
        let resolution = Resolution {
            status: MessageStatus::Replied,
            at: now,
            closing_entry,
        };
        let outcome = self.store.resolve_pending(id, resolution, |message| {
            let effect = authorize(message, Transition::Complete, actor, now, has_content)?;
            apply_effect(self.ledger.as_ref(), message, effect)
        })?;

        match outcome {
            ResolveOutcome::Applied(message) => {
                info!(
                    message_id = %message.id,
                    creator = %message.creator,
                    amount = message.amount,
                    "[ce-03] Message replied, creator paid"
                );
                metrics::record_transition(MessageStatus::Replied);
                self.notify(EscrowEvent::MessageReplied {
                    message_id: message.id,
                    sender: message.sender,
                    creator: message.creator,
                    amount: message.amount,
                    reply_at: now,
                })
                .await;
                Ok(message)
            }
            ResolveOutcome::AlreadyResolved(message) => {
                Err(Self::lost_race(&message, Transition::Complete))
            }
        }
    }

    async fn do_cancel(&self, account: AccountId, id: MessageId) -> EscrowResult<Message> {
        let now = self.clock.now();

        let report = self.reconciler.reconcile_message(id, now)?;
        self.notify_expired(&report).await;

        let current = self.store.get(id)?;
        let actor = Self::actor(&current, account)?;

        let resolution = Resolution {
            status: MessageStatus::Cancelled,
            at: now,
            closing_entry: None,
        };
        let outcome = self.store.resolve_pending(id, resolution, |message| {
            let effect = authorize(message, Transition::Cancel, actor, now, false)?;
            apply_effect(self.ledger.as_ref(), message, effect)
        })?;

        match outcome {
            ResolveOutcome::Applied(message) => {
                info!(
                    message_id = %message.id,
                    sender = %message.sender,
                    amount = message.amount,
                    "[ce-03] Message cancelled, sender refunded"
                );
                metrics::record_transition(MessageStatus::Cancelled);
                self.notify(EscrowEvent::MessageCancelled {
                    message_id: message.id,
                    sender: message.sender,
                    creator: message.creator,
                    amount: message.amount,
                })
                .await;
                Ok(message)
            }
            ResolveOutcome::AlreadyResolved(message) => {
                Err(Self::lost_race(&message, Transition::Cancel))
            }
        }
    }

    async fn do_list(&self, account: AccountId, filter: MessageQuery) -> EscrowResult<Vec<Message>> {
        let now = self.clock.now();
        let report = self.reconciler.reconcile_for(account, now)?;
        self.notify_expired(&report).await;

        let query = MessageQuery {
            participant: Some(account),
            ..filter
        };
        let messages = self.store.query(&query)?;
        debug!("[ce-03] Listed {} messages for {}", messages.len(), account);
        Ok(messages)
    }

    async fn do_get(&self, account: AccountId, id: MessageId) -> EscrowResult<Message> {
        let now = self.clock.now();
        let message = self.store.get(id)?;
        Self::participant(&message, account)?;
        if !message.is_overdue(now) {
            return Ok(message);
        }

        let report = self.reconciler.reconcile_message(id, now)?;
        self.notify_expired(&report).await;
        Ok(self.store.get(id)?)
    }

    async fn do_rate(
        &self,
        account: AccountId,
        id: MessageId,
        stars: u8,
        review: Option<String>,
    ) -> EscrowResult<Rating> {
        let review = validate_rating(stars, review, self.config.max_review_chars)?;
        let message = self.store.get(id)?;
        if message.sender != account {
            return Err(EscrowError::NotAuthorized(format!(
                "only the sender may rate message {id}"
            )));
        }

        let rating = Rating {
            stars,
            review,
            rated_at: self.clock.now(),
        };
        self.store.set_rating(id, rating.clone())?;
        info!(message_id = %id, stars, "[ce-03] Message rated");
        self.notify(EscrowEvent::MessageRated {
            message_id: id,
            creator: message.creator,
            stars,
        })
        .await;
        Ok(rating)
    }

    async fn do_mark_read(&self, account: AccountId, id: MessageId) -> EscrowResult<()> {
        let message = self.store.get(id)?;
        Self::participant(&message, account)?;
        self.store.set_read(id, true)?;
        Ok(())
    }

    async fn do_edit(
        &self,
        account: AccountId,
        id: MessageId,
        entry_id: EntryId,
        content: String,
        attachment: Option<Attachment>,
    ) -> EscrowResult<ConversationEntry> {
        self.check_content(&content)?;
        let message = self.store.get(id)?;
        let role = Self::participant(&message, account)?;

        let existing = message.entry(entry_id).ok_or(EscrowError::EntryNotFound {
            message_id: id,
            entry_id,
        })?;
        let keeps_substance = !content.trim().is_empty()
            || attachment.is_some()
            || existing.attachment.is_some();
        if !keeps_substance {
            return Err(EscrowError::InvalidInput(
                "an entry needs text or an attachment".to_string(),
            ));
        }

        let entry = self.store.edit_entry(id, entry_id, role, content, attachment)?;
        debug!("[ce-03] Entry {} in {} edited", entry_id, id);
        Ok(entry)
    }

    async fn do_upload(
        &self,
        account: AccountId,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> EscrowResult<Attachment> {
        if bytes.is_empty() {
            return Err(EscrowError::InvalidInput("empty upload".to_string()));
        }
        let size = bytes.len();
        let url = self.files.store(bytes, content_type).await?;
        debug!("[ce-03] {} uploaded {} bytes to {}", account, size, url);
        Ok(Attachment {
            url,
            content_type: content_type.to_string(),
        })
    }

    async fn do_reconcile(&self) -> EscrowResult<ReconcileReport> {
        let report = self.reconciler.reconcile(self.clock.now())?;
        self.notify_expired(&report).await;
        Ok(report)
    }

    async fn do_withdraw(&self, creator: AccountId, amount: Credits) -> EscrowResult<Withdrawal> {
        let now: Timestamp = self.clock.now();
        let withdrawal = self.withdrawals.withdraw(creator, amount, now).await?;
        self.notify(EscrowEvent::WithdrawalCompleted {
            withdrawal_id: withdrawal.id,
            creator,
            amount,
        })
        .await;
        Ok(withdrawal)
    }
}

#[async_trait]
impl<L, S> EscrowApi for EscrowService<L, S>
where
    L: LedgerApi + 'static,
    S: MessageStore + 'static,
{
    async fn create_message(&self, request: CreateMessageRequest) -> EscrowResult<Message> {
        let result = self.do_create(request).await;
        self.observe("create_message", result).await
    }

    async fn reply(
        &self,
        creator: AccountId,
        message_id: MessageId,
        reply: ReplyRequest,
    ) -> EscrowResult<Message> {
        let result = self.do_reply(creator, message_id, reply).await;
        self.observe("reply", result).await
    }

    async fn cancel(&self, creator: AccountId, message_id: MessageId) -> EscrowResult<Message> {
        let result = self.do_cancel(creator, message_id).await;
        self.observe("cancel", result).await
    }

    async fn list_messages(
        &self,
        account: AccountId,
        filter: MessageQuery,
    ) -> EscrowResult<Vec<Message>> {
        let result = self.do_list(account, filter).await;
        self.observe("list_messages", result).await
    }

    async fn get_message(&self, account: AccountId, message_id: MessageId) -> EscrowResult<Message> {
        let result = self.do_get(account, message_id).await;
        self.observe("get_message", result).await
    }

    async fn rate(
        &self,
        sender: AccountId,
        message_id: MessageId,
        stars: u8,
        review: Option<String>,
    ) -> EscrowResult<Rating> {
        let result = self.do_rate(sender, message_id, stars, review).await;
        self.observe("rate", result).await
    }

    async fn mark_read(&self, account: AccountId, message_id: MessageId) -> EscrowResult<()> {
        let result = self.do_mark_read(account, message_id).await;
        self.observe("mark_read", result).await
    }

    async fn edit_entry(
        &self,
        account: AccountId,
        message_id: MessageId,
        entry_id: EntryId,
        content: String,
        attachment: Option<Attachment>,
    ) -> EscrowResult<ConversationEntry> {
        let result = self
            .do_edit(account, message_id, entry_id, content, attachment)
            .await;
        self.observe("edit_entry", result).await
    }

    async fn upload_attachment(
        &self,
        account: AccountId,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> EscrowResult<Attachment> {
        let result = self.do_upload(account, bytes, content_type).await;
        self.observe("upload_attachment", result).await
    }

    async fn reconcile_expired(&self) -> EscrowResult<ReconcileReport> {
        let result = self.do_reconcile().await;
        self.observe("reconcile_expired", result).await
    }

    async fn withdraw(&self, creator: AccountId, amount: Credits) -> EscrowResult<Withdrawal> {
        let result = self.do_withdraw(creator, amount).await;
        self.observe("withdraw", result).await
    }
}
