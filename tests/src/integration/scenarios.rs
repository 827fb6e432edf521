//! # End-to-End Scenarios
//!
//! Walkthroughs of the escrow lifecycle against the fully wired engine:
//!
//! 1. Hold on send
//! 2. Reply settles to the creator
//! 3. Silence expires and refunds on the next read
//! 4. Cancel refunds and closes the thread
//! 5. Product purchase settles instantly, once
//! 6. Partial reply then close

#[cfg(test)]
mod tests {
    use ce_02_message_store::{EntryOrigin, MessageQuery, MessageStatus, Role};
    use ce_03_escrow::{CreateMessageRequest, ErrorKind, EscrowApi, ReplyRequest};
    use shared_bus::{EscrowEvent, EventFilter, EventTopic};
    use shared_types::hours_to_ms;

    use crate::fixtures::{EscrowWorld, EPOCH};

    // =========================================================================
    // SCENARIOS 1-3: HOLD, SETTLE, EXPIRE
    // =========================================================================

    #[tokio::test]
    async fn test_send_holds_credits_for_window() {
        let world = EscrowWorld::new();
        let sender = world.fan(1000);
        let creator = world.creator(48);

        let message = world
            .engine()
            .create_message(CreateMessageRequest::regular(sender, creator, 250, "Hello!"))
            .await
            .unwrap();

        assert_eq!(world.balance(sender), 750);
        assert_eq!(world.balance(creator), 0);
        assert_eq!(message.status, MessageStatus::Pending);
        assert_eq!(message.created_at, EPOCH);
        assert_eq!(message.expires_at, EPOCH + hours_to_ms(48));
        assert_eq!(world.escrowed(), 250);
    }

    #[tokio::test]
    async fn test_reply_before_expiry_pays_creator() {
        let world = EscrowWorld::new();
        let sender = world.fan(1000);
        let creator = world.creator(48);
        let engine = world.engine();
        let message = engine
            .create_message(CreateMessageRequest::regular(sender, creator, 250, "Hello!"))
            .await
            .unwrap();

        world.advance_hours(3);
        let replied = engine
            .reply(creator, message.id, ReplyRequest::complete("Thanks for writing"))
            .await
            .unwrap();

        assert_eq!(replied.status, MessageStatus::Replied);
        assert_eq!(replied.reply_at, Some(EPOCH + hours_to_ms(3)));
        assert_eq!(world.balance(creator), 250);
        assert_eq!(world.balance(sender), 750);
        assert_eq!(world.escrowed(), 0);
        assert!(!replied.is_read);

        let last = replied.conversation.last().unwrap();
        assert_eq!(last.role, Role::Creator);
        assert_eq!(last.origin, EntryOrigin::Manual);
        assert_eq!(last.content, "Thanks for writing");
    }

    #[tokio::test]
    async fn test_silence_expires_on_next_list() {
        let world = EscrowWorld::new();
        let sender = world.fan(1000);
        let creator = world.creator(48);
        let engine = world.engine();
        let message = engine
            .create_message(CreateMessageRequest::regular(sender, creator, 250, "Hello?"))
            .await
            .unwrap();

        world.advance_hours(49);
        // Nothing runs until someone reads.
        assert_eq!(world.balance(sender), 750);

        let listed = engine
            .list_messages(sender, MessageQuery::default())
            .await
            .unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, message.id);
        assert_eq!(listed[0].status, MessageStatus::Expired);
        assert_eq!(world.balance(sender), 1000);
        assert_eq!(world.balance(creator), 0);

        let err = engine
            .reply(creator, message.id, ReplyRequest::complete("sorry, late"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Expired);
        assert_eq!(world.balance(creator), 0);
    }

    // =========================================================================
    // SCENARIO 4: CANCEL
    // =========================================================================

    #[tokio::test]
    async fn test_cancel_refunds_and_blocks_reply() {
        let world = EscrowWorld::new();
        let sender = world.fan(1000);
        let creator = world.creator(48);
        let engine = world.engine();
        let message = engine
            .create_message(CreateMessageRequest::regular(sender, creator, 250, "Hi"))
            .await
            .unwrap();

        let cancelled = engine.cancel(creator, message.id).await.unwrap();
        assert_eq!(cancelled.status, MessageStatus::Cancelled);
        assert_eq!(world.balance(sender), 1000);

        let err = engine
            .reply(creator, message.id, ReplyRequest::complete("never mind"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        let err = engine.cancel(creator, message.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(world.balance(sender), 1000);
        assert_eq!(world.balance(creator), 0);
    }

    #[tokio::test]
    async fn test_cancel_past_deadline_without_read_expires() {
        let world = EscrowWorld::new();
        let sender = world.fan(1000);
        let creator = world.creator(48);
        let engine = world.engine();
        let message = engine
            .create_message(CreateMessageRequest::regular(sender, creator, 250, "Hi"))
            .await
            .unwrap();

        world.advance_hours(49);
        let err = engine.cancel(creator, message.id).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(world.status(message.id), MessageStatus::Expired);
        assert_eq!(world.balance(sender), 1000);
        assert_eq!(world.escrowed(), 0);
    }

    #[tokio::test]
    async fn test_send_again_after_unread_expiry() {
        let world = EscrowWorld::new();
        let sender = world.fan(250);
        let creator = world.creator(48);
        let engine = world.engine();
        let first = engine
            .create_message(CreateMessageRequest::regular(sender, creator, 250, "Hello?"))
            .await
            .unwrap();

        world.advance_hours(49);
        let second = engine
            .create_message(CreateMessageRequest::regular(sender, creator, 100, "Trying again"))
            .await
            .unwrap();

        assert_eq!(world.status(first.id), MessageStatus::Expired);
        assert_eq!(second.status, MessageStatus::Pending);
        assert_eq!(world.balance(sender), 150);
        assert_eq!(world.escrowed(), 100);
    }

    // =========================================================================
    // SCENARIO 5: INSTANT PURCHASE
    // =========================================================================

    #[tokio::test]
    async fn test_product_purchase_settles_once() {
        let world = EscrowWorld::new();
        let sender = world.fan(1000);
        let creator = world.creator(48);
        let engine = world.engine();

        let purchase = engine
            .create_message(CreateMessageRequest::product(sender, creator, 500, "X"))
            .await
            .unwrap();

        assert_eq!(purchase.status, MessageStatus::Replied);
        assert_eq!(purchase.reply_at, Some(purchase.created_at));
        assert_eq!(world.balance(creator), 500);
        assert_eq!(world.balance(sender), 500);
        assert_eq!(world.escrowed(), 0);

        let err = engine
            .create_message(CreateMessageRequest::product(sender, creator, 500, "X"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyPurchased);
        assert_eq!(world.balance(sender), 500);
        assert_eq!(world.balance(creator), 500);

        // A different product is a new purchase.
        engine
            .create_message(CreateMessageRequest::product(sender, creator, 100, "Y"))
            .await
            .unwrap();
        assert_eq!(world.balance(creator), 600);
    }

    #[tokio::test]
    async fn test_tips_are_never_duplicates() {
        let world = EscrowWorld::new();
        let sender = world.fan(100);
        let creator = world.creator(48);
        let engine = world.engine();

        for _ in 0..3 {
            let tip = engine
                .create_message(CreateMessageRequest::tip(sender, creator, 10, "great stream"))
                .await
                .unwrap();
            assert_eq!(tip.status, MessageStatus::Replied);
        }
        assert_eq!(world.balance(creator), 30);
    }

    // =========================================================================
    // SCENARIO 6: PARTIAL REPLY THEN CLOSE
    // =========================================================================

    #[tokio::test]
    async fn test_partial_reply_then_close() {
        let world = EscrowWorld::new();
        let sender = world.fan(1000);
        let creator = world.creator(48);
        let engine = world.engine();
        let message = engine
            .create_message(CreateMessageRequest::regular(sender, creator, 250, "Two questions"))
            .await
            .unwrap();

        let partial = engine
            .reply(creator, message.id, ReplyRequest::partial("Answer to the first"))
            .await
            .unwrap();
        assert_eq!(partial.status, MessageStatus::Pending);
        assert_eq!(world.balance(creator), 0);

        let closed = engine
            .reply(creator, message.id, ReplyRequest::close())
            .await
            .unwrap();
        assert_eq!(closed.status, MessageStatus::Replied);
        assert_eq!(world.balance(creator), 250);
    }

    #[tokio::test]
    async fn test_welcome_reply_does_not_unlock_close() {
        let world = EscrowWorld::new();
        let sender = world.fan(1000);
        let creator = world.creator_with_welcome(48, "Thanks, I answer within two days");
        let engine = world.engine();
        let message = engine
            .create_message(CreateMessageRequest::regular(sender, creator, 250, "Hi"))
            .await
            .unwrap();

        assert!(message
            .conversation
            .iter()
            .any(|e| e.origin == EntryOrigin::AutoWelcome));

        let err = engine
            .reply(creator, message.id, ReplyRequest::close())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        let stored = engine.get_message(sender, message.id).await.unwrap();
        assert_eq!(stored.status, MessageStatus::Pending);
        assert_eq!(world.balance(creator), 0);
    }

    // =========================================================================
    // NOTIFICATIONS
    // =========================================================================

    #[tokio::test]
    async fn test_lifecycle_notifies_each_party() {
        let world = EscrowWorld::new();
        let sender = world.fan(1000);
        let creator = world.creator(48);
        let engine = world.engine();
        let mut sender_inbox = world.container.bus.subscribe(EventFilter::for_recipient(sender));
        let mut creator_inbox = world.container.bus.subscribe(EventFilter::for_recipient(creator));
        let mut settlement = world
            .container
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Settlement]));

        let message = engine
            .create_message(CreateMessageRequest::regular(sender, creator, 250, "Hi"))
            .await
            .unwrap();
        engine
            .reply(creator, message.id, ReplyRequest::complete("Hello back"))
            .await
            .unwrap();
        engine.rate(sender, message.id, 5, None).await.unwrap();

        assert!(matches!(
            creator_inbox.try_recv().unwrap(),
            Some(EscrowEvent::MessageCreated { settled: false, .. })
        ));
        assert!(matches!(
            sender_inbox.try_recv().unwrap(),
            Some(EscrowEvent::MessageReplied { amount: 250, .. })
        ));
        assert!(matches!(
            creator_inbox.try_recv().unwrap(),
            Some(EscrowEvent::MessageRated { stars: 5, .. })
        ));
        assert!(matches!(
            settlement.try_recv().unwrap(),
            Some(EscrowEvent::MessageReplied { .. })
        ));
        assert_eq!(settlement.try_recv().unwrap(), None);
    }

    // =========================================================================
    // WITHDRAWAL
    // =========================================================================

    #[tokio::test]
    async fn test_earnings_withdrawn_to_payout_rail() {
        let world = EscrowWorld::new();
        let sender = world.fan(1000);
        let creator = world.creator(48);
        let engine = world.engine();
        engine
            .create_message(CreateMessageRequest::product(sender, creator, 500, "Preset pack"))
            .await
            .unwrap();

        engine.withdraw(creator, 400).await.unwrap();

        assert_eq!(world.balance(creator), 100);
        let sent = world.container.payout_rail.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].amount, 400);

        let err = engine.withdraw(creator, 400).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(world.balance(creator), 100);
    }
}
