//! # Escrow Properties
//!
//! Rules that hold for every sequence of operations:
//!
//! | Property | Check |
//! |----------|-------|
//! | Conservation | balances + escrowed credits never change |
//! | Single terminal transition | a settled status never changes again |
//! | Expiry refund | the sender gets exactly `amount` back |
//! | No negative balance | a debit beyond the balance fails and moves nothing |
//! | Idempotent reconciliation | a second pass has no ledger effect |
//! | Completion precondition | no close without a manual reply |
//! | Rating write-once | the first rating sticks |
//!
//! The randomized walk uses a seeded `StdRng` so failures replay.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use ce_01_ledger::{LedgerApi, MovementReason};
    use ce_02_message_store::{MessageQuery, MessageStatus, MessageStore};
    use ce_03_escrow::{CreateMessageRequest, ErrorKind, EscrowApi, ReplyRequest};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use shared_types::{AccountId, MessageId};

    use crate::fixtures::EscrowWorld;

    // =========================================================================
    // RANDOMIZED WALK
    // =========================================================================

    /// Error kinds a valid caller can provoke. Anything else is a bug.
    fn is_domain_rejection(kind: ErrorKind) -> bool {
        matches!(
            kind,
            ErrorKind::InsufficientFunds
                | ErrorKind::InvalidTransition
                | ErrorKind::Expired
                | ErrorKind::DuplicateRequest
                | ErrorKind::AlreadyPurchased
                | ErrorKind::AlreadyRated
                | ErrorKind::InvalidInput
        )
    }

    async fn random_walk(seed: u64, steps: usize) {
        let mut rng = StdRng::seed_from_u64(seed);
        let world = EscrowWorld::new();
        let engine = world.engine();

        let fans: Vec<AccountId> = (0..4).map(|_| world.fan(rng.gen_range(100..2_000))).collect();
        let creators: Vec<AccountId> = (0..3).map(|i| world.creator(12 * (i + 1))).collect();
        let initial = world.total_value();

        let mut messages: Vec<MessageId> = Vec::new();
        let mut settled: HashMap<MessageId, MessageStatus> = HashMap::new();

        for step in 0..steps {
            let fan = fans[rng.gen_range(0..fans.len())];
            let creator = creators[rng.gen_range(0..creators.len())];
            let picked = (!messages.is_empty()).then(|| messages[rng.gen_range(0..messages.len())]);

            let result = match rng.gen_range(0..10) {
                0..=2 => {
                    let amount = rng.gen_range(1..600);
                    engine
                        .create_message(CreateMessageRequest::regular(fan, creator, amount, "question"))
                        .await
                        .map(|m| messages.push(m.id))
                }
                3 => {
                    let product = format!("product-{}", rng.gen_range(0..4));
                    engine
                        .create_message(CreateMessageRequest::product(fan, creator, rng.gen_range(1..300), product))
                        .await
                        .map(|_| ())
                }
                4 => engine
                    .create_message(CreateMessageRequest::tip(fan, creator, rng.gen_range(1..50), "tip"))
                    .await
                    .map(|_| ()),
                5 => match picked {
                    Some(id) => {
                        let owner = world.container.store.get(id).unwrap().creator;
                        let reply = if rng.gen_bool(0.5) {
                            ReplyRequest::complete("answer")
                        } else {
                            ReplyRequest::partial("partial answer")
                        };
                        engine.reply(owner, id, reply).await.map(|_| ())
                    }
                    None => Ok(()),
                },
                6 => match picked {
                    Some(id) => {
                        let owner = world.container.store.get(id).unwrap().creator;
                        engine.cancel(owner, id).await.map(|_| ())
                    }
                    None => Ok(()),
                },
                7 => {
                    world.advance_hours(rng.gen_range(1..30));
                    Ok(())
                }
                8 => engine
                    .list_messages(fan, MessageQuery::default())
                    .await
                    .map(|_| ()),
                _ => engine.reconcile_expired().await.map(|_| ()),
            };

            if let Err(e) = result {
                assert!(
                    is_domain_rejection(e.kind()),
                    "seed {seed} step {step}: unexpected error {e}"
                );
            }

            assert_eq!(
                world.total_value(),
                initial,
                "seed {seed} step {step}: credits created or destroyed"
            );

            for message in world
                .container
                .store
                .query(&MessageQuery::default())
                .unwrap()
            {
                if message.status == MessageStatus::Pending {
                    continue;
                }
                let first = *settled.entry(message.id).or_insert(message.status);
                assert_eq!(
                    first, message.status,
                    "seed {seed} step {step}: terminal status changed"
                );
            }
        }
    }

    #[tokio::test]
    async fn test_conservation_over_random_walks() {
        for seed in 0..8 {
            random_walk(seed, 150).await;
        }
    }

    // =========================================================================
    // TARGETED PROPERTIES
    // =========================================================================

    #[tokio::test]
    async fn test_expiry_refunds_exactly_amount() {
        let world = EscrowWorld::new();
        let sender = world.fan(1000);
        let other = world.fan(1000);
        let creator = world.creator(24);
        let engine = world.engine();

        engine
            .create_message(CreateMessageRequest::regular(sender, creator, 321, "hello"))
            .await
            .unwrap();
        world.advance_hours(25);

        let report = engine.reconcile_expired().await.unwrap();
        assert_eq!(report.expired.len(), 1);
        assert_eq!(report.refunded(), 321);
        assert_eq!(world.balance(sender), 1000);
        assert_eq!(world.balance(other), 1000);
        assert_eq!(world.balance(creator), 0);
    }

    #[tokio::test]
    async fn test_reconciliation_is_idempotent() {
        let world = EscrowWorld::new();
        let sender = world.fan(500);
        let creator = world.creator(1);
        let engine = world.engine();

        engine
            .create_message(CreateMessageRequest::regular(sender, creator, 200, "ping"))
            .await
            .unwrap();
        world.advance_hours(2);

        engine.reconcile_expired().await.unwrap();
        let journal_after_first = world.container.ledger.journal(sender);

        let second = engine.reconcile_expired().await.unwrap();
        engine.list_messages(sender, MessageQuery::default()).await.unwrap();

        assert!(second.expired.is_empty());
        assert_eq!(world.container.ledger.journal(sender), journal_after_first);
        assert_eq!(
            journal_after_first
                .iter()
                .filter(|e| e.reason == MovementReason::Refund)
                .count(),
            1
        );
        assert_eq!(world.balance(sender), 500);
    }

    #[tokio::test]
    async fn test_overdraft_moves_nothing() {
        let world = EscrowWorld::new();
        let sender = world.fan(100);
        let creator = world.creator(48);
        let engine = world.engine();

        for request in [
            CreateMessageRequest::regular(sender, creator, 101, "too much"),
            CreateMessageRequest::product(sender, creator, 101, "too much"),
            CreateMessageRequest::tip(sender, creator, 101, "too much"),
        ] {
            let err = engine.create_message(request).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        }

        assert_eq!(world.balance(sender), 100);
        assert_eq!(world.balance(creator), 0);
        assert!(world.container.store.is_empty());
        assert!(world.container.ledger.journal(sender).is_empty());
    }

    #[tokio::test]
    async fn test_close_requires_manual_reply() {
        let world = EscrowWorld::new();
        let sender = world.fan(100);
        let creator = world.creator(48);
        let engine = world.engine();
        let message = engine
            .create_message(CreateMessageRequest::regular(sender, creator, 50, "hi"))
            .await
            .unwrap();

        for reply in [ReplyRequest::close(), ReplyRequest::complete("   ")] {
            let err = engine.reply(creator, message.id, reply).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        }

        let stored = engine.get_message(creator, message.id).await.unwrap();
        assert_eq!(stored.status, MessageStatus::Pending);
        assert_eq!(world.balance(creator), 0);
    }

    #[tokio::test]
    async fn test_rating_is_write_once() {
        let world = EscrowWorld::new();
        let sender = world.fan(100);
        let creator = world.creator(48);
        let engine = world.engine();
        let message = engine
            .create_message(CreateMessageRequest::regular(sender, creator, 50, "hi"))
            .await
            .unwrap();

        let err = engine.rate(sender, message.id, 5, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        engine
            .reply(creator, message.id, ReplyRequest::complete("hello"))
            .await
            .unwrap();
        let first = engine
            .rate(sender, message.id, 4, Some("helpful".into()))
            .await
            .unwrap();

        let err = engine.rate(sender, message.id, 1, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyRated);

        let stored = engine.get_message(sender, message.id).await.unwrap();
        assert_eq!(stored.rating, Some(first));
    }

    #[tokio::test]
    async fn test_only_participants_see_a_message() {
        let world = EscrowWorld::new();
        let sender = world.fan(100);
        let stranger = world.fan(100);
        let creator = world.creator(48);
        let engine = world.engine();
        let message = engine
            .create_message(CreateMessageRequest::regular(sender, creator, 50, "private"))
            .await
            .unwrap();

        let err = engine.get_message(stranger, message.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
        assert!(engine
            .list_messages(stranger, MessageQuery::default())
            .await
            .unwrap()
            .is_empty());
    }
}
