//! # Concurrency
//!
//! Races that must resolve to exactly one ledger effect:
//!
//! ```text
//! reply(complete) ─┐
//!                  ├──→ resolve_pending (compare-and-set) ──→ one winner
//! cancel ──────────┤   (before the deadline)
//! reconciler ──────┘
//! ```
//!
//! Each race is repeated so both interleavings get exercised on a
//! multi-threaded runtime.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ce_01_ledger::{LedgerApi, MovementReason};
    use ce_02_message_store::MessageStatus;
    use ce_03_escrow::{CreateMessageRequest, ErrorKind, EscrowApi, ReplyRequest};
    use futures::future::join_all;

    use crate::fixtures::EscrowWorld;

    const ROUNDS: usize = 50;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_reply_races_cancel() {
        let world = EscrowWorld::new();
        let sender = world.fan(100 * ROUNDS as u64);
        let creator = world.creator(48);
        let engine = world.engine();
        let initial = world.total_value();

        let mut replied = 0;
        let mut cancelled = 0;
        for _ in 0..ROUNDS {
            let message = engine
                .create_message(CreateMessageRequest::regular(sender, creator, 100, "race"))
                .await
                .unwrap();

            let reply = tokio::spawn({
                let engine = Arc::clone(&engine);
                async move {
                    engine
                        .reply(creator, message.id, ReplyRequest::complete("won"))
                        .await
                }
            });
            let cancel = tokio::spawn({
                let engine = Arc::clone(&engine);
                async move { engine.cancel(creator, message.id).await }
            });

            let reply = reply.await.unwrap();
            let cancel = cancel.await.unwrap();
            assert!(
                reply.is_ok() ^ cancel.is_ok(),
                "exactly one transition must commit"
            );
            let loser = reply.as_ref().err().or(cancel.as_ref().err()).unwrap();
            assert_eq!(loser.kind(), ErrorKind::InvalidTransition);

            match world.status(message.id) {
                MessageStatus::Replied => replied += 1,
                MessageStatus::Cancelled => cancelled += 1,
                other => panic!("unexpected status {other:?}"),
            }
            assert_eq!(world.total_value(), initial);
        }

        assert_eq!(replied + cancelled, ROUNDS);
        assert_eq!(world.balance(creator), 100 * replied as u64);
        assert_eq!(world.balance(sender), 100 * cancelled as u64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overdue_cancel_races_reconciler() {
        let world = EscrowWorld::new();
        let sender = world.fan(1_000);
        let creator = world.creator(1);
        let engine = world.engine();

        for _ in 0..ROUNDS {
            let message = engine
                .create_message(CreateMessageRequest::regular(sender, creator, 1_000, "late"))
                .await
                .unwrap();
            world.advance_hours(2);

            let cancel = tokio::spawn({
                let engine = Arc::clone(&engine);
                async move { engine.cancel(creator, message.id).await }
            });
            let sweep = tokio::spawn({
                let engine = Arc::clone(&engine);
                async move { engine.reconcile_expired().await }
            });
            let cancel = cancel.await.unwrap();
            sweep.await.unwrap().unwrap();

            // Past the deadline only expiry settles, exactly once.
            assert_eq!(cancel.unwrap_err().kind(), ErrorKind::InvalidTransition);
            assert_eq!(world.balance(sender), 1_000);
            assert_eq!(world.status(message.id), MessageStatus::Expired);
        }

        let refunds = world
            .container
            .ledger
            .journal(sender)
            .iter()
            .filter(|e| e.reason == MovementReason::Refund)
            .count();
        assert_eq!(refunds, ROUNDS);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_readers_refund_once() {
        let world = EscrowWorld::new();
        let sender = world.fan(300);
        let creator = world.creator(1);
        let engine = world.engine();

        let message = engine
            .create_message(CreateMessageRequest::regular(sender, creator, 300, "anyone?"))
            .await
            .unwrap();
        world.advance_hours(2);

        let reads = (0..16).map(|i| {
            let engine = Arc::clone(&engine);
            let reader = if i % 2 == 0 { sender } else { creator };
            tokio::spawn(async move { engine.get_message(reader, message.id).await })
        });
        for read in join_all(reads).await {
            assert_eq!(read.unwrap().unwrap().status, MessageStatus::Expired);
        }

        assert_eq!(world.balance(sender), 300);
        assert_eq!(world.container.ledger.journal(sender).len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_spending_never_overdraws() {
        let world = EscrowWorld::new();
        let sender = world.fan(1_000);
        let creator = world.creator(48);
        let engine = world.engine();

        let tips = (0..25).map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .create_message(CreateMessageRequest::tip(sender, creator, 100, "tip"))
                    .await
            })
        });
        let results: Vec<_> = join_all(tips).await.into_iter().map(|r| r.unwrap()).collect();

        let accepted = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(accepted, 10);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.kind() == ErrorKind::InsufficientFunds));
        assert_eq!(world.balance(sender), 0);
        assert_eq!(world.balance(creator), 1_000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_duplicates_admit_one() {
        let world = EscrowWorld::new();
        let sender = world.fan(1_000);
        let creator = world.creator(48);
        let engine = world.engine();

        let sends = (0..10).map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .create_message(CreateMessageRequest::regular(sender, creator, 50, "same question"))
                    .await
            })
        });
        let results: Vec<_> = join_all(sends).await.into_iter().map(|r| r.unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.kind() == ErrorKind::DuplicateRequest));
        assert_eq!(world.balance(sender), 950);
        assert_eq!(world.escrowed(), 50);
    }
}
