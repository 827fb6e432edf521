//! # Credit Escrow Benchmarks
//!
//! | Path | Work per iteration |
//! |------|--------------------|
//! | create + settle | one hold, one reply, one settlement credit |
//! | instant purchase | one guarded transfer |
//! | reconcile | N overdue messages refunded in one pass |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use ce_03_escrow::{CreateMessageRequest, EscrowApi, ReplyRequest};
use escrow_tests::fixtures::EscrowWorld;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

fn bench_create_and_settle(c: &mut Criterion) {
    let rt = runtime();
    let world = EscrowWorld::new();
    let sender = world.fan(u64::MAX / 2);
    let creator = world.creator(48);
    let engine = world.engine();

    let mut group = c.benchmark_group("ce-03-escrow");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("create_then_complete", |b| {
        b.iter(|| {
            rt.block_on(async {
                let message = engine
                    .create_message(CreateMessageRequest::regular(sender, creator, 10, "bench"))
                    .await
                    .expect("create");
                let replied = engine
                    .reply(creator, message.id, ReplyRequest::complete("done"))
                    .await
                    .expect("reply");
                black_box(replied.status)
            })
        })
    });

    group.bench_function("tip", |b| {
        b.iter(|| {
            rt.block_on(async {
                let tip = engine
                    .create_message(CreateMessageRequest::tip(sender, creator, 1, "bench"))
                    .await
                    .expect("tip");
                black_box(tip.id)
            })
        })
    });

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("ce-03-reconciler");

    for size in [10u64, 100, 1_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("expire_overdue", size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let world = EscrowWorld::new();
                    let creator = world.creator(1);
                    rt.block_on(async {
                        for _ in 0..size {
                            let sender = world.fan(10);
                            world
                                .engine()
                                .create_message(CreateMessageRequest::regular(sender, creator, 10, "hi"))
                                .await
                                .expect("create");
                        }
                    });
                    world.advance_hours(2);
                    world
                },
                |world| {
                    rt.block_on(async {
                        let report = world.engine().reconcile_expired().await.expect("reconcile");
                        black_box(report.expired.len())
                    })
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_create_and_settle, bench_reconcile);
criterion_main!(benches);
