//! # Shroud Lifecycle Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | Commitment computation | < 5µs |
//! | Token lock acquire/release | < 5µs |
//! | Mint through the service | < 100µs |

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use shroud_bus::{ChannelConfig, IdentityRegistry, NotificationChannel, RoutingKey, TRANSFER_TOPIC};
use shroud_commitments::{
    compute_commitment, CommitmentLifecycleApi, CommitmentService, InMemoryAccountService,
    InMemoryDirectory, InMemoryLedger, InMemoryProofEngine, LifecycleConfig, TokenLocks,
};
use shroud_types::{Address, ChannelPublicKey, PartyIdentity, Salt, TokenId, ZkpKeyPair};

fn bench_commitment(c: &mut Criterion) {
    let mut group = c.benchmark_group("commitment");

    let token_id = TokenId::random(32);
    let keys = ZkpKeyPair::generate();
    let salt = Salt::random(32);
    group.bench_function("compute_commitment", |b| {
        b.iter(|| black_box(compute_commitment(&token_id, &keys.public_key, &salt)))
    });

    let recipient = ChannelPublicKey::random(65);
    group.bench_function("routing_key", |b| {
        b.iter(|| black_box(RoutingKey::new(&TRANSFER_TOPIC, &recipient)))
    });

    group.finish();
}

fn bench_token_locks(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let locks = TokenLocks::new();
    let token_id = TokenId::random(32);

    c.bench_function("token_lock_acquire", |b| {
        b.to_async(&runtime).iter(|| async {
            let guard = locks.acquire(&token_id).await;
            black_box(&guard);
        })
    });
}

fn bench_mint(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let directory = Arc::new(InMemoryDirectory::new());
    let alice = PartyIdentity::new("alice", Address::random(20));
    directory.register_party(&alice);

    let service = CommitmentService::new(
        LifecycleConfig::default(),
        Arc::new(InMemoryProofEngine::new()),
        Arc::new(InMemoryLedger::new()),
        Arc::new(InMemoryAccountService::new()),
        directory,
        Arc::new(NotificationChannel::new(
            Arc::new(IdentityRegistry::new()),
            ChannelConfig::default(),
        )),
    );

    let mut group = c.benchmark_group("lifecycle");
    group.measurement_time(Duration::from_secs(10));
    group.bench_function("mint", |b| {
        b.to_async(&runtime).iter(|| async {
            black_box(
                service
                    .mint(&alice, TokenId::random(32), "art")
                    .await
                    .unwrap(),
            )
        })
    });
    group.finish();
}

criterion_group!(benches, bench_commitment, bench_token_locks, bench_mint);
criterion_main!(benches);
