//! # Hybrid-Chain Consensus Benchmarks
//!
//! | Area | Operation | Target |
//! |------|-----------|--------|
//! | Capacity proof | plot generation (4096 scoops) | < 50ms |
//! | Capacity proof | full proof against a reference | < 50ms |
//! | Stake proof | hit and leader ordering | < 1µs |
//! | Engine | validate and link one stake block | < 5ms |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hc_consensus::domain::proof::{
    capacity_proof, compare_stake_candidates, stake_generation_signature, stake_hit,
};
use hc_consensus::MiningPlot;
use hc_tests::fixtures::{TestNode, RICH};
use rand::Rng;
use shared_types::AccountId;
use std::time::Duration;

// ============================================================================
// CAPACITY TRACK
// ============================================================================

fn bench_capacity_proof(c: &mut Criterion) {
    let mut group = c.benchmark_group("capacity-proof");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    let account = AccountId(rand::thread_rng().gen());
    group.bench_function("plot_generation", |b| {
        b.iter(|| black_box(MiningPlot::new(black_box(account), black_box(7))))
    });

    let reference_signature = [0x5au8; 32];
    group.bench_function("full_proof", |b| {
        b.iter(|| {
            black_box(capacity_proof(
                &reference_signature,
                AccountId(1),
                1_000,
                18_325_193_796,
                account,
                black_box(7),
            ))
        })
    });

    group.finish();
}

// ============================================================================
// STAKE TRACK
// ============================================================================

fn bench_stake_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("stake-ranking");

    let previous = [0x11u8; 32];
    group.bench_function("generation_signature_and_hit", |b| {
        b.iter(|| {
            let signature = stake_generation_signature(&previous, black_box(AccountId(42)));
            black_box(stake_hit(&signature))
        })
    });

    for size in [10usize, 100, 1_000] {
        let mut rng = rand::thread_rng();
        let candidates: Vec<(u64, u64)> = (0..size)
            .map(|_| (rng.gen(), rng.gen_range(1..1_000_000)))
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("sort", size), &candidates, |b, input| {
            b.iter(|| {
                let mut sorted = input.clone();
                sorted.sort_by(|a, b| compare_stake_candidates(a.0, a.1, b.0, b.1));
                black_box(sorted)
            })
        });
    }

    group.finish();
}

// ============================================================================
// ENGINE
// ============================================================================

fn bench_push_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");

    group.bench_function("push_and_pop_stake_block", |b| {
        let node = TestNode::new();
        node.fund("bench", RICH);
        let header = node.stake_block("bench", 30);
        b.iter(|| {
            let block = node
                .engine
                .push_block(black_box(header.clone()))
                .expect("accepted");
            node.engine.pop_last().expect("not genesis");
            black_box(block)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_capacity_proof,
    bench_stake_ranking,
    bench_push_block
);
criterion_main!(benches);
