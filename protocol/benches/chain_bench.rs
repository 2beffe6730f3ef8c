// Chain benchmarks for the Miler protocol.
//
// Covers block sealing under both digests, append, and full-chain
// validation at a few chain lengths.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};

use miler_protocol::crypto::{Blake3Hasher, Sha256Hasher};
use miler_protocol::storage::{Block, Chain, GenesisSeed};

fn build_chain(len: usize) -> Chain<Value> {
    let mut chain = Chain::genesis(
        "bench",
        "bench",
        GenesisSeed::new("T0", json!("genesis-tx")),
    )
    .expect("genesis");
    for i in 1..len {
        let candidate = Block::candidate(
            0,
            format!("T{}", i),
            json!({ "from": "alice", "to": "bob", "amount": i }),
        )
        .expect("candidate");
        chain.append(candidate).expect("append");
    }
    chain
}

fn bench_block_sealing(c: &mut Criterion) {
    let payload = json!({ "from": "alice", "to": "bob", "amount": 42, "memo": "coffee" });
    let mut group = c.benchmark_group("block_sealing");

    group.bench_function("sha256", |b| {
        b.iter(|| Block::with_hasher(&Sha256Hasher, 1, "T1", payload.clone(), "prev").unwrap());
    });

    group.bench_function("blake3", |b| {
        b.iter(|| Block::with_hasher(&Blake3Hasher, 1, "T1", payload.clone(), "prev").unwrap());
    });

    group.finish();
}

fn bench_append(c: &mut Criterion) {
    c.bench_function("append_to_1000", |b| {
        b.iter_batched(
            || build_chain(1_000),
            |mut chain| {
                let candidate = Block::candidate(0, "T", json!("tx")).unwrap();
                chain.append(candidate).unwrap();
                chain
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    for len in [10usize, 100, 1_000] {
        let chain = build_chain(len);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &chain, |b, chain| {
            b.iter(|| assert!(chain.validate()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_block_sealing, bench_append, bench_validate);
criterion_main!(benches);
