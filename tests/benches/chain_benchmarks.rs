//! # Crypto Fighter Chain Benchmarks
//!
//! Per-tick costs on the hot path. At 30 ticks per second each peer signs
//! one record and verifies one, so both must stay far below 33 ms.
//!
//! | Path                         | Target  |
//! |------------------------------|---------|
//! | prepare + sign + finalize    | < 1 ms  |
//! | validate_and_store           | < 1 ms  |
//! | wire encode + decode         | < 50 µs |

use std::time::Duration;

use cf_01_chain_validation::{genesis_hash, ChainValidationApi, ChainValidator, LocalKeySigner, RecordSigner};
use cf_02_state_sync::canonical_start;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use shared_types::{wire, PeerMessage, PlayerStateSnapshot, Side, SignedRecord};

const SESSION_ID: &str = "bench-session";
const T0: u64 = 1_700_000_000_000;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
}

/// `count` consecutive records from one signer.
fn signed_run(count: usize) -> Vec<SignedRecord<PlayerStateSnapshot>> {
    let rt = runtime();
    let signer = LocalKeySigner::random();
    let mut chain = ChainValidator::new(signer.identity(), genesis_hash(SESSION_ID, 1));
    (0..count as u64)
        .map(|i| {
            let ts = T0 + i * 33;
            rt.block_on(chain.create_and_sign(canonical_start(Side::Primary, ts), ts, &signer))
                .expect("signing")
        })
        .collect()
}

fn bench_signing(c: &mut Criterion) {
    let mut group = c.benchmark_group("cf-01-signing");
    group.measurement_time(Duration::from_secs(5));

    let rt = runtime();
    let signer = LocalKeySigner::random();
    let mut chain = ChainValidator::new(signer.identity(), genesis_hash(SESSION_ID, 1));
    let mut ts = T0;

    group.bench_function("create_and_sign", |b| {
        b.iter(|| {
            ts += 33;
            let record = rt
                .block_on(chain.create_and_sign(canonical_start(Side::Primary, ts), ts, &signer))
                .expect("signing");
            black_box(record.hash)
        })
    });

    group.bench_function("prepare_only", |b| {
        b.iter_batched(
            || ChainValidator::<PlayerStateSnapshot>::new(signer.identity(), genesis_hash(SESSION_ID, 1)),
            |mut fresh| black_box(fresh.prepare(canonical_start(Side::Primary, T0), T0).map(|u| u.digest)),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("cf-01-validation");
    group.measurement_time(Duration::from_secs(5));

    for size in [1usize, 30, 300] {
        let records = signed_run(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("validate_and_store", size), &records, |b, records| {
            b.iter_batched(
                || {
                    let receiver = LocalKeySigner::random();
                    ChainValidator::<PlayerStateSnapshot>::new(receiver.identity(), genesis_hash(SESSION_ID, 1))
                },
                |mut chain| {
                    for record in records {
                        black_box(chain.validate_and_store(record.clone()));
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_wire(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared-types-wire");
    let message = PeerMessage::SignedState {
        record: signed_run(1).remove(0),
    };
    let frame = wire::encode(&message).expect("encode");

    group.throughput(Throughput::Bytes(frame.len() as u64));
    group.bench_function("encode_signed_state", |b| b.iter(|| black_box(wire::encode(&message))));
    group.bench_function("decode_signed_state", |b| b.iter(|| black_box(wire::decode(&frame))));
    group.finish();
}

criterion_group!(benches, bench_signing, bench_validation, bench_wire);
criterion_main!(benches);
