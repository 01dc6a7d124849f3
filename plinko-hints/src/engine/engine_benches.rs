#[macro_use]
extern crate criterion;
use std::hint::black_box;

use criterion::Criterion;
use plinko_hints::{HintEngine, Params, Parity};

const PARAMS: Params = Params {
    entries: 4096,
    block_size: 64,
    lambda: 2,
    queries: 16,
};

const MASTER: [u8; 32] = [0x42u8; 32];

fn entry(seed: u64) -> Parity {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&seed.to_le_bytes());
    Parity::new(bytes)
}

fn built_engine() -> HintEngine {
    let mut engine = HintEngine::new(PARAMS, &MASTER).unwrap();
    engine.initialize_hints().unwrap();
    engine
}

fn bench_streamed_build(c: &mut Criterion) {
    c.bench_function("hint build, 4096-entry stream", |b| {
        b.iter(|| {
            let mut engine = built_engine();
            for i in 0..PARAMS.entries {
                engine.process_entry(i, entry(i + 1));
            }
            black_box(engine.stats().total_regular)
        })
    });
}

fn bench_entry_processing(c: &mut Criterion) {
    let mut engine = built_engine();

    let mut i = 0u64;
    c.bench_function("process_entry against a built engine", |b| {
        b.iter(|| {
            i = (i + 1) % PARAMS.entries;
            engine.process_entry(i, entry(i));
        })
    });
}

fn bench_online_updates(c: &mut Criterion) {
    let mut engine = built_engine();
    for i in 0..PARAMS.entries {
        engine.process_entry(i, entry(i + 1));
    }

    let mut i = 0u64;
    c.bench_function("update_hint against a built engine", |b| {
        b.iter(|| {
            i = (i + 1) % PARAMS.entries;
            engine.update_hint(i, entry(i * 13 + 7));
        })
    });
}

criterion_group!(
    benches,
    bench_streamed_build,
    bench_entry_processing,
    bench_online_updates
);
criterion_main!(benches);
