#[macro_use]
extern crate criterion;
use std::hint::black_box;

use criterion::Criterion;
use plinko_crypto::iprf::Iprf;
use plinko_crypto::prp::Prp;

const DOMAIN: u64 = 1 << 20;
const RANGE: u64 = 1 << 10;

fn bench_forward(c: &mut Criterion) {
    let key = core::array::from_fn(|i| i as u8);
    let iprf = Iprf::new(&key, DOMAIN, RANGE).unwrap();

    let mut x = 0u64;
    c.bench_function("iprf forward, 2^20 -> 2^10", |b| {
        b.iter(|| {
            x = (x + 1) % DOMAIN;
            black_box(iprf.forward(x))
        })
    });
}

fn bench_inverse(c: &mut Criterion) {
    let key = core::array::from_fn(|i| i as u8);
    let iprf = Iprf::new(&key, DOMAIN, RANGE).unwrap();

    let mut y = 0u64;
    c.bench_function("iprf inverse, 2^20 -> 2^10", |b| {
        b.iter(|| {
            y = (y + 1) % RANGE;
            black_box(iprf.inverse(y))
        })
    });
}

fn bench_table_build(c: &mut Criterion) {
    let key = [0x42u8; 16];

    c.bench_function("prp table build, 2^16", |b| {
        b.iter(|| black_box(Prp::new(&key, 1 << 16)))
    });
}

criterion_group!(benches, bench_forward, bench_inverse, bench_table_build);
criterion_main!(benches);
