use causal_sync::{DeviceId, LogicalTimestamp, ManualClock, VectorClock};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn wide_clock(devices: usize, offset: u64) -> VectorClock {
    (0..devices).fold(VectorClock::new(), |vc, i| {
        let device = DeviceId::create(&format!("device-{}", i)).unwrap();
        vc.observe(&device, (i as u64 * 7 + offset) % 50)
    })
}

fn bench_merge(c: &mut Criterion) {
    let left = wide_clock(64, 0);
    let right = wide_clock(64, 13);
    c.bench_function("vector_clock_merge_64", |b| {
        b.iter(|| black_box(&left).merge(black_box(&right)))
    });
    c.bench_function("vector_clock_fingerprint_64", |b| {
        b.iter(|| black_box(&left).fingerprint())
    });
}

fn bench_compare(c: &mut Criterion) {
    let clock = ManualClock::at_millis(0);
    let mut stamps: Vec<LogicalTimestamp> = (0..1000)
        .map(|i| {
            let vc = wide_clock(8, i);
            LogicalTimestamp::from_vector_clock(&vc, &clock).unwrap()
        })
        .collect();

    c.bench_function("logical_timestamp_sort_1000", |b| {
        b.iter(|| {
            stamps.sort_by(|a, b| a.compare_to(b));
            stamps.reverse();
        })
    });
}

criterion_group!(benches, bench_merge, bench_compare);
criterion_main!(benches);
