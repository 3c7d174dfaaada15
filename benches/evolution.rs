//! Benchmarks for AirQ Sim state evolution

use airq_sim::{advance, evolve, Jitter, Scenario, SensorState, Simulator};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_evolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("evolve");

    let state = SensorState::default();
    group.throughput(Throughput::Elements(1000));

    group.bench_function("evolve_1000_zero_jitter", |b| {
        b.iter(|| {
            let mut s = state;
            for cycle in 0..1000u64 {
                let scenario = Scenario::classify(cycle % 20);
                s = evolve(&s, scenario, false, cycle, &Jitter::ZERO);
            }
            black_box(s)
        })
    });

    group.bench_function("advance_1000_seeded", |b| {
        let mut rng = StdRng::seed_from_u64(42);
        b.iter(|| {
            let mut s = state;
            for cycle in 0..1000u64 {
                let scenario = Scenario::classify(cycle % 20);
                s = advance(&s, scenario, false, cycle, &mut rng);
            }
            black_box(s)
        })
    });

    group.finish();
}

fn bench_ticks(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulator");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("tick_and_encode_1000", |b| {
        let mut sim = Simulator::seeded(7);
        b.iter(|| {
            for i in 0..1000 {
                let tick = sim.tick_at(i as f64);
                for out in tick.readings("AirQuality") {
                    black_box((out.topic, out.reading.to_json()));
                }
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_evolve, bench_ticks);
criterion_main!(benches);
