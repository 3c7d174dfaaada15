//! Stress tests for AirQ Sim
//!
//! Run with: cargo test --release stress -- --ignored

use airq_sim::*;
use std::time::Instant;

#[test]
#[ignore] // Run manually with --ignored
fn stress_test_ticks() {
    let mut sim = Simulator::seeded(1);

    let iterations = 1_000_000;
    let start = Instant::now();

    for i in 0..iterations {
        let tick = sim.tick_at(i as f64);
        assert!(tick.state.is_finite());
    }

    let elapsed = start.elapsed();
    let rate = iterations as f64 / elapsed.as_secs_f64();

    println!("Simulated {} ticks in {:?}", iterations, elapsed);
    println!("Rate: {:.0} ticks/second", rate);

    assert!(
        rate > 100_000.0,
        "Should simulate at least 100k ticks/s, got {:.0}",
        rate
    );
}

#[test]
#[ignore]
fn stress_test_publish_memory_transport() {
    let mut sim = Simulator::seeded(2);
    let mut transport = MemoryTransport::with_buffer_size(usize::MAX);

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let tick = sim.tick_at(i as f64);
        for out in tick.readings(DEFAULT_TOPIC_PREFIX) {
            transport
                .publish(&out.topic, out.reading.to_json().unwrap())
                .unwrap();
        }
    }

    let elapsed = start.elapsed();
    let metrics = transport.metrics();

    println!(
        "Published {} messages ({} bytes) in {:?}",
        metrics.messages_sent, metrics.bytes_sent, elapsed
    );

    assert_eq!(metrics.messages_sent, iterations as u64 * 4);
    assert_eq!(metrics.messages_failed, 0);
}

#[test]
#[ignore]
fn stress_test_long_run_stays_bounded() {
    let mut sim = Simulator::seeded(3);

    let mut max_co2 = f64::MIN;
    let mut min_hum = f64::MAX;
    let mut max_hum = f64::MIN;

    for i in 0..1_000_000u64 {
        let tick = sim.tick_at(i as f64);
        max_co2 = max_co2.max(tick.state.co2);
        min_hum = min_hum.min(tick.state.hum);
        max_hum = max_hum.max(tick.state.hum);
    }

    println!("max co2 {}, hum range [{}, {}]", max_co2, min_hum, max_hum);

    assert!(max_co2 < 2000.0);
    assert!(min_hum > 38.0 && max_hum < 62.0);
}
