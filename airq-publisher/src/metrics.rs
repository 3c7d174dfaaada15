// AirQ Publisher - Prometheus metrics definitions
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Prometheus metrics for the publisher.
//!
//! Mirrors what went out on the wire so a dashboard can be checked against
//! the simulator itself.

use airq_sim::{Scenario, SensorKind, Tick};
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_gauge_vec, Counter,
    CounterVec, Encoder, Gauge, GaugeVec, TextEncoder,
};
use tracing::warn;

lazy_static! {
    /// Ticks simulated since start.
    pub static ref TICKS_TOTAL: Counter = register_counter!(
        "airq_ticks_total",
        "Simulation ticks since start"
    ).expect("airq_ticks_total registers once");

    /// Current cycle position.
    pub static ref CYCLE_POSITION: Gauge = register_gauge!(
        "airq_cycle_position",
        "Current simulation cycle position"
    ).expect("airq_cycle_position registers once");

    /// Active scenario: 0 = normal, 1 = pollution event.
    pub static ref SCENARIO: Gauge = register_gauge!(
        "airq_scenario",
        "Active scenario (0=Normal, 1=PollutionEvent)"
    ).expect("airq_scenario registers once");

    /// Whether the current tick carries a transient spike.
    pub static ref SPIKE: Gauge = register_gauge!(
        "airq_spike",
        "Transient spike active on the current tick (0/1)"
    ).expect("airq_spike registers once");

    /// Latest simulated value per sensor.
    pub static ref SENSOR_VALUE: GaugeVec = register_gauge_vec!(
        "airq_sensor_value",
        "Latest simulated sensor value",
        &["sensor", "unit"]
    ).expect("airq_sensor_value registers once");

    /// Messages accepted by the transport.
    pub static ref MESSAGES_PUBLISHED_TOTAL: CounterVec = register_counter_vec!(
        "airq_messages_published_total",
        "Messages handed to the broker connection",
        &["sensor"]
    ).expect("airq_messages_published_total registers once");

    /// Messages dropped after exhausting retries.
    pub static ref PUBLISH_FAILURES_TOTAL: CounterVec = register_counter_vec!(
        "airq_publish_failures_total",
        "Messages dropped after exhausting retries",
        &["sensor"]
    ).expect("airq_publish_failures_total registers once");
}

/// Record the outcome of a simulation tick.
pub fn record_tick(tick: &Tick) {
    TICKS_TOTAL.inc();
    CYCLE_POSITION.set(tick.cycle_position as f64);
    SCENARIO.set(match tick.scenario {
        Scenario::Normal => 0.0,
        Scenario::PollutionEvent => 1.0,
    });
    SPIKE.set(if tick.spike { 1.0 } else { 0.0 });

    for (kind, value) in tick.state.iter() {
        SENSOR_VALUE
            .with_label_values(&[kind.key(), kind.unit()])
            .set(value);
    }
}

/// Record a publish attempt's final outcome.
pub fn record_publish(kind: SensorKind, delivered: bool) {
    let counter: &CounterVec = if delivered {
        &MESSAGES_PUBLISHED_TOTAL
    } else {
        &PUBLISH_FAILURES_TOTAL
    };
    counter.with_label_values(&[kind.key()]).inc();
}

/// Encode all metrics to Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
