//! # AirQ Sim - Synthetic air-quality sensors
//!
//! Emulates a small rig of environmental sensors (CO2, PM2.5, temperature,
//! humidity) and produces temporally coherent readings for testing
//! dashboards, alerting rules and storage pipelines without hardware.
//!
//! ## Key Features
//!
//! - **Inertial evolution**: values approach moving targets instead of jumping
//! - **Scenario schedule**: calm ticks, random transient spikes and a sustained
//!   pollution event every 20 ticks
//! - **Correlated channels**: humidity follows the temperature oscillator inversely
//! - **Injectable randomness**: seed the generator for reproducible runs
//!
//! ## Quick Start
//!
//! ```rust
//! use airq_sim::{MemoryTransport, Simulator, Transport};
//!
//! let mut sim = Simulator::seeded(42);
//! let mut transport = MemoryTransport::new();
//!
//! let tick = sim.tick();
//! for out in tick.readings("AirQuality") {
//!     transport.publish(&out.topic, out.reading.to_json().unwrap()).unwrap();
//! }
//! assert_eq!(transport.pending(), 4);
//! ```
//!
//! ## Modules
//!
//! - [`state`]: Sensor identities and the state vector
//! - [`scenario`]: Repeating scenario schedule and cycle counter
//! - [`engine`]: State evolution engine
//! - [`simulator`]: Simulator object tying driver and engine together
//! - [`reading`]: Message payloads and topic naming
//! - [`transport`]: Publish transport abstraction
//! - [`recovery`]: Retry policy for failed publishes

// Modules
pub mod engine;
pub mod error;
pub mod reading;
pub mod recovery;
pub mod scenario;
pub mod simulator;
pub mod state;
pub mod transport;

// Re-exports for convenient access
pub use engine::{advance, evolve, Jitter};
pub use error::{Result, SimError, TransportError};
pub use reading::{topic_for, SensorReading, DEFAULT_TOPIC_PREFIX};
pub use recovery::RetryStrategy;
pub use scenario::{Scenario, ScenarioDriver, CYCLE_LENGTH};
pub use simulator::{epoch_seconds, OutboundReading, Simulator, Tick, TickStatus};
pub use state::{round_to_cents, SensorKind, SensorState};
pub use transport::{MemoryTransport, PublishedMessage, Transport, TransportMetrics};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_basic_tick_roundtrip() {
        let mut sim = Simulator::seeded(7);
        let mut transport = MemoryTransport::new();

        let tick = sim.tick_at(1_000.0);
        for out in tick.readings(DEFAULT_TOPIC_PREFIX) {
            transport.publish(&out.topic, out.reading.to_json().unwrap()).unwrap();
        }

        let messages = transport.drain();
        assert_eq!(messages.len(), 4);
        let decoded = SensorReading::from_json(&messages[0].payload).unwrap();
        assert_eq!(decoded.sensor_id, "sim_co2");
        assert_eq!(decoded.value, tick.state.co2);
    }
}
