// AirQ Sim - Simulator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! The simulator object driving one sensor rig.
//!
//! It owns the state vector, the scenario driver and the random generator;
//! nothing lives in globals.

use crate::engine;
use crate::reading::{topic_for, SensorReading};
use crate::scenario::{Scenario, ScenarioDriver};
use crate::state::{SensorKind, SensorState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fmt;

/// Headline of a tick, as shown in the console log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickStatus {
    /// Clean air.
    Normal,
    /// Transient spike (e.g. a passing truck).
    Spike,
    /// Sustained pollution event.
    PollutionAlert,
}

impl fmt::Display for TickStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TickStatus::Normal => "normal",
            TickStatus::Spike => "transient spike",
            TickStatus::PollutionAlert => "pollution alert",
        };
        f.write_str(label)
    }
}

/// One message ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundReading {
    /// Sensor the reading belongs to.
    pub kind: SensorKind,
    /// Destination topic (`<prefix>/<key>`).
    pub topic: String,
    /// Payload record.
    pub reading: SensorReading,
}

/// Outcome of one simulation tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    /// Cycle position of this tick.
    pub cycle_position: u64,
    /// Active scenario.
    pub scenario: Scenario,
    /// Whether a spike fired.
    pub spike: bool,
    /// New sensor state.
    pub state: SensorState,
    /// Epoch seconds stamped on every reading of the tick.
    pub timestamp: f64,
}

impl Tick {
    /// Status headline.
    pub fn status(&self) -> TickStatus {
        match (self.scenario, self.spike) {
            (Scenario::PollutionEvent, _) => TickStatus::PollutionAlert,
            (Scenario::Normal, true) => TickStatus::Spike,
            (Scenario::Normal, false) => TickStatus::Normal,
        }
    }

    /// Outbound readings for every sensor, in emission order.
    pub fn readings(&self, prefix: &str) -> Vec<OutboundReading> {
        self.state
            .iter()
            .map(|(kind, value)| OutboundReading {
                kind,
                topic: topic_for(prefix, kind),
                reading: SensorReading::new(kind, value, self.timestamp),
            })
            .collect()
    }
}

/// Current wall-clock time in epoch seconds.
pub fn epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Stateful sensor simulator.
#[derive(Debug)]
pub struct Simulator<R = StdRng> {
    state: SensorState,
    driver: ScenarioDriver,
    rng: R,
}

impl Simulator<StdRng> {
    /// Create a reproducible simulator.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Create a simulator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> Simulator<R> {
    /// Create a simulator at the default state and cycle position 0.
    pub fn new(rng: R) -> Self {
        Self::with_state(SensorState::default(), rng)
    }

    /// Create a simulator from an explicit starting state.
    pub fn with_state(state: SensorState, rng: R) -> Self {
        Self {
            state,
            driver: ScenarioDriver::new(),
            rng,
        }
    }

    /// Current state.
    pub fn state(&self) -> &SensorState {
        &self.state
    }

    /// Current cycle position.
    pub fn position(&self) -> u64 {
        self.driver.position()
    }

    /// Run one tick stamped with the current time.
    pub fn tick(&mut self) -> Tick {
        self.tick_at(epoch_seconds())
    }

    /// Run one tick stamped with `timestamp`.
    ///
    /// The driver rolls its spike before the engine draws its jitter.
    pub fn tick_at(&mut self, timestamp: f64) -> Tick {
        let (scenario, spike) = self.driver.step(&mut self.rng);
        let cycle_position = self.driver.position();
        self.state = engine::advance(&self.state, scenario, spike, cycle_position, &mut self.rng);

        Tick {
            cycle_position,
            scenario,
            spike,
            state: self.state,
            timestamp,
        }
    }
}
