// AirQ Sim - Scenario schedule
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Repeating scenario schedule.
//!
//! Every 20-tick cycle holds 15 calm ticks, each with an independent
//! chance of a transient spike, followed by a 5-tick pollution event.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticks per schedule cycle.
pub const CYCLE_LENGTH: u64 = 20;

/// First in-cycle position of the pollution event.
pub const POLLUTION_START: u64 = 15;

/// Chance of a spike on a normal tick.
pub const SPIKE_PROBABILITY: f64 = 0.2;

/// Regime governing targets and approach rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scenario {
    /// Clean air with occasional spikes.
    #[default]
    Normal,
    /// Sustained high CO2 and particulates.
    PollutionEvent,
}

impl Scenario {
    /// Scenario for a position within the cycle (`0..CYCLE_LENGTH`).
    pub fn classify(position_in_cycle: u64) -> Self {
        if position_in_cycle >= POLLUTION_START {
            Scenario::PollutionEvent
        } else {
            Scenario::Normal
        }
    }

    /// Whether this is the pollution regime.
    pub fn is_pollution(&self) -> bool {
        matches!(self, Scenario::PollutionEvent)
    }

    /// Upper-case label used in logs and JSON (`NORMAL`, `POLLUTION_EVENT`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Normal => "NORMAL",
            Scenario::PollutionEvent => "POLLUTION_EVENT",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owns the cycle counter and decides the scenario of each tick.
#[derive(Debug, Clone, Default)]
pub struct ScenarioDriver {
    position: u64,
}

impl ScenarioDriver {
    /// Create a driver at cycle position 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a driver whose next step lands on `position + 1`.
    pub fn starting_at(position: u64) -> Self {
        Self { position }
    }

    /// Current cycle position (last tick number).
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Current position within the repeating cycle.
    pub fn position_in_cycle(&self) -> u64 {
        self.position % CYCLE_LENGTH
    }

    /// Advance one tick and decide scenario and spike.
    ///
    /// The spike roll only consumes a draw on normal ticks; pollution
    /// ticks never spike.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> (Scenario, bool) {
        self.position += 1;
        match Scenario::classify(self.position_in_cycle()) {
            Scenario::PollutionEvent => (Scenario::PollutionEvent, false),
            Scenario::Normal => {
                let roll: f64 = rng.gen();
                (Scenario::Normal, roll < SPIKE_PROBABILITY)
            }
        }
    }
}
