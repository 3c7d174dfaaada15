// AirQ Sim - State evolution
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! State evolution engine.
//!
//! Each tick moves CO2 and PM2.5 toward scenario-dependent targets with
//! inertia, drives temperature from a sine oscillator on the cycle
//! position, and pulls humidity toward a target anti-correlated with the
//! fresh temperature.
//!
//! The random draws of one call are gathered in a [`Jitter`] so the
//! arithmetic in [`evolve`] stays deterministic:
//!
//! ```rust
//! use airq_sim::engine::{evolve, Jitter};
//! use airq_sim::{Scenario, SensorState};
//!
//! let next = evolve(&SensorState::default(), Scenario::PollutionEvent, false, 16, &Jitter::ZERO);
//! assert_eq!(next.co2, 696.0);
//! assert_eq!(next.pm25, 186.0);
//! ```

use crate::scenario::Scenario;
use crate::state::SensorState;
use rand::Rng;
use std::ops::RangeInclusive;

/// Base CO2 target during a pollution event (ppm).
pub const POLLUTION_CO2_TARGET: f64 = 1800.0;
/// Base PM2.5 target during a pollution event (µg/m³).
pub const POLLUTION_PM25_TARGET: f64 = 450.0;
/// CO2 target during a spike.
pub const SPIKE_CO2_TARGET: f64 = 600.0;
/// PM2.5 target during a spike.
pub const SPIKE_PM25_TARGET: f64 = 150.0;
/// Base CO2 target in clean air.
pub const QUIET_CO2_TARGET: f64 = 420.0;
/// Base PM2.5 target in clean air.
pub const QUIET_PM25_TARGET: f64 = 10.0;

const POLLUTION_CO2_SPREAD: RangeInclusive<i32> = -100..=100;
const POLLUTION_PM25_SPREAD: RangeInclusive<i32> = -50..=50;
const QUIET_CO2_SPREAD: RangeInclusive<i32> = -20..=20;
// Biased upward.
const QUIET_PM25_SPREAD: RangeInclusive<i32> = -2..=5;

/// CO2 approach rate during a pollution event.
pub const CO2_RATE_POLLUTION: f64 = 0.2;
/// CO2 approach rate otherwise.
pub const CO2_RATE_NORMAL: f64 = 0.1;
/// PM2.5 rate while rising toward the target.
pub const PM25_RATE_RISING: f64 = 0.4;
/// PM2.5 rate while settling.
pub const PM25_RATE_FALLING: f64 = 0.1;
/// Humidity approach rate.
pub const HUM_RATE: f64 = 0.1;

/// Temperature oscillator centre (°C).
pub const TEMP_BASE: f64 = 24.0;
/// Temperature oscillator amplitude (°C).
pub const TEMP_AMPLITUDE: f64 = 3.0;
/// Oscillator phase advance per tick (radians).
pub const TEMP_PHASE_STEP: f64 = 0.2;
/// Humidity at `TEMP_BASE`.
pub const HUM_BASE: f64 = 50.0;
/// Humidity points lost per degree above `TEMP_BASE`.
pub const HUM_PER_DEGREE: f64 = 3.0;

const CO2_NOISE: f64 = 5.0;
const PM25_NOISE: f64 = 2.0;
const TEMP_NOISE: f64 = 0.1;

/// Random draws consumed by one evolution step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Jitter {
    /// Integer offset added to the CO2 target.
    pub co2_target: i32,
    /// Integer offset added to the PM2.5 target.
    pub pm25_target: i32,
    /// Additive CO2 noise, in `[-5, 5]`.
    pub co2: f64,
    /// Additive PM2.5 noise, in `[-2, 2]`.
    pub pm25: f64,
    /// Additive temperature noise, in `[-0.1, 0.1]`.
    pub temp: f64,
}

impl Jitter {
    /// Every draw fixed at zero.
    pub const ZERO: Jitter = Jitter {
        co2_target: 0,
        pm25_target: 0,
        co2: 0.0,
        pm25: 0.0,
        temp: 0.0,
    };

    /// Draw a fresh set of values.
    ///
    /// Target offsets are drawn first, and only for the branches that use
    /// them (a spike has fixed targets), followed by CO2, PM2.5 and
    /// temperature noise.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, scenario: Scenario, spike: bool) -> Self {
        let (co2_target, pm25_target) = if scenario.is_pollution() {
            (
                rng.gen_range(POLLUTION_CO2_SPREAD),
                rng.gen_range(POLLUTION_PM25_SPREAD),
            )
        } else if spike {
            (0, 0)
        } else {
            (
                rng.gen_range(QUIET_CO2_SPREAD),
                rng.gen_range(QUIET_PM25_SPREAD),
            )
        };

        Self {
            co2_target,
            pm25_target,
            co2: rng.gen_range(-CO2_NOISE..=CO2_NOISE),
            pm25: rng.gen_range(-PM25_NOISE..=PM25_NOISE),
            temp: rng.gen_range(-TEMP_NOISE..=TEMP_NOISE),
        }
    }
}

/// CO2 and PM2.5 targets for a tick.
pub fn targets(scenario: Scenario, spike: bool, jitter: &Jitter) -> (f64, f64) {
    if scenario.is_pollution() {
        (
            POLLUTION_CO2_TARGET + f64::from(jitter.co2_target),
            POLLUTION_PM25_TARGET + f64::from(jitter.pm25_target),
        )
    } else if spike {
        (SPIKE_CO2_TARGET, SPIKE_PM25_TARGET)
    } else {
        (
            QUIET_CO2_TARGET + f64::from(jitter.co2_target),
            QUIET_PM25_TARGET + f64::from(jitter.pm25_target),
        )
    }
}

/// Noise-free oscillator temperature at a cycle position.
pub fn base_temperature(cycle_position: u64) -> f64 {
    TEMP_BASE + TEMP_AMPLITUDE * (cycle_position as f64 * TEMP_PHASE_STEP).sin()
}

/// Humidity the air tends toward at a given temperature.
pub fn humidity_target(temp: f64) -> f64 {
    HUM_BASE - (temp - TEMP_BASE) * HUM_PER_DEGREE
}

/// One inertial step: `old + (target - old) * rate`.
pub fn approach(old: f64, target: f64, rate: f64) -> f64 {
    old + (target - old) * rate
}

/// Deterministic evolution step with explicit draws.
pub fn evolve(
    state: &SensorState,
    scenario: Scenario,
    spike: bool,
    cycle_position: u64,
    jitter: &Jitter,
) -> SensorState {
    let (target_co2, target_pm25) = targets(scenario, spike, jitter);

    let co2_rate = if scenario.is_pollution() {
        CO2_RATE_POLLUTION
    } else {
        CO2_RATE_NORMAL
    };
    let co2 = approach(state.co2, target_co2, co2_rate) + jitter.co2;

    let pm25_rate = if target_pm25 - state.pm25 > 0.0 {
        PM25_RATE_RISING
    } else {
        PM25_RATE_FALLING
    };
    let pm25 = approach(state.pm25, target_pm25, pm25_rate) + jitter.pm25;

    let temp = base_temperature(cycle_position) + jitter.temp;

    // Humidity follows the new (unrounded) temperature.
    let hum = approach(state.hum, humidity_target(temp), HUM_RATE);

    SensorState::new(co2, pm25, temp, hum).rounded()
}

/// Advance the state one tick, drawing fresh randomness from `rng`.
pub fn advance<R: Rng + ?Sized>(
    state: &SensorState,
    scenario: Scenario,
    spike: bool,
    cycle_position: u64,
    rng: &mut R,
) -> SensorState {
    let jitter = Jitter::sample(rng, scenario, spike);
    evolve(state, scenario, spike, cycle_position, &jitter)
}
