// AirQ Sim - Sensor state
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Sensor identities and the simulated state vector.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four simulated sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Carbon dioxide concentration.
    Co2,
    /// Fine particulate matter (PM2.5).
    Pm25,
    /// Air temperature.
    Temp,
    /// Relative humidity.
    Hum,
}

impl SensorKind {
    /// All sensors, in emission order.
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Co2,
        SensorKind::Pm25,
        SensorKind::Temp,
        SensorKind::Hum,
    ];

    /// Short key used in topic names.
    pub fn key(&self) -> &'static str {
        match self {
            SensorKind::Co2 => "co2",
            SensorKind::Pm25 => "pm25",
            SensorKind::Temp => "temp",
            SensorKind::Hum => "hum",
        }
    }

    /// Synthetic sensor identifier carried in each reading.
    pub fn sensor_id(&self) -> String {
        format!("sim_{}", self.key())
    }

    /// Unit of measurement.
    pub fn unit(&self) -> &'static str {
        match self {
            SensorKind::Co2 => "ppm",
            SensorKind::Pm25 => "µg/m³",
            SensorKind::Temp => "°C",
            SensorKind::Hum => "%",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when parsing an unknown sensor key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown sensor key: {0}")]
pub struct UnknownSensor(pub String);

impl FromStr for SensorKind {
    type Err = UnknownSensor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "co2" => Ok(SensorKind::Co2),
            "pm25" => Ok(SensorKind::Pm25),
            "temp" => Ok(SensorKind::Temp),
            "hum" => Ok(SensorKind::Hum),
            other => Err(UnknownSensor(other.to_string())),
        }
    }
}

/// Simulated physical values, replaced wholesale every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorState {
    /// CO2 in ppm.
    pub co2: f64,
    /// PM2.5 in µg/m³.
    pub pm25: f64,
    /// Temperature in °C.
    pub temp: f64,
    /// Relative humidity in %.
    pub hum: f64,
}

impl Default for SensorState {
    fn default() -> Self {
        Self {
            co2: 420.0,
            pm25: 10.0,
            temp: 22.0,
            hum: 50.0,
        }
    }
}

impl SensorState {
    /// Create a state from explicit values.
    pub fn new(co2: f64, pm25: f64, temp: f64, hum: f64) -> Self {
        Self {
            co2,
            pm25,
            temp,
            hum,
        }
    }

    /// Value of a single sensor.
    pub fn get(&self, kind: SensorKind) -> f64 {
        match kind {
            SensorKind::Co2 => self.co2,
            SensorKind::Pm25 => self.pm25,
            SensorKind::Temp => self.temp,
            SensorKind::Hum => self.hum,
        }
    }

    /// `(sensor, value)` pairs in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (SensorKind, f64)> + '_ {
        SensorKind::ALL.iter().map(move |&kind| (kind, self.get(kind)))
    }

    /// True when every value is finite.
    pub fn is_finite(&self) -> bool {
        self.iter().all(|(_, v)| v.is_finite())
    }

    /// Copy with every value rounded to two decimals.
    pub fn rounded(&self) -> Self {
        Self {
            co2: round_to_cents(self.co2),
            pm25: round_to_cents(self.pm25),
            temp: round_to_cents(self.temp),
            hum: round_to_cents(self.hum),
        }
    }
}

/// Round to two decimal digits.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = SensorState::default();
        assert_eq!(state, SensorState::new(420.0, 10.0, 22.0, 50.0));
        assert!(state.is_finite());
    }

    #[test]
    fn test_iter_order() {
        let state = SensorState::new(1.0, 2.0, 3.0, 4.0);
        let pairs: Vec<_> = state.iter().collect();
        assert_eq!(
            pairs,
            vec![
                (SensorKind::Co2, 1.0),
                (SensorKind::Pm25, 2.0),
                (SensorKind::Temp, 3.0),
                (SensorKind::Hum, 4.0),
            ]
        );
    }

    #[test]
    fn test_sensor_kind_parse() {
        for kind in SensorKind::ALL {
            assert_eq!(kind.key().parse::<SensorKind>().unwrap(), kind);
        }
        assert!("pm10".parse::<SensorKind>().is_err());
        assert_eq!(SensorKind::Pm25.sensor_id(), "sim_pm25");
    }

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(23.82487), 23.82);
        assert_eq!(round_to_cents(50.0525001), 50.05);
        assert_eq!(round_to_cents(-4.996), -5.0);

        let v = round_to_cents(1234.5678);
        assert_eq!(round_to_cents(v), v);
    }

    #[test]
    fn test_not_finite() {
        let state = SensorState::new(f64::NAN, 1.0, 1.0, 1.0);
        assert!(!state.is_finite());
    }
}
