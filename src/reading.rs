// AirQ Sim - Outbound readings
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Message payloads and topic naming.

use crate::error::{Result, SimError};
use crate::state::SensorKind;
use serde::{Deserialize, Serialize};

/// Default topic prefix.
pub const DEFAULT_TOPIC_PREFIX: &str = "AirQuality";

/// One sensor value as published on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Value rounded to two decimals.
    pub value: f64,
    /// Synthetic identifier (`sim_<key>`).
    pub sensor_id: String,
    /// Epoch seconds, shared by all readings of one tick.
    pub timestamp: f64,
}

impl SensorReading {
    /// Build the reading for a sensor.
    pub fn new(kind: SensorKind, value: f64, timestamp: f64) -> Self {
        Self {
            value,
            sensor_id: kind.sensor_id(),
            timestamp,
        }
    }

    /// Encode as a JSON payload.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| SimError::Encode(e.to_string()))
    }

    /// Decode a JSON payload.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| SimError::Encode(e.to_string()))
    }
}

/// Topic for a sensor under `prefix` (`<prefix>/<key>`).
pub fn topic_for(prefix: &str, kind: SensorKind) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), kind.key())
}
