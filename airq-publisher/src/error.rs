// AirQ Publisher - MQTT publisher for simulated sensors
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for the publisher

use thiserror::Error;

/// Main error type for publisher operations
#[derive(Error, Debug)]
pub enum PublisherError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Broker connection could not be established
    #[error("Connection to {broker} failed: {reason}")]
    Connect { broker: String, reason: String },

    /// Simulation or transport error
    #[error("Simulation error: {0}")]
    Sim(#[from] airq_sim::SimError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for publisher operations
pub type Result<T> = std::result::Result<T, PublisherError>;
