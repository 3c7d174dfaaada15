// AirQ Publisher - MQTT publisher for simulated sensors
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Publisher configuration.
//!
//! Built-in defaults can be overridden by a JSON file, which can in turn be
//! overridden from the command line or environment.

use crate::error::{PublisherError, Result};
use airq_sim::{RetryStrategy, DEFAULT_TOPIC_PREFIX};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Retry settings for failed publishes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries per message (0 = best effort, drop on failure).
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    pub delay_ms: u64,
    /// Double the delay after each attempt.
    pub backoff: bool,
}

impl RetryConfig {
    /// Build the retry strategy.
    pub fn strategy(&self) -> RetryStrategy {
        let delay = Duration::from_millis(self.delay_ms);
        if self.backoff {
            RetryStrategy::doubling(self.max_retries, delay)
        } else {
            RetryStrategy::fixed(self.max_retries, delay)
        }
    }
}

/// Publisher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Broker host name.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Topic prefix (`<prefix>/<sensor>`).
    pub topic_prefix: String,
    /// MQTT client identifier.
    pub client_id: String,
    /// MQTT keep-alive in seconds.
    pub keep_alive_secs: u64,
    /// Delay between ticks in milliseconds.
    pub tick_interval_ms: u64,
    /// Delay after each published reading in milliseconds.
    pub publish_pacing_ms: u64,
    /// Random seed for reproducible runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Stop after this many ticks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ticks: Option<u64>,
    /// Port for the Prometheus endpoint (disabled when unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
    /// Publish retry settings.
    pub retry: RetryConfig,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
            client_id: "airq-sim".to_string(),
            keep_alive_secs: 60,
            tick_interval_ms: 20_000,
            publish_pacing_ms: 50,
            seed: None,
            max_ticks: None,
            metrics_port: None,
            retry: RetryConfig::default(),
        }
    }
}

impl PublisherConfig {
    /// Load configuration from a JSON file. Missing fields keep defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save configuration to a JSON file.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(PublisherError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(PublisherError::Config("port must not be 0".to_string()));
        }
        if self.topic_prefix.is_empty() {
            return Err(PublisherError::Config(
                "topic prefix must not be empty".to_string(),
            ));
        }
        if self.topic_prefix.contains(['+', '#']) {
            return Err(PublisherError::Config(format!(
                "topic prefix '{}' must not contain MQTT wildcards",
                self.topic_prefix
            )));
        }
        if self.client_id.is_empty() {
            return Err(PublisherError::Config(
                "client id must not be empty".to_string(),
            ));
        }
        if self.keep_alive_secs != 0 && self.keep_alive_secs < 5 {
            return Err(PublisherError::Config(
                "keep-alive must be 0 (disabled) or at least 5 seconds".to_string(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(PublisherError::Config(
                "tick interval must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Broker address as `host:port`.
    pub fn broker(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Delay between ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Delay after each published reading.
    pub fn publish_pacing(&self) -> Duration {
        Duration::from_millis(self.publish_pacing_ms)
    }
}
