// AirQ Sim - Transport abstraction
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Transport abstraction module
//!
//! The simulator never talks to a broker directly. Callers hand readings to
//! a [`Transport`], which delivers them fire-and-forget.

use crate::error::{Result, TransportError};
use std::collections::VecDeque;

/// Statistics about transport usage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportMetrics {
    /// Total payload bytes handed to the transport
    pub bytes_sent: u64,
    /// Total messages accepted
    pub messages_sent: u64,
    /// Total messages refused
    pub messages_failed: u64,
}

/// Trait for publish/subscribe transports
pub trait Transport {
    /// Publish a payload on a topic without waiting for acknowledgment
    fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<()>;

    /// Check if the transport can accept messages
    fn is_connected(&self) -> bool;

    /// Get transport metrics
    fn metrics(&self) -> TransportMetrics;

    /// Release the connection
    fn close(&mut self);
}

/// A message captured by [`MemoryTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    /// Destination topic
    pub topic: String,
    /// Raw payload
    pub payload: Vec<u8>,
}

/// An in-memory transport for testing and dry runs
#[derive(Debug)]
pub struct MemoryTransport {
    /// Published messages, oldest first
    outbox: VecDeque<PublishedMessage>,
    /// Maximum retained messages
    max_buffer_size: usize,
    /// Number of upcoming publishes to refuse
    fail_next: u32,
    /// Whether the transport is open
    is_open: bool,
    /// Metrics
    metrics: TransportMetrics,
}

impl MemoryTransport {
    /// Create a new memory transport
    pub fn new() -> Self {
        Self::with_buffer_size(1000)
    }

    /// Create with custom buffer size
    pub fn with_buffer_size(max_size: usize) -> Self {
        Self {
            outbox: VecDeque::with_capacity(max_size.min(1024)),
            max_buffer_size: max_size,
            fail_next: 0,
            is_open: true,
            metrics: TransportMetrics::default(),
        }
    }

    /// Refuse the next `count` publishes with [`TransportError::Rejected`]
    pub fn fail_next(&mut self, count: u32) {
        self.fail_next = count;
    }

    /// Pop the oldest published message
    pub fn pop(&mut self) -> Option<PublishedMessage> {
        self.outbox.pop_front()
    }

    /// Drain every published message
    pub fn drain(&mut self) -> Vec<PublishedMessage> {
        self.outbox.drain(..).collect()
    }

    /// Number of retained messages
    pub fn pending(&self) -> usize {
        self.outbox.len()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<()> {
        if !self.is_open {
            self.metrics.messages_failed += 1;
            return Err(TransportError::Disconnected {
                reason: "Transport is closed".to_string(),
            }
            .into());
        }

        if self.fail_next > 0 {
            self.fail_next -= 1;
            self.metrics.messages_failed += 1;
            return Err(TransportError::Rejected {
                reason: "injected failure".to_string(),
            }
            .into());
        }

        if self.outbox.len() >= self.max_buffer_size {
            self.metrics.messages_failed += 1;
            return Err(TransportError::BufferFull.into());
        }

        self.metrics.bytes_sent += payload.len() as u64;
        self.metrics.messages_sent += 1;
        self.outbox.push_back(PublishedMessage {
            topic: topic.to_string(),
            payload,
        });

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.is_open
    }

    fn metrics(&self) -> TransportMetrics {
        self.metrics.clone()
    }

    fn close(&mut self) {
        self.is_open = false;
    }
}
