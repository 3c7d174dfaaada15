//! Error types for AirQ Sim
//!
//! The evolution engine and scenario driver are total; errors only arise
//! at the transport seam and when encoding payloads.

use thiserror::Error;

/// Result type alias for AirQ Sim operations
pub type Result<T> = std::result::Result<T, SimError>;

/// Main error type for AirQ Sim operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Payload could not be encoded or decoded
    #[error("Encoding error: {0}")]
    Encode(String),
}

/// Errors raised by a message transport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Connection is gone
    #[error("Disconnected: {reason}")]
    Disconnected { reason: String },

    /// Broker or client refused the message
    #[error("Publish rejected: {reason}")]
    Rejected { reason: String },

    /// Outgoing queue is full
    #[error("Send buffer full")]
    BufferFull,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::Transport(TransportError::Disconnected {
            reason: "broker went away".to_string(),
        });
        let msg = format!("{}", err);
        assert!(msg.contains("Disconnected"));
        assert!(msg.contains("broker went away"));
    }

    #[test]
    fn test_error_conversion() {
        let sim_err: SimError = TransportError::BufferFull.into();
        assert!(matches!(sim_err, SimError::Transport(TransportError::BufferFull)));
    }
}
