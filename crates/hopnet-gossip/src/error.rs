//! Error types for hopnet-gossip

use thiserror::Error;

/// Invalid gossip configuration
#[derive(Debug, Error, PartialEq)]
pub enum GossipError {
    /// Threshold outside [0, 1]
    #[error("gossip_threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    /// Reliability target outside [0, 1]
    #[error("tau_reliability must be within [0, 1], got {0}")]
    InvalidReliability(f64),

    /// Non-positive or non-finite delta
    #[error("delta must be a positive finite number, got {0}")]
    InvalidDelta(f64),
}

/// Result type for gossip operations
pub type GossipResult<T> = Result<T, GossipError>;
