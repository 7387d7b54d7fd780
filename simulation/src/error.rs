//! Error types for the simulator

use hopnet_core::{IdentityError, ProtocolError};
use hopnet_gossip::GossipError;
use thiserror::Error;

/// Errors raised while building or driving a simulation
///
/// Message-scoped protocol failures never surface here; the substrate logs
/// and counts them. These are setup errors.
#[derive(Debug, Error)]
pub enum SimError {
    /// A node name that is not part of the mesh
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// A topology that cannot be built with the given parameters
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// A traffic schedule that does not fit in virtual time
    #[error("invalid traffic: {0}")]
    InvalidTraffic(String),

    /// Protocol error outside message handling
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Invalid gossip parameters
    #[error("gossip configuration error: {0}")]
    Gossip(#[from] GossipError),

    /// Invalid node name
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Experiment file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Experiment file could not be parsed
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for simulator operations
pub type SimResult<T> = Result<T, SimError>;
