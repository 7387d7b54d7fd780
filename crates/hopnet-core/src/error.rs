//! Error types for hopnet protocols
//!
//! Every [`ProtocolError`] is message-scoped: the substrate logs it, discards
//! the offending message and keeps the node running.

use thiserror::Error;

/// Errors related to node identity
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid identity format: {0}")]
    InvalidFormat(String),
}

/// Errors raised while handling a single message
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Unrecognized message kind: {0}")]
    UnrecognizedMessageKind(u32),

    #[error("Message kind {kind} is missing required field `{field}`")]
    MissingField { kind: u32, field: &'static str },

    #[error("Node {node} is not on the route reply path")]
    SelfNotInPath { node: String },

    #[error("No link from {from} to next hop {to}")]
    NoRouteToNextHop { from: String, to: String },

    #[error("Wire codec error: {0}")]
    Codec(String),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
}

impl ProtocolError {
    pub fn self_not_in_path(node: &impl std::fmt::Display) -> Self {
        Self::SelfNotInPath {
            node: node.to_string(),
        }
    }

    pub fn no_route_to_next_hop(
        from: &impl std::fmt::Display,
        to: &impl std::fmt::Display,
    ) -> Self {
        Self::NoRouteToNextHop {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

impl From<postcard::Error> for ProtocolError {
    fn from(err: postcard::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

/// Result type alias for message handling
pub type ProtocolResult<T> = Result<T, ProtocolError>;
