//! Node identity abstractions
//!
//! Protocols are generic over [`PeerIdentity`] so the same state machines
//! run against:
//!
//! - `SimulationIdentity`: single capital letter ('A'..'Z'), handy in tests
//! - `NodeName`: opaque string names such as `node32`, used by the simulator

use std::fmt::{Debug, Display};
use std::hash::Hash;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::IdentityError;

/// Trait for node identity abstraction
///
/// Identities are compared, hashed and ordered (routing tables and role sets
/// are kept in ordered containers so reports are reproducible), and travel
/// inside the postcard wire frame through serde.
pub trait PeerIdentity:
    Clone + Eq + Ord + Hash + Debug + Display + Serialize + DeserializeOwned + 'static
{
    /// Get a short display form (for logging)
    fn short_id(&self) -> String {
        format!("{}", self)
    }
}

/// Simple character-based identity for tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimulationIdentity(pub char);

impl SimulationIdentity {
    /// Create a new simulation identity from a capital letter
    pub fn new(c: char) -> Option<Self> {
        if c.is_ascii_uppercase() {
            Some(Self(c))
        } else {
            None
        }
    }

}

impl Display for SimulationIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PeerIdentity for SimulationIdentity {
    fn short_id(&self) -> String {
        self.0.to_string()
    }
}

/// Opaque string name of a node (`node0`, `node32`, `gateway`, ...)
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("{_0}")]
pub struct NodeName(String);

impl NodeName {
    /// Create a node name; empty or whitespace-bearing names are rejected
    pub fn new(name: impl Into<String>) -> Result<Self, IdentityError> {
        let name = name.into();
        if name.is_empty() {
            return Err(IdentityError::InvalidFormat("empty node name".to_string()));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(IdentityError::InvalidFormat(format!(
                "node name contains whitespace: {:?}",
                name
            )));
        }
        Ok(Self(name))
    }

    /// The conventional generated name for the node at `index`
    pub fn indexed(index: usize) -> Self {
        Self(format!("node{}", index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PeerIdentity for NodeName {}
