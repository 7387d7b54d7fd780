//! # Hopnet Gossip
//!
//! Probabilistic rebroadcast tuned by an implicit spanning tree.
//!
//! Nodes classify their neighbors as parents, siblings or children purely
//! from the `(source, parent_hint)` pair carried on each message. The
//! number of parents sets how reliably this node must be fed; children
//! report that requirement upward, and a node forwards with probability
//! `max(gossip_threshold, max requirement over its children)`.
//!
//! - [`GossipProtocol`]: Per-node state machine
//! - [`GossipMessage`]: The gossiped message
//! - [`GossipConfig`]: Threshold and reliability parameters
//! - [`RoleSets`]: Neighbor/Parent/Sibling/Child bookkeeping

pub mod config;
pub mod error;
pub mod message;
pub mod protocol;
pub mod roles;

pub use config::GossipConfig;
pub use error::{GossipError, GossipResult};
pub use message::GossipMessage;
pub use protocol::GossipProtocol;
pub use roles::{Role, RoleSets, calculate_gossip_probability, calculate_required_probability};
