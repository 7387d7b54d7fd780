//! # Hopnet Flood
//!
//! Flooding with duplicate suppression.
//!
//! - [`FloodingProtocol`]: Per-node rebroadcast-once state machine
//! - [`FloodMessage`]: An id-tagged, timestamped flood message
//! - [`FloodConfig`]: Forwarding policy and per-hop delay
//!
//! On a tree with `E` edges, and with every node excluding the arrival
//! sender, one originated message costs exactly `E` transmissions and is
//! processed exactly once per node.

pub mod flood;

pub use flood::{FloodConfig, FloodMessage, FloodingProtocol};
