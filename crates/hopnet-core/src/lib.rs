//! # Hopnet Core
//!
//! Core traits, types, and errors shared by the hopnet routing protocols.
//!
//! Protocol crates only ever see the abstractions defined here, so the same
//! per-node state machines run inside the discrete-event simulator and
//! inside the in-memory [`RecordingNetwork`] used by unit tests.
//!
//! ## Key Traits
//!
//! - [`PeerIdentity`]: Abstraction over node identification (char for tests, string names for the simulator)
//! - [`NeighborDirectory`]: Adjacency as seen from one node
//! - [`DeliverySubstrate`]: Fire-and-forget sends plus the virtual clock
//! - [`Protocol`]: A per-node routing state machine
//! - [`WireCodec`]: Conversion between typed messages and the wire envelope
//!
//! ## Key Types
//!
//! - [`WireMessage`]: The envelope every protocol message travels in
//! - [`Disposition`]: What a handler did with a message
//! - [`KnownMessageSet`]: Duplicate suppression
//! - [`VirtualTime`]: Ticks of the simulated clock

pub mod disposition;
pub mod error;
pub mod identity;
pub mod known;
pub mod recording;
pub mod time;
pub mod traits;
pub mod wire;

// Re-export main types
pub use disposition::*;
pub use error::*;
pub use identity::*;
pub use known::*;
pub use recording::*;
pub use time::*;
pub use traits::*;
pub use wire::*;

/// Per-hop delivery delay used when nothing else is configured
pub const DEFAULT_HOP_DELAY: u64 = 1;
