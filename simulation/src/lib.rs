//! # Hopnet Simulation
//!
//! A discrete-event simulator for multi-hop dissemination protocols.
//!
//! ## Overview
//!
//! Every node of a static [`Mesh`] runs one instance of a [`Protocol`]
//! implementation. The simulator owns the virtual clock and a single event
//! queue; it hands originated traffic and link arrivals to the protocols
//! and turns their sends into future arrivals.
//!
//! - **Virtual time**: integer ticks, every hop costs the configured delay
//! - **Deterministic order**: events at the same tick run in the order they
//!   were scheduled
//! - **Wire fidelity**: every copy on a link is encoded, then decoded at the
//!   receiver
//!
//! ## Architecture
//!
//! - **Topology** (`topology.rs`): Mesh construction (line, ring, tree, random, ...)
//! - **Scheduler** (`scheduler.rs`): Time-ordered event queue
//! - **Simulation** (`simulation.rs`): The event loop and link substrate
//! - **Traffic** (`traffic.rs`): Fixed-cadence message sources
//! - **Experiment** (`experiment.rs`): Config-driven runs of each protocol
//! - **Scenarios** (`scenarios.rs`): Pre-built walk-throughs
//!
//! ## Example
//!
//! ```rust,ignore
//! use hopnet_simulation::*;
//!
//! let config = ExperimentConfig::for_protocol(ProtocolKind::Flood);
//! let report = run_experiment(&config)?;
//! println!("{} transmissions", report.stats.transmissions);
//! ```
//!
//! [`Protocol`]: hopnet_core::Protocol

pub mod error;
pub mod experiment;
pub mod scenarios;
pub mod scheduler;
pub mod simulation;
pub mod topology;
pub mod traffic;
pub mod types;

pub use error::{SimError, SimResult};
pub use experiment::{
    ExperimentConfig, ExperimentReport, PolicyChoice, ProtocolKind, TopologyConfig, TopologyKind,
    run_experiment,
};
pub use scheduler::{Scheduled, Scheduler};
pub use simulation::{SimConfig, Simulation};
pub use topology::{Mesh, MeshBuilder};
pub use traffic::TrafficSource;
pub use types::{NetworkEvent, SimStats};

// Re-export core types for integration
pub use hopnet_core::{NodeName, VirtualTime};
