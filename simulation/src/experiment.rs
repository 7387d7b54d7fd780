//! Experiment driver
//!
//! An [`ExperimentConfig`] names a protocol, a topology, a traffic source
//! and the protocol parameters. [`run_experiment`] builds the mesh, puts one
//! protocol instance on every node, installs the traffic, runs to
//! completion and returns an [`ExperimentReport`].
//!
//! Defaults follow the classic setup: ten messages, every 20 ticks for
//! source routing and gossip, every 5 ticks for flooding. Source routing
//! sends to `node32` when the mesh has one, otherwise to the last node.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use hopnet_core::{DEFAULT_HOP_DELAY, ForwardingPolicy, NodeName, Protocol};
use hopnet_flood::{FloodConfig, FloodMessage, FloodingProtocol};
use hopnet_gossip::{GossipConfig, GossipMessage, GossipProtocol};
use hopnet_routing::{DsrMessage, RouteDiscoveryConfig, RouteDiscoveryProtocol};

use crate::error::{SimError, SimResult};
use crate::simulation::{SimConfig, Simulation};
use crate::topology::{Mesh, MeshBuilder};
use crate::traffic::TrafficSource;
use crate::types::SimStats;

/// Default number of messages per experiment
pub const DEFAULT_EXPERIMENT_COUNT: u32 = 10;

/// Node source routing sends to when it exists
pub const DEFAULT_DESTINATION: &str = "node32";

/// Payload carried by source-routed data
pub const DATA_PAYLOAD: &[u8] = b"Hello!";

/// Which protocol runs on every node
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKind {
    #[display("dsr")]
    Dsr,
    #[display("flood")]
    Flood,
    #[display("gossip")]
    Gossip,
}

impl ProtocolKind {
    /// Ticks between originated messages
    pub fn default_interval(self) -> u64 {
        match self {
            Self::Dsr | Self::Gossip => 20,
            Self::Flood => 5,
        }
    }
}

/// Shape of a generated mesh
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum TopologyKind {
    #[display("line")]
    Line,
    #[display("star")]
    Star,
    #[display("ring")]
    Ring,
    #[display("full")]
    Full,
    #[display("tree")]
    Tree,
    #[display("random")]
    Random,
}

/// Parameters for a generated mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub kind: TopologyKind,
    pub nodes: usize,
    /// Children per node for trees
    pub branching: usize,
    /// Link probability for random meshes
    pub probability: f64,
    /// Seed for random meshes
    pub seed: u64,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            kind: TopologyKind::Random,
            nodes: 40,
            branching: 2,
            probability: 0.1,
            seed: 12345,
        }
    }
}

impl TopologyConfig {
    pub fn build(&self) -> SimResult<Mesh> {
        let builder = MeshBuilder::new(self.nodes)?;
        match self.kind {
            TopologyKind::Line => Ok(builder.line()),
            TopologyKind::Star => Ok(builder.star()),
            TopologyKind::Ring => Ok(builder.ring()),
            TopologyKind::Full => Ok(builder.full_mesh()),
            TopologyKind::Tree => builder.tree(self.branching),
            TopologyKind::Random => builder.random(self.probability, self.seed),
        }
    }
}

/// How each node picks its forwarding policy
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum PolicyChoice {
    /// Broadcast-all on degree-1 nodes, except-sender elsewhere
    #[default]
    #[display("auto")]
    Auto,
    #[display("broadcast-all")]
    BroadcastAll,
    #[display("except-sender")]
    ExceptSender,
}

impl PolicyChoice {
    pub fn for_degree(self, degree: usize) -> ForwardingPolicy {
        match self {
            Self::Auto => ForwardingPolicy::for_degree(degree),
            Self::BroadcastAll => ForwardingPolicy::BroadcastAll,
            Self::ExceptSender => ForwardingPolicy::ExceptSender,
        }
    }
}

/// Everything needed to reproduce one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub protocol: ProtocolKind,
    pub topology: TopologyConfig,
    /// Originating node; the first node when unset
    pub source: Option<String>,
    /// Source-routing destination
    pub destination: Option<String>,
    /// Ticks between messages; protocol default when unset
    pub interval: Option<u64>,
    /// Messages to originate
    pub count: Option<u32>,
    /// Seed for per-node gossip randomness
    pub seed: u64,
    /// Forwarding policy for source routing and flooding
    pub policy: PolicyChoice,
    /// Delay of every hop, in ticks
    pub hop_delay: u64,
    pub gossip: GossipConfig,
    pub sim: SimConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self::for_protocol(ProtocolKind::Dsr)
    }
}

impl ExperimentConfig {
    pub fn for_protocol(protocol: ProtocolKind) -> Self {
        Self {
            protocol,
            topology: TopologyConfig::default(),
            source: None,
            destination: None,
            interval: None,
            count: None,
            seed: 12345,
            policy: PolicyChoice::default(),
            hop_delay: DEFAULT_HOP_DELAY,
            gossip: GossipConfig::default(),
            sim: SimConfig::default(),
        }
    }

    /// Load a config from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn effective_interval(&self) -> u64 {
        self.interval.unwrap_or_else(|| self.protocol.default_interval())
    }

    pub fn effective_count(&self) -> u32 {
        self.count.unwrap_or(DEFAULT_EXPERIMENT_COUNT)
    }

    /// The configured source, or the first node
    pub fn resolve_source(&self, mesh: &Mesh) -> SimResult<NodeName> {
        match &self.source {
            Some(name) => lookup(mesh, name),
            None => mesh
                .node_ids()
                .into_iter()
                .next()
                .ok_or_else(|| SimError::InvalidTopology("mesh has no nodes".to_string())),
        }
    }

    /// The configured destination, else `node32`, else the last node
    pub fn resolve_destination(&self, mesh: &Mesh) -> SimResult<NodeName> {
        if let Some(name) = &self.destination {
            return lookup(mesh, name);
        }
        let preferred = NodeName::new(DEFAULT_DESTINATION)?;
        if mesh.contains(&preferred) {
            return Ok(preferred);
        }
        mesh.node_ids()
            .into_iter()
            .max_by_key(|name| name_index(name))
            .ok_or_else(|| SimError::InvalidTopology("mesh has no nodes".to_string()))
    }
}

fn lookup(mesh: &Mesh, name: &str) -> SimResult<NodeName> {
    let node = NodeName::new(name)?;
    if mesh.contains(&node) {
        Ok(node)
    } else {
        Err(SimError::UnknownNode(node.to_string()))
    }
}

/// Numeric suffix of generated names, so node10 sorts after node9
fn name_index(name: &NodeName) -> (usize, String) {
    let digits = name.as_str().trim_start_matches(|c: char| !c.is_ascii_digit());
    (digits.parse().unwrap_or(0), name.as_str().to_string())
}

/// Outcome of one experiment
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentReport {
    pub protocol: ProtocolKind,
    pub nodes: usize,
    pub edges: usize,
    pub source: String,
    pub destination: Option<String>,
    pub interval: u64,
    pub count: u32,
    pub end_time: u64,
    /// Sum of every node's routing message count
    pub routing_messages: u64,
    pub routing_messages_by_node: BTreeMap<String, u64>,
    pub stats: SimStats,
}

/// Build, run and summarise one experiment
pub fn run_experiment(config: &ExperimentConfig) -> SimResult<ExperimentReport> {
    let mesh = config.topology.build()?;
    let source = config.resolve_source(&mesh)?;
    let traffic = TrafficSource::new(
        source.clone(),
        config.effective_interval(),
        config.effective_count(),
    );
    info!(
        protocol = %config.protocol,
        topology = %config.topology.kind,
        nodes = mesh.node_count(),
        edges = mesh.edge_count(),
        source = %source,
        "Starting experiment"
    );

    let hop_delay = config.hop_delay;
    match config.protocol {
        ProtocolKind::Dsr => {
            let destination = config.resolve_destination(&mesh)?;
            let mut sim = Simulation::new(mesh, config.sim.clone(), |id, mesh| {
                let node_config = RouteDiscoveryConfig {
                    policy: config.policy.for_degree(mesh.degree(id)),
                    hop_delay,
                };
                Ok(RouteDiscoveryProtocol::new(id.clone(), node_config))
            })?;
            traffic.install(&mut sim, |_, at| {
                DsrMessage::data(source.clone(), destination.clone(), DATA_PAYLOAD, at)
            })?;
            Ok(finish(config, &traffic, Some(&destination), sim))
        }
        ProtocolKind::Flood => {
            let mut sim = Simulation::new(mesh, config.sim.clone(), |id, mesh| {
                let node_config = FloodConfig {
                    policy: config.policy.for_degree(mesh.degree(id)),
                    hop_delay,
                };
                Ok(FloodingProtocol::new(id.clone(), node_config))
            })?;
            traffic.install(&mut sim, FloodMessage::new)?;
            Ok(finish(config, &traffic, None, sim))
        }
        ProtocolKind::Gossip => {
            let gossip = GossipConfig {
                hop_delay,
                ..config.gossip
            };
            let mut node_index = 0u64;
            let mut sim = Simulation::new(mesh, config.sim.clone(), |id, _| {
                node_index += 1;
                let seed = config.seed.wrapping_add(node_index);
                Ok(GossipProtocol::seeded(id.clone(), gossip, seed)?)
            })?;
            traffic.install(&mut sim, |i, at| {
                GossipMessage::originated(i, source.clone(), at)
            })?;
            Ok(finish(config, &traffic, None, sim))
        }
    }
}

fn finish<P: Protocol<NodeName>>(
    config: &ExperimentConfig,
    traffic: &TrafficSource,
    destination: Option<&NodeName>,
    mut sim: Simulation<P>,
) -> ExperimentReport {
    sim.run();
    sim.report();
    ExperimentReport {
        protocol: config.protocol,
        nodes: sim.mesh().node_count(),
        edges: sim.mesh().edge_count(),
        source: traffic.node.to_string(),
        destination: destination.map(NodeName::to_string),
        interval: traffic.interval,
        count: traffic.count,
        end_time: sim.now().ticks(),
        routing_messages: sim.total_routing_messages(),
        routing_messages_by_node: sim
            .routing_messages_by_node()
            .into_iter()
            .map(|(id, count)| (id.to_string(), count))
            .collect(),
        stats: sim.stats.clone(),
    }
}
