//! hopnet - multi-hop dissemination simulator
//!
//! Runs source routing, flooding or gossip over a generated mesh and prints
//! the run statistics.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use hopnet_logging::{HopnetSubscriberBuilder, LogConfig};
use hopnet_simulation::{
    ExperimentConfig, ExperimentReport, PolicyChoice, ProtocolKind, TopologyConfig,
    TopologyKind, run_experiment, scenarios,
};

#[derive(Parser)]
#[command(
    name = "hopnet",
    about = "Discrete-event simulator for multi-hop dissemination protocols",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write a JSONL log of the run into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Print the experiment report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run reactive source routing
    Dsr(RunArgs),

    /// Run duplicate-suppressed flooding
    Flood(RunArgs),

    /// Run role-based probabilistic gossip
    Gossip {
        #[command(flatten)]
        run: RunArgs,

        /// Minimum forwarding probability
        #[arg(long)]
        threshold: Option<f64>,

        /// Target end-to-end reliability
        #[arg(long)]
        tau: Option<f64>,

        /// Expected hop diameter
        #[arg(long)]
        delta: Option<f64>,
    },

    /// Run the A-B-C source routing walk-through
    Abc,

    /// Create and visualize a topology
    Topology {
        #[arg(short, long, value_enum, default_value_t = TopologyKind::Random)]
        topology: TopologyKind,

        #[arg(short, long, default_value = "40")]
        nodes: usize,

        /// Children per node for trees
        #[arg(long, default_value = "2")]
        branching: usize,

        /// Link probability for random meshes
        #[arg(long, default_value = "0.1")]
        probability: f64,

        #[arg(long, default_value = "12345")]
        seed: u64,
    },
}

/// Overrides applied on top of the defaults or a config file
#[derive(Args)]
struct RunArgs {
    /// JSON experiment config; flags override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    topology: Option<TopologyKind>,

    #[arg(short, long)]
    nodes: Option<usize>,

    #[arg(long)]
    branching: Option<usize>,

    #[arg(long)]
    probability: Option<f64>,

    /// Seed for random meshes
    #[arg(long)]
    topology_seed: Option<u64>,

    #[arg(long)]
    source: Option<String>,

    #[arg(long)]
    destination: Option<String>,

    /// Ticks between originated messages
    #[arg(long)]
    interval: Option<u64>,

    /// Number of messages to originate
    #[arg(long)]
    count: Option<u32>,

    /// Seed for per-node randomness
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    policy: Option<PolicyChoice>,

    #[arg(long)]
    hop_delay: Option<u64>,

    /// Stop processing events after this tick
    #[arg(long)]
    max_time: Option<u64>,
}

impl RunArgs {
    fn into_config(self, protocol: ProtocolKind) -> anyhow::Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ExperimentConfig::for_protocol(protocol),
        };
        config.protocol = protocol;

        if let Some(kind) = self.topology {
            config.topology.kind = kind;
        }
        if let Some(nodes) = self.nodes {
            config.topology.nodes = nodes;
        }
        if let Some(branching) = self.branching {
            config.topology.branching = branching;
        }
        if let Some(probability) = self.probability {
            config.topology.probability = probability;
        }
        if let Some(seed) = self.topology_seed {
            config.topology.seed = seed;
        }
        if self.source.is_some() {
            config.source = self.source;
        }
        if self.destination.is_some() {
            config.destination = self.destination;
        }
        if self.interval.is_some() {
            config.interval = self.interval;
        }
        if self.count.is_some() {
            config.count = self.count;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(hop_delay) = self.hop_delay {
            config.hop_delay = hop_delay;
        }
        if self.max_time.is_some() {
            config.sim.max_time = self.max_time;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_config = match &cli.log_dir {
        Some(dir) => LogConfig::with_run_log(dir, "hopnet"),
        None if cli.verbose => LogConfig::development(),
        None => LogConfig::default(),
    };
    let mut builder = HopnetSubscriberBuilder::new().with_config(log_config);
    if cli.verbose {
        builder = builder.with_level("debug");
    }
    if cli.json {
        builder = builder.with_console(false);
    }
    let _guard = builder.init();

    let experiment = match cli.command {
        Commands::Dsr(run) => run.into_config(ProtocolKind::Dsr)?,
        Commands::Flood(run) => run.into_config(ProtocolKind::Flood)?,
        Commands::Gossip {
            run,
            threshold,
            tau,
            delta,
        } => {
            let mut config = run.into_config(ProtocolKind::Gossip)?;
            if let Some(threshold) = threshold {
                config.gossip.gossip_threshold = threshold;
            }
            if let Some(tau) = tau {
                config.gossip.tau_reliability = tau;
            }
            if let Some(delta) = delta {
                config.gossip.delta = delta;
            }
            config
        }
        Commands::Abc => {
            scenarios::run_abc_scenario()?;
            return Ok(());
        }
        Commands::Topology {
            topology,
            nodes,
            branching,
            probability,
            seed,
        } => {
            let mesh = TopologyConfig {
                kind: topology,
                nodes,
                branching,
                probability,
                seed,
            }
            .build()?;
            println!("{}", mesh.visualize());
            return Ok(());
        }
    };

    let report = run_experiment(&experiment)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &ExperimentReport) {
    let stats = &report.stats;
    println!("\n=== {} experiment ===", report.protocol);
    println!("  Nodes: {}  Edges: {}", report.nodes, report.edges);
    match &report.destination {
        Some(dest) => println!("  Traffic: {} -> {}", report.source, dest),
        None => println!("  Traffic: from {}", report.source),
    }
    println!(
        "  Messages: {} every {} ticks, finished at T={}",
        report.count, report.interval, report.end_time
    );
    println!("  Routing messages: {}", report.routing_messages);
    println!("  Transmissions: {}", stats.transmissions);
    println!("  Arrivals: {}", stats.arrivals);
    println!("  Delivered: {}", stats.delivered);
    println!("  Discoveries started: {}", stats.discoveries_started);
    println!(
        "  Suppressed: {} duplicate, {} by probability",
        stats.duplicates_suppressed, stats.probability_suppressed
    );
    println!("  Errors: {}", stats.errors);
    match stats.mean_latency() {
        Some(mean) => println!("  Latency: mean {:.2}, max {}", mean, stats.max_latency),
        None => println!("  Latency: no samples"),
    }
}

