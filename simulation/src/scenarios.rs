//! Pre-built simulation scenarios
//!
//! The A-B-C walk-through exercises every source-routing message kind on a
//! three node line.

use tracing::info;

use hopnet_core::{ForwardingPolicy, NodeName, VirtualTime};
use hopnet_routing::{DsrMessage, RouteDiscoveryConfig, RouteDiscoveryProtocol};

use crate::error::SimResult;
use crate::simulation::{SimConfig, Simulation};
use crate::topology::Mesh;
use crate::types::NetworkEvent;

/// Run the canonical A-B-C scenario:
///
/// ```text
/// A - B - C
///
/// T=0   A floods a route request for C
/// T=1   B relays it with path [A, B]
/// T=2   C answers with a route reply along [A, B, C]
/// T=3   B caches the route [C] and relays the reply
/// T=4   A caches the route [B, C]
/// T=20  A sends data to C along the cached route
/// T=22  C receives it, two hops later
/// ```
pub fn run_abc_scenario() -> SimResult<Simulation<RouteDiscoveryProtocol<NodeName>>> {
    info!("=== Running A-B-C Scenario ===");

    let mesh = Mesh::from_edges(&[("A", "B"), ("B", "C")])?;
    println!("{}", mesh.visualize());

    let a = NodeName::new("A")?;
    let c = NodeName::new("C")?;

    let mut sim = Simulation::new(mesh, SimConfig::default(), |id, mesh| {
        let config = RouteDiscoveryConfig::default()
            .with_policy(ForwardingPolicy::for_degree(mesh.degree(id)));
        Ok(RouteDiscoveryProtocol::new(id.clone(), config))
    })?;

    sim.schedule_origination(
        VirtualTime::ZERO,
        &a,
        DsrMessage::route_request(a.clone(), c.clone()),
    )?;
    let data_at = VirtualTime::new(20);
    sim.schedule_origination(
        data_at,
        &a,
        DsrMessage::data(a.clone(), c.clone(), b"Hello C!".to_vec(), data_at),
    )?;

    println!("\n--- Route discovery ---");
    sim.run_until(VirtualTime::new(data_at.ticks() - 1));
    for (id, node) in sim.nodes() {
        println!("  {} routes: {}", id, node.routing_table());
    }

    println!("\n--- Data ---");
    sim.run();

    println!("\n=== Final Statistics ===");
    println!("  Transmissions: {}", sim.stats.transmissions);
    println!("  Route replies: {}", sim.stats.route_replies);
    println!("  Routes cached: {}", sim.stats.routes_cached);
    println!("  Delivered: {}", sim.stats.delivered);
    println!("  Routing messages: {}", sim.total_routing_messages());

    println!("\n=== Event Log ===");
    for event in &sim.event_log {
        if let NetworkEvent::Handled { .. } | NetworkEvent::Failed { .. } = event {
            println!("  {:?}", event);
        }
    }

    sim.report();
    Ok(sim)
}
