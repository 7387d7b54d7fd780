//! Multi-node gossip runs over the recording network

use std::collections::BTreeMap;

use hopnet_core::{
    ArrivalContext, Disposition, Protocol, RecordingNetwork, SimulationIdentity, SuppressReason,
    VirtualTime,
};
use hopnet_gossip::{GossipConfig, GossipMessage, GossipProtocol, Role};

type Id = SimulationIdentity;
type Net = RecordingNetwork<Id, GossipMessage<Id>>;

fn make_id(c: char) -> Id {
    SimulationIdentity::new(c).unwrap()
}

fn build(edges: &[(char, char)], config: GossipConfig) -> (Net, BTreeMap<Id, GossipProtocol<Id>>) {
    let edges: Vec<(Id, Id)> = edges.iter().map(|(a, b)| (make_id(*a), make_id(*b))).collect();
    let net = RecordingNetwork::with_edges(&edges);
    let nodes = net
        .nodes()
        .into_iter()
        .enumerate()
        .map(|(i, id)| (id, GossipProtocol::seeded(id, config, i as u64).unwrap()))
        .collect();
    (net, nodes)
}

#[test]
fn test_line_reaches_everyone_and_infers_roles() {
    let config = GossipConfig::default().with_threshold(1.0);
    let (mut net, mut nodes) = build(&[('A', 'B'), ('B', 'C'), ('C', 'D')], config);
    let (a, b, c, d) = (make_id('A'), make_id('B'), make_id('C'), make_id('D'));

    let msg = nodes[&a].make_message(1, VirtualTime::ZERO);
    nodes.get_mut(&a).unwrap().originate(msg, &mut net).unwrap();
    let outcomes = net.pump(&mut nodes);

    assert!(nodes.values().all(|n| n.has_processed(1)));
    let total: u64 = nodes.values().map(|n| n.routing_message_count()).sum();
    assert_eq!(total, 6);

    // Latency grows by one per hop on the first arrival at each node
    let first_latency = |node: Id| {
        outcomes
            .iter()
            .find(|(at, o)| *at == node && matches!(o, Ok(Disposition::Forwarded { .. })))
            .and_then(|(_, o)| o.as_ref().ok().and_then(Disposition::latency))
    };
    assert_eq!(first_latency(b), Some(1));
    assert_eq!(first_latency(c), Some(2));
    assert_eq!(first_latency(d), Some(3));

    // The originator stamps itself as parent, so B cannot place A
    assert_eq!(nodes[&b].roles().role_of(&a), None);
    assert_eq!(nodes[&a].roles().role_of(&b), Some(Role::Child));
    assert_eq!(nodes[&c].roles().role_of(&b), Some(Role::Parent));
    assert_eq!(nodes[&b].roles().role_of(&c), Some(Role::Child));
    assert_eq!(nodes[&d].roles().role_of(&c), Some(Role::Parent));
    assert_eq!(nodes[&c].roles().role_of(&d), Some(Role::Child));
}

#[test]
fn test_zero_threshold_stops_after_first_hop() {
    let config = GossipConfig::default().with_threshold(0.0);
    let (mut net, mut nodes) = build(&[('A', 'B'), ('B', 'C')], config);
    let a = make_id('A');

    let msg = nodes[&a].make_message(1, VirtualTime::ZERO);
    nodes.get_mut(&a).unwrap().originate(msg, &mut net).unwrap();
    let outcomes = net.pump(&mut nodes);

    assert_eq!(outcomes.len(), 1);
    assert_eq!(
        outcomes[0].1.as_ref().unwrap().suppress_reason(),
        Some(SuppressReason::ProbabilityGate)
    );
    assert!(!nodes[&make_id('C')].has_processed(1));
}

#[test]
fn test_replay_after_run_is_silent() {
    let config = GossipConfig::default().with_threshold(1.0);
    let (mut net, mut nodes) = build(&[('A', 'B'), ('B', 'C')], config);
    let (a, b, c) = (make_id('A'), make_id('B'), make_id('C'));

    let msg = nodes[&a].make_message(5, VirtualTime::ZERO);
    nodes.get_mut(&a).unwrap().originate(msg.clone(), &mut net).unwrap();
    net.pump(&mut nodes);
    let before: u64 = nodes.values().map(|n| n.routing_message_count()).sum();

    let replay = msg.relayed_by(&b);
    let outcome = nodes
        .get_mut(&c)
        .unwrap()
        .handle(&ArrivalContext::from_neighbor(c, b), replay, &mut net)
        .unwrap();

    assert_eq!(outcome.suppress_reason(), Some(SuppressReason::Duplicate));
    assert!(net.sent().is_empty());
    let after: u64 = nodes.values().map(|n| n.routing_message_count()).sum();
    assert_eq!(before, after);
}

#[test]
fn test_config_from_partial_json() {
    let config: GossipConfig = serde_json::from_str(r#"{ "gossip_threshold": 0.65 }"#).unwrap();
    assert_eq!(config.gossip_threshold, 0.65);
    assert_eq!(config.delta, 6.0);
    assert!(GossipProtocol::seeded(make_id('A'), config, 0).is_ok());
}
