//! Multi-node route discovery tests
//!
//! These drive several protocol instances through the in-memory recording
//! network, without the simulator.

use std::collections::{BTreeMap, VecDeque};

use hopnet_core::{
    Disposition, ForwardingPolicy, NeighborDirectory, Protocol, RecordingNetwork,
    SimulationIdentity, VirtualTime,
};
use hopnet_routing::{DsrMessage, RouteDiscoveryConfig, RouteDiscoveryProtocol};

type Id = SimulationIdentity;
type Net = RecordingNetwork<Id, DsrMessage<Id>>;

fn make_id(c: char) -> Id {
    SimulationIdentity::new(c).unwrap()
}

fn build(edges: &[(char, char)]) -> (Net, BTreeMap<Id, RouteDiscoveryProtocol<Id>>) {
    let edges: Vec<(Id, Id)> = edges.iter().map(|(a, b)| (make_id(*a), make_id(*b))).collect();
    let net = RecordingNetwork::with_edges(&edges);
    let nodes = net
        .nodes()
        .into_iter()
        .map(|id| {
            let policy = ForwardingPolicy::for_degree(net.neighbors(&id).len());
            let config = RouteDiscoveryConfig::default().with_policy(policy);
            (id, RouteDiscoveryProtocol::new(id, config))
        })
        .collect();
    (net, nodes)
}

/// Hops from `from` (exclusive) to `to` (inclusive) on a tree
fn tree_path(net: &Net, from: Id, to: Id) -> Vec<Id> {
    let mut parent: BTreeMap<Id, Id> = BTreeMap::new();
    let mut queue = VecDeque::from([from]);
    while let Some(node) = queue.pop_front() {
        for next in net.neighbors(&node) {
            if next != from && !parent.contains_key(&next) {
                parent.insert(next, node);
                queue.push_back(next);
            }
        }
    }
    let mut path = vec![to];
    let mut cursor = to;
    while let Some(&p) = parent.get(&cursor) {
        if p == from {
            break;
        }
        path.push(p);
        cursor = p;
    }
    path.reverse();
    path
}

#[test]
fn test_abc_end_to_end() {
    let (mut net, mut nodes) = build(&[('A', 'B'), ('B', 'C')]);
    let (a, b, c) = (make_id('A'), make_id('B'), make_id('C'));

    nodes
        .get_mut(&a)
        .unwrap()
        .send_route_request(c, &mut net)
        .unwrap();
    let outcomes = net.pump(&mut nodes);

    // B relays the request once, C replies once through B
    assert_eq!(nodes[&b].routing_message_count(), 1);
    let replies: Vec<_> = outcomes
        .iter()
        .filter(|(_, o)| matches!(o, Ok(Disposition::Replied { .. })))
        .collect();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].0, c);
    assert!(outcomes.iter().any(|(node, o)| *node == b
        && matches!(o, Ok(Disposition::RouteCached { relayed: true, .. }))));

    assert_eq!(nodes[&a].routing_table().get(&c), Some(&[b, c][..]));
    assert_eq!(nodes[&b].routing_table().get(&c), Some(&[c][..]));

    // Data now follows the cached route and is delivered at C
    net.set_now(VirtualTime::new(20));
    let data = nodes[&a].make_data(c, b"Hello!".to_vec(), VirtualTime::new(20));
    let first = nodes.get_mut(&a).unwrap().originate(data, &mut net).unwrap();
    assert!(first.is_forwarding());

    let outcomes = net.pump(&mut nodes);
    let delivered: Vec<_> = outcomes
        .iter()
        .filter_map(|(node, o)| match o {
            Ok(Disposition::Delivered { latency }) => Some((*node, *latency)),
            _ => None,
        })
        .collect();
    assert_eq!(delivered, vec![(c, 2)]);
}

#[test]
fn test_route_convergence_on_tree() {
    //       A
    //      / \
    //     B   F
    //    / \
    //   C   D
    //       |
    //       E
    let edges = [('A', 'B'), ('A', 'F'), ('B', 'C'), ('B', 'D'), ('D', 'E')];

    for target in ['B', 'C', 'D', 'E', 'F'] {
        let (mut net, mut nodes) = build(&edges);
        let a = make_id('A');
        let target = make_id(target);

        nodes
            .get_mut(&a)
            .unwrap()
            .send_route_request(target, &mut net)
            .unwrap();
        let outcomes = net.pump(&mut nodes);
        assert!(outcomes.iter().all(|(_, o)| o.is_ok()));

        let expected = tree_path(&net, a, target);
        assert_eq!(
            nodes[&a].routing_table().get(&target),
            Some(expected.as_slice()),
            "route from A to {}",
            target
        );

        // Every relay on the path caches its own remaining suffix
        for (i, relay) in expected.iter().enumerate().take(expected.len() - 1) {
            assert_eq!(
                nodes[relay].routing_table().get(&target),
                Some(&expected[i + 1..]),
                "route from {} to {}",
                relay,
                target
            );
        }
    }
}

#[test]
fn test_replayed_request_produces_no_sends() {
    let (mut net, mut nodes) = build(&[('A', 'B'), ('B', 'C')]);
    let (a, b, c) = (make_id('A'), make_id('B'), make_id('C'));

    nodes
        .get_mut(&a)
        .unwrap()
        .send_route_request(c, &mut net)
        .unwrap();
    net.pump(&mut nodes);
    let before: u64 = nodes.values().map(|n| n.routing_message_count()).sum();

    let replay = DsrMessage::RouteRequest {
        source: a,
        destination: c,
        path: vec![a],
    };
    let arrival = hopnet_core::ArrivalContext::from_neighbor(b, a);
    let outcome = nodes
        .get_mut(&b)
        .unwrap()
        .handle(&arrival, replay, &mut net)
        .unwrap();

    assert!(outcome.is_suppress());
    assert!(net.sent().is_empty());
    let after: u64 = nodes.values().map(|n| n.routing_message_count()).sum();
    assert_eq!(before, after);
}

#[test]
fn test_request_in_cycle_terminates() {
    // A - B - C - A triangle plus tail C - D
    let (mut net, mut nodes) = build(&[('A', 'B'), ('B', 'C'), ('C', 'A'), ('C', 'D')]);
    let (a, d) = (make_id('A'), make_id('D'));

    nodes
        .get_mut(&a)
        .unwrap()
        .send_route_request(d, &mut net)
        .unwrap();
    let outcomes = net.pump(&mut nodes);

    assert!(outcomes.len() < 20);
    let route = nodes[&a].routing_table().get(&d).unwrap();
    assert_eq!(route.last(), Some(&d));
}
