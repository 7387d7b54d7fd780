//! Discrete-event simulation engine
//!
//! Drives one protocol instance per mesh node:
//! - traffic is handed to a node's protocol at scheduled times
//! - every copy a handler sends is encoded onto the wire and delivered
//!   after its delay, then decoded at the receiving node
//! - events are processed strictly in `(time, sequence)` order, one handler
//!   at a time, so links are FIFO and runs are reproducible
//! - message-scoped errors are logged, counted and discarded

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};

use hopnet_core::{
    ArrivalContext, DeliverySubstrate, Disposition, NeighborDirectory, NodeName, Protocol,
    ProtocolError, ProtocolResult, SendTarget, VirtualTime, WireCodec, WireMessage,
};
use hopnet_logging::NodeContextGuard;

use crate::error::{SimError, SimResult};
use crate::scheduler::Scheduler;
use crate::topology::Mesh;
use crate::types::{NetworkEvent, SimStats};

/// Configuration for the simulation engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Stop before processing any event later than this tick
    pub max_time: Option<u64>,
    /// Keep every event in [`Simulation::event_log`]
    pub record_events: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_time: None,
            record_events: true,
        }
    }
}

#[derive(Debug, Clone)]
enum SimEvent<M> {
    Originate { node: NodeName, message: M },
    Deliver {
        from: NodeName,
        to: NodeName,
        bytes: Vec<u8>,
    },
}

#[derive(Debug)]
struct Transmission {
    to: NodeName,
    bytes: Vec<u8>,
    kind: u32,
    deliver_at: VirtualTime,
}

/// The substrate one handler sees: the mesh, the clock and an outbox
struct LinkSubstrate<'a> {
    mesh: &'a Mesh,
    now: VirtualTime,
    outbox: Vec<Transmission>,
}

impl<'a> LinkSubstrate<'a> {
    fn new(mesh: &'a Mesh, now: VirtualTime) -> Self {
        Self {
            mesh,
            now,
            outbox: Vec::new(),
        }
    }
}

impl NeighborDirectory<NodeName> for LinkSubstrate<'_> {
    fn neighbors(&self, node: &NodeName) -> Vec<NodeName> {
        self.mesh.neighbors(node)
    }

    fn is_neighbor(&self, node: &NodeName, other: &NodeName) -> bool {
        self.mesh.are_connected(node, other)
    }
}

impl<M: WireCodec<NodeName>> DeliverySubstrate<NodeName, M> for LinkSubstrate<'_> {
    fn now(&self) -> VirtualTime {
        self.now
    }

    fn send(
        &mut self,
        from: &NodeName,
        message: M,
        target: SendTarget<NodeName>,
        delay: u64,
    ) -> ProtocolResult<usize> {
        if let SendTarget::Neighbor(to) = &target {
            if !self.is_neighbor(from, to) {
                return Err(ProtocolError::no_route_to_next_hop(from, to));
            }
        }
        let wire = message.to_wire();
        let kind = wire.kind;
        let bytes = wire.encode()?;
        let deliver_at = self.now.plus(delay);

        let recipients = self.resolve(from, &target);
        let copies = recipients.len();
        for to in recipients {
            self.outbox.push(Transmission {
                to,
                bytes: bytes.clone(),
                kind,
                deliver_at,
            });
        }
        Ok(copies)
    }
}

/// The simulation state
pub struct Simulation<P: Protocol<NodeName>> {
    mesh: Mesh,
    nodes: BTreeMap<NodeName, P>,
    scheduler: Scheduler<SimEvent<P::Message>>,
    now: VirtualTime,
    config: SimConfig,
    /// Statistics
    pub stats: SimStats,
    /// Global event log (when enabled)
    pub event_log: Vec<NetworkEvent>,
}

impl<P: Protocol<NodeName>> Simulation<P> {
    /// Create a simulation with one protocol instance per mesh node
    pub fn new<F>(mesh: Mesh, config: SimConfig, mut factory: F) -> SimResult<Self>
    where
        F: FnMut(&NodeName, &Mesh) -> SimResult<P>,
    {
        let nodes = mesh
            .node_ids()
            .into_iter()
            .map(|id| factory(&id, &mesh).map(|protocol| (id, protocol)))
            .collect::<SimResult<BTreeMap<_, _>>>()?;

        info!(
            nodes = mesh.node_count(),
            edges = mesh.edge_count(),
            "Simulation initialized at T=0"
        );
        Ok(Self {
            mesh,
            nodes,
            scheduler: Scheduler::new(),
            now: VirtualTime::ZERO,
            config,
            stats: SimStats::default(),
            event_log: Vec::new(),
        })
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn now(&self) -> VirtualTime {
        self.now
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn node(&self, id: &NodeName) -> Option<&P> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &NodeName) -> Option<&mut P> {
        self.nodes.get_mut(id)
    }

    pub fn nodes(&self) -> &BTreeMap<NodeName, P> {
        &self.nodes
    }

    /// Number of events still queued
    pub fn pending(&self) -> usize {
        self.scheduler.len()
    }

    /// Hand `message` to `node`'s protocol at time `at`
    pub fn schedule_origination(
        &mut self,
        at: VirtualTime,
        node: &NodeName,
        message: P::Message,
    ) -> SimResult<()> {
        if !self.nodes.contains_key(node) {
            return Err(SimError::UnknownNode(node.to_string()));
        }
        self.scheduler.schedule(
            at,
            SimEvent::Originate {
                node: node.clone(),
                message,
            },
        );
        Ok(())
    }

    /// Process the next event; returns false when there is nothing left
    pub fn step(&mut self) -> bool {
        let Some(next) = self.scheduler.peek_time() else {
            return false;
        };
        if self.config.max_time.is_some_and(|max| next.ticks() > max) {
            return false;
        }
        let Some(event) = self.scheduler.pop_next() else {
            return false;
        };
        self.now = self.now.max(event.at);
        self.dispatch(event.payload);
        true
    }

    /// Run until the queue drains (or the time limit is reached)
    pub fn run(&mut self) -> &SimStats {
        while self.step() {}
        info!(
            time = %self.now,
            transmissions = self.stats.transmissions,
            delivered = self.stats.delivered,
            errors = self.stats.errors,
            "Simulation complete"
        );
        &self.stats
    }

    /// Process every event due at or before `until`
    pub fn run_until(&mut self, until: VirtualTime) {
        while self.scheduler.peek_time().is_some_and(|t| t <= until) {
            if !self.step() {
                break;
            }
        }
    }

    /// Sum of every node's routing message count
    pub fn total_routing_messages(&self) -> u64 {
        self.nodes.values().map(|p| p.routing_message_count()).sum()
    }

    pub fn routing_messages_by_node(&self) -> BTreeMap<NodeName, u64> {
        self.nodes
            .iter()
            .map(|(id, p)| (id.clone(), p.routing_message_count()))
            .collect()
    }

    /// Every node logs its final state, then the run totals are logged
    pub fn report(&self) {
        for (id, protocol) in &self.nodes {
            let _ctx = NodeContextGuard::new(id, self.now);
            protocol.report();
        }
        info!(
            routing_messages = self.total_routing_messages(),
            originated = self.stats.originated,
            transmissions = self.stats.transmissions,
            delivered = self.stats.delivered,
            mean_latency = self.stats.mean_latency().unwrap_or(0.0),
            max_latency = self.stats.max_latency,
            "Run summary"
        );
    }

    fn dispatch(&mut self, event: SimEvent<P::Message>) {
        match event {
            SimEvent::Originate { node, message } => self.originate(node, message),
            SimEvent::Deliver { from, to, bytes } => self.deliver(from, to, &bytes),
        }
    }

    fn originate(&mut self, node: NodeName, message: P::Message) {
        let _ctx = NodeContextGuard::new(&node, self.now);
        let kind = message.to_wire().kind;
        self.stats.originated += 1;
        self.emit_event(NetworkEvent::Originated {
            node: node.clone(),
            kind,
            time: self.now,
        });

        let Some(protocol) = self.nodes.get_mut(&node) else {
            return;
        };
        let mut substrate = LinkSubstrate::new(&self.mesh, self.now);
        let result = protocol.originate(message, &mut substrate);
        let outbox = substrate.outbox;

        self.flush(&node, outbox);
        self.complete(node, None, kind, result);
    }

    fn deliver(&mut self, from: NodeName, to: NodeName, bytes: &[u8]) {
        let _ctx = NodeContextGuard::new(&to, self.now);
        self.stats.arrivals += 1;

        let decoded = WireMessage::<NodeName>::decode(bytes).and_then(|wire| {
            let kind = wire.kind;
            P::Message::from_wire(wire).map(|message| (kind, message))
        });
        let (kind, message) = match decoded {
            Ok(decoded) => decoded,
            Err(error) => return self.fail(to, error),
        };

        let Some(protocol) = self.nodes.get_mut(&to) else {
            return self.fail(to.clone(), SimError::UnknownNode(to.to_string()));
        };
        trace!(from = %from, kind, "Message arrived");
        let arrival = ArrivalContext::from_neighbor(to.clone(), from.clone());
        let mut substrate = LinkSubstrate::new(&self.mesh, self.now);
        let result = protocol.handle(&arrival, message, &mut substrate);
        let outbox = substrate.outbox;

        self.flush(&to, outbox);
        self.complete(to, Some(from), kind, result);
    }

    /// Schedule the copies a handler sent; sends are never rolled back
    fn flush(&mut self, from: &NodeName, outbox: Vec<Transmission>) {
        for copy in outbox {
            self.stats.transmissions += 1;
            self.emit_event(NetworkEvent::Transmitted {
                from: from.clone(),
                to: copy.to.clone(),
                kind: copy.kind,
                time: self.now,
                deliver_at: copy.deliver_at,
            });
            self.scheduler.schedule(
                copy.deliver_at,
                SimEvent::Deliver {
                    from: from.clone(),
                    to: copy.to,
                    bytes: copy.bytes,
                },
            );
        }
    }

    fn complete(
        &mut self,
        node: NodeName,
        from: Option<NodeName>,
        kind: u32,
        result: ProtocolResult<Disposition<NodeName>>,
    ) {
        match result {
            Ok(disposition) => {
                trace!(kind, ?disposition, "Handler finished");
                self.stats.record(&disposition);
                self.emit_event(NetworkEvent::Handled {
                    node,
                    from,
                    kind,
                    disposition,
                    time: self.now,
                });
            }
            Err(error) => self.fail(node, error),
        }
    }

    fn fail(&mut self, node: NodeName, error: impl std::fmt::Display) {
        warn!(%error, "Message discarded");
        self.stats.errors += 1;
        self.emit_event(NetworkEvent::Failed {
            node,
            error: error.to_string(),
            time: self.now,
        });
    }

    fn emit_event(&mut self, event: NetworkEvent) {
        if self.config.record_events {
            self.event_log.push(event);
        }
    }
}
