//! In-memory network for testing protocol logic
//!
//! [`RecordingNetwork`] implements both [`NeighborDirectory`] and
//! [`DeliverySubstrate`] over a static adjacency list and simply records
//! every copy a handler puts on the wire. [`RecordingNetwork::pump`] replays
//! recorded copies into a set of protocol instances until the network goes
//! quiet, which is enough to drive small multi-node scenarios without the
//! full simulator.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut net = RecordingNetwork::with_edges(&[(a, b), (b, c)]);
//! let disposition = node_b.handle(&ArrivalContext::from_neighbor(b, a), msg, &mut net)?;
//! assert_eq!(net.sent().len(), 1);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::disposition::Disposition;
use crate::error::{ProtocolError, ProtocolResult};
use crate::identity::PeerIdentity;
use crate::time::VirtualTime;
use crate::traits::{ArrivalContext, DeliverySubstrate, NeighborDirectory, Protocol, SendTarget};

/// One copy put on the wire
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage<I, M> {
    pub from: I,
    pub to: I,
    pub message: M,
    pub deliver_at: VirtualTime,
}

/// Recording substrate over a fixed undirected adjacency
#[derive(Debug, Clone)]
pub struct RecordingNetwork<I: PeerIdentity, M> {
    adjacency: BTreeMap<I, BTreeSet<I>>,
    now: VirtualTime,
    sent: Vec<SentMessage<I, M>>,
}

impl<I: PeerIdentity, M: Clone> RecordingNetwork<I, M> {
    /// Create an empty network at time zero
    pub fn new() -> Self {
        Self {
            adjacency: BTreeMap::new(),
            now: VirtualTime::ZERO,
            sent: Vec::new(),
        }
    }

    /// Create a network from undirected edges
    pub fn with_edges(edges: &[(I, I)]) -> Self {
        let mut net = Self::new();
        for (a, b) in edges {
            net.connect(a.clone(), b.clone());
        }
        net
    }

    /// Add a bidirectional link
    pub fn connect(&mut self, a: I, b: I) {
        if a == b {
            return;
        }
        self.adjacency.entry(a.clone()).or_default().insert(b.clone());
        self.adjacency.entry(b).or_default().insert(a);
    }

    /// All nodes that appear in at least one link
    pub fn nodes(&self) -> Vec<I> {
        self.adjacency.keys().cloned().collect()
    }

    /// Number of undirected links
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn set_now(&mut self, now: VirtualTime) {
        self.now = now;
    }

    /// Copies recorded since the last [`take_sent`](Self::take_sent)
    pub fn sent(&self) -> &[SentMessage<I, M>] {
        &self.sent
    }

    /// Drain the recorded copies
    pub fn take_sent(&mut self) -> Vec<SentMessage<I, M>> {
        std::mem::take(&mut self.sent)
    }

    /// Deliver recorded copies to `nodes` until nothing is left in flight
    ///
    /// Copies are replayed in send order, batch by batch, with the clock set
    /// to each copy's delivery time. With a uniform per-hop delay this is the
    /// same order a time-ordered scheduler would produce. Returns every
    /// handler outcome, tagged with the receiving node.
    pub fn pump<P>(
        &mut self,
        nodes: &mut BTreeMap<I, P>,
    ) -> Vec<(I, ProtocolResult<Disposition<I>>)>
    where
        P: Protocol<I, Message = M>,
    {
        let mut outcomes = Vec::new();
        loop {
            let mut batch = self.take_sent();
            if batch.is_empty() {
                break;
            }
            batch.sort_by_key(|copy| copy.deliver_at);
            for copy in batch {
                let Some(node) = nodes.get_mut(&copy.to) else {
                    continue;
                };
                self.now = self.now.max(copy.deliver_at);
                let arrival = ArrivalContext::from_neighbor(copy.to.clone(), copy.from);
                let outcome = node.handle(&arrival, copy.message, self);
                outcomes.push((copy.to, outcome));
            }
        }
        outcomes
    }
}

impl<I: PeerIdentity, M: Clone> Default for RecordingNetwork<I, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: PeerIdentity, M> NeighborDirectory<I> for RecordingNetwork<I, M> {
    fn neighbors(&self, node: &I) -> Vec<I> {
        self.adjacency
            .get(node)
            .map(|n| n.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn is_neighbor(&self, node: &I, other: &I) -> bool {
        self.adjacency
            .get(node)
            .is_some_and(|n| n.contains(other))
    }
}

impl<I: PeerIdentity, M: Clone> DeliverySubstrate<I, M> for RecordingNetwork<I, M> {
    fn now(&self) -> VirtualTime {
        self.now
    }

    fn send(
        &mut self,
        from: &I,
        message: M,
        target: SendTarget<I>,
        delay: u64,
    ) -> ProtocolResult<usize> {
        if let SendTarget::Neighbor(to) = &target {
            if !self.is_neighbor(from, to) {
                return Err(ProtocolError::no_route_to_next_hop(from, to));
            }
        }
        let recipients = self.resolve(from, &target);
        let deliver_at = self.now.plus(delay);
        for to in &recipients {
            self.sent.push(SentMessage {
                from: from.clone(),
                to: to.clone(),
                message: message.clone(),
                deliver_at,
            });
        }
        Ok(recipients.len())
    }
}
