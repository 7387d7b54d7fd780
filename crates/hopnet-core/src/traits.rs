//! Core traits for hopnet
//!
//! These are the seams between per-node protocol logic and whatever moves
//! messages around (the discrete-event simulator, or the recording network
//! used in unit tests).
//!
//! ## Key Traits
//!
//! - [`NeighborDirectory`]: adjacency as seen from one node
//! - [`DeliverySubstrate`]: fire-and-forget sends plus the virtual clock
//! - [`Protocol`]: a per-node routing state machine

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::disposition::Disposition;
use crate::error::ProtocolResult;
use crate::identity::PeerIdentity;
use crate::time::VirtualTime;
use crate::wire::WireCodec;

/// Who a send instruction is addressed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendTarget<I: PeerIdentity> {
    /// One specific neighbor
    Neighbor(I),
    /// Every neighbor except the given one
    AllExcept(I),
    /// Every neighbor
    All,
}

/// How a node rebroadcasts flooded traffic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardingPolicy {
    /// Resend to every neighbor, including the one it came from
    BroadcastAll,
    /// Resend to every neighbor except the arrival sender
    #[default]
    ExceptSender,
}

impl ForwardingPolicy {
    /// Policy a node of the given degree uses when none is configured
    pub fn for_degree(degree: usize) -> Self {
        if degree <= 1 {
            Self::BroadcastAll
        } else {
            Self::ExceptSender
        }
    }

    /// Resolve the send target for a message that arrived from `sender`
    ///
    /// Locally originated traffic has no sender, so it always goes to all
    /// neighbors.
    pub fn target_for<I: PeerIdentity>(&self, sender: Option<&I>) -> SendTarget<I> {
        match (self, sender) {
            (Self::ExceptSender, Some(sender)) => SendTarget::AllExcept(sender.clone()),
            _ => SendTarget::All,
        }
    }
}

/// What the substrate tells a handler about the arrival it is processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalContext<I: PeerIdentity> {
    /// The node running the handler
    pub local: I,
    /// The neighbor the message came from, if known
    pub sender: Option<I>,
}

impl<I: PeerIdentity> ArrivalContext<I> {
    pub fn new(local: I, sender: Option<I>) -> Self {
        Self { local, sender }
    }

    /// Arrival from a known neighbor
    pub fn from_neighbor(local: I, sender: I) -> Self {
        Self::new(local, Some(sender))
    }
}

/// Adjacency as seen by the protocols
pub trait NeighborDirectory<I: PeerIdentity> {
    /// Ordered neighbors of `node`
    fn neighbors(&self, node: &I) -> Vec<I>;

    /// Whether `other` is directly reachable from `node`
    fn is_neighbor(&self, node: &I, other: &I) -> bool {
        self.neighbors(node).contains(other)
    }

    /// Expand a send target into the concrete neighbors it reaches
    fn resolve(&self, node: &I, target: &SendTarget<I>) -> Vec<I> {
        match target {
            SendTarget::Neighbor(peer) => {
                if self.is_neighbor(node, peer) {
                    vec![peer.clone()]
                } else {
                    Vec::new()
                }
            }
            SendTarget::AllExcept(excluded) => self
                .neighbors(node)
                .into_iter()
                .filter(|n| n != excluded)
                .collect(),
            SendTarget::All => self.neighbors(node),
        }
    }
}

/// Message transport plus the virtual clock
pub trait DeliverySubstrate<I: PeerIdentity, M> {
    /// Current virtual time
    fn now(&self) -> VirtualTime;

    /// Queue `message` from `from` to `target` after `delay` ticks
    ///
    /// Returns the number of copies put on the wire. A unicast to a node
    /// that is not a neighbor fails with `NoRouteToNextHop` and sends nothing.
    fn send(
        &mut self,
        from: &I,
        message: M,
        target: SendTarget<I>,
        delay: u64,
    ) -> ProtocolResult<usize>;
}

/// Everything a protocol handler may touch outside its own state
pub trait Network<I: PeerIdentity, M>: NeighborDirectory<I> + DeliverySubstrate<I, M> {}

impl<I, M, T> Network<I, M> for T
where
    I: PeerIdentity,
    T: NeighborDirectory<I> + DeliverySubstrate<I, M>,
{
}

/// A per-node routing protocol instance
///
/// Each node owns exactly one instance; the substrate calls it once per
/// arriving message and the handler runs to completion.
pub trait Protocol<I: PeerIdentity> {
    /// The closed set of messages this protocol understands
    type Message: WireCodec<I> + Clone + Debug;

    /// Short protocol label for logs
    fn name(&self) -> &'static str;

    /// Identity of the node this instance belongs to
    fn local_id(&self) -> &I;

    /// Process an arriving message
    fn handle(
        &mut self,
        arrival: &ArrivalContext<I>,
        message: Self::Message,
        net: &mut dyn Network<I, Self::Message>,
    ) -> ProtocolResult<Disposition<I>>;

    /// Inject locally produced traffic (the traffic source entry point)
    fn originate(
        &mut self,
        message: Self::Message,
        net: &mut dyn Network<I, Self::Message>,
    ) -> ProtocolResult<Disposition<I>>;

    /// Control or forwarding transmissions this node has put on the wire
    fn routing_message_count(&self) -> u64;

    /// Log end-of-run state
    fn report(&self);
}
