//! Flooding with duplicate suppression
//!
//! Every node rebroadcasts the first copy of each message id it sees and
//! silently drops later copies. The protocol never looks at a destination:
//! propagation stops once every node has seen the id.
//!
//! Duplicate detection keys on the bare message id. Independent sources
//! that reuse an id will have their floods merged.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use hopnet_core::{
    ArrivalContext, DEFAULT_HOP_DELAY, Disposition, ForwardingPolicy, KnownMessageSet, Network,
    PeerIdentity, Protocol, ProtocolResult, SendTarget, SuppressReason, VirtualTime, WireCodec,
    WireMessage,
};

/// A flooded message, identified by an integer id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloodMessage {
    pub id: u32,
    pub created_at: VirtualTime,
}

impl FloodMessage {
    pub fn new(id: u32, created_at: VirtualTime) -> Self {
        Self { id, created_at }
    }
}

impl<I: PeerIdentity> WireCodec<I> for FloodMessage {
    fn to_wire(&self) -> WireMessage<I> {
        WireMessage::new(self.id).with_created_at(self.created_at)
    }

    fn from_wire(wire: WireMessage<I>) -> ProtocolResult<Self> {
        Ok(Self {
            id: wire.kind,
            created_at: WireMessage::<I>::require(wire.kind, "created_at", wire.created_at)?,
        })
    }
}

/// Configuration for a flooding node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloodConfig {
    /// How first copies are rebroadcast
    pub policy: ForwardingPolicy,
    /// Delay attached to every copy, in ticks
    pub hop_delay: u64,
}

impl Default for FloodConfig {
    fn default() -> Self {
        Self {
            policy: ForwardingPolicy::default(),
            hop_delay: DEFAULT_HOP_DELAY,
        }
    }
}

impl FloodConfig {
    pub fn with_policy(mut self, policy: ForwardingPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Per-node flooding state machine
#[derive(Debug, Clone)]
pub struct FloodingProtocol<I: PeerIdentity> {
    id: I,
    config: FloodConfig,
    processed: KnownMessageSet<u32>,
    routing_message_count: u64,
}

impl<I: PeerIdentity> FloodingProtocol<I> {
    pub fn new(id: I, config: FloodConfig) -> Self {
        Self {
            id,
            config,
            processed: KnownMessageSet::new(),
            routing_message_count: 0,
        }
    }

    pub fn config(&self) -> &FloodConfig {
        &self.config
    }

    /// Check if a message id has already been processed here
    pub fn has_processed(&self, id: u32) -> bool {
        self.processed.contains(&id)
    }

    /// Number of distinct ids processed
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    fn rebroadcast(
        &mut self,
        message: FloodMessage,
        target: SendTarget<I>,
        net: &mut dyn Network<I, FloodMessage>,
    ) -> ProtocolResult<usize> {
        let copies = net.send(&self.id, message, target, self.config.hop_delay)?;
        self.routing_message_count += copies as u64;
        Ok(copies)
    }
}

impl<I: PeerIdentity> Protocol<I> for FloodingProtocol<I> {
    type Message = FloodMessage;

    fn name(&self) -> &'static str {
        "flood"
    }

    fn local_id(&self) -> &I {
        &self.id
    }

    fn handle(
        &mut self,
        arrival: &ArrivalContext<I>,
        message: FloodMessage,
        net: &mut dyn Network<I, FloodMessage>,
    ) -> ProtocolResult<Disposition<I>> {
        if !self.processed.insert(message.id) {
            trace!(node = %self.id, msg_id = message.id, "Duplicate flood message");
            return Ok(Disposition::suppressed(SuppressReason::Duplicate));
        }

        let target = self.config.policy.target_for(arrival.sender.as_ref());
        let copies = self.rebroadcast(message, target, net)?;
        let latency = net.now().since(message.created_at);
        debug!(node = %self.id, msg_id = message.id, copies, latency, "Flood message processed");

        Ok(Disposition::Forwarded {
            copies,
            latency: Some(latency),
        })
    }

    fn originate(
        &mut self,
        message: FloodMessage,
        net: &mut dyn Network<I, FloodMessage>,
    ) -> ProtocolResult<Disposition<I>> {
        if !self.processed.insert(message.id) {
            return Ok(Disposition::suppressed(SuppressReason::Duplicate));
        }
        let copies = self.rebroadcast(message, SendTarget::All, net)?;
        debug!(node = %self.id, msg_id = message.id, copies, "Flood originated");
        Ok(Disposition::Forwarded {
            copies,
            latency: None,
        })
    }

    fn routing_message_count(&self) -> u64 {
        self.routing_message_count
    }

    fn report(&self) {
        info!(
            node = %self.id,
            transmissions = self.routing_message_count,
            processed = self.processed.len(),
            "Flooding finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopnet_core::{ProtocolError, RecordingNetwork, SimulationIdentity};

    type Id = SimulationIdentity;

    fn make_id(c: char) -> Id {
        SimulationIdentity::new(c).unwrap()
    }

    /// B is the hub of a star with A, C and D
    fn star() -> RecordingNetwork<Id, FloodMessage> {
        RecordingNetwork::with_edges(&[
            (make_id('B'), make_id('A')),
            (make_id('B'), make_id('C')),
            (make_id('B'), make_id('D')),
        ])
    }

    #[test]
    fn test_first_copy_rebroadcast_except_sender() {
        let mut net = star();
        net.set_now(VirtualTime::new(9));
        let mut b = FloodingProtocol::new(make_id('B'), FloodConfig::default());

        let arrival = ArrivalContext::from_neighbor(make_id('B'), make_id('A'));
        let outcome = b
            .handle(&arrival, FloodMessage::new(1, VirtualTime::new(5)), &mut net)
            .unwrap();

        assert_eq!(
            outcome,
            Disposition::Forwarded {
                copies: 2,
                latency: Some(4),
            }
        );
        let targets: Vec<Id> = net.sent().iter().map(|s| s.to).collect();
        assert_eq!(targets, vec![make_id('C'), make_id('D')]);
        assert_eq!(b.routing_message_count(), 2);
        assert!(b.has_processed(1));
    }

    #[test]
    fn test_duplicate_suppression() {
        let mut net = star();
        let mut b = FloodingProtocol::new(make_id('B'), FloodConfig::default());
        let arrival = ArrivalContext::from_neighbor(make_id('B'), make_id('A'));

        b.handle(&arrival, FloodMessage::new(1, VirtualTime::ZERO), &mut net)
            .unwrap();
        net.take_sent();

        let again = ArrivalContext::from_neighbor(make_id('B'), make_id('C'));
        let outcome = b
            .handle(&again, FloodMessage::new(1, VirtualTime::ZERO), &mut net)
            .unwrap();
        assert_eq!(outcome.suppress_reason(), Some(SuppressReason::Duplicate));
        assert!(net.sent().is_empty());
        assert_eq!(b.routing_message_count(), 2);
        assert_eq!(b.processed_count(), 1);
    }

    #[test]
    fn test_leaf_policies() {
        let mut net = star();
        let arrival = ArrivalContext::from_neighbor(make_id('A'), make_id('B'));

        let mut except = FloodingProtocol::new(make_id('A'), FloodConfig::default());
        let outcome = except
            .handle(&arrival, FloodMessage::new(3, VirtualTime::ZERO), &mut net)
            .unwrap();
        assert_eq!(outcome.copies(), 0);

        let mut all = FloodingProtocol::new(
            make_id('A'),
            FloodConfig::default().with_policy(ForwardingPolicy::BroadcastAll),
        );
        let outcome = all
            .handle(&arrival, FloodMessage::new(3, VirtualTime::ZERO), &mut net)
            .unwrap();
        assert_eq!(outcome.copies(), 1);
        assert_eq!(net.sent()[0].to, make_id('B'));
    }

    #[test]
    fn test_originate_reaches_every_neighbor() {
        let mut net = star();
        let mut b = FloodingProtocol::new(make_id('B'), FloodConfig::default());
        let outcome = b
            .originate(FloodMessage::new(7, VirtualTime::ZERO), &mut net)
            .unwrap();
        assert_eq!(outcome.copies(), 3);

        // A reused id is not flooded twice
        let outcome = b
            .originate(FloodMessage::new(7, VirtualTime::ZERO), &mut net)
            .unwrap();
        assert!(outcome.is_suppress());
        assert_eq!(b.routing_message_count(), 3);
    }

    #[test]
    fn test_wire_requires_timestamp() {
        let msg = FloodMessage::new(12, VirtualTime::new(3));
        let wire: WireMessage<Id> = msg.to_wire();
        assert_eq!(wire.kind, 12);
        assert_eq!(FloodMessage::from_wire(wire).unwrap(), msg);

        let err = <FloodMessage as WireCodec<Id>>::from_wire(WireMessage::new(12)).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingField { .. }));
    }
}
