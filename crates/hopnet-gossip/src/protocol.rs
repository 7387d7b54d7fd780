//! Smart gossip
//!
//! Each first-seen message is rebroadcast to every neighbor with probability
//! `p_gossip`. The probability never drops below the configured threshold
//! and is raised to whatever the neediest child last required, so sparse
//! parts of the implicit tree are fed more reliably.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

use hopnet_core::{
    ArrivalContext, Disposition, KnownMessageSet, Network, PeerIdentity, Protocol, ProtocolResult,
    SendTarget, SuppressReason, VirtualTime,
};

use crate::config::GossipConfig;
use crate::error::GossipResult;
use crate::message::GossipMessage;
use crate::roles::{RoleSets, calculate_gossip_probability, calculate_required_probability, render};

/// Per-node smart gossip state machine
#[derive(Debug, Clone)]
pub struct GossipProtocol<I: PeerIdentity, R: Rng = StdRng> {
    id: I,
    config: GossipConfig,
    roles: RoleSets<I>,
    processed: KnownMessageSet<u32>,
    rng: R,
    routing_message_count: u64,
}

impl<I: PeerIdentity> GossipProtocol<I, StdRng> {
    /// Create a node seeded from the operating system
    pub fn new(id: I, config: GossipConfig) -> GossipResult<Self> {
        Self::with_rng(id, config, StdRng::from_os_rng())
    }

    /// Create a node with a reproducible random stream
    pub fn seeded(id: I, config: GossipConfig, seed: u64) -> GossipResult<Self> {
        Self::with_rng(id, config, StdRng::seed_from_u64(seed))
    }
}

impl<I: PeerIdentity, R: Rng> GossipProtocol<I, R> {
    pub fn with_rng(id: I, config: GossipConfig, rng: R) -> GossipResult<Self> {
        config.validate()?;
        Ok(Self {
            roles: RoleSets::new(&id),
            id,
            config,
            processed: KnownMessageSet::new(),
            rng,
            routing_message_count: 0,
        })
    }

    pub fn config(&self) -> &GossipConfig {
        &self.config
    }

    pub fn roles(&self) -> &RoleSets<I> {
        &self.roles
    }

    pub fn has_processed(&self, id: u32) -> bool {
        self.processed.contains(&id)
    }

    /// Required probability for the current parent count
    pub fn calculate_required_probability(&self) -> f64 {
        calculate_required_probability(
            self.roles.parent_count(),
            self.config.tau_reliability,
            self.config.delta,
        )
    }

    /// Current forward probability
    pub fn forward_probability(&self) -> f64 {
        calculate_gossip_probability(self.config.gossip_threshold, self.roles.max_child_requirement())
    }

    /// A new message originated here
    pub fn make_message(&self, id: u32, created_at: VirtualTime) -> GossipMessage<I> {
        GossipMessage::originated(id, self.id.clone(), created_at)
    }

    fn broadcast(
        &mut self,
        message: GossipMessage<I>,
        net: &mut dyn Network<I, GossipMessage<I>>,
    ) -> ProtocolResult<usize> {
        let copies = net.send(&self.id, message, SendTarget::All, self.config.hop_delay)?;
        self.routing_message_count += copies as u64;
        Ok(copies)
    }
}

impl<I: PeerIdentity, R: Rng> Protocol<I> for GossipProtocol<I, R> {
    type Message = GossipMessage<I>;

    fn name(&self) -> &'static str {
        "gossip"
    }

    fn local_id(&self) -> &I {
        &self.id
    }

    fn handle(
        &mut self,
        _arrival: &ArrivalContext<I>,
        message: GossipMessage<I>,
        net: &mut dyn Network<I, GossipMessage<I>>,
    ) -> ProtocolResult<Disposition<I>> {
        let latency = net.now().since(message.created_at);

        // Requirement is taken before this arrival can add a parent
        let p_required = self.calculate_required_probability();
        if let Some(role) = self.roles.observe(&message.source, &message.parent_hint) {
            trace!(node = %self.id, peer = %message.source, ?role, "Neighbor classified");
        }
        if self.roles.is_child(&message.source) {
            self.roles.record_requirement(&message.source, p_required);
        }

        let p_gossip = self.forward_probability();
        let draw: f64 = self.rng.random();
        debug!(
            node = %self.id,
            msg_id = message.id,
            from = %message.source,
            latency,
            p_required,
            p_gossip,
            "Gossip message arrived"
        );

        if draw < p_gossip && self.processed.insert(message.id) {
            let copies = self.broadcast(message.relayed_by(&self.id), net)?;
            return Ok(Disposition::Forwarded {
                copies,
                latency: Some(latency),
            });
        }

        let reason = if self.processed.contains(&message.id) {
            SuppressReason::Duplicate
        } else {
            SuppressReason::ProbabilityGate
        };
        trace!(node = %self.id, msg_id = message.id, ?reason, "Gossip message not forwarded");
        Ok(Disposition::Suppressed {
            reason,
            latency: Some(latency),
        })
    }

    fn originate(
        &mut self,
        message: GossipMessage<I>,
        net: &mut dyn Network<I, GossipMessage<I>>,
    ) -> ProtocolResult<Disposition<I>> {
        if !self.processed.insert(message.id) {
            return Ok(Disposition::suppressed(SuppressReason::Duplicate));
        }
        let outgoing = GossipMessage {
            source: self.id.clone(),
            parent_hint: self.id.clone(),
            ..message
        };
        let id = outgoing.id;
        let copies = self.broadcast(outgoing, net)?;
        debug!(node = %self.id, msg_id = id, copies, "Gossip originated");
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
            neighbors = %render(self.roles.neighbors()),
            parents = %render(self.roles.parents()),
            siblings = %render(self.roles.siblings()),
            children = %render(self.roles.children()),
            p_gossip = self.forward_probability(),
            "Gossip finished"
        );
    }
}
