//! Reactive source routing
//!
//! [`RouteDiscoveryProtocol`] floods route requests, unicasts replies back
//! along the reversed discovered path, caches the forward path at every
//! node the reply crosses, and forwards data along cached routes.

use tracing::{debug, info, trace};

use hopnet_core::{
    ArrivalContext, DEFAULT_HOP_DELAY, Disposition, ForwardingPolicy, KnownMessageSet, Network,
    PeerIdentity, Protocol, ProtocolError, ProtocolResult, SendTarget, SuppressReason, VirtualTime,
};
use serde::{Deserialize, Serialize};

use crate::message::{DsrMessage, ROUTE_REQUEST_KIND};
use crate::table::RoutingTable;

/// Per-node configuration for route discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteDiscoveryConfig {
    /// How route requests are rebroadcast
    pub policy: ForwardingPolicy,
    /// Delay attached to every send, in ticks
    pub hop_delay: u64,
}

impl Default for RouteDiscoveryConfig {
    fn default() -> Self {
        Self {
            policy: ForwardingPolicy::default(),
            hop_delay: DEFAULT_HOP_DELAY,
        }
    }
}

impl RouteDiscoveryConfig {
    pub fn with_policy(mut self, policy: ForwardingPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Per-node source-routing state machine
#[derive(Debug, Clone)]
pub struct RouteDiscoveryProtocol<I: PeerIdentity> {
    id: I,
    config: RouteDiscoveryConfig,
    table: RoutingTable<I>,
    /// (source, destination) pairs of requests already handled
    known: KnownMessageSet<(I, I)>,
    routing_message_count: u64,
}

impl<I: PeerIdentity> RouteDiscoveryProtocol<I> {
    pub fn new(id: I, config: RouteDiscoveryConfig) -> Self {
        Self {
            id,
            config,
            table: RoutingTable::new(),
            known: KnownMessageSet::new(),
            routing_message_count: 0,
        }
    }

    pub fn config(&self) -> &RouteDiscoveryConfig {
        &self.config
    }

    pub fn routing_table(&self) -> &RoutingTable<I> {
        &self.table
    }

    /// Route request pairs this node has already handled
    pub fn known_requests(&self) -> &KnownMessageSet<(I, I)> {
        &self.known
    }

    /// Flood a fresh route request for `destination` to every neighbor
    ///
    /// The pair is recorded locally so echoes of our own request are
    /// dropped on return.
    pub fn send_route_request(
        &mut self,
        destination: I,
        net: &mut dyn Network<I, DsrMessage<I>>,
    ) -> ProtocolResult<usize> {
        self.known.insert((self.id.clone(), destination.clone()));
        let request = DsrMessage::route_request(self.id.clone(), destination.clone());
        let copies = net.send(&self.id, request, SendTarget::All, self.config.hop_delay)?;
        self.routing_message_count += copies as u64;
        debug!(node = %self.id, dest = %destination, copies, "Route discovery started");
        Ok(copies)
    }

    fn on_route_request(
        &mut self,
        arrival: &ArrivalContext<I>,
        source: I,
        destination: I,
        mut path: Vec<I>,
        net: &mut dyn Network<I, DsrMessage<I>>,
    ) -> ProtocolResult<Disposition<I>> {
        // Every request path starts with its originator
        if path.is_empty() {
            return Err(ProtocolError::MissingField {
                kind: ROUTE_REQUEST_KIND,
                field: "path",
            });
        }
        if !self.known.insert((source.clone(), destination.clone())) {
            trace!(node = %self.id, source = %source, dest = %destination, "Duplicate route request");
            return Ok(Disposition::suppressed(SuppressReason::Duplicate));
        }

        if destination == self.id {
            let previous = path.last().cloned().filter(|hop| *hop != self.id);
            path.push(self.id.clone());
            debug!(
                node = %self.id,
                requester = %source,
                hops = path.len() - 1,
                "Route request reached destination, replying"
            );
            // A penultimate entry naming ourselves ends the reply here
            let copies = match previous {
                Some(next_hop) => {
                    let reply = DsrMessage::RouteReply {
                        source: self.id.clone(),
                        destination: source.clone(),
                        path,
                    };
                    self.unicast(next_hop, reply, net)?
                }
                None => 0,
            };
            return Ok(Disposition::Replied {
                requester: source,
                copies,
            });
        }

        path.push(self.id.clone());
        let target = self.config.policy.target_for(arrival.sender.as_ref());
        let request = DsrMessage::RouteRequest {
            source,
            destination,
            path,
        };
        let copies = net.send(&self.id, request, target, self.config.hop_delay)?;
        self.routing_message_count += copies as u64;
        trace!(node = %self.id, copies, "Route request relayed");
        Ok(Disposition::Forwarded {
            copies,
            latency: None,
        })
    }

    fn on_route_reply(
        &mut self,
        source: I,
        destination: I,
        path: Vec<I>,
        net: &mut dyn Network<I, DsrMessage<I>>,
    ) -> ProtocolResult<Disposition<I>> {
        let position = path
            .iter()
            .position(|hop| *hop == self.id)
            .ok_or_else(|| ProtocolError::self_not_in_path(&self.id))?;

        let route = path[position + 1..].to_vec();
        let hops = route.len();
        if hops > 0 {
            debug!(node = %self.id, dest = %source, hops, "Route cached");
        }
        self.table.insert(source.clone(), route);

        let next_hop = match position.checked_sub(1).map(|i| path[i].clone()) {
            Some(hop) if hop != self.id => hop,
            _ => {
                debug!(node = %self.id, dest = %source, "Route reply home");
                return Ok(Disposition::RouteCached {
                    destination: source,
                    hops,
                    relayed: false,
                });
            }
        };

        let reply = DsrMessage::RouteReply {
            source: source.clone(),
            destination,
            path,
        };
        self.unicast(next_hop, reply, net)?;
        Ok(Disposition::RouteCached {
            destination: source,
            hops,
            relayed: true,
        })
    }

    fn on_data(
        &mut self,
        source: I,
        destination: I,
        payload: Vec<u8>,
        created_at: VirtualTime,
        net: &mut dyn Network<I, DsrMessage<I>>,
    ) -> ProtocolResult<Disposition<I>> {
        if destination == self.id {
            let latency = net.now().since(created_at);
            info!(
                node = %self.id,
                source = %source,
                latency,
                payload = %String::from_utf8_lossy(&payload),
                "Data delivered"
            );
            return Ok(Disposition::Delivered { latency });
        }

        let data = DsrMessage::Data {
            source,
            destination,
            payload,
            created_at,
        };
        self.forward_data(data, net)
    }

    /// Send data along the cached route, or start discovery and drop it
    fn forward_data(
        &mut self,
        message: DsrMessage<I>,
        net: &mut dyn Network<I, DsrMessage<I>>,
    ) -> ProtocolResult<Disposition<I>> {
        let destination = message.destination().clone();
        let Some(next_hop) = self.table.next_hop(&destination).cloned() else {
            debug!(node = %self.id, dest = %destination, "No cached route, data dropped");
            let copies = self.send_route_request(destination.clone(), net)?;
            return Ok(Disposition::DiscoveryStarted {
                destination,
                copies,
            });
        };

        let copies = self.unicast(next_hop, message, net)?;
        Ok(Disposition::Forwarded {
            copies,
            latency: None,
        })
    }

    fn unicast(
        &self,
        next_hop: I,
        message: DsrMessage<I>,
        net: &mut dyn Network<I, DsrMessage<I>>,
    ) -> ProtocolResult<usize> {
        // The substrate rejects non-neighbor hops with NoRouteToNextHop
        trace!(node = %self.id, next_hop = %next_hop, kind = message.kind(), "Unicast");
        net.send(
            &self.id,
            message,
            SendTarget::Neighbor(next_hop),
            self.config.hop_delay,
        )
    }

    /// Build a data message from this node stamped with the current time
    pub fn make_data(&self, destination: I, payload: impl Into<Vec<u8>>, now: VirtualTime) -> DsrMessage<I> {
        DsrMessage::data(self.id.clone(), destination, payload, now)
    }
}

impl<I: PeerIdentity> Protocol<I> for RouteDiscoveryProtocol<I> {
    type Message = DsrMessage<I>;

    fn name(&self) -> &'static str {
        "dsr"
    }

    fn local_id(&self) -> &I {
        &self.id
    }

    fn handle(
        &mut self,
        arrival: &ArrivalContext<I>,
        message: DsrMessage<I>,
        net: &mut dyn Network<I, DsrMessage<I>>,
    ) -> ProtocolResult<Disposition<I>> {
        match message {
            DsrMessage::RouteRequest {
                source,
                destination,
                path,
            } => self.on_route_request(arrival, source, destination, path, net),
            DsrMessage::RouteReply {
                source,
                destination,
                path,
            } => self.on_route_reply(source, destination, path, net),
            DsrMessage::Data {
                source,
                destination,
                payload,
                created_at,
            } => self.on_data(source, destination, payload, created_at, net),
        }
    }

    fn originate(
        &mut self,
        message: DsrMessage<I>,
        net: &mut dyn Network<I, DsrMessage<I>>,
    ) -> ProtocolResult<Disposition<I>> {
        let kind = message.kind();
        match message {
            DsrMessage::RouteRequest { destination, .. } => {
                let copies = self.send_route_request(destination, net)?;
                Ok(Disposition::Forwarded {
                    copies,
                    latency: None,
                })
            }
            DsrMessage::RouteReply { .. } => Err(ProtocolError::UnrecognizedMessageKind(kind)),
            data => {
                if data.destination() == &self.id {
                    Ok(Disposition::Delivered { latency: 0 })
                } else {
                    self.forward_data(data, net)
                }
            }
        }
    }

    fn routing_message_count(&self) -> u64 {
        self.routing_message_count
    }

    fn report(&self) {
        info!(
            node = %self.id,
            routing_messages = self.routing_message_count,
            routes = self.table.len(),
            table = %self.table,
            "Route discovery finished"
        );
    }
}
