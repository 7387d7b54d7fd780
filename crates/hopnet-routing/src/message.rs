//! Route discovery messages
//!
//! The closed set of messages the source-routing protocol understands,
//! and their mapping onto the shared wire envelope.

use hopnet_core::{PeerIdentity, ProtocolError, ProtocolResult, VirtualTime, WireCodec, WireMessage};

/// Wire kind of a route request
pub const ROUTE_REQUEST_KIND: u32 = 0;
/// Wire kind of a route reply
pub const ROUTE_REPLY_KIND: u32 = 1;
/// Wire kind of a data message
pub const DATA_KIND: u32 = 2;

/// A source-routing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DsrMessage<I: PeerIdentity> {
    /// Flooded search for `destination`; `path` grows by one node per hop
    RouteRequest {
        source: I,
        destination: I,
        path: Vec<I>,
    },
    /// Unicast back along the reversed path
    ///
    /// `source` is the node that answered the request, `destination` the
    /// node that asked, and `path` the full discovered forward path.
    RouteReply {
        source: I,
        destination: I,
        path: Vec<I>,
    },
    /// Application payload following a cached route
    Data {
        source: I,
        destination: I,
        payload: Vec<u8>,
        created_at: VirtualTime,
    },
}

impl<I: PeerIdentity> DsrMessage<I> {
    /// A fresh route request from `source`
    pub fn route_request(source: I, destination: I) -> Self {
        Self::RouteRequest {
            path: vec![source.clone()],
            source,
            destination,
        }
    }

    /// A data message stamped with its creation time
    pub fn data(source: I, destination: I, payload: impl Into<Vec<u8>>, created_at: VirtualTime) -> Self {
        Self::Data {
            source,
            destination,
            payload: payload.into(),
            created_at,
        }
    }

    pub fn kind(&self) -> u32 {
        match self {
            Self::RouteRequest { .. } => ROUTE_REQUEST_KIND,
            Self::RouteReply { .. } => ROUTE_REPLY_KIND,
            Self::Data { .. } => DATA_KIND,
        }
    }

    pub fn source(&self) -> &I {
        match self {
            Self::RouteRequest { source, .. }
            | Self::RouteReply { source, .. }
            | Self::Data { source, .. } => source,
        }
    }

    pub fn destination(&self) -> &I {
        match self {
            Self::RouteRequest { destination, .. }
            | Self::RouteReply { destination, .. }
            | Self::Data { destination, .. } => destination,
        }
    }
}

impl<I: PeerIdentity> WireCodec<I> for DsrMessage<I> {
    fn to_wire(&self) -> WireMessage<I> {
        let wire = WireMessage::new(self.kind())
            .with_source(self.source().clone())
            .with_destination(self.destination().clone());
        match self {
            Self::RouteRequest { path, .. } | Self::RouteReply { path, .. } => {
                wire.with_path(path.clone())
            }
            Self::Data {
                payload,
                created_at,
                ..
            } => wire
                .with_payload(Some(payload.clone()))
                .with_created_at(*created_at),
        }
    }

    fn from_wire(wire: WireMessage<I>) -> ProtocolResult<Self> {
        let kind = wire.kind;
        if kind > DATA_KIND {
            return Err(ProtocolError::UnrecognizedMessageKind(kind));
        }
        let source = WireMessage::<I>::require(kind, "source", wire.source)?;
        let destination = WireMessage::<I>::require(kind, "destination", wire.destination)?;
        match kind {
            ROUTE_REQUEST_KIND => Ok(Self::RouteRequest {
                source,
                destination,
                path: wire.path,
            }),
            ROUTE_REPLY_KIND => Ok(Self::RouteReply {
                source,
                destination,
                path: wire.path,
            }),
            _ => Ok(Self::Data {
                source,
                destination,
                payload: WireMessage::<I>::require(kind, "payload", wire.payload)?,
                created_at: WireMessage::<I>::require(kind, "created_at", wire.created_at)?,
            }),
        }
    }
}
