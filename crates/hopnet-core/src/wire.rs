//! Wire shape shared by every protocol
//!
//! A [`WireMessage`] is the language-neutral envelope that travels between
//! nodes: a numeric `kind` plus the optional fields each protocol needs.
//! Typed protocol messages convert to and from it through [`WireCodec`],
//! and the envelope itself is framed with postcard.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};
use crate::identity::PeerIdentity;
use crate::time::VirtualTime;

/// Untyped message as carried by the delivery substrate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "I: PeerIdentity")]
pub struct WireMessage<I: PeerIdentity> {
    /// Discriminator (route discovery kind, or the flood/gossip message id)
    pub kind: u32,
    pub source: Option<I>,
    pub destination: Option<I>,
    /// Accumulated or full discovered path
    pub path: Vec<I>,
    /// Gossip: the sender's own predecessor
    pub parent_hint: Option<I>,
    pub payload: Option<Vec<u8>>,
    pub created_at: Option<VirtualTime>,
}

impl<I: PeerIdentity> WireMessage<I> {
    /// A bare message of the given kind with every optional field unset
    pub fn new(kind: u32) -> Self {
        Self {
            kind,
            source: None,
            destination: None,
            path: Vec::new(),
            parent_hint: None,
            payload: None,
            created_at: None,
        }
    }

    pub fn with_source(mut self, source: I) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_destination(mut self, destination: I) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_path(mut self, path: Vec<I>) -> Self {
        self.path = path;
        self
    }

    pub fn with_parent_hint(mut self, parent_hint: I) -> Self {
        self.parent_hint = Some(parent_hint);
        self
    }

    pub fn with_payload(mut self, payload: Option<Vec<u8>>) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_created_at(mut self, created_at: VirtualTime) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Take a required field, reporting which one was absent
    pub fn require<T>(kind: u32, field: &'static str, value: Option<T>) -> ProtocolResult<T> {
        value.ok_or(ProtocolError::MissingField { kind, field })
    }

    /// Frame and serialize for the delivery substrate
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        let frame = Frame::V0 {
            message: self.clone(),
        };
        postcard::to_allocvec(&frame).map_err(Into::into)
    }

    /// Parse a framed message
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        let frame: Frame<I> = postcard::from_bytes(bytes)?;
        let Frame::V0 { message } = frame;
        Ok(message)
    }
}

/// Versioned framing around the envelope
#[derive(Debug, Serialize, Deserialize)]
#[serde(bound = "I: PeerIdentity")]
enum Frame<I: PeerIdentity> {
    V0 { message: WireMessage<I> },
}

/// Conversion between a protocol's typed message and the wire envelope
pub trait WireCodec<I: PeerIdentity>: Sized {
    fn to_wire(&self) -> WireMessage<I>;

    fn from_wire(wire: WireMessage<I>) -> ProtocolResult<Self>;

    fn encode(&self) -> ProtocolResult<Vec<u8>> {
        self.to_wire().encode()
    }

    fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Self::from_wire(WireMessage::decode(bytes)?)
    }
}
