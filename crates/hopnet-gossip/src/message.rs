//! Gossip message

use hopnet_core::{PeerIdentity, ProtocolResult, VirtualTime, WireCodec, WireMessage};

/// A gossiped message
///
/// `source` is the node that last transmitted the message and `parent_hint`
/// the node it received it from. Both are rewritten on every hop; receivers
/// use the pair to infer tree roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GossipMessage<I: PeerIdentity> {
    pub id: u32,
    pub source: I,
    pub parent_hint: I,
    pub payload: Option<Vec<u8>>,
    pub created_at: VirtualTime,
}

impl<I: PeerIdentity> GossipMessage<I> {
    /// A message as its originator sends it: the source is its own parent
    pub fn originated(id: u32, source: I, created_at: VirtualTime) -> Self {
        Self {
            id,
            parent_hint: source.clone(),
            source,
            payload: None,
            created_at,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// The copy `relay` sends on: the previous sender becomes the parent hint
    pub fn relayed_by(&self, relay: &I) -> Self {
        Self {
            id: self.id,
            source: relay.clone(),
            parent_hint: self.source.clone(),
            payload: self.payload.clone(),
            created_at: self.created_at,
        }
    }
}

impl<I: PeerIdentity> WireCodec<I> for GossipMessage<I> {
    fn to_wire(&self) -> WireMessage<I> {
        WireMessage::new(self.id)
            .with_source(self.source.clone())
            .with_parent_hint(self.parent_hint.clone())
            .with_payload(self.payload.clone())
            .with_created_at(self.created_at)
    }

    fn from_wire(wire: WireMessage<I>) -> ProtocolResult<Self> {
        let kind = wire.kind;
        Ok(Self {
            id: kind,
            source: WireMessage::<I>::require(kind, "source", wire.source)?,
            parent_hint: WireMessage::<I>::require(kind, "parent_hint", wire.parent_hint)?,
            payload: wire.payload,
            created_at: WireMessage::<I>::require(kind, "created_at", wire.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopnet_core::{NodeName, ProtocolError};

    #[test]
    fn test_relay_rewrites_sender_fields() {
        let a = NodeName::indexed(0);
        let b = NodeName::indexed(1);
        let msg = GossipMessage::originated(4, a.clone(), VirtualTime::new(2));
        assert_eq!(msg.parent_hint, a);

        let relayed = msg.relayed_by(&b);
        assert_eq!(relayed.source, b);
        assert_eq!(relayed.parent_hint, a);
        assert_eq!(relayed.id, 4);
        assert_eq!(relayed.created_at, VirtualTime::new(2));
    }

    #[test]
    fn test_encode_decode() {
        let msg = GossipMessage::originated(9, NodeName::indexed(3), VirtualTime::new(40))
            .with_payload(b"x".to_vec());
        let bytes = msg.encode().unwrap();
        assert_eq!(GossipMessage::<NodeName>::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_missing_parent_hint() {
        let wire = WireMessage::new(9)
            .with_source(NodeName::indexed(3))
            .with_created_at(VirtualTime::ZERO);
        let err = GossipMessage::<NodeName>::from_wire(wire).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::MissingField {
                kind: 9,
                field: "parent_hint"
            }
        ));
    }
}
