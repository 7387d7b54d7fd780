//! Node context for per-event logging
//!
//! The simulator hands every event to exactly one node. [`NodeContextGuard`]
//! enters a `node` span carrying that node's name and the virtual time, so
//! every record a protocol handler emits is attributed to it.

use hopnet_core::{PeerIdentity, VirtualTime};
use tracing::span::EnteredSpan;
use tracing::{Span, info_span};

/// The span every per-node record is emitted under
pub fn node_span<I: PeerIdentity>(node: &I, time: VirtualTime) -> Span {
    info_span!("node", node = %node.short_id(), t = time.ticks())
}

/// RAII guard for node context
///
/// The `node` span stays entered until the guard is dropped.
pub struct NodeContextGuard {
    _span: EnteredSpan,
}

impl NodeContextGuard {
    pub fn new<I: PeerIdentity>(node: &I, time: VirtualTime) -> Self {
        Self {
            _span: node_span(node, time).entered(),
        }
    }
}
