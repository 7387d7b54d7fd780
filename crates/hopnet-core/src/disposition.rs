//! Handler outcomes
//!
//! A [`Disposition`] tells the substrate what a handler did with one
//! arriving (or originated) message, so it can keep overhead and latency
//! statistics without looking inside protocol state.

use crate::identity::PeerIdentity;

/// Why a message was not propagated further
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// The message key was already processed here
    Duplicate,
    /// The gossip coin toss came up against forwarding
    ProbabilityGate,
}

/// Outcome of handling one message
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition<I: PeerIdentity> {
    /// Copies were put on the wire
    Forwarded {
        copies: usize,
        /// End-to-end delay observed at this node, when the protocol reports one
        latency: Option<u64>,
    },
    /// Data reached its destination
    Delivered { latency: u64 },
    /// A route request reached its destination and a reply was sent back
    Replied { requester: I, copies: usize },
    /// A route reply installed (or refreshed) a route
    RouteCached {
        destination: I,
        hops: usize,
        /// Whether the reply was passed on toward the requester
        relayed: bool,
    },
    /// Data had no cached route: discovery was started and the data dropped
    DiscoveryStarted { destination: I, copies: usize },
    /// The message stops here
    Suppressed {
        reason: SuppressReason,
        latency: Option<u64>,
    },
}

impl<I: PeerIdentity> Disposition<I> {
    pub fn suppressed(reason: SuppressReason) -> Self {
        Self::Suppressed {
            reason,
            latency: None,
        }
    }

    /// Check if this outcome put anything on the wire
    pub fn is_forwarding(&self) -> bool {
        self.copies() > 0
    }

    /// Check if this is a final delivery
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// Check if this is a suppression
    pub fn is_suppress(&self) -> bool {
        matches!(self, Self::Suppressed { .. })
    }

    /// Get the suppress reason if this is a suppression
    pub fn suppress_reason(&self) -> Option<SuppressReason> {
        match self {
            Self::Suppressed { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Number of copies this outcome put on the wire
    pub fn copies(&self) -> usize {
        match self {
            Self::Forwarded { copies, .. }
            | Self::Replied { copies, .. }
            | Self::DiscoveryStarted { copies, .. } => *copies,
            Self::RouteCached { relayed, .. } => usize::from(*relayed),
            Self::Delivered { .. } | Self::Suppressed { .. } => 0,
        }
    }

    /// End-to-end delay reported with this outcome, if any
    pub fn latency(&self) -> Option<u64> {
        match self {
            Self::Delivered { latency } => Some(*latency),
            Self::Forwarded { latency, .. } | Self::Suppressed { latency, .. } => *latency,
            _ => None,
        }
    }
}
