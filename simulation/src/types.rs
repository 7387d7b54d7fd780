//! Event log and statistics types

use serde::Serialize;

use hopnet_core::{Disposition, NodeName, SuppressReason, VirtualTime};

/// Events recorded by the simulator
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkEvent {
    /// Traffic handed to a node's protocol
    Originated {
        node: NodeName,
        kind: u32,
        time: VirtualTime,
    },
    /// One copy put on a link
    Transmitted {
        from: NodeName,
        to: NodeName,
        kind: u32,
        time: VirtualTime,
        deliver_at: VirtualTime,
    },
    /// A node's handler ran to completion
    Handled {
        node: NodeName,
        from: Option<NodeName>,
        kind: u32,
        disposition: Disposition<NodeName>,
        time: VirtualTime,
    },
    /// Message discarded after a message-scoped error
    Failed {
        node: NodeName,
        error: String,
        time: VirtualTime,
    },
}

impl NetworkEvent {
    pub fn time(&self) -> VirtualTime {
        match self {
            Self::Originated { time, .. }
            | Self::Transmitted { time, .. }
            | Self::Handled { time, .. }
            | Self::Failed { time, .. } => *time,
        }
    }
}

/// Simulation statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimStats {
    /// Messages handed to protocols by the traffic source
    pub originated: u64,
    /// Copies put on links, of every kind
    pub transmissions: u64,
    /// Copies handed to a receiving node
    pub arrivals: u64,
    /// Originations and first arrivals passed on through the forwarding step
    pub forwarded: u64,
    /// Data messages delivered at their destination
    pub delivered: u64,
    pub route_replies: u64,
    pub routes_cached: u64,
    pub discoveries_started: u64,
    pub duplicates_suppressed: u64,
    pub probability_suppressed: u64,
    /// Messages discarded after an error
    pub errors: u64,
    /// Sum of reported latencies
    pub total_latency: u64,
    /// Number of reported latencies
    pub latency_samples: u64,
    pub max_latency: u64,
}

impl SimStats {
    /// Fold one handler outcome into the counters
    pub fn record(&mut self, disposition: &Disposition<NodeName>) {
        match disposition {
            Disposition::Forwarded { .. } => self.forwarded += 1,
            Disposition::Delivered { .. } => self.delivered += 1,
            Disposition::Replied { .. } => self.route_replies += 1,
            Disposition::RouteCached { .. } => self.routes_cached += 1,
            Disposition::DiscoveryStarted { .. } => self.discoveries_started += 1,
            Disposition::Suppressed { reason, .. } => match reason {
                SuppressReason::Duplicate => self.duplicates_suppressed += 1,
                SuppressReason::ProbabilityGate => self.probability_suppressed += 1,
            },
        }
        if let Some(latency) = disposition.latency() {
            self.total_latency += latency;
            self.latency_samples += 1;
            self.max_latency = self.max_latency.max(latency);
        }
    }

    /// Mean reported latency in ticks
    pub fn mean_latency(&self) -> Option<f64> {
        (self.latency_samples > 0).then(|| self.total_latency as f64 / self.latency_samples as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_and_latency() {
        let mut stats = SimStats::default();
        stats.record(&Disposition::Delivered { latency: 4 });
        stats.record(&Disposition::Forwarded {
            copies: 2,
            latency: Some(2),
        });
        stats.record(&Disposition::suppressed(SuppressReason::Duplicate));
        stats.record(&Disposition::Suppressed {
            reason: SuppressReason::ProbabilityGate,
            latency: Some(6),
        });

        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.forwarded, 1);
        assert_eq!(stats.duplicates_suppressed, 1);
        assert_eq!(stats.probability_suppressed, 1);
        assert_eq!(stats.latency_samples, 3);
        assert_eq!(stats.max_latency, 6);
        assert_eq!(stats.mean_latency(), Some(4.0));
    }

    #[test]
    fn test_no_latency_samples() {
        assert_eq!(SimStats::default().mean_latency(), None);
    }
}
