//! Gossip parameters

use serde::{Deserialize, Serialize};

use hopnet_core::DEFAULT_HOP_DELAY;

use crate::error::{GossipError, GossipResult};

/// Smart gossip configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GossipConfig {
    /// Floor of the forward probability
    /// Default: 0.8
    pub gossip_threshold: f64,

    /// End-to-end reliability target
    /// Default: 0.8
    pub tau_reliability: f64,

    /// Redundancy (fan-out) parameter of the reliability model
    /// Default: 6
    pub delta: f64,

    /// Delay attached to every copy, in ticks
    /// Default: 1
    pub hop_delay: u64,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            gossip_threshold: 0.8,
            tau_reliability: 0.8,
            delta: 6.0,
            hop_delay: DEFAULT_HOP_DELAY,
        }
    }
}

impl GossipConfig {
    pub fn with_threshold(mut self, gossip_threshold: f64) -> Self {
        self.gossip_threshold = gossip_threshold;
        self
    }

    pub fn with_reliability(mut self, tau_reliability: f64, delta: f64) -> Self {
        self.tau_reliability = tau_reliability;
        self.delta = delta;
        self
    }

    /// Reject parameters the probability model cannot use
    pub fn validate(&self) -> GossipResult<()> {
        if !(0.0..=1.0).contains(&self.gossip_threshold) {
            return Err(GossipError::InvalidThreshold(self.gossip_threshold));
        }
        if !(0.0..=1.0).contains(&self.tau_reliability) {
            return Err(GossipError::InvalidReliability(self.tau_reliability));
        }
        if !self.delta.is_finite() || self.delta <= 0.0 {
            return Err(GossipError::InvalidDelta(self.delta));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GossipConfig::default();
        assert_eq!(config.gossip_threshold, 0.8);
        assert_eq!(config.tau_reliability, 0.8);
        assert_eq!(config.delta, 6.0);
        assert_eq!(config.hop_delay, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            GossipConfig::default().with_threshold(1.5).validate(),
            Err(GossipError::InvalidThreshold(1.5))
        );
        assert!(matches!(
            GossipConfig::default().with_reliability(-0.1, 6.0).validate(),
            Err(GossipError::InvalidReliability(_))
        ));
        assert!(matches!(
            GossipConfig::default().with_reliability(0.8, 0.0).validate(),
            Err(GossipError::InvalidDelta(_))
        ));
        assert!(matches!(
            GossipConfig::default().with_reliability(0.8, f64::NAN).validate(),
            Err(GossipError::InvalidDelta(_))
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GossipConfig = serde_json::from_str(r#"{"gossip_threshold": 0.5}"#).unwrap();
        assert_eq!(config.gossip_threshold, 0.5);
        assert_eq!(config.delta, 6.0);
    }
}
