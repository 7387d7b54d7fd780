//! Virtual time
//!
//! All timestamps are integer ticks of the simulated clock. One tick is the
//! default per-hop delivery delay.

use serde::{Deserialize, Serialize};

/// A point on the virtual clock
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("T={_0}")]
pub struct VirtualTime(u64);

impl VirtualTime {
    /// The start of every run
    pub const ZERO: VirtualTime = VirtualTime(0);

    pub const fn new(ticks: u64) -> Self {
        Self(ticks)
    }

    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// The time `ticks` after this one
    pub const fn plus(self, ticks: u64) -> Self {
        Self(self.0.saturating_add(ticks))
    }

    /// Ticks elapsed since `earlier`, zero if `earlier` is in the future
    pub const fn since(self, earlier: VirtualTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl From<u64> for VirtualTime {
    fn from(ticks: u64) -> Self {
        Self(ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let t = VirtualTime::new(20);
        assert_eq!(t.plus(3), VirtualTime::new(23));
        assert_eq!(t.plus(3).since(t), 3);
        assert_eq!(t.since(t.plus(3)), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(VirtualTime::new(42).to_string(), "T=42");
    }
}
