//! Fixed-cadence traffic source
//!
//! Hands `count` messages to one node's protocol, one every `interval`
//! ticks starting at `start`. Message `i` carries id `i` and is stamped
//! with its own origination time.

use hopnet_core::{NodeName, Protocol, VirtualTime};

use crate::error::{SimError, SimResult};
use crate::simulation::Simulation;

/// Periodic traffic from a single node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficSource {
    pub node: NodeName,
    pub start: VirtualTime,
    pub interval: u64,
    pub count: u32,
}

impl TrafficSource {
    pub fn new(node: NodeName, interval: u64, count: u32) -> Self {
        Self {
            node,
            start: VirtualTime::ZERO,
            interval,
            count,
        }
    }

    pub fn starting_at(mut self, start: VirtualTime) -> Self {
        self.start = start;
        self
    }

    /// Origination times, paired with the message index
    ///
    /// Fails when the last origination lies beyond the end of virtual time.
    pub fn times(&self) -> SimResult<Vec<(u32, VirtualTime)>> {
        (0..self.count)
            .map(|i| {
                u64::from(i)
                    .checked_mul(self.interval)
                    .and_then(|offset| self.start.ticks().checked_add(offset))
                    .map(|at| (i, VirtualTime::new(at)))
                    .ok_or_else(|| {
                        SimError::InvalidTraffic(format!(
                            "message {} at interval {} from {} overflows virtual time",
                            i, self.interval, self.start
                        ))
                    })
            })
            .collect()
    }

    /// Schedule every message on `sim`, built by `make(index, time)`
    ///
    /// Nothing is scheduled if any origination time overflows.
    pub fn install<P, F>(&self, sim: &mut Simulation<P>, mut make: F) -> SimResult<()>
    where
        P: Protocol<NodeName>,
        F: FnMut(u32, VirtualTime) -> P::Message,
    {
        for (i, at) in self.times()? {
            sim.schedule_origination(at, &self.node, make(i, at))?;
        }
        Ok(())
    }
}
