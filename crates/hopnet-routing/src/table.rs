//! Source-route cache
//!
//! The [`RoutingTable`] maps a destination to the remaining hops from this
//! node (exclusive) to that destination (inclusive). Entries are written only
//! when a route reply passes through, the last writer wins, and nothing
//! expires.

use std::collections::BTreeMap;

use hopnet_core::PeerIdentity;

/// Cached source routes, keyed by destination
#[derive(Debug, Clone)]
pub struct RoutingTable<I: PeerIdentity> {
    routes: BTreeMap<I, Vec<I>>,
}

impl<I: PeerIdentity> RoutingTable<I> {
    pub fn new() -> Self {
        Self {
            routes: BTreeMap::new(),
        }
    }

    /// Insert or replace the route to a destination
    ///
    /// Returns the route it replaced, if any. Empty routes are ignored.
    pub fn insert(&mut self, destination: I, route: Vec<I>) -> Option<Vec<I>> {
        if route.is_empty() {
            return None;
        }
        self.routes.insert(destination, route)
    }

    /// Get the route to a destination
    pub fn get(&self, destination: &I) -> Option<&[I]> {
        self.routes.get(destination).map(Vec::as_slice)
    }

    /// First hop toward a destination
    pub fn next_hop(&self, destination: &I) -> Option<&I> {
        self.routes.get(destination).and_then(|route| route.first())
    }

    pub fn contains(&self, destination: &I) -> bool {
        self.routes.contains_key(destination)
    }

    /// Get the number of cached routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes in destination order
    pub fn iter(&self) -> impl Iterator<Item = (&I, &[I])> {
        self.routes.iter().map(|(dest, route)| (dest, route.as_slice()))
    }
}

impl<I: PeerIdentity> Default for RoutingTable<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: PeerIdentity> std::fmt::Display for RoutingTable<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (dest, route)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            let hops: Vec<String> = route.iter().map(|h| h.to_string()).collect();
            write!(f, "{} via [{}]", dest, hops.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopnet_core::SimulationIdentity;

    fn make_id(c: char) -> SimulationIdentity {
        SimulationIdentity::new(c).unwrap()
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut table = RoutingTable::new();
        assert!(table.is_empty());

        table.insert(make_id('C'), vec![make_id('B'), make_id('C')]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.next_hop(&make_id('C')), Some(&make_id('B')));
        assert_eq!(table.get(&make_id('C')).unwrap().len(), 2);
        assert!(table.get(&make_id('D')).is_none());
    }

    #[test]
    fn test_last_writer_wins() {
        let mut table = RoutingTable::new();
        table.insert(make_id('D'), vec![make_id('B'), make_id('D')]);
        let old = table.insert(make_id('D'), vec![make_id('C'), make_id('D')]);
        assert_eq!(old, Some(vec![make_id('B'), make_id('D')]));
        assert_eq!(table.next_hop(&make_id('D')), Some(&make_id('C')));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_empty_route_ignored() {
        let mut table: RoutingTable<SimulationIdentity> = RoutingTable::new();
        assert!(table.insert(make_id('A'), Vec::new()).is_none());
        assert!(!table.contains(&make_id('A')));
    }

    #[test]
    fn test_display() {
        let mut table = RoutingTable::new();
        table.insert(make_id('C'), vec![make_id('B'), make_id('C')]);
        table.insert(make_id('B'), vec![make_id('B')]);
        assert_eq!(table.to_string(), "B via [B]; C via [B, C]");
    }
}
