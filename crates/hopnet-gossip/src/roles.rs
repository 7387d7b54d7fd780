//! Traffic-inferred tree roles
//!
//! A gossip node never builds a spanning tree explicitly. Instead it watches
//! the `(sender, parent_hint)` pair on every arriving message and sorts its
//! neighbors into parents, siblings and children:
//!
//! - hint unknown to us: the sender sits one level above, so it is a **parent**
//! - hint is one of our parents: the sender shares a parent with us, a **sibling**
//! - hint is one of our siblings (we are our own sibling): the sender hangs
//!   below us, a **child**
//!
//! Classification is first-match-wins: a neighbor already in the Parent,
//! Sibling or Child set keeps its role.

use std::collections::{BTreeMap, BTreeSet};

use hopnet_core::PeerIdentity;

/// Role a neighbor was classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Parent,
    Sibling,
    Child,
}

/// Neighbor, Parent, Sibling and Child sets of one node
#[derive(Debug, Clone)]
pub struct RoleSets<I: PeerIdentity> {
    neighbors: BTreeSet<I>,
    parents: BTreeSet<I>,
    siblings: BTreeSet<I>,
    children: BTreeSet<I>,
    /// Most recent required probability reported through each child
    latest_required: BTreeMap<I, f64>,
}

impl<I: PeerIdentity> RoleSets<I> {
    /// Fresh sets for `local`, seeded into Neighbor and Sibling
    pub fn new(local: &I) -> Self {
        Self {
            neighbors: BTreeSet::from([local.clone()]),
            parents: BTreeSet::new(),
            siblings: BTreeSet::from([local.clone()]),
            children: BTreeSet::new(),
            latest_required: BTreeMap::new(),
        }
    }

    /// Fold one observation into the sets
    ///
    /// Returns the role newly assigned to `sender`, if any.
    pub fn observe(&mut self, sender: &I, parent_hint: &I) -> Option<Role> {
        self.neighbors.insert(sender.clone());

        if self.role_of(sender).is_some() {
            return None;
        }

        let role = if !self.neighbors.contains(parent_hint) {
            Role::Parent
        } else if self.parents.contains(parent_hint) {
            Role::Sibling
        } else if self.siblings.contains(parent_hint) {
            Role::Child
        } else {
            return None;
        };

        let set = match role {
            Role::Parent => &mut self.parents,
            Role::Sibling => &mut self.siblings,
            Role::Child => &mut self.children,
        };
        set.insert(sender.clone());
        Some(role)
    }

    /// Current role of `node`; the local node reports as a sibling
    pub fn role_of(&self, node: &I) -> Option<Role> {
        if self.parents.contains(node) {
            Some(Role::Parent)
        } else if self.siblings.contains(node) {
            Some(Role::Sibling)
        } else if self.children.contains(node) {
            Some(Role::Child)
        } else {
            None
        }
    }

    pub fn is_child(&self, node: &I) -> bool {
        self.children.contains(node)
    }

    /// Record the requirement last reported through `child`
    pub fn record_requirement(&mut self, child: &I, p_required: f64) {
        self.latest_required.insert(child.clone(), p_required);
    }

    /// Highest requirement across tracked children
    pub fn max_child_requirement(&self) -> Option<f64> {
        self.latest_required.values().copied().reduce(f64::max)
    }

    pub fn latest_required(&self) -> &BTreeMap<I, f64> {
        &self.latest_required
    }

    pub fn neighbors(&self) -> &BTreeSet<I> {
        &self.neighbors
    }

    pub fn parents(&self) -> &BTreeSet<I> {
        &self.parents
    }

    pub fn siblings(&self) -> &BTreeSet<I> {
        &self.siblings
    }

    pub fn children(&self) -> &BTreeSet<I> {
        &self.children
    }

    pub fn parent_count(&self) -> usize {
        self.parents.len()
    }
}

/// Minimum per-hop forward probability for a node with `parent_count` parents
///
/// With no parents full reliability is demanded. Otherwise
/// `1 - ((1 - tau)^(1/delta))^(1/K)`.
pub fn calculate_required_probability(parent_count: usize, tau_reliability: f64, delta: f64) -> f64 {
    if parent_count == 0 {
        return 1.0;
    }
    let base = (1.0 - tau_reliability).powf(1.0 / delta);
    1.0 - base.powf(1.0 / parent_count as f64)
}

/// Forward probability: the threshold, raised to the neediest child's requirement
pub fn calculate_gossip_probability(threshold: f64, max_child_requirement: Option<f64>) -> f64 {
    max_child_requirement.map_or(threshold, |p| p.max(threshold))
}

/// Join a set for log output
pub(crate) fn render<I: PeerIdentity>(set: &BTreeSet<I>) -> String {
    set.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopnet_core::SimulationIdentity;

    fn make_id(c: char) -> SimulationIdentity {
        SimulationIdentity::new(c).unwrap()
    }

    #[test]
    fn test_seeded_with_self() {
        let sets = RoleSets::new(&make_id('A'));
        assert!(sets.neighbors().contains(&make_id('A')));
        assert!(sets.siblings().contains(&make_id('A')));
        assert!(sets.parents().is_empty());
        assert!(sets.children().is_empty());
    }

    #[test]
    fn test_unknown_hint_makes_parent() {
        let mut sets = RoleSets::new(&make_id('B'));
        // A relays something whose previous hop Z we have never heard
        assert_eq!(sets.observe(&make_id('A'), &make_id('Z')), Some(Role::Parent));
        assert_eq!(sets.role_of(&make_id('A')), Some(Role::Parent));
        assert_eq!(sets.parent_count(), 1);
    }

    #[test]
    fn test_hint_equal_to_sender_is_ambiguous() {
        // A source stamps itself as its own parent; the sender becomes a
        // neighbor before the hint is checked, so no role is assigned
        let mut sets = RoleSets::new(&make_id('B'));
        assert_eq!(sets.observe(&make_id('A'), &make_id('A')), None);
        assert!(sets.neighbors().contains(&make_id('A')));
        assert_eq!(sets.role_of(&make_id('A')), None);
    }

    #[test]
    fn test_sibling_and_child() {
        let mut sets = RoleSets::new(&make_id('C'));
        sets.observe(&make_id('B'), &make_id('A'));
        assert_eq!(sets.role_of(&make_id('B')), Some(Role::Parent));

        // D was also fed by our parent B
        assert_eq!(sets.observe(&make_id('D'), &make_id('B')), Some(Role::Sibling));

        // E relays something it got from us
        assert_eq!(sets.observe(&make_id('E'), &make_id('C')), Some(Role::Child));
        assert!(sets.is_child(&make_id('E')));
    }

    #[test]
    fn test_roles_are_sticky() {
        let mut sets = RoleSets::new(&make_id('C'));
        sets.observe(&make_id('B'), &make_id('A'));
        // B later echoes our own message back, which would look like a child
        assert_eq!(sets.observe(&make_id('B'), &make_id('C')), None);
        assert_eq!(sets.role_of(&make_id('B')), Some(Role::Parent));
        assert!(sets.children().is_empty());
    }

    #[test]
    fn test_required_probability_no_parents() {
        assert_eq!(calculate_required_probability(0, 0.8, 6.0), 1.0);
        assert_eq!(calculate_required_probability(0, 0.1, 2.0), 1.0);
        assert_eq!(calculate_required_probability(0, 0.0, 100.0), 1.0);
    }

    #[test]
    fn test_required_probability_formula() {
        let p = calculate_required_probability(1, 0.8, 6.0);
        let expected = 1.0 - 0.2f64.powf(1.0 / 6.0);
        assert!((p - expected).abs() < 1e-12);
        assert!((p - 0.2353).abs() < 1e-4);

        // More parents means each one needs to forward less often
        let p2 = calculate_required_probability(2, 0.8, 6.0);
        assert!(p2 < p);
        assert!((p2 - (1.0 - 0.2f64.powf(1.0 / 12.0))).abs() < 1e-12);
    }

    #[test]
    fn test_gossip_probability_floor_and_monotonicity() {
        assert_eq!(calculate_gossip_probability(0.8, None), 0.8);
        assert_eq!(calculate_gossip_probability(0.8, Some(0.3)), 0.8);
        assert_eq!(calculate_gossip_probability(0.8, Some(1.0)), 1.0);

        let mut last = 0.0;
        for step in 0..=10 {
            let p = calculate_gossip_probability(0.5, Some(step as f64 / 10.0));
            assert!(p >= 0.5);
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn test_max_child_requirement() {
        let mut sets = RoleSets::new(&make_id('A'));
        assert_eq!(sets.max_child_requirement(), None);
        sets.record_requirement(&make_id('B'), 0.4);
        sets.record_requirement(&make_id('C'), 0.9);
        assert_eq!(sets.max_child_requirement(), Some(0.9));
        // Only the most recent report from a child counts
        sets.record_requirement(&make_id('C'), 0.2);
        assert_eq!(sets.max_child_requirement(), Some(0.4));
    }
}
