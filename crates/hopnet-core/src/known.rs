//! Duplicate suppression
//!
//! A [`KnownMessageSet`] remembers every message key a node has processed.
//! It is never pruned: entries live as long as the node.

use std::collections::BTreeSet;

/// Set of already-processed message keys
#[derive(Debug, Clone)]
pub struct KnownMessageSet<K: Ord> {
    seen: BTreeSet<K>,
}

impl<K: Ord> KnownMessageSet<K> {
    pub fn new() -> Self {
        Self {
            seen: BTreeSet::new(),
        }
    }

    /// Record `key`; returns `false` if it was already known
    pub fn insert(&mut self, key: K) -> bool {
        self.seen.insert(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.seen.contains(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.seen.iter()
    }
}

impl<K: Ord> Default for KnownMessageSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_reports_first_sighting() {
        let mut known = KnownMessageSet::new();
        assert!(known.insert(3u32));
        assert!(!known.insert(3u32));
        assert!(known.insert(4u32));
        assert_eq!(known.len(), 2);
        assert!(known.contains(&3));
    }

    #[test]
    fn test_pair_keys() {
        let mut known = KnownMessageSet::new();
        assert!(known.insert(('A', 'C')));
        assert!(known.insert(('C', 'A')));
        assert!(!known.insert(('A', 'C')));
    }
}
