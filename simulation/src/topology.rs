//! Static mesh topologies
//!
//! Nodes are named `node0`, `node1`, ... by the builders. Custom meshes can
//! use any name accepted by [`NodeName`].
//!
//! - Line, star, ring and full mesh
//! - Balanced tree with a fixed branching factor
//! - Seeded random graph, patched to be connected

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hopnet_core::{NeighborDirectory, NodeName};

use crate::error::{SimError, SimResult};

/// An undirected mesh network
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    adjacency: BTreeMap<NodeName, BTreeSet<NodeName>>,
}

impl Mesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from named edges
    pub fn from_edges(edges: &[(&str, &str)]) -> SimResult<Self> {
        let mut mesh = Self::new();
        for (a, b) in edges {
            mesh.connect(NodeName::new(*a)?, NodeName::new(*b)?);
        }
        Ok(mesh)
    }

    /// Add a node without links
    pub fn add_node(&mut self, node: NodeName) {
        self.adjacency.entry(node).or_default();
    }

    /// Add a bidirectional link; self-loops are ignored
    pub fn connect(&mut self, a: NodeName, b: NodeName) {
        if a == b {
            return;
        }
        self.adjacency.entry(a.clone()).or_default().insert(b.clone());
        self.adjacency.entry(b).or_default().insert(a);
    }

    pub fn contains(&self, node: &NodeName) -> bool {
        self.adjacency.contains_key(node)
    }

    /// Neighbors of a node, in name order
    pub fn neighbor_set(&self, node: &NodeName) -> Option<&BTreeSet<NodeName>> {
        self.adjacency.get(node)
    }

    /// Check if two nodes are directly connected
    pub fn are_connected(&self, a: &NodeName, b: &NodeName) -> bool {
        self.adjacency
            .get(a)
            .is_some_and(|neighbors| neighbors.contains(b))
    }

    pub fn degree(&self, node: &NodeName) -> usize {
        self.adjacency.get(node).map_or(0, BTreeSet::len)
    }

    /// All node names, in order
    pub fn node_ids(&self) -> Vec<NodeName> {
        self.adjacency.keys().cloned().collect()
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Get number of links
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Connected components, each listed in name order
    pub fn components(&self) -> Vec<Vec<NodeName>> {
        let mut seen: BTreeSet<&NodeName> = BTreeSet::new();
        let mut components = Vec::new();
        for start in self.adjacency.keys() {
            if !seen.insert(start) {
                continue;
            }
            let mut component = vec![start.clone()];
            let mut queue = VecDeque::from([start]);
            while let Some(node) = queue.pop_front() {
                for next in &self.adjacency[node] {
                    if seen.insert(next) {
                        component.push(next.clone());
                        queue.push_back(next);
                    }
                }
            }
            component.sort();
            components.push(component);
        }
        components
    }

    pub fn is_connected(&self) -> bool {
        self.components().len() <= 1
    }

    /// Print a simple ASCII visualization of the mesh
    pub fn visualize(&self) -> String {
        let mut output = String::new();
        output.push_str("Mesh Topology:\n");
        output.push_str(&format!("  Nodes: {}\n", self.node_count()));
        output.push_str(&format!("  Edges: {}\n\n", self.edge_count()));

        for (node, neighbors) in &self.adjacency {
            let neighbor_str: Vec<&str> = neighbors.iter().map(NodeName::as_str).collect();
            output.push_str(&format!("  {} -> [{}]\n", node, neighbor_str.join(", ")));
        }
        output
    }
}

impl NeighborDirectory<NodeName> for Mesh {
    fn neighbors(&self, node: &NodeName) -> Vec<NodeName> {
        self.adjacency
            .get(node)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn is_neighbor(&self, node: &NodeName, other: &NodeName) -> bool {
        self.are_connected(node, other)
    }
}

/// Builder for generated topologies
pub struct MeshBuilder {
    node_count: usize,
}

impl MeshBuilder {
    /// A builder for `node_count` nodes named `node0..`
    pub fn new(node_count: usize) -> SimResult<Self> {
        if node_count == 0 {
            return Err(SimError::InvalidTopology("at least one node is required".to_string()));
        }
        Ok(Self { node_count })
    }

    fn nodes(&self) -> (Mesh, Vec<NodeName>) {
        let names: Vec<NodeName> = (0..self.node_count).map(NodeName::indexed).collect();
        let mut mesh = Mesh::new();
        for name in &names {
            mesh.add_node(name.clone());
        }
        (mesh, names)
    }

    /// node0 - node1 - node2 - ...
    pub fn line(self) -> Mesh {
        let (mut mesh, names) = self.nodes();
        for pair in names.windows(2) {
            mesh.connect(pair[0].clone(), pair[1].clone());
        }
        mesh
    }

    /// node0 in the center, connected to all others
    pub fn star(self) -> Mesh {
        let (mut mesh, names) = self.nodes();
        for leaf in names.iter().skip(1) {
            mesh.connect(names[0].clone(), leaf.clone());
        }
        mesh
    }

    /// A line closed back onto node0
    pub fn ring(self) -> Mesh {
        let (mut mesh, names) = self.nodes();
        for i in 0..names.len() {
            let next = (i + 1) % names.len();
            mesh.connect(names[i].clone(), names[next].clone());
        }
        mesh
    }

    /// Every node connected to every other
    pub fn full_mesh(self) -> Mesh {
        let (mut mesh, names) = self.nodes();
        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                mesh.connect(names[i].clone(), names[j].clone());
            }
        }
        mesh
    }

    /// Balanced tree rooted at node0, filled breadth first
    pub fn tree(self, branching: usize) -> SimResult<Mesh> {
        if branching == 0 {
            return Err(SimError::InvalidTopology("tree branching must be positive".to_string()));
        }
        let (mut mesh, names) = self.nodes();
        for (i, child) in names.iter().enumerate().skip(1) {
            let parent = (i - 1) / branching;
            mesh.connect(names[parent].clone(), child.clone());
        }
        Ok(mesh)
    }

    /// Each pair linked with `probability`, then components are bridged
    ///
    /// The same seed always yields the same mesh.
    pub fn random(self, probability: f64, seed: u64) -> SimResult<Mesh> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(SimError::InvalidTopology(format!(
                "link probability must be within [0, 1], got {}",
                probability
            )));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let (mut mesh, names) = self.nodes();

        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                if rng.random::<f64>() < probability {
                    mesh.connect(names[i].clone(), names[j].clone());
                }
            }
        }

        // Bridge every stray component to a random member of the first
        let components = mesh.components();
        if let Some((main, rest)) = components.split_first() {
            for component in rest {
                let anchor = &main[rng.random_range(0..main.len())];
                mesh.connect(anchor.clone(), component[0].clone());
            }
        }

        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(i: usize) -> NodeName {
        NodeName::indexed(i)
    }

    #[test]
    fn test_ring_topology() {
        let mesh = MeshBuilder::new(4).unwrap().ring();
        assert_eq!(mesh.node_count(), 4);
        assert_eq!(mesh.edge_count(), 4);

        assert!(mesh.are_connected(&name(0), &name(1)));
        assert!(mesh.are_connected(&name(3), &name(0))); // Wrap around
        assert!(!mesh.are_connected(&name(0), &name(2))); // Not direct
    }

    #[test]
    fn test_full_mesh() {
        let mesh = MeshBuilder::new(4).unwrap().full_mesh();
        assert_eq!(mesh.edge_count(), 6); // C(4,2) = 6
        for a in mesh.node_ids() {
            assert_eq!(mesh.degree(&a), 3);
        }
    }

    #[test]
    fn test_line_and_star() {
        let line = MeshBuilder::new(5).unwrap().line();
        assert_eq!(line.edge_count(), 4);
        assert_eq!(line.degree(&name(0)), 1);
        assert_eq!(line.degree(&name(2)), 2);

        let star = MeshBuilder::new(5).unwrap().star();
        assert_eq!(star.degree(&name(0)), 4);
        assert_eq!(star.neighbors(&name(3)), vec![name(0)]);
    }

    #[test]
    fn test_balanced_tree() {
        let mesh = MeshBuilder::new(7).unwrap().tree(2).unwrap();
        assert_eq!(mesh.edge_count(), 6);
        assert!(mesh.is_connected());
        assert!(mesh.are_connected(&name(0), &name(1)));
        assert!(mesh.are_connected(&name(0), &name(2)));
        assert!(mesh.are_connected(&name(2), &name(5)));
        assert!(mesh.are_connected(&name(2), &name(6)));
        assert!(MeshBuilder::new(3).unwrap().tree(0).is_err());
    }

    #[test]
    fn test_random_is_connected_and_reproducible() {
        for seed in 0..10 {
            let a = MeshBuilder::new(20).unwrap().random(0.05, seed).unwrap();
            let b = MeshBuilder::new(20).unwrap().random(0.05, seed).unwrap();
            assert!(a.is_connected(), "seed {seed}");
            assert_eq!(a.visualize(), b.visualize());
        }
        assert!(MeshBuilder::new(3).unwrap().random(1.5, 0).is_err());
    }

    #[test]
    fn test_custom_topology() {
        let mesh = Mesh::from_edges(&[("A", "B"), ("A", "C"), ("B", "C"), ("B", "D")]).unwrap();
        let id = |s: &str| NodeName::new(s).unwrap();

        assert_eq!(mesh.node_count(), 4);
        assert_eq!(mesh.edge_count(), 4);
        assert!(mesh.is_neighbor(&id("A"), &id("B")));
        assert!(!mesh.is_neighbor(&id("A"), &id("D")));
        assert!(Mesh::from_edges(&[("A", "")]).is_err());
    }

    #[test]
    fn test_components() {
        let mut mesh = Mesh::from_edges(&[("A", "B"), ("C", "D")]).unwrap();
        mesh.add_node(NodeName::new("E").unwrap());
        assert_eq!(mesh.components().len(), 3);
        assert!(!mesh.is_connected());
        assert!(MeshBuilder::new(0).is_err());
    }
}
