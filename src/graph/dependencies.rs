//! Dependency graph engine
//!
//! Automation objects declare ordering constraints through `spec.dependsOn`.
//! This module answers "what is connected to this object" over an immutable
//! snapshot of already-fetched nodes. Edges are directional in the data but
//! walked in both directions; the graph is not guaranteed to be acyclic.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::models::{ObjectRef, ResourceNode};

/// Immutable set of nodes with a bidirectional dependency lookup
#[derive(Debug, Clone, Default)]
pub struct NodeSnapshot {
    nodes: Vec<ResourceNode>,
    /// Map from object id to index in `nodes`
    node_index: HashMap<String, usize>,
    /// Map from a dependency's object id to the indices of nodes declaring it
    dependents: HashMap<String, Vec<usize>>,
}

impl NodeSnapshot {
    /// Build a snapshot; a later node with an already-seen id replaces the
    /// earlier one in place.
    pub fn new(nodes: Vec<ResourceNode>) -> Self {
        let mut snapshot = Self::default();
        for node in nodes {
            let id = node.id();
            match snapshot.node_index.get(&id) {
                Some(&idx) => snapshot.nodes[idx] = node,
                None => {
                    snapshot.node_index.insert(id, snapshot.nodes.len());
                    snapshot.nodes.push(node);
                }
            }
        }

        for (idx, node) in snapshot.nodes.iter().enumerate() {
            for dependency in node.depends_on() {
                let target = dependency.resolve(node.namespace()).id();
                let declared_by = snapshot.dependents.entry(target).or_default();
                if declared_by.last() != Some(&idx) {
                    declared_by.push(idx);
                }
            }
        }

        snapshot
    }

    pub fn get(&self, object: &ObjectRef) -> Option<&ResourceNode> {
        self.get_by_id(&object.id())
    }

    pub fn get_by_id(&self, id: &str) -> Option<&ResourceNode> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn dependents_of(&self, id: &str) -> impl Iterator<Item = &ResourceNode> {
        self.dependents
            .get(id)
            .into_iter()
            .flatten()
            .map(|&idx| &self.nodes[idx])
    }
}

impl FromIterator<ResourceNode> for NodeSnapshot {
    fn from_iter<T: IntoIterator<Item = ResourceNode>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A node of a connected dependency subgraph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DependencyNode<'a> {
    pub node: &'a ResourceNode,
    /// Display flag for the focal node; not part of the node's identity
    pub is_current: bool,
}

/// Directed edge: `from` declares a dependency on `to`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
}

/// Nodes directly connected to `current`
///
/// Nodes `current` depends on come first, in `dependsOn` order, followed by
/// nodes depending on `current`, in snapshot order. References that resolve
/// to nothing in the snapshot are dropped.
pub fn get_neighbors<'a>(snapshot: &'a NodeSnapshot, current: &ResourceNode) -> Vec<&'a ResourceNode> {
    let current_id = current.id();
    let mut seen = HashSet::new();
    let mut neighbors = Vec::new();

    for dependency in current.depends_on() {
        let target = dependency.resolve(current.namespace());
        match snapshot.get(&target) {
            Some(node) => {
                if seen.insert(node.id()) {
                    neighbors.push(node);
                }
            }
            None => tracing::trace!("Ignoring dangling dependency {} -> {}", current_id, target),
        }
    }

    for node in snapshot.dependents_of(&current_id) {
        if seen.insert(node.id()) {
            neighbors.push(node);
        }
    }

    neighbors
}

/// Connected component around `focal`, in breadth-first discovery order
///
/// Returns an empty list when the focal object is not in the snapshot or has
/// no resolvable neighbor: a lone node is nothing to draw.
pub fn get_connected_subgraph<'a>(
    snapshot: &'a NodeSnapshot,
    focal: &ObjectRef,
) -> Vec<DependencyNode<'a>> {
    let Some(focal_node) = snapshot.get(focal) else {
        tracing::debug!("Focal object {} not found in snapshot", focal);
        return Vec::new();
    };

    let focal_id = focal_node.id();
    let mut visited: HashSet<String> = HashSet::from([focal_id.clone()]);
    let mut queue: VecDeque<&ResourceNode> = VecDeque::from([focal_node]);
    let mut result = Vec::new();

    while let Some(node) = queue.pop_front() {
        for neighbor in get_neighbors(snapshot, node) {
            if visited.insert(neighbor.id()) {
                queue.push_back(neighbor);
            }
        }
        result.push(DependencyNode {
            node,
            is_current: node.id() == focal_id,
        });
    }

    if result.len() <= 1 {
        return Vec::new();
    }

    tracing::debug!(
        "Dependency subgraph for {} has {} nodes",
        focal_id,
        result.len()
    );
    result
}

/// Declared edges whose both ends are part of `nodes`
pub fn dependency_edges(nodes: &[DependencyNode<'_>]) -> Vec<DependencyEdge> {
    let ids: HashSet<String> = nodes.iter().map(|n| n.node.id()).collect();
    let mut edges = Vec::new();

    for entry in nodes {
        let from = entry.node.id();
        for dependency in entry.node.depends_on() {
            let to = dependency.resolve(entry.node.namespace()).id();
            let edge = DependencyEdge {
                from: from.clone(),
                to,
            };
            if ids.contains(&edge.to) && !edges.contains(&edge) {
                edges.push(edge);
            }
        }
    }

    edges
}
