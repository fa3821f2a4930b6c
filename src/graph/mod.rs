//! Graph engines
//!
//! - `dependencies` - `dependsOn` graph between automation objects
//! - `ownership` - owner-reference trees of reconciled objects

pub mod dependencies;
pub mod ownership;

pub use dependencies::{
    DependencyEdge, DependencyNode, NodeSnapshot, dependency_edges, get_connected_subgraph,
    get_neighbors,
};
pub use ownership::{
    KindTree, ObjectSource, default_ownership_table, flatten, flatten_with_depth, resolve_tree,
};
