//! fluxgraph
//!
//! Resource graph and status engine for Flux GitOps dashboards: normalizes
//! loosely-typed Kubernetes payloads, derives readiness from their
//! conditions, resolves ownership trees and `dependsOn` graphs, and rolls up
//! health counts.

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod health;
pub mod kube;
pub mod models;
pub mod status;

pub use error::{RequestError, ShapeError};
pub use graph::{
    DependencyNode, KindTree, NodeSnapshot, ObjectSource, default_ownership_table, flatten,
    get_connected_subgraph, get_neighbors, resolve_tree,
};
pub use health::{HealthBucket, HealthStatus, aggregate};
pub use models::{AutomationRef, ObjectRef, RawPayload, ResourceNode};
pub use status::{DisplayStatus, Readiness, compute_message, compute_readiness};
