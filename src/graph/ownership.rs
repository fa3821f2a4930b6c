//! Ownership tree builder
//!
//! Resolves the objects reconciled by an automation object and, recursively,
//! the objects they own. Which child kinds to look for is driven by a static
//! lookup table of [`KindTree`]s; each level of recursion only sees the part
//! of the table below the kind being expanded.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, join_all};
use tokio_util::sync::CancellationToken;

use crate::error::{RequestError, ShapeError};
use crate::models::{AutomationRef, FluxResourceKind, GroupVersionKind, RawPayload, ResourceNode};

/// Backend able to list reconciled and owned objects
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Objects reconciled by `root`, restricted to `kinds`
    async fn get_reconciled_objects(
        &self,
        root: &AutomationRef,
        kinds: &[GroupVersionKind],
    ) -> Result<Vec<RawPayload>, RequestError>;

    /// Objects of `kind` in `namespace` whose owner uid is `parent_id`
    async fn get_child_objects(
        &self,
        parent_id: &str,
        namespace: &str,
        kind: &GroupVersionKind,
        cluster: &str,
    ) -> Result<Vec<RawPayload>, RequestError>;
}

/// One level of the ownership lookup table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindTree {
    pub gvk: GroupVersionKind,
    pub children: Vec<KindTree>,
}

impl KindTree {
    pub fn leaf(group: &str, version: &str, kind: &str) -> Self {
        Self {
            gvk: GroupVersionKind::gvk(group, version, kind),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<KindTree>) -> Self {
        self.children = children;
        self
    }

    fn matches(&self, node: &ResourceNode) -> bool {
        node.kind() == Some(self.gvk.kind.as_str())
    }
}

impl From<FluxResourceKind> for KindTree {
    fn from(kind: FluxResourceKind) -> Self {
        Self {
            gvk: kind.gvk(),
            children: Vec::new(),
        }
    }
}

fn pod() -> KindTree {
    KindTree::leaf("", "v1", "Pod")
}

/// Lookup table covering the workload chains commonly found in a Flux
/// inventory, plus a few leaf kinds worth showing.
pub fn default_ownership_table() -> Vec<KindTree> {
    vec![
        KindTree::leaf("apps", "v1", "Deployment")
            .with_children(vec![KindTree::leaf("apps", "v1", "ReplicaSet").with_children(vec![pod()])]),
        KindTree::leaf("apps", "v1", "StatefulSet").with_children(vec![pod()]),
        KindTree::leaf("apps", "v1", "DaemonSet").with_children(vec![pod()]),
        KindTree::leaf("batch", "v1", "CronJob")
            .with_children(vec![KindTree::leaf("batch", "v1", "Job").with_children(vec![pod()])]),
        KindTree::leaf("batch", "v1", "Job").with_children(vec![pod()]),
        KindTree::leaf("", "v1", "Service"),
        KindTree::leaf("", "v1", "ConfigMap"),
        KindTree::leaf("", "v1", "Secret"),
        FluxResourceKind::Kustomization.into(),
        FluxResourceKind::HelmRelease.into(),
        FluxResourceKind::GitRepository.into(),
        FluxResourceKind::HelmRepository.into(),
        FluxResourceKind::OCIRepository.into(),
    ]
}

/// Build the ownership forest under `root`
///
/// The root fetch is the only request whose failure is returned; a failed
/// child lookup leaves that branch empty and is logged. Every returned node,
/// at every depth, has its children attached (possibly empty).
pub async fn resolve_tree(
    source: &dyn ObjectSource,
    root: &AutomationRef,
    managed_kinds: &[KindTree],
    cancel: &CancellationToken,
) -> Result<Vec<ResourceNode>, RequestError> {
    if cancel.is_cancelled() {
        return Err(RequestError::Cancelled);
    }

    let kinds: Vec<GroupVersionKind> = managed_kinds.iter().map(|k| k.gvk.clone()).collect();
    let payloads = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(RequestError::Cancelled),
        result = source.get_reconciled_objects(root, &kinds) => result?,
    };

    tracing::debug!(
        "{} reconciles {} objects of {} managed kinds",
        root.id(),
        payloads.len(),
        kinds.len()
    );

    let objects = payloads.iter().map(ResourceNode::parse).map(|node| {
        let child_kinds = managed_kinds
            .iter()
            .find(|entry| entry.matches(&node))
            .map(|entry| entry.children.as_slice())
            .unwrap_or_default();
        resolve_node(source, node, child_kinds, cancel)
    });

    Ok(join_all(objects).await)
}

/// Attach the children of `node`, one child kind at a time, then recurse into
/// each child concurrently with the narrowed table.
fn resolve_node<'a>(
    source: &'a dyn ObjectSource,
    mut node: ResourceNode,
    child_kinds: &'a [KindTree],
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, ResourceNode> {
    async move {
        let mut children = Vec::new();

        let parent_id = match node.uid() {
            Some(uid) if !child_kinds.is_empty() => uid.to_string(),
            _ => {
                node.attach_children(children);
                return node;
            }
        };

        for child_kind in child_kinds {
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = source.get_child_objects(
                    &parent_id,
                    node.namespace(),
                    &child_kind.gvk,
                    node.cluster_tag(),
                ) => Some(result),
            };

            let Some(fetched) = fetched else {
                tracing::debug!("Tree resolution cancelled below {}", node.id());
                break;
            };

            let payloads = match fetched {
                Ok(payloads) => payloads,
                Err(e) => {
                    tracing::warn!(
                        "Failed to list {} owned by {}: {}",
                        child_kind.gvk.kind,
                        node.id(),
                        e
                    );
                    continue;
                }
            };

            let resolved = join_all(
                payloads
                    .iter()
                    .map(ResourceNode::parse)
                    .map(|child| resolve_node(source, child, &child_kind.children, cancel)),
            )
            .await;
            children.extend(resolved);
        }

        node.attach_children(children);
        node
    }
    .boxed()
}

/// Pre-order walk of a resolved forest
pub fn flatten(forest: &[ResourceNode]) -> Result<Vec<&ResourceNode>, ShapeError> {
    Ok(flatten_with_depth(forest)?
        .into_iter()
        .map(|(_, node)| node)
        .collect())
}

/// Pre-order walk paired with each node's depth (roots are 0)
pub fn flatten_with_depth(forest: &[ResourceNode]) -> Result<Vec<(usize, &ResourceNode)>, ShapeError> {
    let mut out = Vec::new();
    for node in forest {
        flatten_into(node, 0, &mut out)?;
    }
    Ok(out)
}

fn flatten_into<'a>(
    node: &'a ResourceNode,
    depth: usize,
    out: &mut Vec<(usize, &'a ResourceNode)>,
) -> Result<(), ShapeError> {
    let children = node
        .children()
        .ok_or_else(|| ShapeError::MissingChildren { id: node.id() })?;
    out.push((depth, node));
    for child in children {
        flatten_into(child, depth + 1, out)?;
    }
    Ok(())
}
