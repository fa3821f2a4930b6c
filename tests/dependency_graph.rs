//! Dependency graph tests
//!
//! Neighbor lookup and connected-subgraph extraction over `dependsOn`

use std::collections::HashSet;

use fluxgraph::graph::{
    DependencyEdge, NodeSnapshot, dependency_edges, get_connected_subgraph, get_neighbors,
};
use fluxgraph::models::{ObjectRef, RawPayload, ResourceNode};
use serde_json::{Value, json};

fn automation(kind: &str, namespace: &str, name: &str, depends_on: Value) -> ResourceNode {
    ResourceNode::parse(&RawPayload::from_document(
        &json!({
            "kind": kind,
            "metadata": {"name": name, "namespace": namespace},
            "spec": {"dependsOn": depends_on},
            "status": {"conditions": [{"type": "Ready", "status": "True"}]}
        }),
        "Default",
    ))
}

fn ks(name: &str, deps: &[&str]) -> ResourceNode {
    let depends_on: Vec<Value> = deps.iter().map(|d| json!({"name": d})).collect();
    automation("Kustomization", "flux-system", name, Value::Array(depends_on))
}

fn fixture() -> NodeSnapshot {
    NodeSnapshot::new(vec![
        ks("kustomization1", &[]),
        ks("kustomizationa", &["kustomization1"]),
        ks("kustomizationb", &["kustomizationa"]),
        ks("kustomizationc", &["kustomizationa"]),
        ks("kustomizatione", &["kustomizationb"]),
        ks("kustomizationz", &[]),
    ])
}

fn focal(name: &str) -> ObjectRef {
    ObjectRef::new("flux-system", name)
}

fn names(snapshot: &NodeSnapshot, name: &str) -> HashSet<String> {
    get_connected_subgraph(snapshot, &focal(name))
        .iter()
        .map(|n| n.node.name().to_string())
        .collect()
}

#[test]
fn test_connected_subgraph_of_fixture() {
    let snapshot = fixture();
    let expected: HashSet<String> = [
        "kustomizationc",
        "kustomizationa",
        "kustomizationb",
        "kustomizatione",
        "kustomization1",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    assert_eq!(names(&snapshot, "kustomizationc"), expected);
    // Every member of the component sees the same component
    assert_eq!(names(&snapshot, "kustomization1"), expected);
    assert_eq!(names(&snapshot, "kustomizatione"), expected);
}

#[test]
fn test_discovery_order_and_focal_flag() {
    let snapshot = fixture();
    let subgraph = get_connected_subgraph(&snapshot, &focal("kustomizationc"));

    let order: Vec<&str> = subgraph.iter().map(|n| n.node.name()).collect();
    assert_eq!(
        order,
        vec![
            "kustomizationc",
            "kustomizationa",
            "kustomization1",
            "kustomizationb",
            "kustomizatione"
        ]
    );

    let current: Vec<&str> = subgraph
        .iter()
        .filter(|n| n.is_current)
        .map(|n| n.node.name())
        .collect();
    assert_eq!(current, vec!["kustomizationc"]);
}

#[test]
fn test_isolated_or_missing_focal_is_empty() {
    let snapshot = fixture();
    assert!(get_connected_subgraph(&snapshot, &focal("kustomizationz")).is_empty());
    assert!(get_connected_subgraph(&snapshot, &focal("does-not-exist")).is_empty());
    assert!(get_connected_subgraph(&NodeSnapshot::default(), &focal("kustomizationa")).is_empty());
}

#[test]
fn test_dangling_dependency_does_not_count_as_neighbor() {
    let snapshot = NodeSnapshot::new(vec![ks("lonely", &["ghost"])]);
    let lonely = snapshot.get(&focal("lonely")).unwrap();
    assert!(get_neighbors(&snapshot, lonely).is_empty());
    assert!(get_connected_subgraph(&snapshot, &focal("lonely")).is_empty());
}

#[test]
fn test_cycles_visit_each_node_once() {
    let snapshot = NodeSnapshot::new(vec![
        ks("a", &["b"]),
        ks("b", &["c"]),
        ks("c", &["a"]),
        ks("self", &["self", "a"]),
    ]);
    let subgraph = get_connected_subgraph(&snapshot, &focal("a"));
    let ids: Vec<String> = subgraph.iter().map(|n| n.node.id()).collect();
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(ids.len(), 4);
    assert_eq!(unique.len(), 4);
}

#[test]
fn test_cross_namespace_and_mixed_kinds() {
    let snapshot = NodeSnapshot::new(vec![
        automation("Kustomization", "flux-system", "infra", json!([])),
        automation(
            "HelmRelease",
            "monitoring",
            "kube-prometheus-stack",
            json!([{"name": "infra", "namespace": "flux-system"}]),
        ),
        // Same name, other namespace: must not be linked
        automation("Kustomization", "monitoring", "infra", json!([])),
        automation(
            "Kustomization",
            "monitoring",
            "dashboards",
            json!([{"name": "kube-prometheus-stack"}]),
        ),
    ]);

    let subgraph = get_connected_subgraph(&snapshot, &ObjectRef::new("flux-system", "infra"));
    let mut ids: Vec<String> = subgraph.iter().map(|n| n.node.id()).collect();
    ids.sort();
    assert_eq!(
        ids,
        vec![
            "flux-system/infra",
            "monitoring/dashboards",
            "monitoring/kube-prometheus-stack"
        ]
    );

    let edges = dependency_edges(&subgraph);
    assert!(edges.contains(&DependencyEdge {
        from: "monitoring/kube-prometheus-stack".to_string(),
        to: "flux-system/infra".to_string(),
    }));
    assert!(edges.contains(&DependencyEdge {
        from: "monitoring/dashboards".to_string(),
        to: "monitoring/kube-prometheus-stack".to_string(),
    }));
    assert_eq!(edges.len(), 2);
}

#[test]
fn test_non_automation_kinds_declare_nothing() {
    let snapshot = NodeSnapshot::new(vec![
        automation("GitRepository", "flux-system", "a", json!([{"name": "b"}])),
        automation("GitRepository", "flux-system", "b", json!([])),
    ]);
    assert!(get_connected_subgraph(&snapshot, &focal("a")).is_empty());
}
