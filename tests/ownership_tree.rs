//! Ownership tree tests
//!
//! Recursive resolution of reconciled objects through an `ObjectSource`,
//! using an in-memory cluster and mocked sources

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use fluxgraph::error::{RequestError, ShapeError};
use fluxgraph::graph::{
    KindTree, ObjectSource, default_ownership_table, flatten, flatten_with_depth, resolve_tree,
};
use fluxgraph::models::{AutomationRef, FluxResourceKind, GroupVersionKind, RawPayload};
use mockall::mock;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

mock! {
    pub Source {}

    #[async_trait]
    impl ObjectSource for Source {
        async fn get_reconciled_objects(
            &self,
            root: &AutomationRef,
            kinds: &[GroupVersionKind],
        ) -> Result<Vec<RawPayload>, RequestError>;

        async fn get_child_objects(
            &self,
            parent_id: &str,
            namespace: &str,
            kind: &GroupVersionKind,
            cluster: &str,
        ) -> Result<Vec<RawPayload>, RequestError>;
    }
}

fn object(kind: &str, name: &str, uid: &str, owner: Option<&str>) -> Value {
    let owner_references: Vec<Value> = owner
        .map(|o| json!({"apiVersion": "apps/v1", "kind": "Owner", "name": "owner", "uid": o}))
        .into_iter()
        .collect();
    json!({
        "kind": kind,
        "metadata": {
            "name": name,
            "namespace": "apps",
            "uid": uid,
            "ownerReferences": owner_references
        }
    })
}

/// In-memory cluster: a fixed inventory plus objects found by owner uid
struct FakeCluster {
    inventory: Vec<Value>,
    objects: Vec<Value>,
    failing_kinds: Vec<&'static str>,
    cancel_on_child_fetch: Option<CancellationToken>,
    /// Per-parent-uid latency applied to child fetches
    delays: Vec<(&'static str, Duration)>,
    child_calls: Mutex<Vec<String>>,
    completed_calls: Mutex<Vec<String>>,
}

impl FakeCluster {
    fn new(inventory: Vec<Value>, objects: Vec<Value>) -> Self {
        Self {
            inventory,
            objects,
            failing_kinds: Vec::new(),
            cancel_on_child_fetch: None,
            delays: Vec::new(),
            child_calls: Mutex::new(Vec::new()),
            completed_calls: Mutex::new(Vec::new()),
        }
    }

    fn child_calls(&self) -> Vec<String> {
        self.child_calls.lock().unwrap().clone()
    }

    fn completed_calls(&self) -> Vec<String> {
        self.completed_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectSource for FakeCluster {
    async fn get_reconciled_objects(
        &self,
        root: &AutomationRef,
        kinds: &[GroupVersionKind],
    ) -> Result<Vec<RawPayload>, RequestError> {
        Ok(self
            .inventory
            .iter()
            .filter(|doc| kinds.iter().any(|k| doc["kind"] == k.kind.as_str()))
            .map(|doc| RawPayload::from_document(doc, root.cluster.clone()))
            .collect())
    }

    async fn get_child_objects(
        &self,
        parent_id: &str,
        namespace: &str,
        kind: &GroupVersionKind,
        cluster: &str,
    ) -> Result<Vec<RawPayload>, RequestError> {
        let call = format!("{}<-{}", kind.kind, parent_id);
        self.child_calls.lock().unwrap().push(call.clone());

        if let Some((_, delay)) = self.delays.iter().find(|(uid, _)| *uid == parent_id) {
            tokio::time::sleep(*delay).await;
        }
        self.completed_calls.lock().unwrap().push(call);

        if let Some(token) = &self.cancel_on_child_fetch {
            token.cancel();
        }
        if self.failing_kinds.contains(&kind.kind.as_str()) {
            return Err(RequestError::new("the server is currently unable to handle the request", Some(503)));
        }

        Ok(self
            .objects
            .iter()
            .filter(|doc| doc["kind"] == kind.kind.as_str())
            .filter(|doc| doc["metadata"]["namespace"] == namespace)
            .filter(|doc| {
                doc["metadata"]["ownerReferences"]
                    .as_array()
                    .is_some_and(|refs| refs.iter().any(|r| r["uid"] == parent_id))
            })
            .map(|doc| RawPayload::from_document(doc, cluster))
            .collect())
    }
}

fn root() -> AutomationRef {
    AutomationRef::new(FluxResourceKind::Kustomization, "flux-system", "apps", "Default")
}

fn deployment_cluster() -> FakeCluster {
    FakeCluster::new(
        vec![
            object("Deployment", "podinfo", "d-1", None),
            object("Service", "podinfo", "s-1", None),
        ],
        vec![
            object("ReplicaSet", "podinfo-5d8f", "rs-1", Some("d-1")),
            object("Pod", "podinfo-5d8f-abcde", "p-1", Some("rs-1")),
            object("Pod", "unrelated", "p-2", Some("rs-other")),
        ],
    )
}

#[tokio::test]
async fn test_deployment_chain_resolves_to_depth_three() {
    let cluster = deployment_cluster();
    let cancel = CancellationToken::new();

    let forest = resolve_tree(&cluster, &root(), &default_ownership_table(), &cancel)
        .await
        .unwrap();

    assert_eq!(forest.len(), 2);
    let flat: Vec<(usize, &str)> = flatten_with_depth(&forest)
        .unwrap()
        .into_iter()
        .map(|(depth, node)| (depth, node.name()))
        .collect();
    assert_eq!(
        flat,
        vec![
            (0, "podinfo"),
            (1, "podinfo-5d8f"),
            (2, "podinfo-5d8f-abcde"),
            (0, "podinfo"),
        ]
    );

    // Leaves still carry an (empty) children list
    let service = &forest[1];
    assert_eq!(service.kind(), Some("Service"));
    assert_eq!(service.children().map(|c| c.len()), Some(0));

    assert_eq!(cluster.child_calls(), vec!["ReplicaSet<-d-1", "Pod<-rs-1"]);
    assert!(forest.iter().all(|n| n.cluster_tag() == "Default"));
}

#[tokio::test]
async fn test_flatten_preorder_emits_each_node_once() {
    let cluster = deployment_cluster();
    let forest = resolve_tree(
        &cluster,
        &root(),
        &default_ownership_table(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let flat = flatten(&forest[..1]).unwrap();
    let kinds: Vec<_> = flat.iter().map(|n| n.kind().unwrap_or("")).collect();
    assert_eq!(kinds, vec!["Deployment", "ReplicaSet", "Pod"]);
}

#[tokio::test]
async fn test_child_fetch_failure_leaves_empty_branch() {
    let mut cluster = deployment_cluster();
    cluster.failing_kinds = vec!["ReplicaSet"];

    let forest = resolve_tree(
        &cluster,
        &root(),
        &default_ownership_table(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(forest[0].children(), Some(&[][..]));
    assert_eq!(flatten(&forest).unwrap().len(), 2);
}

#[tokio::test]
async fn test_child_kinds_follow_table_order() {
    let cluster = FakeCluster::new(
        vec![object("CronJob", "backup", "cj-1", None)],
        vec![
            object("Job", "backup-28519200", "j-1", Some("cj-1")),
            object("Job", "backup-28519260", "j-2", Some("cj-1")),
            object("Pod", "backup-28519260-x7k2p", "p-1", Some("j-2")),
        ],
    );

    let table = vec![
        KindTree::leaf("batch", "v1", "CronJob").with_children(vec![
            KindTree::leaf("batch", "v1", "Job")
                .with_children(vec![KindTree::leaf("", "v1", "Pod")]),
            KindTree::leaf("", "v1", "Event"),
        ]),
    ];

    let forest = resolve_tree(&cluster, &root(), &table, &CancellationToken::new())
        .await
        .unwrap();

    let names: Vec<&str> = flatten(&forest).unwrap().iter().map(|n| n.name()).collect();
    assert_eq!(
        names,
        vec!["backup", "backup-28519200", "backup-28519260", "backup-28519260-x7k2p"]
    );

    let calls = cluster.child_calls();
    assert_eq!(calls[0], "Job<-cj-1");
    // Pods of both jobs are fetched before the CronJob's second child kind
    assert_eq!(calls.last().map(String::as_str), Some("Event<-cj-1"));
    assert_eq!(calls.len(), 4);
}

#[tokio::test]
async fn test_cancellation_stops_further_child_requests() {
    let cancel = CancellationToken::new();
    let mut cluster = deployment_cluster();
    cluster.cancel_on_child_fetch = Some(cancel.clone());

    let forest = resolve_tree(&cluster, &root(), &default_ownership_table(), &cancel)
        .await
        .unwrap();

    assert_eq!(cluster.child_calls(), vec!["ReplicaSet<-d-1"]);
    let replica_set = &forest[0].children().unwrap()[0];
    assert_eq!(replica_set.children(), Some(&[][..]));
}

#[tokio::test]
async fn test_sibling_order_independent_of_completion_order() {
    let mut cluster = FakeCluster::new(
        vec![
            object("Deployment", "frontend", "d-1", None),
            object("Deployment", "backend", "d-2", None),
        ],
        vec![
            object("ReplicaSet", "frontend-6c9f", "rs-1", Some("d-1")),
            object("Pod", "frontend-6c9f-aaaaa", "p-1", Some("rs-1")),
            object("ReplicaSet", "backend-77b4", "rs-2", Some("d-2")),
            object("Pod", "backend-77b4-bbbbb", "p-2", Some("rs-2")),
        ],
    );
    cluster.delays = vec![
        ("d-1", Duration::from_millis(80)),
        ("rs-1", Duration::from_millis(40)),
    ];

    let forest = resolve_tree(
        &cluster,
        &root(),
        &default_ownership_table(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    // The slow frontend branch finishes last but keeps its position
    assert_eq!(
        cluster.completed_calls(),
        vec!["ReplicaSet<-d-2", "Pod<-rs-2", "ReplicaSet<-d-1", "Pod<-rs-1"]
    );

    let names: Vec<&str> = flatten(&forest).unwrap().iter().map(|n| n.name()).collect();
    assert_eq!(
        names,
        vec![
            "frontend",
            "frontend-6c9f",
            "frontend-6c9f-aaaaa",
            "backend",
            "backend-77b4",
            "backend-77b4-bbbbb",
        ]
    );
}

#[tokio::test]
async fn test_cancelled_before_root_fetch() {
    let mut source = MockSource::new();
    source.expect_get_reconciled_objects().times(0);
    source.expect_get_child_objects().times(0);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = resolve_tree(&source, &root(), &default_ownership_table(), &cancel).await;
    assert_eq!(result, Err(RequestError::Cancelled));
}

#[tokio::test]
async fn test_root_fetch_failure_is_surfaced() {
    let mut source = MockSource::new();
    source
        .expect_get_reconciled_objects()
        .times(1)
        .returning(|_, _| {
            Err(RequestError::new(
                "kustomizations.kustomize.toolkit.fluxcd.io \"apps\" not found",
                Some(404),
            ))
        });
    source.expect_get_child_objects().times(0);

    let err = resolve_tree(
        &source,
        &root(),
        &default_ownership_table(),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), Some(404));
}

#[tokio::test]
async fn test_root_fetch_receives_table_kinds() {
    let table = default_ownership_table();
    let expected: Vec<String> = table.iter().map(|k| k.gvk.kind.clone()).collect();

    let mut source = MockSource::new();
    source
        .expect_get_reconciled_objects()
        .withf(move |root, kinds| {
            root.name == "apps"
                && kinds.iter().map(|k| k.kind.clone()).collect::<Vec<_>>() == expected
        })
        .times(1)
        .returning(|_, _| {
            Ok(vec![
                RawPayload::from_document(&object("ConfigMap", "settings", "cm-1", None), "Default"),
                RawPayload::from_document(&object("Widget", "custom", "w-1", None), "Default"),
                RawPayload::new("{not json", "Default"),
            ])
        });
    source.expect_get_child_objects().times(0);

    let forest = resolve_tree(&source, &root(), &table, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(forest.len(), 3);
    assert!(forest.iter().all(|n| n.children() == Some(&[][..])));
}

#[tokio::test]
async fn test_flatten_rejects_unresolved_input() {
    let node = fluxgraph::models::ResourceNode::parse(&RawPayload::from_document(
        &object("Deployment", "podinfo", "d-1", None),
        "Default",
    ));
    assert_eq!(
        flatten(std::slice::from_ref(&node)),
        Err(ShapeError::MissingChildren {
            id: "apps/podinfo".to_string()
        })
    );
}
