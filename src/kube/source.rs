//! `ObjectSource` backed by the Kubernetes API

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::ListParams;
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Api, Client};

use serde_json::Value;

use super::helm;
use super::inventory::{InventoryEntry, extract_inventory};
use crate::error::RequestError;
use crate::graph::ObjectSource;
use crate::models::{AutomationRef, FluxResourceKind, RawPayload};

/// Lists reconciled and owned objects through `DynamicObject` APIs
#[derive(Clone)]
pub struct KubeObjectSource {
    client: Client,
}

impl KubeObjectSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, gvk: &GroupVersionKind, namespace: &str) -> Api<DynamicObject> {
        let api_resource = ApiResource::from_gvk(gvk);
        if namespace.is_empty() {
            Api::all_with(self.client.clone(), &api_resource)
        } else {
            Api::namespaced_with(self.client.clone(), namespace, &api_resource)
        }
    }

    async fn fetch_entry(
        &self,
        entry: &InventoryEntry,
        cluster: &str,
    ) -> Result<Option<RawPayload>, RequestError> {
        let api = self.api(&entry.gvk(), &entry.namespace);
        let Some(obj) = api.get_opt(&entry.name).await.map_err(request_error)? else {
            return Ok(None);
        };
        to_payload(&obj, cluster).map(Some)
    }

    /// Objects applied by a HelmRelease, read from its Helm storage Secret
    async fn helm_inventory(
        &self,
        helm_release: &Value,
        root: &AutomationRef,
    ) -> Result<Vec<InventoryEntry>, RequestError> {
        let Some(storage) = helm::storage_secret(helm_release, &root.namespace) else {
            tracing::debug!("HelmRelease {} has no installed release", root.id());
            return Ok(Vec::new());
        };

        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &storage.namespace);
        let secret = secrets
            .get(&storage.secret_name)
            .await
            .map_err(request_error)?;
        let Some(release) = secret.data.as_ref().and_then(|data| data.get("release")) else {
            tracing::warn!(
                "Helm storage Secret {}/{} has no release data",
                storage.namespace,
                storage.secret_name
            );
            return Ok(Vec::new());
        };

        let manifest = helm::decode_release(&release.0)
            .map_err(|e| RequestError::new(format!("{:#}", e), None))?;
        Ok(helm::manifest_inventory(&manifest, &storage.release_namespace))
    }
}

/// Map a client error, keeping the HTTP status when the message carries one
fn request_error(err: kube::Error) -> RequestError {
    let message = err.to_string();
    let code = if message.contains("404") || message.contains("NotFound") {
        Some(404)
    } else if message.contains("403") || message.contains("Forbidden") {
        Some(403)
    } else {
        None
    };
    RequestError::new(message, code)
}

fn to_payload(obj: &DynamicObject, cluster: &str) -> Result<RawPayload, RequestError> {
    let document = serde_json::to_value(obj)
        .map_err(|e| RequestError::new(format!("Failed to serialize object: {}", e), None))?;
    Ok(RawPayload::from_document(&document, cluster))
}

#[async_trait]
impl ObjectSource for KubeObjectSource {
    async fn get_reconciled_objects(
        &self,
        root: &AutomationRef,
        kinds: &[GroupVersionKind],
    ) -> Result<Vec<RawPayload>, RequestError> {
        let api = self.api(&root.kind.gvk(), &root.namespace);
        let automation = api.get(&root.name).await.map_err(request_error)?;
        let document = serde_json::to_value(&automation)
            .map_err(|e| RequestError::new(format!("Failed to serialize object: {}", e), None))?;

        let inventory = match root.kind {
            FluxResourceKind::HelmRelease => {
                self.helm_inventory(&document, root).await?
            }
            _ => extract_inventory(&document),
        };
        let entries: Vec<InventoryEntry> = inventory
            .into_iter()
            .filter(|entry| entry.is_any_of(kinds))
            .collect();
        tracing::debug!(
            "{} inventory has {} entries of requested kinds",
            root.id(),
            entries.len()
        );

        let mut payloads = Vec::with_capacity(entries.len());
        for entry in &entries {
            match self.fetch_entry(entry, &root.cluster).await {
                Ok(Some(payload)) => payloads.push(payload),
                Ok(None) => tracing::debug!("Inventory entry {} no longer exists", entry.id()),
                Err(e) => tracing::warn!("Failed to fetch inventory entry {}: {}", entry.id(), e),
            }
        }
        Ok(payloads)
    }

    async fn get_child_objects(
        &self,
        parent_id: &str,
        namespace: &str,
        kind: &GroupVersionKind,
        cluster: &str,
    ) -> Result<Vec<RawPayload>, RequestError> {
        let api = self.api(kind, namespace);
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(request_error)?;

        list.items
            .iter()
            .filter(|obj| {
                obj.metadata
                    .owner_references
                    .as_ref()
                    .is_some_and(|refs| refs.iter().any(|r| r.uid == parent_id))
            })
            .map(|obj| to_payload(obj, cluster))
            .collect()
    }
}
