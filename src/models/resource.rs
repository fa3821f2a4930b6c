//! Canonical resource node
//!
//! Turns the loosely-typed documents returned by the backend into a
//! `ResourceNode`. Parsing never fails: a malformed document degrades to an
//! empty mapping and every accessor falls back to an empty value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Interval, ObjectRef, object_id};
use crate::health::HealthCheck;
use crate::status::{self, Readiness};

/// Annotations carrying dashboard metadata share this prefix
pub const METADATA_ANNOTATION_PREFIX: &str = "metadata.weave.works/";

/// A single object as delivered by the backend API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPayload {
    /// Serialized Kubernetes document
    #[serde(default)]
    pub payload: String,
    /// Cluster the object was read from
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    /// Health pre-computed by the backend, when it has a checker for the kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthCheck>,
}

impl RawPayload {
    pub fn new(payload: impl Into<String>, cluster_name: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            cluster_name: cluster_name.into(),
            ..Default::default()
        }
    }

    /// Wrap an already-decoded document
    pub fn from_document(document: &Value, cluster_name: impl Into<String>) -> Self {
        Self::new(document.to_string(), cluster_name)
    }
}

/// A status condition, mapped 1:1 from `status.conditions`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    pub reason: String,
    pub message: String,
    pub timestamp: String,
}

impl Condition {
    pub fn new(
        type_: impl Into<String>,
        status: impl Into<String>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status: status.into(),
            reason: reason.into(),
            message: message.into(),
            timestamp: String::new(),
        }
    }

    /// Read a condition from its JSON form, tolerating missing fields
    pub fn from_value(value: &Value) -> Self {
        let field = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };

        Self {
            type_: field("type"),
            status: field("status"),
            reason: field("reason"),
            message: field("message"),
            timestamp: field("lastTransitionTime"),
        }
    }

    pub fn last_transition(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Canonical in-memory representation of one Kubernetes or Flux object
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    raw_document: Value,
    cluster_tag: String,
    name: String,
    namespace: String,
    kind: Option<String>,
    uid: Option<String>,
    suspended: bool,
    conditions: Vec<Condition>,
    interval: Interval,
    metadata_annotations: Vec<(String, String)>,
    health: Option<HealthCheck>,
    children: Option<Vec<ResourceNode>>,
}

impl ResourceNode {
    /// Parse a backend payload using the default metadata annotation prefix
    pub fn parse(payload: &RawPayload) -> Self {
        Self::parse_with_prefix(payload, METADATA_ANNOTATION_PREFIX)
    }

    pub fn parse_with_prefix(payload: &RawPayload, annotation_prefix: &str) -> Self {
        let document = match serde_json::from_str::<Value>(&payload.payload) {
            Ok(value) if value.is_object() => value,
            Ok(_) => {
                tracing::debug!("Payload from {} is not a mapping", payload.cluster_name);
                Value::Object(Map::new())
            }
            Err(e) => {
                tracing::debug!(
                    "Failed to parse payload from {}: {}",
                    payload.cluster_name,
                    e
                );
                Value::Object(Map::new())
            }
        };

        let mut node =
            Self::from_value_with_prefix(document, &payload.cluster_name, annotation_prefix);
        if payload.uid.is_some() {
            node.uid = payload.uid.clone();
        }
        node.health = payload.health.clone();
        node
    }

    /// Build a node from an already-decoded document
    pub fn from_value(document: Value, cluster_tag: &str) -> Self {
        Self::from_value_with_prefix(document, cluster_tag, METADATA_ANNOTATION_PREFIX)
    }

    pub fn from_value_with_prefix(
        document: Value,
        cluster_tag: &str,
        annotation_prefix: &str,
    ) -> Self {
        let document = if document.is_object() {
            document
        } else {
            Value::Object(Map::new())
        };

        let metadata = document.get("metadata");
        let meta_str = |key: &str| {
            metadata
                .and_then(|m| m.get(key))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };

        let name = meta_str("name").unwrap_or_default();
        let namespace = meta_str("namespace").unwrap_or_default();
        let uid = meta_str("uid");
        let kind = document
            .get("kind")
            .and_then(|k| k.as_str())
            .filter(|k| !k.is_empty())
            .map(|k| k.to_string());

        let suspended = document
            .get("spec")
            .and_then(|s| s.get("suspend"))
            .and_then(|s| s.as_bool())
            .unwrap_or(false);

        let status = document.get("status");
        let conditions = match status
            .and_then(|s| s.get("conditions"))
            .and_then(|c| c.as_array())
        {
            Some(conditions) => conditions.iter().map(Condition::from_value).collect(),
            None => match (&kind, status) {
                (Some(kind), Some(status)) => status::derive_synthetic_conditions(kind, status),
                _ => Vec::new(),
            },
        };

        let interval = Interval::parse(
            document
                .get("spec")
                .and_then(|s| s.get("interval"))
                .and_then(|i| i.as_str())
                .unwrap_or(""),
        );

        let metadata_annotations = metadata
            .and_then(|m| m.get("annotations"))
            .and_then(|a| a.as_object())
            .map(|annotations| {
                annotations
                    .iter()
                    .filter_map(|(key, value)| {
                        let short_key = key.strip_prefix(annotation_prefix)?;
                        let value = match value {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        Some((short_key.to_string(), value))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            raw_document: document,
            cluster_tag: cluster_tag.to_string(),
            name,
            namespace,
            kind,
            uid,
            suspended,
            conditions,
            interval,
            metadata_annotations,
            health: None,
            children: None,
        }
    }

    pub fn raw_document(&self) -> &Value {
        &self.raw_document
    }

    pub fn cluster_tag(&self) -> &str {
        &self.cluster_tag
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Object id used as map key (`namespace/name`)
    pub fn id(&self) -> String {
        object_id(&self.namespace, &self.name)
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(&self.namespace, &self.name)
    }

    /// Kubernetes uid, preferring the one reported alongside the payload
    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    pub fn api_version(&self) -> Option<&str> {
        self.raw_document.get("apiVersion").and_then(|v| v.as_str())
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    /// Dashboard metadata annotations with the prefix stripped
    pub fn metadata_annotations(&self) -> &[(String, String)] {
        &self.metadata_annotations
    }

    pub fn health(&self) -> Option<&HealthCheck> {
        self.health.as_ref()
    }

    pub fn last_applied_revision(&self) -> Option<&str> {
        self.raw_document
            .get("status")
            .and_then(|s| s.get("lastAppliedRevision"))
            .and_then(|r| r.as_str())
    }

    pub fn readiness(&self) -> Readiness {
        status::compute_readiness(&self.conditions)
    }

    pub fn message(&self) -> String {
        status::compute_message(&self.conditions)
    }

    /// Children attached by the ownership tree builder.
    ///
    /// `None` means the node never went through the builder, which is not the
    /// same as having no children.
    pub fn children(&self) -> Option<&[ResourceNode]> {
        self.children.as_deref()
    }

    pub fn with_children(mut self, children: Vec<ResourceNode>) -> Self {
        self.children = Some(children);
        self
    }

    pub(crate) fn attach_children(&mut self, children: Vec<ResourceNode>) {
        self.children = Some(children);
    }
}
