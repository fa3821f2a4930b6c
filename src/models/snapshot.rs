//! Snapshot file decoding
//!
//! A snapshot is what the dashboard would have fetched: either a list of
//! backend payloads (`{payload, clusterName, ...}`) or plain Kubernetes
//! documents, as a YAML/JSON sequence or a `kind: List` with `items`.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

use super::{RawPayload, ResourceNode};

/// Decode snapshot contents into resource nodes
///
/// Documents without a cluster name of their own are tagged with
/// `default_cluster`.
pub fn parse_snapshot(
    contents: &str,
    default_cluster: &str,
    annotation_prefix: &str,
) -> Result<Vec<ResourceNode>> {
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value =
        serde_yaml::from_str(contents).context("Snapshot is neither valid YAML nor JSON")?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => items,
            Some(_) => anyhow::bail!("Snapshot 'items' field must be a list"),
            None => vec![Value::Object(map)],
        },
        Value::Null => Vec::new(),
        _ => anyhow::bail!("Snapshot must be a list of objects"),
    };

    let nodes = items
        .into_iter()
        .map(|item| to_payload(item, default_cluster))
        .collect::<Result<Vec<_>>>()?
        .iter()
        .map(|payload| ResourceNode::parse_with_prefix(payload, annotation_prefix))
        .collect();

    Ok(nodes)
}

/// Read and decode a snapshot file
pub fn load_snapshot(
    path: &Path,
    default_cluster: &str,
    annotation_prefix: &str,
) -> Result<Vec<ResourceNode>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
    parse_snapshot(&contents, default_cluster, annotation_prefix)
        .with_context(|| format!("Failed to parse snapshot file: {}", path.display()))
}

fn to_payload(item: Value, default_cluster: &str) -> Result<RawPayload> {
    if item.get("payload").is_some_and(|p| p.is_string()) {
        let mut payload: RawPayload =
            serde_json::from_value(item).context("Invalid payload entry in snapshot")?;
        if payload.cluster_name.is_empty() {
            payload.cluster_name = default_cluster.to_string();
        }
        return Ok(payload);
    }

    Ok(RawPayload::from_document(&item, default_cluster))
}
