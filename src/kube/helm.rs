//! HelmRelease inventory from Helm storage
//!
//! helm-controller does not publish `status.inventory`. The applied objects
//! are read from the release manifest Helm keeps in the
//! `sh.helm.release.v1.<release>.v<version>` Secret of the storage namespace.
//! The Secret's `release` key holds base64 text of a (usually gzipped) JSON
//! release document.

use std::io::Read;

use anyhow::{Context, Result};
use base64::Engine;
use serde_json::Value;

use super::inventory::InventoryEntry;

const GZIP_MAGIC: [u8; 3] = [0x1f, 0x8b, 0x08];

/// Location of the storage Secret for the latest release of a HelmRelease
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelmStorage {
    pub namespace: String,
    pub secret_name: String,
    /// Namespace the chart was installed into, used for namespace-less
    /// manifest objects
    pub release_namespace: String,
}

/// Locate the storage Secret from `status.storageNamespace` and
/// `status.history[0]`
///
/// Returns `None` for releases targeting a remote cluster (`spec.kubeConfig`)
/// and for releases that have not been installed yet.
pub fn storage_secret(helm_release: &Value, namespace: &str) -> Option<HelmStorage> {
    if helm_release
        .get("spec")
        .and_then(|s| s.get("kubeConfig"))
        .is_some()
    {
        tracing::debug!("Skipping HelmRelease targeting a remote cluster");
        return None;
    }

    let status = helm_release.get("status")?;
    let storage_namespace = status.get("storageNamespace").and_then(|s| s.as_str())?;
    let latest = status
        .get("history")
        .and_then(|h| h.as_array())
        .and_then(|h| h.first())?;

    let release_name = latest.get("name").and_then(|n| n.as_str())?;
    let version = latest.get("version").and_then(|v| v.as_i64())?;
    let release_namespace = latest
        .get("namespace")
        .and_then(|n| n.as_str())
        .unwrap_or(namespace);

    Some(HelmStorage {
        namespace: storage_namespace.to_string(),
        secret_name: format!("sh.helm.release.v1.{}.v{}", release_name, version),
        release_namespace: release_namespace.to_string(),
    })
}

/// Decode the `release` value of a storage Secret into the rendered manifest
pub fn decode_release(data: &[u8]) -> Result<String> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(data)
        .context("Failed to decode base64 release data")?;

    let raw = if decoded.starts_with(&GZIP_MAGIC) {
        let mut buf = Vec::new();
        flate2::read::GzDecoder::new(decoded.as_slice())
            .read_to_end(&mut buf)
            .context("Failed to decompress gzip release data")?;
        buf
    } else {
        decoded
    };

    let release: Value = serde_json::from_slice(&raw).context("Failed to parse release JSON")?;
    release
        .get("manifest")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .context("Release JSON missing 'manifest' field")
}

/// Inventory entries for every object in a multi-document manifest
///
/// Documents that fail to parse or lack a kind or name are skipped.
pub fn manifest_inventory(manifest: &str, release_namespace: &str) -> Vec<InventoryEntry> {
    split_documents(manifest)
        .filter_map(|doc| {
            let resource: Value = match serde_yaml::from_str(doc) {
                Ok(resource) => resource,
                Err(e) => {
                    tracing::warn!("Failed to parse manifest document: {}", e);
                    return None;
                }
            };
            manifest_entry(&resource, release_namespace)
        })
        .collect()
}

fn manifest_entry(resource: &Value, release_namespace: &str) -> Option<InventoryEntry> {
    let kind = resource.get("kind").and_then(|k| k.as_str())?;
    let metadata = resource.get("metadata")?;
    let name = metadata.get("name").and_then(|n| n.as_str())?;
    let namespace = metadata
        .get("namespace")
        .and_then(|n| n.as_str())
        .unwrap_or(release_namespace);
    let api_version = resource
        .get("apiVersion")
        .and_then(|v| v.as_str())
        .unwrap_or("v1");
    let (group, version) = api_version.split_once('/').unwrap_or(("", api_version));

    Some(InventoryEntry {
        namespace: namespace.to_string(),
        name: name.to_string(),
        group: group.to_string(),
        version: version.to_string(),
        kind: kind.to_string(),
    })
}

/// Non-empty documents between `---` separator lines
fn split_documents(manifest: &str) -> impl Iterator<Item = &str> {
    let mut docs = Vec::new();
    let mut start = 0;
    let mut offset = 0;
    for line in manifest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            docs.push(&manifest[start..offset]);
            start = offset + line.len();
        }
        offset += line.len();
    }
    docs.push(&manifest[start..]);

    docs.into_iter().filter(|doc| {
        doc.lines()
            .any(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
    })
}
