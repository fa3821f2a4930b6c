//! Inventory parsing for Flux automation objects
//!
//! Kustomizations record every object they applied in
//! `status.inventory.entries[]`, each entry carrying an encoded `id` and the
//! object's API version in `v`.

use kube::core::GroupVersionKind;
use serde_json::Value;

use crate::models::object_id;

/// One object listed in an automation's inventory
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InventoryEntry {
    pub namespace: String,
    pub name: String,
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl InventoryEntry {
    pub fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::gvk(&self.group, &self.version, &self.kind)
    }

    pub fn id(&self) -> String {
        object_id(&self.namespace, &self.name)
    }

    /// Whether this entry is of one of `kinds`, compared by group and kind
    pub fn is_any_of(&self, kinds: &[GroupVersionKind]) -> bool {
        kinds
            .iter()
            .any(|gvk| gvk.group == self.group && gvk.kind == self.kind)
    }
}

/// Extract inventory entries from an automation object
///
/// Entries that cannot be decoded are skipped with a warning.
pub fn extract_inventory(obj: &Value) -> Vec<InventoryEntry> {
    let Some(entries) = obj
        .get("status")
        .and_then(|s| s.get("inventory"))
        .and_then(|i| i.get("entries"))
        .and_then(|e| e.as_array())
    else {
        tracing::debug!("No status.inventory.entries on object");
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let id = entry.get("id").and_then(|i| i.as_str())?;
            let version = entry.get("v").and_then(|v| v.as_str()).unwrap_or("v1");
            let parsed = parse_id_field(id, version);
            if parsed.is_none() {
                tracing::warn!("Failed to parse inventory ID format: {}", id);
            }
            parsed
        })
        .collect()
}

/// Decode an inventory id
///
/// - `<namespace>_<name>_<group>_<Kind>` for kinds with an API group
/// - `<namespace>_<name>__<Kind>` for core kinds
/// - a leading `_` (empty namespace) for cluster-scoped objects
///
/// A double underscore only appears when the group is empty. Names may
/// contain underscores; namespaces and groups may not.
pub fn parse_id_field(id: &str, version: &str) -> Option<InventoryEntry> {
    let (before_kind, kind) = id.rsplit_once('_')?;
    let (before_group, group) = before_kind.rsplit_once('_')?;
    let (namespace, name) = before_group.split_once('_')?;

    if kind.is_empty() || name.is_empty() {
        return None;
    }

    Some(InventoryEntry {
        namespace: namespace.to_string(),
        name: name.to_string(),
        group: group.to_string(),
        version: version.to_string(),
        kind: kind.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_id_field_formats() {
        let svc = parse_id_field("cabot-book_cabot-book-service__Service", "v1").unwrap();
        assert_eq!(svc.namespace, "cabot-book");
        assert_eq!(svc.name, "cabot-book-service");
        assert_eq!(svc.group, "");
        assert_eq!(svc.kind, "Service");

        let deploy = parse_id_field("cabot-book_cabot-book_apps_Deployment", "v1").unwrap();
        assert_eq!(deploy.group, "apps");
        assert_eq!(deploy.gvk().api_version(), "apps/v1");
        assert_eq!(deploy.id(), "cabot-book/cabot-book");

        let ns = parse_id_field("_cabot-book__Namespace", "v1").unwrap();
        assert_eq!(ns.namespace, "");
        assert_eq!(ns.id(), "cabot-book");
    }

    #[test]
    fn test_parse_id_field_name_with_underscore() {
        let entry = parse_id_field("apps_my_app_apps_Deployment", "v1").unwrap();
        assert_eq!(entry.namespace, "apps");
        assert_eq!(entry.name, "my_app");
    }

    #[test]
    fn test_parse_id_field_garbage() {
        assert!(parse_id_field("nounderscores", "v1").is_none());
        assert!(parse_id_field("a_b", "v1").is_none());
        assert!(parse_id_field("ns___Kind", "v1").is_none());
    }

    #[test]
    fn test_extract_inventory() {
        let obj = json!({
            "status": {"inventory": {"entries": [
                {"id": "apps_podinfo_apps_Deployment", "v": "v1"},
                {"id": "broken", "v": "v1"},
                {"id": "apps_podinfo__Service", "v": "v1"},
                {"v": "v1"}
            ]}}
        });
        let entries = extract_inventory(&obj);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_any_of(&[GroupVersionKind::gvk("apps", "v1", "Deployment")]));
        assert!(!entries[1].is_any_of(&[GroupVersionKind::gvk("apps", "v1", "Deployment")]));
        assert!(extract_inventory(&json!({})).is_empty());
    }
}
