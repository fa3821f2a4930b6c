//! Kind-specific accessors
//!
//! A small, explicit accessor layer over `ResourceNode::raw_document`. Each
//! known kind gets a variant exposing the fields the dashboard needs; every
//! other kind falls back to `KindView::Generic`. Nothing here is cached, the
//! view is recomputed from the document on each call.

use serde_json::Value;

use super::{FluxResourceKind, ObjectRef, ResourceNode};

/// Reference from an automation or chart to its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
}

/// One entry of `spec.dependsOn`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRef {
    pub name: String,
    pub namespace: Option<String>,
}

impl DependencyRef {
    /// Resolve against the declaring object's namespace
    pub fn resolve(&self, owner_namespace: &str) -> ObjectRef {
        ObjectRef::new(
            self.namespace.as_deref().unwrap_or(owner_namespace),
            &self.name,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindView {
    /// GitRepository, OCIRepository, HelmRepository, Bucket
    Source { url: Option<String> },
    HelmChart {
        chart: Option<String>,
        version: Option<String>,
        source_ref: Option<SourceRef>,
    },
    Kustomization {
        path: Option<String>,
        source_ref: Option<SourceRef>,
        depends_on: Vec<DependencyRef>,
    },
    HelmRelease {
        chart: Option<String>,
        version: Option<String>,
        source_ref: Option<SourceRef>,
        depends_on: Vec<DependencyRef>,
    },
    /// ImageRepository, ImagePolicy, ImageUpdateAutomation
    ImageAutomation {
        image: Option<String>,
        source_ref: Option<SourceRef>,
    },
    Generic,
}

fn str_at(value: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn parse_source_ref(value: Option<&Value>) -> Option<SourceRef> {
    let value = value?;
    Some(SourceRef {
        kind: str_at(value, &["kind"]).unwrap_or_default(),
        name: str_at(value, &["name"])?,
        namespace: str_at(value, &["namespace"]),
    })
}

fn parse_depends_on(spec: &Value) -> Vec<DependencyRef> {
    spec.get("dependsOn")
        .and_then(|d| d.as_array())
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    Some(DependencyRef {
                        name: str_at(entry, &["name"])?,
                        namespace: str_at(entry, &["namespace"]).filter(|ns| !ns.is_empty()),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

impl ResourceNode {
    pub fn flux_kind(&self) -> Option<FluxResourceKind> {
        self.kind().and_then(FluxResourceKind::parse_optional)
    }

    pub fn view(&self) -> KindView {
        let null = Value::Null;
        let spec = self.raw_document().get("spec").unwrap_or(&null);

        match self.flux_kind() {
            Some(
                FluxResourceKind::GitRepository
                | FluxResourceKind::OCIRepository
                | FluxResourceKind::HelmRepository
                | FluxResourceKind::Bucket,
            ) => KindView::Source {
                url: str_at(spec, &["url"]).or_else(|| str_at(spec, &["endpoint"])),
            },
            Some(FluxResourceKind::HelmChart) => KindView::HelmChart {
                chart: str_at(spec, &["chart"]),
                version: str_at(spec, &["version"]),
                source_ref: parse_source_ref(spec.get("sourceRef")),
            },
            Some(FluxResourceKind::Kustomization) => KindView::Kustomization {
                path: str_at(spec, &["path"]),
                source_ref: parse_source_ref(spec.get("sourceRef")),
                depends_on: parse_depends_on(spec),
            },
            Some(FluxResourceKind::HelmRelease) => KindView::HelmRelease {
                chart: str_at(spec, &["chart", "spec", "chart"]),
                version: str_at(spec, &["chart", "spec", "version"]),
                source_ref: parse_source_ref(
                    spec.get("chart")
                        .and_then(|c| c.get("spec"))
                        .and_then(|s| s.get("sourceRef"))
                        .or_else(|| spec.get("chartRef")),
                ),
                depends_on: parse_depends_on(spec),
            },
            Some(FluxResourceKind::ImageRepository) => KindView::ImageAutomation {
                image: str_at(spec, &["image"]),
                source_ref: None,
            },
            Some(FluxResourceKind::ImagePolicy) => KindView::ImageAutomation {
                image: str_at(spec, &["imageRepositoryRef", "name"]),
                source_ref: None,
            },
            Some(FluxResourceKind::ImageUpdateAutomation) => KindView::ImageAutomation {
                image: None,
                source_ref: parse_source_ref(spec.get("sourceRef")),
            },
            _ => KindView::Generic,
        }
    }

    /// Declared dependencies; empty for kinds that cannot declare any
    pub fn depends_on(&self) -> Vec<DependencyRef> {
        match self.view() {
            KindView::Kustomization { depends_on, .. }
            | KindView::HelmRelease { depends_on, .. } => depends_on,
            _ => Vec::new(),
        }
    }

    pub fn source_ref(&self) -> Option<SourceRef> {
        match self.view() {
            KindView::HelmChart { source_ref, .. }
            | KindView::Kustomization { source_ref, .. }
            | KindView::HelmRelease { source_ref, .. }
            | KindView::ImageAutomation { source_ref, .. } => source_ref,
            _ => None,
        }
    }

    /// Source URL for source kinds
    pub fn url(&self) -> Option<String> {
        match self.view() {
            KindView::Source { url } => url,
            _ => None,
        }
    }
}
