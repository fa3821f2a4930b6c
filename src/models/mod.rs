//! Resource model layer
//!
//! Canonical representation of the Kubernetes and Flux objects handed to the
//! engine by the backend API, plus the per-kind accessor layer built on top.
//!
//! Structure:
//! - `resource.rs` - raw payloads, `ResourceNode` and conditions
//! - `interval.rs` - compact duration parsing (`1h30m`)
//! - `view.rs` - lazily computed kind-specific accessors
//! - `snapshot.rs` - decoding of snapshot files into payloads
//! - `flux_resource_kind.rs` - known Flux kinds

mod flux_resource_kind;
mod interval;
mod resource;
mod snapshot;
mod view;

use std::fmt;
use std::str::FromStr;

pub use flux_resource_kind::FluxResourceKind;
pub use interval::Interval;
pub use kube::core::GroupVersionKind;
pub use resource::{Condition, METADATA_ANNOTATION_PREFIX, RawPayload, ResourceNode};
pub use snapshot::{load_snapshot, parse_snapshot};
pub use view::{DependencyRef, KindView, SourceRef};

/// Build the id used as a map key for a resource.
///
/// `namespace/name`, or just `name` for cluster-scoped objects.
pub fn object_id(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", namespace, name)
    }
}

/// A `(namespace, name)` reference to a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ObjectRef {
    pub name: String,
    pub namespace: String,
}

impl ObjectRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    pub fn id(&self) -> String {
        object_id(&self.namespace, &self.name)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for ObjectRef {
    type Err = String;

    /// Accepts `namespace/name` or a bare `name`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('/') {
            Some((namespace, name)) if !name.is_empty() && !name.contains('/') => {
                Ok(ObjectRef::new(namespace, name))
            }
            None if !s.is_empty() => Ok(ObjectRef::new("", s)),
            _ => Err(format!("Invalid object reference: {}", s)),
        }
    }
}

/// The automation object an ownership tree is resolved for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationRef {
    pub name: String,
    pub namespace: String,
    pub kind: FluxResourceKind,
    pub cluster: String,
}

impl AutomationRef {
    pub fn new(
        kind: FluxResourceKind,
        namespace: impl Into<String>,
        name: impl Into<String>,
        cluster: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            kind,
            cluster: cluster.into(),
        }
    }

    pub fn id(&self) -> String {
        object_id(&self.namespace, &self.name)
    }
}
