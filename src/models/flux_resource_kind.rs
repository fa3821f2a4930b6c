//! Flux resource kinds
//!
//! Centralized enum for the Flux kinds the engine knows how to interpret.
//! Anything outside this list is handled through the generic accessor path.

use std::fmt;
use std::str::FromStr;

use kube::core::GroupVersionKind;

/// Enumeration of the Flux CRD kinds with dedicated handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FluxResourceKind {
    // Source Controller resources
    GitRepository,
    OCIRepository,
    HelmRepository,
    Bucket,
    HelmChart,
    // Kustomize Controller resources
    Kustomization,
    // Helm Controller resources
    HelmRelease,
    // Image Reflector Controller resources
    ImageRepository,
    ImagePolicy,
    // Image Automation Controller resources
    ImageUpdateAutomation,
    // Notification Controller resources
    Alert,
    Provider,
}

impl FluxResourceKind {
    pub const ALL: [FluxResourceKind; 12] = [
        FluxResourceKind::GitRepository,
        FluxResourceKind::OCIRepository,
        FluxResourceKind::HelmRepository,
        FluxResourceKind::Bucket,
        FluxResourceKind::HelmChart,
        FluxResourceKind::Kustomization,
        FluxResourceKind::HelmRelease,
        FluxResourceKind::ImageRepository,
        FluxResourceKind::ImagePolicy,
        FluxResourceKind::ImageUpdateAutomation,
        FluxResourceKind::Alert,
        FluxResourceKind::Provider,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FluxResourceKind::GitRepository => "GitRepository",
            FluxResourceKind::OCIRepository => "OCIRepository",
            FluxResourceKind::HelmRepository => "HelmRepository",
            FluxResourceKind::Bucket => "Bucket",
            FluxResourceKind::HelmChart => "HelmChart",
            FluxResourceKind::Kustomization => "Kustomization",
            FluxResourceKind::HelmRelease => "HelmRelease",
            FluxResourceKind::ImageRepository => "ImageRepository",
            FluxResourceKind::ImagePolicy => "ImagePolicy",
            FluxResourceKind::ImageUpdateAutomation => "ImageUpdateAutomation",
            FluxResourceKind::Alert => "Alert",
            FluxResourceKind::Provider => "Provider",
        }
    }

    /// Try to parse a string into a FluxResourceKind, returning None if invalid
    pub fn parse_optional(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    /// API group served by the owning controller
    pub fn api_group(&self) -> &'static str {
        match self {
            FluxResourceKind::GitRepository
            | FluxResourceKind::OCIRepository
            | FluxResourceKind::HelmRepository
            | FluxResourceKind::Bucket
            | FluxResourceKind::HelmChart => "source.toolkit.fluxcd.io",
            FluxResourceKind::Kustomization => "kustomize.toolkit.fluxcd.io",
            FluxResourceKind::HelmRelease => "helm.toolkit.fluxcd.io",
            FluxResourceKind::ImageRepository
            | FluxResourceKind::ImagePolicy
            | FluxResourceKind::ImageUpdateAutomation => "image.toolkit.fluxcd.io",
            FluxResourceKind::Alert | FluxResourceKind::Provider => {
                "notification.toolkit.fluxcd.io"
            }
        }
    }

    /// Preferred served version, used when no discovery information is available
    pub fn api_version(&self) -> &'static str {
        match self {
            FluxResourceKind::HelmRelease => "v2",
            FluxResourceKind::Alert | FluxResourceKind::Provider => "v1beta3",
            _ => "v1",
        }
    }

    pub fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::gvk(self.api_group(), self.api_version(), self.as_str())
    }

    /// Automation objects reconcile other objects onto the cluster and may
    /// declare `spec.dependsOn`.
    pub fn is_automation(&self) -> bool {
        matches!(
            self,
            FluxResourceKind::Kustomization | FluxResourceKind::HelmRelease
        )
    }

    /// Source objects produce artifacts consumed by automation objects.
    pub fn is_source(&self) -> bool {
        matches!(
            self,
            FluxResourceKind::GitRepository
                | FluxResourceKind::OCIRepository
                | FluxResourceKind::HelmRepository
                | FluxResourceKind::Bucket
                | FluxResourceKind::HelmChart
        )
    }

    /// Parse a kind name ignoring case, accepting plurals and the short
    /// aliases the flux CLI uses (`ks`, `hr`, `gitrepo`, ...)
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        let alias = match lower.as_str() {
            "ks" => Some(FluxResourceKind::Kustomization),
            "hr" => Some(FluxResourceKind::HelmRelease),
            "gitrepo" => Some(FluxResourceKind::GitRepository),
            "helmrepo" => Some(FluxResourceKind::HelmRepository),
            "oci" | "ocirepo" => Some(FluxResourceKind::OCIRepository),
            _ => None,
        };
        alias.or_else(|| {
            Self::ALL.into_iter().find(|kind| {
                let name = kind.as_str().to_lowercase();
                let plural = match name.strip_suffix('y') {
                    Some(stem) => format!("{}ies", stem),
                    None => format!("{}s", name),
                };
                lower == name || lower == plural
            })
        })
    }
}

impl fmt::Display for FluxResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<FluxResourceKind> for String {
    fn from(kind: FluxResourceKind) -> Self {
        kind.as_str().to_string()
    }
}

impl FromStr for FluxResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown Flux resource kind: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(
            FluxResourceKind::parse_optional("HelmRelease"),
            Some(FluxResourceKind::HelmRelease)
        );
        assert_eq!(FluxResourceKind::parse_optional("Deployment"), None);
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!(
            FluxResourceKind::from_str_case_insensitive("ks"),
            Some(FluxResourceKind::Kustomization)
        );
        assert_eq!(
            FluxResourceKind::from_str_case_insensitive("HR"),
            Some(FluxResourceKind::HelmRelease)
        );
        assert_eq!(
            FluxResourceKind::from_str_case_insensitive("ImagePolicies"),
            Some(FluxResourceKind::ImagePolicy)
        );
        assert_eq!(
            FluxResourceKind::from_str_case_insensitive("kustomization"),
            Some(FluxResourceKind::Kustomization)
        );
        assert_eq!(FluxResourceKind::from_str_case_insensitive("pod"), None);
    }

    #[test]
    fn test_automation_and_source_classes() {
        assert!(FluxResourceKind::Kustomization.is_automation());
        assert!(FluxResourceKind::HelmRelease.is_automation());
        assert!(!FluxResourceKind::GitRepository.is_automation());
        assert!(FluxResourceKind::HelmChart.is_source());
        assert!(!FluxResourceKind::Alert.is_source());
    }

    #[test]
    fn test_gvk() {
        let gvk = FluxResourceKind::Kustomization.gvk();
        assert_eq!(gvk.group, "kustomize.toolkit.fluxcd.io");
        assert_eq!(gvk.version, "v1");
        assert_eq!(gvk.kind, "Kustomization");
        assert_eq!(
            FluxResourceKind::HelmRelease.gvk().api_version(),
            "helm.toolkit.fluxcd.io/v2"
        );
    }
}
