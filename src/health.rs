//! Aggregated health
//!
//! Folds the health of already-resolved objects into the four counters shown
//! on rollup summaries.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::ResourceNode;
use crate::status::Readiness;

/// Health of a single object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Progressing,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Unhealthy => "Unhealthy",
            HealthStatus::Progressing => "Progressing",
            HealthStatus::Unknown => "Unknown",
        };
        write!(f, "{}", label)
    }
}

/// Health reported by the backend's health checkers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(default)]
    pub status: HealthStatus,
    #[serde(default)]
    pub message: String,
}

/// Bucketed health counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthBucket {
    pub healthy: usize,
    pub unhealthy: usize,
    pub progressing: usize,
    #[serde(rename = "NA")]
    pub na: usize,
}

impl HealthBucket {
    pub fn total(&self) -> usize {
        self.healthy + self.unhealthy + self.progressing + self.na
    }

    fn record(&mut self, status: HealthStatus) {
        match status {
            HealthStatus::Healthy => self.healthy += 1,
            HealthStatus::Unhealthy => self.unhealthy += 1,
            HealthStatus::Progressing => self.progressing += 1,
            HealthStatus::Unknown => self.na += 1,
        }
    }
}

/// Health signal of one node
///
/// Backend-provided health wins; otherwise it follows readiness, and an
/// object without any condition is not applicable rather than unhealthy.
pub fn health_status(node: &ResourceNode) -> HealthStatus {
    if let Some(check) = node.health() {
        return check.status;
    }
    if node.conditions().is_empty() {
        return HealthStatus::Unknown;
    }
    match node.readiness() {
        Readiness::Ready => HealthStatus::Healthy,
        Readiness::Reconciling => HealthStatus::Progressing,
        Readiness::NotReady => HealthStatus::Unhealthy,
    }
}

/// Count nodes per health bucket; each node lands in exactly one bucket
pub fn aggregate<'a, I>(nodes: I) -> HealthBucket
where
    I: IntoIterator<Item = &'a ResourceNode>,
{
    nodes
        .into_iter()
        .fold(HealthBucket::default(), |mut bucket, node| {
            bucket.record(health_status(node));
            bucket
        })
}
