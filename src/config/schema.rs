//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.

use serde::{Deserialize, Serialize};

use crate::models::METADATA_ANNOTATION_PREFIX;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Namespace used for references given without one
    #[serde(default = "default_namespace")]
    pub default_namespace: String,

    /// Cluster tag attached to objects read from snapshots or the live cluster
    #[serde(default = "default_cluster_name")]
    pub cluster_name: String,

    /// Annotation prefix whose entries become node metadata
    #[serde(default = "default_annotation_prefix")]
    pub annotation_prefix: String,

    #[serde(default)]
    pub graph: GraphConfig,

    #[serde(default)]
    pub logger: LoggerConfig,
}

/// Dependency graph output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
    /// Print subgraph ids sorted instead of in discovery order
    #[serde(default = "default_true")]
    pub sort_ids: bool,
}

/// Logger configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoggerConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_namespace() -> String {
    "flux-system".to_string()
}

fn default_cluster_name() -> String {
    "Default".to_string()
}

fn default_annotation_prefix() -> String {
    METADATA_ANNOTATION_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_namespace: default_namespace(),
            cluster_name: default_cluster_name(),
            annotation_prefix: default_annotation_prefix(),
            graph: GraphConfig::default(),
            logger: LoggerConfig::default(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            sort_ids: default_true(),
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
