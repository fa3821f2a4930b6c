//! Configuration loading and merging logic
//!
//! Precedence, highest first: environment overrides, the configuration file,
//! built-in defaults. Keys missing from the file keep their defaults through
//! the schema's serde defaults.

use std::path::Path;

use anyhow::{Context, Result};

use super::{paths, schema::Config};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// `explicit` replaces the default file location. An explicit file must
    /// exist; the default one is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let config = match explicit {
            Some(path) => Self::load_file(path)?,
            None => {
                let path = paths::root_config_path();
                if path.exists() {
                    Self::load_file(&path)?
                } else {
                    tracing::debug!("No config file at {}, using defaults", path.display());
                    Config::default()
                }
            }
        };

        Ok(Self::apply_env_overrides(config, |key| std::env::var(key).ok()))
    }

    /// Load configuration from a file
    pub fn load_file(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if contents.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply environment variable overrides read through `lookup`
    fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(namespace) = lookup("FLUXGRAPH_DEFAULT_NAMESPACE") {
            config.default_namespace = namespace;
        }
        if let Some(cluster) = lookup("FLUXGRAPH_CLUSTER_NAME") {
            config.cluster_name = cluster;
        }
        if let Some(level) = lookup("FLUXGRAPH_LOG") {
            config.logger.level = level;
        }
        config
    }
}
