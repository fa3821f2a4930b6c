//! Configuration for the fluxgraph binary
//!
//! A single YAML file (`config.yaml` in the platform config directory)
//! layered over built-in defaults and environment overrides.

pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{Config, GraphConfig, LoggerConfig};

/// Get a configuration value by key (dot notation)
pub fn get_config_value(config: &Config, key: &str) -> anyhow::Result<String> {
    match key {
        "defaultNamespace" => Ok(config.default_namespace.clone()),
        "clusterName" => Ok(config.cluster_name.clone()),
        "annotationPrefix" => Ok(config.annotation_prefix.clone()),
        "graph.sortIds" => Ok(config.graph.sort_ids.to_string()),
        "logger.level" => Ok(config.logger.level.clone()),
        _ => Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_config_value() {
        let config = Config::default();
        assert_eq!(get_config_value(&config, "graph.sortIds").unwrap(), "true");
        assert_eq!(get_config_value(&config, "clusterName").unwrap(), "Default");
        assert!(get_config_value(&config, "ui.skin").is_err());
    }
}
