//! fluxgraph - inspect Flux dependency graphs, ownership trees and health
//!
//! Snapshot commands work offline on a file of payloads or documents; `tree`
//! talks to the cluster selected by the current kubeconfig.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use fluxgraph::cli;
use fluxgraph::config::{Config, ConfigLoader, get_config_value, paths};
use fluxgraph::graph::{self, NodeSnapshot};
use fluxgraph::health;
use fluxgraph::kube::{self as kube_source, KubeObjectSource};
use fluxgraph::models::{self, AutomationRef, FluxResourceKind, ObjectRef, ResourceNode};

#[derive(Parser, Debug)]
#[command(name = "fluxgraph", version)]
#[command(about = "Dependency graphs, ownership trees and health of Flux resources", long_about = None)]
struct Args {
    /// Enable debug logging to a temporary file
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the dependency subgraph connected to an object
    Deps {
        /// Snapshot file (JSON or YAML)
        snapshot: PathBuf,
        /// Focal object as `namespace/name` or `name`
        object: String,
    },
    /// Print health counts for a snapshot
    Health { snapshot: PathBuf },
    /// Print the status of every object in a snapshot
    Status { snapshot: PathBuf },
    /// Resolve the ownership tree of a Kustomization or HelmRelease
    Tree {
        /// Kustomization or HelmRelease
        kind: String,
        /// Object as `namespace/name` or `name`
        object: String,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigSubcommand {
    /// Show configuration file path
    Path,
    /// Show the merged configuration, or a single key
    Show {
        /// Configuration key (e.g. "clusterName", "graph.sortIds")
        key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config =
        ConfigLoader::load(args.config.as_deref()).context("Failed to load configuration")?;

    let log_file = cli::init_logging(args.debug, &config.logger.level)?;
    if let Some(ref log_path) = log_file {
        eprintln!(
            "Debug logging enabled. Logs written to: {}",
            log_path.display()
        );
    }

    match args.command {
        Command::Deps { snapshot, object } => {
            let nodes = load_nodes(&snapshot, &config)?;
            let focal = parse_object(&object, &config)?;
            let snapshot = NodeSnapshot::new(nodes);
            let subgraph = graph::get_connected_subgraph(&snapshot, &focal);
            print!("{}", cli::render_dependencies(&subgraph, config.graph.sort_ids));
        }
        Command::Health { snapshot } => {
            let nodes = load_nodes(&snapshot, &config)?;
            print!("{}", cli::render_health(&health::aggregate(&nodes)));
        }
        Command::Status { snapshot } => {
            let nodes = load_nodes(&snapshot, &config)?;
            print!("{}", cli::render_status(&nodes));
        }
        Command::Tree { kind, object } => run_tree(&kind, &object, &config).await?,
        Command::Config { subcommand } => {
            handle_config_command(subcommand, &args.config, &config)?
        }
    }

    Ok(())
}

fn load_nodes(path: &Path, config: &Config) -> Result<Vec<ResourceNode>> {
    models::load_snapshot(path, &config.cluster_name, &config.annotation_prefix)
}

fn parse_object(input: &str, config: &Config) -> Result<ObjectRef> {
    let mut object: ObjectRef = input.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    if object.namespace.is_empty() {
        object.namespace = config.default_namespace.clone();
    }
    Ok(object)
}

async fn run_tree(kind: &str, object: &str, config: &Config) -> Result<()> {
    let kind = FluxResourceKind::from_str_case_insensitive(kind)
        .filter(FluxResourceKind::is_automation)
        .with_context(|| format!("'{}' is not a Kustomization or HelmRelease", kind))?;
    let object = parse_object(object, config)?;
    let root = AutomationRef::new(kind, object.namespace, object.name, &config.cluster_name);

    tracing::debug!("Initializing Kubernetes client");
    let client = kube_source::create_client().await?;
    let source = KubeObjectSource::new(client);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let forest = graph::resolve_tree(&source, &root, &graph::default_ownership_table(), &cancel)
        .await
        .with_context(|| format!("Failed to resolve tree for {}", root.id()))?;
    let rows = graph::flatten_with_depth(&forest)?;
    print!("{}", cli::render_tree(&rows));
    Ok(())
}

fn handle_config_command(
    cmd: ConfigSubcommand,
    explicit: &Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    match cmd {
        ConfigSubcommand::Path => {
            let path = explicit.clone().unwrap_or_else(paths::root_config_path);
            println!("{}", path.display());
        }
        ConfigSubcommand::Show { key: Some(key) } => {
            println!("{}", get_config_value(config, &key)?);
        }
        ConfigSubcommand::Show { key: None } => {
            let yaml =
                serde_yaml::to_string(config).context("Failed to serialize configuration")?;
            print!("{}", yaml);
        }
    }
    Ok(())
}
