//! Kubernetes collaborator
//!
//! Connection to the API server plus an `ObjectSource` backed by it.
//!
//! Proxies are taken from the usual `HTTP_PROXY` / `HTTPS_PROXY` / `NO_PROXY`
//! variables. An API server that looks internal is appended to `NO_PROXY`
//! so that a corporate proxy does not swallow cluster traffic.

pub mod helm;
pub mod inventory;
mod source;

pub use inventory::{InventoryEntry, extract_inventory};
pub use source::KubeObjectSource;

use std::net::IpAddr;

use anyhow::{Context, Result};
use kube::{Client, Config};
use url::Url;

/// Infer a client from in-cluster config, `KUBECONFIG` or `~/.kube/config`
pub async fn create_client() -> Result<Client> {
    let config = Config::infer()
        .await
        .context("Failed to infer Kubernetes configuration")?;

    if let Ok(url) = Url::parse(&config.cluster_url.to_string()) {
        if let Some(host) = url.host_str() {
            ensure_no_proxy_bypass(host);
        }
    }

    Client::try_from(config).context("Failed to create Kubernetes client")
}

fn ensure_no_proxy_bypass(host: &str) {
    if !is_internal_host(host) {
        return;
    }

    let current = std::env::var("NO_PROXY")
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| std::env::var("no_proxy").ok())
        .unwrap_or_default();
    if no_proxy_contains(&current, host) {
        return;
    }

    let updated = if current.is_empty() {
        host.to_string()
    } else {
        format!("{},{}", current, host)
    };

    tracing::debug!("Adding {} to NO_PROXY", host);
    // SAFETY: runs before the client is built, while no other thread reads
    // the environment.
    unsafe {
        std::env::set_var("NO_PROXY", &updated);
        std::env::set_var("no_proxy", &updated);
    }
}

const INTERNAL_SUFFIXES: &[&str] = &[".local", ".internal", ".cluster.local"];
const INTERNAL_DOMAINS: &[&str] = &["corp", "internal", "int", "local"];
const INTERNAL_PREFIXES: &[&str] = &["dev", "test", "staging", "qa", "uat", "internal"];

/// Heuristic for loopback/RFC 1918 addresses and corporate-looking hostnames
fn is_internal_host(host: &str) -> bool {
    if host == "localhost" {
        return true;
    }
    if let Ok(ip) = host.trim_matches(['[', ']']).parse::<IpAddr>() {
        return match ip {
            IpAddr::V4(v4) => v4.is_loopback() || v4.is_private(),
            IpAddr::V6(v6) => v6.is_loopback(),
        };
    }

    if INTERNAL_SUFFIXES.iter().any(|s| host.ends_with(s)) {
        return true;
    }

    let labels: Vec<&str> = host.split('.').collect();
    let Some((_tld, rest)) = labels.split_last() else {
        return false;
    };
    if rest.is_empty() {
        return false;
    }
    if rest
        .last()
        .is_some_and(|domain| INTERNAL_DOMAINS.contains(domain))
    {
        return true;
    }
    rest.iter()
        .any(|label| INTERNAL_PREFIXES.iter().any(|p| label.starts_with(p)))
}

/// Whether a NO_PROXY list already covers `host`
///
/// `example.com` and `.example.com` both cover the domain and its subdomains.
fn no_proxy_contains(no_proxy: &str, host: &str) -> bool {
    no_proxy
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .any(|pattern| {
            let domain = pattern.strip_prefix('.').unwrap_or(pattern);
            host == domain || host.ends_with(&format!(".{}", domain))
        })
}
