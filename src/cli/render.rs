//! Plain-text rendering of engine results

use crate::graph::DependencyNode;
use crate::health::HealthBucket;
use crate::models::ResourceNode;
use crate::status::DisplayStatus;

/// Left-aligned columns separated by two spaces; the last column is not padded
fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let mut out = String::new();
    for row in std::iter::once(&header).chain(rows) {
        let last = row.len().saturating_sub(1);
        for (i, cell) in row.iter().enumerate() {
            if i == last {
                out.push_str(cell);
            } else {
                let pad = widths[i] - cell.chars().count();
                out.push_str(cell);
                out.push_str(&" ".repeat(pad + 2));
            }
        }
        out.push('\n');
    }
    out
}

/// Connected dependency subgraph, one object per line
pub fn render_dependencies(nodes: &[DependencyNode<'_>], sort_ids: bool) -> String {
    if nodes.is_empty() {
        return "No connected dependencies\n".to_string();
    }

    let mut entries: Vec<_> = nodes.iter().collect();
    if sort_ids {
        entries.sort_by_key(|entry| entry.node.id());
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| {
            let mut status = DisplayStatus::of(entry.node).to_string();
            if entry.is_current {
                status.push_str(" (focal)");
            }
            vec![
                entry.node.id(),
                entry.node.kind().unwrap_or("-").to_string(),
                status,
            ]
        })
        .collect();
    table(&["ID", "KIND", "STATUS"], &rows)
}

pub fn render_health(bucket: &HealthBucket) -> String {
    let rows = vec![
        vec!["Healthy".to_string(), bucket.healthy.to_string()],
        vec!["Unhealthy".to_string(), bucket.unhealthy.to_string()],
        vec!["Progressing".to_string(), bucket.progressing.to_string()],
        vec!["NA".to_string(), bucket.na.to_string()],
        vec!["Total".to_string(), bucket.total().to_string()],
    ];
    table(&["HEALTH", "COUNT"], &rows)
}

/// Status table in input order
pub fn render_status(nodes: &[ResourceNode]) -> String {
    let rows: Vec<Vec<String>> = nodes
        .iter()
        .map(|node| {
            let interval = if node.interval().is_zero() {
                "-".to_string()
            } else {
                node.interval().to_string()
            };
            vec![
                node.id(),
                node.kind().unwrap_or("-").to_string(),
                DisplayStatus::of(node).to_string(),
                interval,
                node.message(),
            ]
        })
        .collect();
    table(&["ID", "KIND", "STATUS", "INTERVAL", "MESSAGE"], &rows)
}

/// Flattened ownership tree, children indented under their parent
pub fn render_tree(rows: &[(usize, &ResourceNode)]) -> String {
    if rows.is_empty() {
        return "No reconciled objects\n".to_string();
    }

    rows.iter()
        .map(|(depth, node)| {
            let status = DisplayStatus::of(node);
            format!(
                "{}{} {} {} {}\n",
                "  ".repeat(*depth),
                node.kind().unwrap_or("-"),
                node.id(),
                status.icon(),
                status
            )
        })
        .collect()
}
