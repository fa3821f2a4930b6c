//! Synthetic conditions for kinds that only publish counters
//!
//! ReplicaSets, StatefulSets and DaemonSets frequently carry no
//! `status.conditions` at all, only replica counters. The dispatch below is a
//! closed list: an unknown kind yields no condition instead of a guess.

use serde_json::Value;

use crate::models::Condition;

fn counter(status: &Value, key: &str) -> i64 {
    status.get(key).and_then(|v| v.as_i64()).unwrap_or(0)
}

fn replica_condition(ready: i64, desired: i64, is_ready: bool) -> Condition {
    let (status, reason) = if is_ready {
        ("True", "ReplicasReady")
    } else {
        ("False", "ReplicasNotReady")
    };
    Condition::new(
        "Ready",
        status,
        reason,
        format!("{}/{} ready", ready, desired),
    )
}

/// Synthesize a single `Ready` condition from a kind's status counters
pub fn derive_synthetic_conditions(kind: &str, status: &Value) -> Vec<Condition> {
    match kind {
        // Scaled to zero means there is nothing left to wait for
        "Deployment" | "ReplicaSet" | "StatefulSet" => {
            let desired = counter(status, "replicas");
            let ready = counter(status, "readyReplicas");
            vec![replica_condition(ready, desired, ready == desired)]
        }
        // A DaemonSet scheduled on no node is not serving anything
        "DaemonSet" => {
            let desired = counter(status, "desiredNumberScheduled");
            let ready = counter(status, "numberReady");
            vec![replica_condition(ready, desired, desired > 0 && ready == desired)]
        }
        "Pod" => {
            let phase = status.get("phase").and_then(|p| p.as_str()).unwrap_or("");
            let ready = matches!(phase, "Running" | "Succeeded");
            let (value, reason) = match (ready, phase) {
                (true, _) => ("True", phase),
                (false, "Pending") => ("Unknown", "Pending"),
                (false, "") => ("False", "PhaseUnknown"),
                (false, _) => ("False", phase),
            };
            vec![Condition::new(
                "Ready",
                value,
                reason,
                format!("Pod phase: {}", if phase.is_empty() { "Unknown" } else { phase }),
            )]
        }
        _ => Vec::new(),
    }
}
