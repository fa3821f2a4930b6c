//! Status normalization
//!
//! Pure functions reducing the many condition schemas found on Flux and
//! Kubernetes objects to one three-valued readiness signal plus a message.
//! Suspension is reported separately so callers can decide precedence; the
//! dashboard's own precedence is available through [`DisplayStatus`].

mod synthetic;

use std::fmt;

use crate::models::{Condition, ResourceNode};

pub use synthetic::derive_synthetic_conditions;

/// Placeholder message for objects without conditions
pub const NO_MESSAGE: &str = "-";

/// Reasons Flux controllers use while a reconciliation is in flight
const IN_PROGRESS_REASONS: &[&str] = &["Progressing", "ProgressingWithRetry", "Reconciling"];

/// Reconciliation readiness of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Readiness {
    Ready,
    Reconciling,
    NotReady,
}

impl Readiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Readiness::Ready => "Ready",
            Readiness::Reconciling => "Reconciling",
            Readiness::NotReady => "Not Ready",
        }
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The condition readiness is computed from: `Ready` when present, the
/// first condition otherwise.
fn select_condition(conditions: &[Condition]) -> Option<&Condition> {
    conditions
        .iter()
        .find(|c| c.type_ == "Ready")
        .or_else(|| conditions.first())
}

fn classify(condition: &Condition) -> Readiness {
    if condition.status == "True" {
        Readiness::Ready
    } else if condition.status == "Unknown"
        || IN_PROGRESS_REASONS.contains(&condition.reason.as_str())
    {
        Readiness::Reconciling
    } else {
        Readiness::NotReady
    }
}

/// Compute readiness from a condition list
///
/// Objects without any condition are reported as `NotReady`; callers wanting
/// to tell "unknown" apart should check for an empty list first (the health
/// engine does).
pub fn compute_readiness(conditions: &[Condition]) -> Readiness {
    select_condition(conditions)
        .map(classify)
        .unwrap_or(Readiness::NotReady)
}

/// Message of the condition readiness was computed from, or `-`
pub fn compute_message(conditions: &[Condition]) -> String {
    select_condition(conditions)
        .map(|c| c.message.clone())
        .unwrap_or_else(|| NO_MESSAGE.to_string())
}

/// Status as shown to users: suspension wins over computed readiness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayStatus {
    Suspended,
    Ready,
    Reconciling,
    NotReady,
}

impl DisplayStatus {
    pub fn new(suspended: bool, readiness: Readiness) -> Self {
        if suspended {
            return DisplayStatus::Suspended;
        }
        match readiness {
            Readiness::Ready => DisplayStatus::Ready,
            Readiness::Reconciling => DisplayStatus::Reconciling,
            Readiness::NotReady => DisplayStatus::NotReady,
        }
    }

    pub fn of(node: &ResourceNode) -> Self {
        Self::new(node.is_suspended(), node.readiness())
    }

    /// Status icon used in text output
    pub fn icon(&self) -> &'static str {
        match self {
            DisplayStatus::Suspended => "⏸",
            DisplayStatus::Ready => "✓",
            DisplayStatus::Reconciling => "↻",
            DisplayStatus::NotReady => "✗",
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DisplayStatus::Suspended => "Suspended",
            DisplayStatus::Ready => "Ready",
            DisplayStatus::Reconciling => "Reconciling",
            DisplayStatus::NotReady => "Not Ready",
        };
        write!(f, "{}", label)
    }
}
