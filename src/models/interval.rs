//! Reconciliation interval parsing
//!
//! Flux specs carry intervals as compact Go-style durations (`10m`, `1h30m`).

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

// Every group is optional, so the pattern always matches at offset 0 and a
// string it cannot read yields an all-zero interval.
static INTERVAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((\d+)h)?((\d+)m)?((\d+)s)?").expect("interval pattern is valid")
});

/// A reconciliation interval split into its components, kept verbatim as
/// numeric strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub hours: String,
    pub minutes: String,
    pub seconds: String,
}

impl Interval {
    pub fn parse(input: &str) -> Self {
        let captures = INTERVAL_PATTERN.captures(input);
        let component = |idx: usize| -> String {
            captures
                .as_ref()
                .and_then(|caps| caps.get(idx))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "0".to_string())
        };

        Self {
            hours: component(2),
            minutes: component(4),
            seconds: component(6),
        }
    }

    pub fn is_zero(&self) -> bool {
        [&self.hours, &self.minutes, &self.seconds]
            .into_iter()
            .all(|component| is_zero_component(component))
    }

    /// Total length, saturating at `u64::MAX` seconds for oversized components
    pub fn to_duration(&self) -> Duration {
        let value = |s: &str| s.parse::<u64>().unwrap_or(u64::MAX);
        let secs = value(&self.hours)
            .saturating_mul(3600)
            .saturating_add(value(&self.minutes).saturating_mul(60))
            .saturating_add(value(&self.seconds));
        Duration::from_secs(secs)
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self {
            hours: "0".to_string(),
            minutes: "0".to_string(),
            seconds: "0".to_string(),
        }
    }
}

/// Components are digit strings, possibly longer than any integer type
fn is_zero_component(component: &str) -> bool {
    component.bytes().all(|b| b == b'0')
}

/// Canonical rendering: only non-zero components, `0s` when empty
impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for (value, unit) in [(&self.hours, 'h'), (&self.minutes, 'm'), (&self.seconds, 's')] {
            if !is_zero_component(value) {
                out.push_str(value);
                out.push(unit);
            }
        }
        if out.is_empty() {
            out.push_str("0s");
        }
        write!(f, "{}", out)
    }
}
