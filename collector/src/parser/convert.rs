//! Conversions from CLI tokens to numbers.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref UPTIME_PARTS: [(Regex, f64); 4] = [
        (super::builtin(r"(\d+)d"), 24.0),
        (super::builtin(r"(\d+)h"), 1.0),
        (super::builtin(r"(\d+)m"), 1.0 / 60.0),
        (super::builtin(r"(\d+)s"), 1.0 / 3600.0),
    ];
}

/// Parses a plain number, tolerating surrounding whitespace and a trailing `%`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let raw = raw.strip_suffix('%').unwrap_or(raw).trim_end();
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// `"40%"` → `40.0`.
pub fn parse_percent(raw: &str) -> Option<f64> {
    parse_number(raw)
}

/// Converts `<d>d<h>h<m>m<s>s` into hours, rounded to two decimals.
///
/// Every component is optional. Returns `None` when none of them is present.
pub fn parse_uptime(raw: &str) -> Option<f64> {
    let mut seen = false;
    let mut hours = 0.0;
    for (pattern, factor) in UPTIME_PARTS.iter() {
        if let Some(value) = pattern
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
        {
            seen = true;
            hours += value as f64 * factor;
        }
    }
    seen.then(|| (hours * 100.0).round() / 100.0)
}

/// Splits `v0|v1|...(Lane0|Lane1|...)` into the lane values, in lane order.
pub fn split_lanes(raw: &str) -> Vec<&str> {
    let values = raw.split_once('(').map_or(raw, |(values, _)| values).trim();
    if values.is_empty() {
        return Vec::new();
    }
    values.split('|').map(str::trim).collect()
}

/// A fixed state-name lookup with one value for everything it does not know.
#[derive(Debug, Clone, Copy)]
pub struct StateTable {
    entries: &'static [(&'static str, i64)],
    unknown: i64,
}

impl StateTable {
    pub const fn new(entries: &'static [(&'static str, i64)], unknown: i64) -> Self {
        Self { entries, unknown }
    }

    pub fn lookup(&self, state: &str) -> i64 {
        let state = state.trim();
        self.entries
            .iter()
            .find(|(name, _)| *name == state)
            .map_or(self.unknown, |(_, value)| *value)
    }

    pub fn unknown(&self) -> i64 {
        self.unknown
    }
}

/// BGP finite state machine, RFC 4271 order starting at 1.
pub const BGP_STATE: StateTable = StateTable::new(
    &[
        ("Idle", 1),
        ("Connect", 2),
        ("Active", 3),
        ("OpenSent", 4),
        ("OpenConfirm", 5),
        ("Established", 6),
    ],
    0,
);

/// Session up or not.
pub const BGP_ESTABLISHED: StateTable = StateTable::new(&[("Established", 1)], 0);

/// `display power` module state.
pub const POWER_SUPPLY: StateTable = StateTable::new(&[("Supply", 1), ("Normal", 1)], 0);

/// `display fan` status column.
pub const FAN_STATUS: StateTable = StateTable::new(&[("Normal", 1)], 0);
