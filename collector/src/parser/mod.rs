//! # Output Parser Engine
//!
//! Pure functions from raw CLI text to ordered [`Record`]s. Every vendor command is described
//! by a [`ParserSpec`], built once when its collector is first used:
//!
//! - **`Tabular`**: fixed-column tables split on whitespace (`display fan`, `display power`).
//! - **`KeyValue`**: `label : value` blocks, optionally split into one record per block
//!   (`display bgp peer verbose`).
//! - **`MultiLane`**: per-entity sections with `v0|v1(Lane0|Lane1)` or `Tx<n> ...` lane
//!   values (`display transceiver verbose`).
//!
//! A field is either missing from the record (the device did not print it) or present. A
//! present field may hold the sentinel [`FieldValue::Unavailable`] when the device printed a
//! placeholder such as `-` or `N/A`.

pub mod convert;
mod key_value;
mod multi_lane;
mod tabular;

pub use key_value::KeyValueSpec;
pub use multi_lane::{
    LaneLayout,
    MultiLaneSpec,
};
use regex::Regex;
use std::collections::BTreeMap;
pub use tabular::TabularSpec;

/// Placeholders devices print instead of a reading.
pub const DEFAULT_SENTINELS: &[&str] = &["-", "--", "N/A", "NA"];

/// Record field holding the lane index of a lane record.
pub const LANE_FIELD: &str = "lane";

/// Record field holding how many lanes an entity reported.
pub const LANE_COUNT_FIELD: &str = "lanes";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Value(String),
    /// The device printed the field with a "no reading" placeholder.
    Unavailable,
}

/// One parsed entity: an interface, a BGP peer, a sensor, a power module, a lane.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), FieldValue::Value(value.into()));
    }

    pub fn set_unavailable(&mut self, name: impl Into<String>) {
        self.fields.insert(name.into(), FieldValue::Unavailable);
    }

    /// Stores `raw`, or the sentinel if it is one of `sentinels`.
    pub(crate) fn set_raw(&mut self, name: &str, raw: &str, sentinels: &[&str]) {
        let raw = raw.trim();
        if sentinels.contains(&raw) {
            self.set_unavailable(name);
        } else {
            self.set(name, raw);
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// The value of a present, available field.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Value(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.text(name).and_then(convert::parse_number)
    }

    pub fn is_unavailable(&self, name: &str) -> bool {
        matches!(self.fields.get(name), Some(FieldValue::Unavailable))
    }

    pub fn lane(&self) -> Option<usize> {
        self.text(LANE_FIELD).and_then(|lane| lane.parse().ok())
    }

    pub fn lane_count(&self) -> usize {
        self.text(LANE_COUNT_FIELD)
            .and_then(|count| count.parse().ok())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// How to turn one command's output into records.
#[derive(Debug, Clone)]
pub enum ParserSpec {
    Tabular(TabularSpec),
    KeyValue(KeyValueSpec),
    MultiLane(MultiLaneSpec),
}

impl ParserSpec {
    pub fn parse(&self, text: &str) -> Vec<Record> {
        match self {
            ParserSpec::Tabular(spec) => spec.parse(text),
            ParserSpec::KeyValue(spec) => spec.parse(text),
            ParserSpec::MultiLane(spec) => spec.parse(text),
        }
    }
}

impl From<TabularSpec> for ParserSpec {
    fn from(spec: TabularSpec) -> Self {
        ParserSpec::Tabular(spec)
    }
}

impl From<KeyValueSpec> for ParserSpec {
    fn from(spec: KeyValueSpec) -> Self {
        ParserSpec::KeyValue(spec)
    }
}

impl From<MultiLaneSpec> for ParserSpec {
    fn from(spec: MultiLaneSpec) -> Self {
        ParserSpec::MultiLane(spec)
    }
}

/// A named single-capture pattern. The first capture group is the field value.
#[derive(Debug, Clone)]
pub struct Extractor {
    name: String,
    pattern: Regex,
    sentinels: &'static [&'static str],
}

impl Extractor {
    /// Matches `label : value` and captures the value up to the next whitespace or comma.
    pub fn colon(name: &str, label: &str) -> Self {
        Self::pattern(
            name,
            &format!(r"{}\s*:\s*([^\s,]+)", regex::escape(label)),
        )
    }

    /// Matches `label : rest of line` and captures the trimmed rest.
    pub fn colon_line(name: &str, label: &str) -> Self {
        Self::pattern(name, &format!(r"(?m){}\s*:\s*(.*?)\s*$", regex::escape(label)))
    }

    pub fn pattern(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: builtin(pattern),
            sentinels: DEFAULT_SENTINELS,
        }
    }

    pub fn without_sentinels(mut self) -> Self {
        self.sentinels = &[];
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extracts the field from `text` into `record`. Leaves the record untouched on a miss.
    pub(crate) fn apply(&self, text: &str, record: &mut Record) -> bool {
        match self.pattern.captures(text).and_then(|caps| caps.get(1)) {
            Some(value) => {
                record.set_raw(&self.name, value.as_str(), self.sentinels);
                true
            }
            None => false,
        }
    }
}

/// Compiles one of the crate's own patterns.
///
/// # Panics
/// Panics on an invalid pattern. Only literals from this crate go through here, and every
/// collector's specs are built in its tests.
pub(crate) fn builtin(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_are_kept_apart_from_missing_fields() {
        let extractor = Extractor::colon("cpu", "CPU usage");
        let mut record = Record::new();

        assert!(extractor.apply("CPU usage : N/A", &mut record));
        assert!(record.is_unavailable("cpu"));
        assert_eq!(record.text("cpu"), None);

        assert!(!record.is_unavailable("memory"));
        assert_eq!(record.field("memory"), None);
    }

    #[test]
    fn colon_values_stop_at_commas() {
        let extractor = Extractor::colon("state", "BGP current state");
        let mut record = Record::new();
        extractor.apply("  BGP current state: Established, Up for 20h46m48s", &mut record);
        assert_eq!(record.text("state"), Some("Established"));
    }

    #[test]
    fn colon_line_keeps_spaces() {
        let extractor = Extractor::colon_line("uptime", "Uptime");
        let mut record = Record::new();
        extractor.apply("Name : x\nUptime : 3 weeks, 2 days \nOther : y", &mut record);
        assert_eq!(record.text("uptime"), Some("3 weeks, 2 days"));
    }
}
