//! # Discovery Payload Builder
//!
//! Turns parsed entities into low-level discovery documents: `{"data":[{...},...]}`, one per
//! discovery key. Every document is a full refresh of the entity set for its key.

use serde::{
    ser::SerializeMap,
    Serialize,
    Serializer,
};
use std::collections::BTreeMap;

/// One discovered object: macro name to value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryEntity {
    macros: Vec<(String, String)>,
}

impl DiscoveryEntity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `{#NAME}`. A repeated name replaces the earlier value in place.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.macros.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.macros.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.macros
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

impl Serialize for DiscoveryEntity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.macros.len()))?;
        for (name, value) in &self.macros {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryDocument {
    pub key: String,
    pub entities: Vec<DiscoveryEntity>,
}

#[derive(Serialize)]
struct Payload<'a> {
    data: &'a [DiscoveryEntity],
}

impl DiscoveryDocument {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entities: Vec::new(),
        }
    }

    /// Compact JSON with non-ASCII text left as is.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&Payload { data: &self.entities })
    }
}

/// Collects entities per discovery key and emits the documents in declaration order.
///
/// Every declared key yields a document, even when nothing was discovered for it, so that
/// vanished objects are retired downstream. Input is not deduplicated.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryBuilder {
    documents: Vec<DiscoveryDocument>,
}

impl DiscoveryBuilder {
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            documents: keys.into_iter().map(DiscoveryDocument::new).collect(),
        }
    }

    pub fn add(&mut self, key: &str, entity: DiscoveryEntity) {
        match self.documents.iter_mut().find(|document| document.key == key) {
            Some(document) => document.entities.push(entity),
            None => {
                let mut document = DiscoveryDocument::new(key);
                document.entities.push(entity);
                self.documents.push(document);
            }
        }
    }

    pub fn build(self) -> Vec<DiscoveryDocument> {
        self.documents
    }
}

/// Builds display labels like `100GE 1 - UPLINK Lane 2` from optional parts.
///
/// Empty parts are dropped together with their separator, runs of spaces collapse to one,
/// and leading or trailing spaces and dashes are trimmed.
#[derive(Debug, Clone, Default)]
pub struct LabelBuilder {
    label: String,
}

impl LabelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value`, preceded by `separator` unless it is the first non-empty part.
    pub fn part(mut self, separator: &str, value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return self;
        }
        if !self.label.is_empty() {
            self.label.push_str(separator);
        }
        self.label.push_str(value);
        self
    }

    pub fn build(self) -> String {
        let collapsed = self.label.split(' ').filter(|word| !word.is_empty()).collect::<Vec<_>>().join(" ");
        collapsed.trim_matches(|c| c == ' ' || c == '-').to_string()
    }
}

/// Interface alias lookup. "Unknown" is a normal answer.
pub trait AliasSource {
    fn alias(&self, interface: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoAliases;

impl AliasSource for NoAliases {
    fn alias(&self, _interface: &str) -> Option<String> {
        None
    }
}

/// Aliases from the settings file.
#[derive(Debug, Clone, Default)]
pub struct StaticAliases {
    aliases: BTreeMap<String, String>,
}

impl StaticAliases {
    pub fn new(aliases: BTreeMap<String, String>) -> Self {
        Self { aliases }
    }
}

impl AliasSource for StaticAliases {
    fn alias(&self, interface: &str) -> Option<String> {
        self.aliases
            .get(interface)
            .map(|alias| alias.trim())
            .filter(|alias| !alias.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lane_label(if_type: &str, id: &str, alias: &str, lane: usize) -> String {
        LabelBuilder::new()
            .part("", if_type)
            .part(" ", id)
            .part(" - ", alias)
            .part(" ", &format!("Lane {lane}"))
            .build()
    }

    #[test]
    fn labels_drop_empty_parts() {
        assert_eq!(lane_label("100GE", "1", "", 2), "100GE 1 Lane 2");
        assert_eq!(lane_label("100GE", "1", "UPLINK  CORE", 2), "100GE 1 - UPLINK CORE Lane 2");
        assert_eq!(lane_label("", "", "UPLINK", 1), "UPLINK Lane 1");
        assert_eq!(LabelBuilder::new().part(" - ", "- x -").build(), "x");
    }

    #[test]
    fn documents_are_compact_and_keep_macro_order() {
        let mut builder = DiscoveryBuilder::new(["discovery_gbic", "discovery_gbic_temp_volt"]);
        builder.add(
            "discovery_gbic",
            DiscoveryEntity::new()
                .with("{#IFNAME}", "100GE1/0/1")
                .with("{#IFALIAS}", "Ligação São Paulo")
                .with("{#GBIC_LANE}", "Lane 0"),
        );

        let documents = builder.build();

        assert_eq!(documents.len(), 2);
        assert_eq!(
            documents[0].to_json().unwrap(),
            r#"{"data":[{"{#IFNAME}":"100GE1/0/1","{#IFALIAS}":"Ligação São Paulo","{#GBIC_LANE}":"Lane 0"}]}"#
        );
        assert_eq!(documents[1].to_json().unwrap(), r#"{"data":[]}"#);
    }

    #[test]
    fn identical_input_serializes_identically() {
        let build = || {
            let mut builder = DiscoveryBuilder::new(["k"]);
            builder.add("k", DiscoveryEntity::new().with("{#B}", "2").with("{#A}", "1"));
            builder.add("k", DiscoveryEntity::new().with("{#B}", "2").with("{#A}", "1"));
            builder.build()[0].to_json().unwrap()
        };
        assert_eq!(build(), build());
        assert_eq!(build(), r#"{"data":[{"{#B}":"2","{#A}":"1"},{"{#B}":"2","{#A}":"1"}]}"#);
    }

    #[test]
    fn static_aliases_treat_blank_as_unknown() {
        let aliases = StaticAliases::new(BTreeMap::from([
            ("ten-gigabit-ethernet-1/1/1".to_string(), "UPLINK".to_string()),
            ("ten-gigabit-ethernet-1/1/2".to_string(), "  ".to_string()),
        ]));
        assert_eq!(aliases.alias("ten-gigabit-ethernet-1/1/1"), Some("UPLINK".to_string()));
        assert_eq!(aliases.alias("ten-gigabit-ethernet-1/1/2"), None);
        assert_eq!(NoAliases.alias("anything"), None);
    }
}
