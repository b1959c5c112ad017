//! Metric samples as they travel from the parsers to the trapper.

use std::fmt;

/// A parsed reading. Rendered as text only at the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl MetricValue {
    /// Reads a numeric token, keeping integers integral. `None` for anything non-numeric.
    pub fn number(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let raw = raw.strip_suffix('%').unwrap_or(raw).trim_end();
        if let Ok(integer) = raw.parse::<i64>() {
            return Some(MetricValue::Integer(integer));
        }
        crate::parser::convert::parse_number(raw).map(MetricValue::Float)
    }

    pub fn text(raw: impl Into<String>) -> Self {
        MetricValue::Text(raw.into())
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Integer(value) => write!(f, "{value}"),
            // `{:?}` is the shortest round-trip form and keeps the `.0` on whole numbers.
            MetricValue::Float(value) => write!(f, "{value:?}"),
            MetricValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(value: i64) -> Self {
        MetricValue::Integer(value)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Float(value)
    }
}

/// What goes on the wire when a reading is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhenAbsent {
    /// Send nothing for this item.
    #[default]
    Skip,
    /// Send this value instead.
    Sentinel(i64),
}

/// A trapper item key: `name` or `name[param,param]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    name: String,
    params: Vec<String>,
}

impl ItemKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Adds a parameter, quoting it only if the key syntax requires it.
    pub fn param(mut self, value: impl AsRef<str>) -> Self {
        let value = value.as_ref();
        let needs_quotes = value.starts_with('"') || value.starts_with(' ') || value.contains([',', ']']);
        self.params.push(if needs_quotes { quote(value) } else { value.to_string() });
        self
    }

    /// Adds an always-quoted parameter.
    pub fn quoted(mut self, value: impl AsRef<str>) -> Self {
        self.params.push(quote(value.as_ref()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\\""))
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.params.is_empty() {
            write!(f, "[{}]", self.params.join(","))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub key: ItemKey,
    pub lane: Option<usize>,
    pub value: Option<MetricValue>,
    pub when_absent: WhenAbsent,
}

impl MetricSample {
    pub fn new(key: ItemKey, value: Option<MetricValue>) -> Self {
        Self {
            key,
            lane: None,
            value,
            when_absent: WhenAbsent::Skip,
        }
    }

    pub fn lane(mut self, lane: usize) -> Self {
        self.lane = Some(lane);
        self
    }

    pub fn or_sentinel(mut self, sentinel: i64) -> Self {
        self.when_absent = WhenAbsent::Sentinel(sentinel);
        self
    }

    /// The text to send, or `None` if this sample is skipped.
    pub fn wire_value(&self) -> Option<String> {
        match (&self.value, self.when_absent) {
            (Some(value), _) => Some(value.to_string()),
            (None, WhenAbsent::Sentinel(sentinel)) => Some(sentinel.to_string()),
            (None, WhenAbsent::Skip) => None,
        }
    }
}

/// How a group of samples is pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// One sender call per sample. A bad value only fails itself.
    Individual,
    /// One sender call for the whole group. All succeed or all fail.
    Batch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricGroup {
    pub delivery: Delivery,
    pub samples: Vec<MetricSample>,
}

impl MetricGroup {
    pub fn individual(samples: Vec<MetricSample>) -> Self {
        Self {
            delivery: Delivery::Individual,
            samples,
        }
    }

    pub fn batch(samples: Vec<MetricSample>) -> Self {
        Self {
            delivery: Delivery::Batch,
            samples,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &ItemKey> {
        self.samples.iter().map(|sample| &sample.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_keep_a_decimal_point() {
        assert_eq!(MetricValue::Float(98.0).to_string(), "98.0");
        assert_eq!(MetricValue::Float(580.05).to_string(), "580.05");
        assert_eq!(MetricValue::Float(-2.26).to_string(), "-2.26");
        assert_eq!(MetricValue::Integer(98).to_string(), "98");
    }

    #[test]
    fn numbers_stay_integral_when_they_can() {
        assert_eq!(MetricValue::number("812345"), Some(MetricValue::Integer(812345)));
        assert_eq!(MetricValue::number("40%"), Some(MetricValue::Integer(40)));
        assert_eq!(MetricValue::number("41.00"), Some(MetricValue::Float(41.0)));
        assert_eq!(MetricValue::number("n/a"), None);
    }

    #[test]
    fn keys_quote_when_needed() {
        let key = ItemKey::new("bgpAdvRoutes").quoted("TRANSIT A").param("10.0.0.1");
        assert_eq!(key.to_string(), r#"bgpAdvRoutes["TRANSIT A",10.0.0.1]"#);

        let key = ItemKey::new("curr").param("100GE1/0/1").param("Lane 0");
        assert_eq!(key.to_string(), "curr[100GE1/0/1,Lane 0]");

        let key = ItemKey::new("x").param("a,b").param("say \"hi\"");
        assert_eq!(key.to_string(), r#"x["a,b",say "hi"]"#);

        assert_eq!(ItemKey::new("cpuUsage").to_string(), "cpuUsage");
    }

    #[test]
    fn absent_values_follow_their_policy() {
        let skipped = MetricSample::new(ItemKey::new("a"), None);
        let zeroed = MetricSample::new(ItemKey::new("b"), None).or_sentinel(0);
        let present = MetricSample::new(ItemKey::new("c"), Some(MetricValue::Integer(7))).or_sentinel(0);

        assert_eq!(skipped.wire_value(), None);
        assert_eq!(zeroed.wire_value(), Some("0".to_string()));
        assert_eq!(present.wire_value(), Some("7".to_string()));
    }
}
