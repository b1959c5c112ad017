use super::{
    number,
    Collector,
};
use crate::{
    discovery::{
        AliasSource,
        DiscoveryBuilder,
        DiscoveryDocument,
        DiscoveryEntity,
        LabelBuilder,
    },
    error::TransportError,
    executor::{
        CommandCost,
        Executor,
    },
    metrics::{
        ItemKey,
        MetricGroup,
        MetricSample,
    },
    parser::{
        builtin,
        Record,
        DEFAULT_SENTINELS,
    },
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;

const TRANSCEIVERS: &str = "show interface transceivers | display json";

const LANES_KEY: &str = "gbicDiscovery";
const MODULES_KEY: &str = "discovery_gbic_temp_volt";

lazy_static! {
    static ref LANE_BIAS: Regex = builtin(r"^tx(\d+)-bias$");
}

#[derive(Debug, Deserialize, Default)]
struct Reply {
    #[serde(default)]
    data: Data,
}

#[derive(Debug, Deserialize, Default)]
struct Data {
    #[serde(rename = "dmos-base:status", default)]
    status: Status,
}

#[derive(Debug, Deserialize, Default)]
struct Status {
    #[serde(default)]
    interface: Interfaces,
}

#[derive(Debug, Deserialize, Default)]
struct Interfaces {
    #[serde(rename = "dmos-transceivers:transceivers", default)]
    transceivers: Vec<BTreeMap<String, serde_json::Value>>,
}

/// Turns the JSON export into one record per transceiver. Strings and numbers are kept,
/// nested values are dropped.
fn decode(text: &str) -> Result<Vec<Record>, serde_json::Error> {
    // Anything the shell printed before the document is noise.
    let json = text.find('{').map_or(text, |start| &text[start..]);
    let reply: Reply = serde_json::from_str(json)?;

    Ok(reply
        .data
        .status
        .interface
        .transceivers
        .into_iter()
        .map(|fields| {
            let mut record = Record::new();
            for (name, value) in fields {
                match value {
                    serde_json::Value::String(value) => record.set_raw(&name, &value, DEFAULT_SENTINELS),
                    serde_json::Value::Number(value) => record.set(name, value.to_string()),
                    _ => {}
                }
            }
            record
        })
        .collect())
}

/// One transceiver and how it is named on the server.
struct Transceiver {
    record: Record,
    if_type: String,
    id: String,
    alias: String,
    lanes: Vec<usize>,
}

impl Transceiver {
    fn new(record: Record, aliases: &dyn AliasSource) -> Self {
        let if_type = record.text("if-type").unwrap_or_default().to_string();
        let id = record
            .text("id")
            .or_else(|| record.text("if-index"))
            .unwrap_or_default()
            .to_string();
        let alias = aliases.alias(&format!("{if_type}-{id}")).unwrap_or_default();

        // Lanes are whatever `tx<n>-bias` keys the device sent, readable or not.
        let mut lanes: Vec<usize> = record
            .iter()
            .filter_map(|(name, _)| LANE_BIAS.captures(name)?.get(1)?.as_str().parse().ok())
            .collect();
        lanes.sort_unstable();

        Self {
            record,
            if_type,
            id,
            alias,
            lanes,
        }
    }

    /// `ten-gigabit-ethernet` `1/1/1` becomes `ten gigabit ethernet 1/1/1`.
    fn iface(&self) -> String {
        format!("{} {}", self.if_type.replace('-', " "), self.id)
    }
}

/// Datacom DmOS: transceiver readings from the JSON status export.
pub struct DatacomCollector<'a> {
    aliases: &'a dyn AliasSource,
}

impl<'a> DatacomCollector<'a> {
    pub fn new(aliases: &'a dyn AliasSource) -> Self {
        Self { aliases }
    }

    fn transceivers(&self, executor: &mut Executor<'_>) -> Result<Vec<Transceiver>, TransportError> {
        let text = executor.execute(TRANSCEIVERS, CommandCost::Heavy)?;
        let unusable = |reason: String| TransportError::Unusable {
            command: TRANSCEIVERS.to_string(),
            reason,
        };
        // An empty list would retire every discovered transceiver, so it is not trusted.
        let records = decode(&text).map_err(|e| unusable(format!("not a JSON export: {e}")))?;
        if records.is_empty() {
            return Err(unusable("no transceivers listed".to_string()));
        }
        debug!(transceivers = records.len(), "decoded");
        Ok(records
            .into_iter()
            .map(|record| Transceiver::new(record, self.aliases))
            .collect())
    }
}

impl Collector for DatacomCollector<'_> {
    fn discover(&self, executor: &mut Executor<'_>) -> Result<Vec<DiscoveryDocument>, TransportError> {
        let mut builder = DiscoveryBuilder::new([LANES_KEY, MODULES_KEY]);

        for transceiver in self.transceivers(executor)? {
            let iface = transceiver.iface();
            for lane in &transceiver.lanes {
                let label = LabelBuilder::new()
                    .part("", &transceiver.if_type.replace('-', " "))
                    .part(" ", &transceiver.id)
                    .part(" - ", &transceiver.alias)
                    .part(" ", &format!("Lane {lane}"))
                    .build();
                builder.add(
                    LANES_KEY,
                    DiscoveryEntity::new()
                        .with("{#LABEL}", label)
                        .with("{#IFNAME}", iface.as_str())
                        .with("{#GBIC_LANE}", lane.to_string()),
                );
            }

            let label = if transceiver.alias.is_empty() { iface.as_str() } else { transceiver.alias.as_str() };
            for metric in ["temp", "voltage"] {
                builder.add(
                    MODULES_KEY,
                    DiscoveryEntity::new()
                        .with("{#LABEL}", label)
                        .with("{#IFNAME}", iface.as_str())
                        .with("{#METRIC}", metric),
                );
            }
        }

        Ok(builder.build())
    }

    fn collect(&self, executor: &mut Executor<'_>) -> Result<Vec<MetricGroup>, TransportError> {
        let mut samples = Vec::new();

        for transceiver in self.transceivers(executor)? {
            let iface = transceiver.iface();
            let record = &transceiver.record;
            samples.push(MetricSample::new(ItemKey::new("temp").param(&iface), number(record, "temperature")));
            samples.push(MetricSample::new(ItemKey::new("voltage").param(&iface), number(record, "vcc-3v3")));

            for &lane in &transceiver.lanes {
                let lane_iface = format!("{iface}:{lane}");
                for (name, field) in [
                    ("current", format!("tx{lane}-bias")),
                    ("rxpower", format!("rx{lane}-power")),
                    ("txpower", format!("tx{lane}-power")),
                ] {
                    samples.push(
                        MetricSample::new(ItemKey::new(name).param(&lane_iface), number(record, &field)).lane(lane),
                    );
                }
            }
        }

        Ok(vec![MetricGroup::individual(samples)])
    }

    fn name(&self) -> &'static str {
        "datacom-transceiver"
    }
}
