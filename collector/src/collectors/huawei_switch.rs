use super::{
    fetch,
    fetch_one,
    number,
    text,
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
        MetricValue,
    },
    parser::{
        convert::{
            BGP_ESTABLISHED,
            FAN_STATUS,
            POWER_SUPPLY,
        },
        Extractor,
        KeyValueSpec,
        LaneLayout,
        MultiLaneSpec,
        ParserSpec,
        Record,
        TabularSpec,
    },
};
use lazy_static::lazy_static;

const INTERFACES: &str = "display interface description";
const BGP_V4: &str = "display bgp peer verbose";
const BGP_V6: &str = "display bgp ipv6 peer verbose";
const POWER: &str = "display power";
const POWER_MANAGE: &str = "display power manage power-information";
const FAN: &str = "display fan";
const VERSION: &str = "display version";

const SFP_KEY: &str = "discovery_switch_sfp";
const PEERS_KEY: &str = "discovery_bgp_peers";
const PEERS_V6_KEY: &str = "discovery_bgp_peers_v6";
const LANES_KEY: &str = "discovery_switch_sfp_lanes";

/// Transceiver lane fields and the item names they are sent under.
const LANE_METRICS: [(&str, &str); 3] = [("bias", "curr"), ("tx_power", "txpower"), ("rx_power", "rxpower")];

lazy_static! {
    static ref ETHERNET_PORTS: ParserSpec = TabularSpec::new(r"^\S*(GE|Ethernet)\S*\s+\S+\s+\S+")
        .column("ifname", 0)
        .column("phy", 1)
        .rest("description", 3)
        .into();
    static ref PEERS: ParserSpec = KeyValueSpec::new()
        .blocks("peer", r"BGP Peer is ([^\s,]+)")
        .pattern("remote_as", r"remote AS (\d+)")
        .colon("state", "BGP current state")
        .colon("received", "Received total routes")
        .into();
    static ref POWER_MODULES: ParserSpec = TabularSpec::new(r"^\d+\s+PWR\d+")
        .column("power_id", 1)
        .column("state", 4)
        .column("power", 5)
        .into();
    static ref POWER_CONSUMPTION: ParserSpec = KeyValueSpec::new()
        .pattern("current", r"current power consumption \(mW\)\s*:\s*(\d+)")
        .pattern("average", r"average power consumption \(mW\)\s*:\s*(\d+)")
        .into();
    static ref FANS: ParserSpec = TabularSpec::new(r"^\d+\s+\d+\s+Present")
        .column("fan", 1)
        .column("status", 3)
        .column("speed", 4)
        .into();
    static ref VERSION_INFO: ParserSpec = KeyValueSpec::new()
        .pattern("software_version", r"VRP \(R\) software, Version\s+([\d.]+)")
        .pattern("software_build", r"VRP \(R\) software, Version\s+[\d.]+\s+\(([^)]+)\)")
        .pattern("device_model", r"HUAWEI\s+([\w-]+).*uptime is")
        .pattern("uptime", r"uptime is\s+([^\r\n]+)")
        .pattern("bootrom_version", r"BootROM\s+Version\s*:\s*([\w.]+)")
        .into();
    static ref TRANSCEIVER: ParserSpec = MultiLaneSpec::new()
        .scalar(Extractor::pattern("temperature", r"Temperature\([^)]*\)\s*:\s*([+-]?\d+\.?\d*)"))
        .scalar(Extractor::pattern("voltage", r"Voltage\(V\)\s*:\s*(\S+)"))
        .lane("bias", LaneLayout::Pipe, r"Bias Current\(mA\)\s*:\s*(\S+)")
        .lane("tx_power", LaneLayout::Pipe, r"TX Power\(dBM\)\s*:\s*(\S+)")
        .lane("rx_power", LaneLayout::Pipe, r"RX Power\(dBM\)\s*:\s*(\S+)")
        .into();
}

fn transceiver_command(ifname: &str) -> String {
    format!("display transceiver verbose interface {ifname}")
}

/// A physically up port and what its transceiver reported.
struct Port {
    ifname: String,
    alias: String,
    /// Scalar record first, then one record per lane.
    transceiver: Vec<Record>,
}

impl Port {
    fn scalars(&self) -> Option<&Record> {
        self.transceiver.first()
    }

    fn lanes(&self) -> &[Record] {
        self.transceiver.get(1..).unwrap_or_default()
    }

    fn multi_lane(&self) -> bool {
        self.scalars().is_some_and(|scalars| scalars.lane_count() > 1)
    }

    fn samples(&self) -> Vec<MetricSample> {
        let Some(scalars) = self.scalars() else {
            return Vec::new();
        };
        let ifname = self.ifname.as_str();
        let mut samples = Vec::new();

        if self.multi_lane() {
            samples.push(MetricSample::new(
                ItemKey::new("tempML").param(ifname).param("0"),
                number(scalars, "temperature"),
            ));
            samples.push(MetricSample::new(
                ItemKey::new("voltML").param(ifname).param("0"),
                number(scalars, "voltage"),
            ));
            for record in self.lanes() {
                let Some(lane) = record.lane() else {
                    continue;
                };
                for (field, name) in LANE_METRICS {
                    samples.push(
                        MetricSample::new(
                            ItemKey::new(format!("{name}ML")).param(ifname).param(lane.to_string()),
                            number(record, field),
                        )
                        .lane(lane),
                    );
                }
            }
        } else {
            samples.push(MetricSample::new(ItemKey::new("temp").param(ifname), number(scalars, "temperature")));
            samples.push(MetricSample::new(ItemKey::new("volt").param(ifname), number(scalars, "voltage")));
            if let Some(lane) = self.lanes().first() {
                for (field, name) in LANE_METRICS {
                    samples.push(MetricSample::new(ItemKey::new(name).param(ifname), number(lane, field)));
                }
            }
        }
        samples
    }
}

/// Huawei CE/S switches: transceivers, BGP peers, power, fans and version.
pub struct HuaweiSwitchCollector<'a> {
    aliases: &'a dyn AliasSource,
}

impl<'a> HuaweiSwitchCollector<'a> {
    pub fn new(aliases: &'a dyn AliasSource) -> Self {
        Self { aliases }
    }

    fn ports(&self, executor: &mut Executor<'_>) -> Result<Vec<Port>, TransportError> {
        let mut ports = Vec::new();
        for interface in fetch(executor, INTERFACES, CommandCost::Light, &ETHERNET_PORTS)? {
            let Some(ifname) = interface.text("ifname") else {
                continue;
            };
            // Down ports usually have no module plugged.
            if interface.text("phy") != Some("up") {
                continue;
            }
            let transceiver = fetch(executor, &transceiver_command(ifname), CommandCost::Heavy, &TRANSCEIVER)?;
            let alias = self
                .aliases
                .alias(ifname)
                .or_else(|| interface.text("description").map(str::to_string))
                .unwrap_or_else(|| "No Description".to_string());
            ports.push(Port {
                ifname: ifname.to_string(),
                alias,
                transceiver,
            });
        }
        debug!(ports = ports.len(), "ports up");
        Ok(ports)
    }

    fn peer_samples(&self, executor: &mut Executor<'_>, command: &str, prefix: &str) -> Result<Vec<MetricSample>, TransportError> {
        let mut samples = Vec::new();
        for peer in fetch(executor, command, CommandCost::Heavy, &PEERS)? {
            let Some(address) = peer.text("peer") else {
                continue;
            };
            let key = |metric: &str| ItemKey::new(format!("{prefix}.{metric}")).param(address);
            let state = peer.text("state");
            samples.push(MetricSample::new(key("remote_as"), number(&peer, "remote_as")));
            samples.push(MetricSample::new(key("state"), state.map(MetricValue::text)));
            samples.push(MetricSample::new(
                key("state_num"),
                state.map(|state| MetricValue::Integer(BGP_ESTABLISHED.lookup(state))),
            ));
            samples.push(MetricSample::new(key("received_routes"), number(&peer, "received")));
        }
        Ok(samples)
    }

    fn power_samples(&self, executor: &mut Executor<'_>) -> Result<Vec<MetricSample>, TransportError> {
        let mut samples = Vec::new();
        for module in fetch(executor, POWER, CommandCost::Light, &POWER_MODULES)? {
            let Some(id) = module.text("power_id").map(str::to_lowercase) else {
                continue;
            };
            samples.push(MetricSample::new(
                ItemKey::new(format!("system.power.{id}_state")),
                module.text("state").map(|state| MetricValue::Integer(POWER_SUPPLY.lookup(state))),
            ));
            samples.push(MetricSample::new(
                ItemKey::new(format!("system.power.{id}_power")),
                number(&module, "power"),
            ));
        }

        let consumption = fetch_one(executor, POWER_MANAGE, CommandCost::Light, &POWER_CONSUMPTION)?;
        for (field, name) in [("current", "current_power_w"), ("average", "average_power_w")] {
            // Reported in mW.
            let watts = consumption.number(field).map(|milliwatts| MetricValue::Float(milliwatts / 1000.0));
            samples.push(MetricSample::new(ItemKey::new(format!("system.power.{name}")), watts));
        }
        Ok(samples)
    }

    fn fan_samples(&self, executor: &mut Executor<'_>) -> Result<Vec<MetricSample>, TransportError> {
        let mut samples = Vec::new();
        for fan in fetch(executor, FAN, CommandCost::Light, &FANS)? {
            let Some(id) = fan.text("fan") else {
                continue;
            };
            samples.push(MetricSample::new(
                ItemKey::new(format!("system.fan_{id}_status")),
                fan.text("status").map(|status| MetricValue::Integer(FAN_STATUS.lookup(status))),
            ));
            samples.push(MetricSample::new(
                ItemKey::new(format!("system.fan_{id}_speed_percent")),
                number(&fan, "speed"),
            ));
        }
        Ok(samples)
    }

    fn version_samples(&self, executor: &mut Executor<'_>) -> Result<Vec<MetricSample>, TransportError> {
        let version = fetch_one(executor, VERSION, CommandCost::Light, &VERSION_INFO)?;
        Ok(["software_version", "software_build", "device_model", "uptime", "bootrom_version"]
            .into_iter()
            .map(|field| MetricSample::new(ItemKey::new(format!("system.{field}")), text(&version, field)))
            .collect())
    }
}

impl Collector for HuaweiSwitchCollector<'_> {
    fn discover(&self, executor: &mut Executor<'_>) -> Result<Vec<DiscoveryDocument>, TransportError> {
        let mut builder = DiscoveryBuilder::new([SFP_KEY, PEERS_KEY, PEERS_V6_KEY, LANES_KEY]);

        for port in self.ports(executor)? {
            builder.add(
                SFP_KEY,
                DiscoveryEntity::new()
                    .with("{#IFNAME}", port.ifname.as_str())
                    .with("{#IFALIAS}", port.alias.as_str()),
            );
            if !port.multi_lane() {
                continue;
            }
            for lane in port.lanes().iter().filter_map(Record::lane) {
                let label = LabelBuilder::new()
                    .part("", &port.ifname)
                    .part(" - ", &port.alias)
                    .part(" ", &format!("Lane {lane}"))
                    .build();
                builder.add(
                    LANES_KEY,
                    DiscoveryEntity::new()
                        .with("{#IFNAME}", port.ifname.as_str())
                        .with("{#IFALIAS}", port.alias.as_str())
                        .with("{#GBIC_LANE}", lane.to_string())
                        .with("{#LABEL}", label),
                );
            }
        }

        for (command, key, name) in [(BGP_V4, PEERS_KEY, "{#BGP_PEER}"), (BGP_V6, PEERS_V6_KEY, "{#BGP_PEER_V6}")] {
            for peer in fetch(executor, command, CommandCost::Heavy, &PEERS)? {
                if let Some(address) = peer.text("peer") {
                    builder.add(key, DiscoveryEntity::new().with(name, address));
                }
            }
        }

        Ok(builder.build())
    }

    fn collect(&self, executor: &mut Executor<'_>) -> Result<Vec<MetricGroup>, TransportError> {
        let mut system = self.peer_samples(executor, BGP_V4, "bgp.peer")?;
        system.extend(self.peer_samples(executor, BGP_V6, "bgp.peer.v6")?);
        system.extend(self.power_samples(executor)?);
        system.extend(self.fan_samples(executor)?);
        system.extend(self.version_samples(executor)?);

        let transceivers = self.ports(executor)?.iter().flat_map(Port::samples).collect();

        Ok(vec![MetricGroup::individual(system), MetricGroup::batch(transceivers)])
    }

    fn name(&self) -> &'static str {
        "huawei-switch"
    }
}
