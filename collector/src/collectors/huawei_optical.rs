use super::{
    fetch,
    number,
    Collector,
};
use crate::{
    discovery::{
        AliasSource,
        DiscoveryBuilder,
        DiscoveryDocument,
        DiscoveryEntity,
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
        Extractor,
        LaneLayout,
        MultiLaneSpec,
        ParserSpec,
        Record,
        TabularSpec,
    },
};
use lazy_static::lazy_static;

const INTERFACES: &str = "display interface description | no-more";

const LANES_KEY: &str = "discovery_gbic";
const MODULES_KEY: &str = "discovery_gbic_temp_volt";

/// Per-lane readings, in send order.
const LANE_METRICS: [&str; 3] = ["curr", "txpower", "rxpower"];

lazy_static! {
    static ref DESCRIBED_100GE: ParserSpec = TabularSpec::new(r"^100GE\S*\s+\S+\s+\S+")
        .column("ifname", 0)
        .rest("description", 3)
        .into();
    static ref OPTICAL_MODULE: ParserSpec = MultiLaneSpec::new()
        .scalar(Extractor::pattern("temp", r"Temperature\(C\)\s+([-\d.]+)"))
        .scalar(Extractor::pattern("volt", r"Supply Voltage\(V\)\s+([-\d.]+)"))
        .lane("curr", LaneLayout::Indexed, r"Tx(\d+) Bias\(mA\)\s+([-\d.]+)")
        .lane("txpower", LaneLayout::Indexed, r"Tx(\d+) Power\(avg dBm\)\s+([-\d.]+)")
        .lane("rxpower", LaneLayout::Indexed, r"Rx(\d+) Power\(avg dBm\)\s+([-\d.]+)")
        .into();
}

fn module_command(ifname: &str) -> String {
    format!("display optical-module extend information interface {ifname} | no-more")
}

fn lane_label(lane: usize) -> String {
    format!("Lane {lane}")
}

/// A described 100GE port and what its optical module reported.
struct Port {
    ifname: String,
    alias: String,
    /// Scalar record first, then one record per lane.
    module: Vec<Record>,
}

/// Huawei routers: 100GE optical modules with `Tx<n>`/`Rx<n>` lane readings.
pub struct HuaweiOpticalCollector<'a> {
    aliases: &'a dyn AliasSource,
}

impl<'a> HuaweiOpticalCollector<'a> {
    pub fn new(aliases: &'a dyn AliasSource) -> Self {
        Self { aliases }
    }

    fn ports(&self, executor: &mut Executor<'_>) -> Result<Vec<Port>, TransportError> {
        let mut ports = Vec::new();
        for interface in fetch(executor, INTERFACES, CommandCost::Light, &DESCRIBED_100GE)? {
            // Undescribed ports are not monitored.
            let (Some(ifname), Some(description)) = (interface.text("ifname"), interface.text("description")) else {
                continue;
            };
            let module = fetch(executor, &module_command(ifname), CommandCost::Heavy, &OPTICAL_MODULE)?;
            ports.push(Port {
                ifname: ifname.to_string(),
                alias: self.aliases.alias(ifname).unwrap_or_else(|| description.to_string()),
                module,
            });
        }
        debug!(ports = ports.len(), "described 100GE ports");
        Ok(ports)
    }
}

impl Collector for HuaweiOpticalCollector<'_> {
    fn discover(&self, executor: &mut Executor<'_>) -> Result<Vec<DiscoveryDocument>, TransportError> {
        let mut builder = DiscoveryBuilder::new([LANES_KEY, MODULES_KEY]);

        for port in self.ports(executor)? {
            for lane in port.module.iter().filter_map(Record::lane) {
                builder.add(
                    LANES_KEY,
                    DiscoveryEntity::new()
                        .with("{#IFNAME}", port.ifname.as_str())
                        .with("{#IFALIAS}", port.alias.as_str())
                        .with("{#GBIC_LANE}", lane_label(lane)),
                );
            }
            builder.add(
                MODULES_KEY,
                DiscoveryEntity::new()
                    .with("{#IFNAME}", port.ifname)
                    .with("{#IFALIAS}", port.alias),
            );
        }

        Ok(builder.build())
    }

    fn collect(&self, executor: &mut Executor<'_>) -> Result<Vec<MetricGroup>, TransportError> {
        let mut samples = Vec::new();

        for port in self.ports(executor)? {
            let Some((scalars, lanes)) = port.module.split_first() else {
                continue;
            };
            for name in ["temp", "volt"] {
                samples.push(MetricSample::new(
                    ItemKey::new(name).param(&port.ifname),
                    number(scalars, name),
                ));
            }
            for record in lanes {
                let Some(lane) = record.lane() else {
                    continue;
                };
                for name in LANE_METRICS {
                    samples.push(
                        MetricSample::new(
                            ItemKey::new(name).param(&port.ifname).param(lane_label(lane)),
                            number(record, name),
                        )
                        .lane(lane),
                    );
                }
            }
        }

        Ok(vec![MetricGroup::individual(samples)])
    }

    fn name(&self) -> &'static str {
        "huawei-optical"
    }
}
