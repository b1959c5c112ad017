//! # Collectors Module
//!
//! Vendor-specific command sets built on the executor, parser engine and discovery builder.
//!
//! ## Architecture
//!
//! - **`Collector` trait**: discovery and collection phases of one vendor family
//! - **`HuaweiBgpCollector`**: routing table sizes and BGP sessions
//! - **`HuaweiHealthCollector`**: CPU, memory, fans, power and IPU temperatures
//! - **`HuaweiOpticalCollector`**: 100GE optical modules, indexed lanes
//! - **`HuaweiSwitchCollector`**: CE/S switch transceivers, BGP, power, fans and version
//! - **`DatacomCollector`**: JSON transceiver export with alias-built labels
//!
//! Parser specs live in `lazy_static` blocks next to each collector and are compiled on
//! first use.

pub mod collector;
mod datacom;
mod huawei_bgp;
mod huawei_health;
mod huawei_optical;
mod huawei_switch;

use crate::{
    discovery::AliasSource,
    error::TransportError,
    executor::{
        CommandCost,
        Executor,
    },
    metrics::MetricValue,
    parser::{
        ParserSpec,
        Record,
    },
};
pub use collector::Collector;
pub use datacom::DatacomCollector;
pub use huawei_bgp::HuaweiBgpCollector;
pub use huawei_health::HuaweiHealthCollector;
pub use huawei_optical::HuaweiOpticalCollector;
pub use huawei_switch::HuaweiSwitchCollector;
use netcli_collector_config::VendorProfile;

/// The collector for `profile`.
pub fn for_profile<'a>(profile: VendorProfile, aliases: &'a dyn AliasSource) -> Box<dyn Collector + 'a> {
    match profile {
        VendorProfile::HuaweiBgp => Box::new(HuaweiBgpCollector),
        VendorProfile::HuaweiHealth => Box::new(HuaweiHealthCollector),
        VendorProfile::HuaweiOptical => Box::new(HuaweiOpticalCollector::new(aliases)),
        VendorProfile::HuaweiSwitch => Box::new(HuaweiSwitchCollector::new(aliases)),
        VendorProfile::DatacomTransceiver => Box::new(DatacomCollector::new(aliases)),
    }
}

/// Runs `command` and parses its output with `spec`.
fn fetch(
    executor: &mut Executor<'_>,
    command: &str,
    cost: CommandCost,
    spec: &ParserSpec,
) -> Result<Vec<Record>, TransportError> {
    let text = executor.execute(command, cost)?;
    let records = spec.parse(&text);
    trace!(command, records = records.len(), "parsed");
    Ok(records)
}

/// Like [`fetch`] for commands that describe a single entity.
fn fetch_one(
    executor: &mut Executor<'_>,
    command: &str,
    cost: CommandCost,
    spec: &ParserSpec,
) -> Result<Record, TransportError> {
    Ok(fetch(executor, command, cost, spec)?.into_iter().next().unwrap_or_default())
}

fn number(record: &Record, field: &str) -> Option<MetricValue> {
    record.text(field).and_then(MetricValue::number)
}

fn text(record: &Record, field: &str) -> Option<MetricValue> {
    record.text(field).map(MetricValue::text)
}
