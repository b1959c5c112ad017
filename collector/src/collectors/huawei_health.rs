use super::{
    fetch,
    fetch_one,
    number,
    text,
    Collector,
};
use crate::{
    discovery::{
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
        MetricValue,
    },
    parser::{
        builtin,
        convert::POWER_SUPPLY,
        KeyValueSpec,
        ParserSpec,
        Record,
        TabularSpec,
    },
};
use lazy_static::lazy_static;
use regex::Regex;

const CPU: &str = "display cpu-usage | no-more";
const MEMORY: &str = "display memory-usage | no-more";
const VERSION: &str = "display version | no-more";
const TEMPERATURE: &str = "display temperature ipu | no-more";
const FAN: &str = "display fan | no-more";
const POWER: &str = "display power | no-more";
const POWER_SUPPLY_INFO: &str = "display power-supply information | no-more";
const HEALTH: &str = "display health | no-more";

const POWER_KEY: &str = "powerInfo";
const SENSOR_KEY: &str = "ipuTemperatureDiscovery";

lazy_static! {
    static ref CPU_USAGE: ParserSpec = KeyValueSpec::new()
        .pattern("cpu", r"System cpu use rate is\s*:\s*(\d+)%")
        .into();
    static ref MEMORY_USAGE: ParserSpec = KeyValueSpec::new()
        .pattern("total", r"System Total Memory Is:\s+(\d+)\s+Kbytes")
        .pattern("used", r"Total Memory Used Is:\s+(\d+)\s+Kbytes")
        .pattern("used_pct", r"Memory Using Percentage Is:\s+(\d+)%")
        .into();
    static ref VERSION_INFO: ParserSpec = KeyValueSpec::new()
        .pattern("version", r"VRP \(R\) software, Version ([\d.]+)")
        .pattern("uptime", r"uptime is ([^\r\n]+)")
        .into();
    static ref IPU_SENSORS: ParserSpec = TabularSpec::new(r"^\S+\s+\d+\s+\d+\s+\d+\s+\S+\s+\d+\s+\d+\s+\d+\s+\d+\s+\d+\s+-?\d+")
        .header(r"^PCB\s+I2C\s+Addr\s+Chl")
        .context("slot", r"Base-Board, Unit:C, Slot (\d+)")
        .column("sensor", 0)
        .column("i2c", 1)
        .column("addr", 2)
        .column("chl", 3)
        .column("temp", 10)
        .into();
    static ref POWER_MODULES: ParserSpec = TabularSpec::new(r"^\d+\s+Yes\s+\w+\s+\w+")
        .column("slot", 0)
        .column("mode", 2)
        .column("state", 3)
        .into();
    static ref TOTAL_POWER: ParserSpec = KeyValueSpec::new()
        .pattern("real", r"Real\s+(\d+)")
        .into();
    static ref HEALTH_SUMMARY: ParserSpec = KeyValueSpec::new()
        .pattern("cpu", r"(\d+)%\s+\d+%\s+\d+MB/\d+MB")
        .pattern("memory_pct", r"\d+%\s+(\d+)%\s+\d+MB/\d+MB")
        .pattern("memory_used", r"\d+%\s+\d+%\s+(\d+)MB/\d+MB")
        .pattern("memory_total", r"\d+%\s+\d+%\s+\d+MB/(\d+)MB")
        .into();
    static ref FAN_SPEED: Regex = builtin(r"\[(\d+)\](\d+)%");
}

/// Huawei routers: system health scalars, power modules and IPU temperature sensors.
#[derive(Debug, Clone, Copy, Default)]
pub struct HuaweiHealthCollector;

impl HuaweiHealthCollector {
    fn sensors(&self, executor: &mut Executor<'_>) -> Result<Vec<Sensor>, TransportError> {
        Ok(fetch(executor, TEMPERATURE, CommandCost::Heavy, &IPU_SENSORS)?
            .iter()
            .filter_map(Sensor::from_record)
            .collect())
    }

    fn memory_samples(&self, executor: &mut Executor<'_>) -> Result<Vec<MetricSample>, TransportError> {
        let memory = fetch_one(executor, MEMORY, CommandCost::Light, &MEMORY_USAGE)?;
        let field = |name| memory.text(name).and_then(|value| value.parse::<i64>().ok());

        // The device prints all three or none of them.
        let (total, used, used_pct) = match (field("total"), field("used"), field("used_pct")) {
            (Some(total), Some(used), Some(used_pct)) => (Some(total), Some(used), Some(used_pct)),
            _ => (None, None, None),
        };

        Ok([
            ("memoryTotal", total),
            ("memoryUsed", used),
            ("memoryFree", total.zip(used).map(|(total, used)| total - used)),
            ("memoryUsedPercentage", used_pct),
            ("memoryFreePercentage", used_pct.map(|used_pct| 100 - used_pct)),
        ]
        .into_iter()
        .map(|(key, value)| MetricSample::new(ItemKey::new(key), value.map(MetricValue::Integer)))
        .collect())
    }
}

/// One IPU temperature sensor row.
struct Sensor {
    slot: String,
    name: String,
    i2c: String,
    addr: String,
    chl: String,
    temp: Option<MetricValue>,
}

impl Sensor {
    fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            slot: record.text("slot").unwrap_or("unknown").to_string(),
            name: record.text("sensor")?.to_string(),
            i2c: record.text("i2c")?.to_string(),
            addr: record.text("addr")?.to_string(),
            chl: record.text("chl")?.to_string(),
            temp: number(record, "temp"),
        })
    }

    fn key(&self) -> ItemKey {
        ItemKey::new("temperatureInfo")
            .param(&self.slot)
            .param(&self.name)
            .param(&self.i2c)
            .param(&self.addr)
            .param(&self.chl)
    }
}

fn mean_fan_speed(output: &str) -> Option<f64> {
    let speeds: Vec<f64> = FAN_SPEED
        .captures_iter(output)
        .filter_map(|caps| caps.get(2)?.as_str().parse::<f64>().ok())
        .collect();
    (!speeds.is_empty()).then(|| speeds.iter().sum::<f64>() / speeds.len() as f64)
}

impl Collector for HuaweiHealthCollector {
    fn discover(&self, executor: &mut Executor<'_>) -> Result<Vec<DiscoveryDocument>, TransportError> {
        let mut builder = DiscoveryBuilder::new([POWER_KEY, SENSOR_KEY]);

        for module in fetch(executor, POWER, CommandCost::Light, &POWER_MODULES)? {
            let (Some(slot), Some(mode), Some(state)) = (module.text("slot"), module.text("mode"), module.text("state"))
            else {
                continue;
            };
            builder.add(
                POWER_KEY,
                DiscoveryEntity::new()
                    .with("{#SLOT}", slot)
                    .with("{#MODE}", mode)
                    .with("{#STATE}", state)
                    .with("{#STATUS}", POWER_SUPPLY.lookup(state).to_string()),
            );
        }

        for sensor in self.sensors(executor)? {
            builder.add(
                SENSOR_KEY,
                DiscoveryEntity::new()
                    .with("{#SLOT}", sensor.slot)
                    .with("{#SENSOR_NAME}", sensor.name)
                    .with("{#I2C}", sensor.i2c)
                    .with("{#ADDR}", sensor.addr)
                    .with("{#CHL}", sensor.chl),
            );
        }

        Ok(builder.build())
    }

    fn collect(&self, executor: &mut Executor<'_>) -> Result<Vec<MetricGroup>, TransportError> {
        let cpu = fetch_one(executor, CPU, CommandCost::Light, &CPU_USAGE)?;
        let version = fetch_one(executor, VERSION, CommandCost::Light, &VERSION_INFO)?;
        let uptime = version
            .text("uptime")
            .map(|uptime| uptime.split("Patch").next().unwrap_or(uptime).trim())
            .filter(|uptime| !uptime.is_empty())
            .map(MetricValue::text);
        let fan_mean = mean_fan_speed(&executor.execute(FAN, CommandCost::Light)?);
        let power = fetch_one(executor, POWER_SUPPLY_INFO, CommandCost::Light, &TOTAL_POWER)?;
        let health = fetch_one(executor, HEALTH, CommandCost::Light, &HEALTH_SUMMARY)?;

        let mut system = vec![MetricSample::new(ItemKey::new("cpuUsage"), number(&cpu, "cpu"))];
        system.extend(self.memory_samples(executor)?);
        system.extend([
            MetricSample::new(ItemKey::new("firmwareVersion"), text(&version, "version")),
            MetricSample::new(ItemKey::new("firmwareUptime"), uptime),
            MetricSample::new(ItemKey::new("fanMean"), fan_mean.map(MetricValue::Float)),
            MetricSample::new(ItemKey::new("total_power_usage"), number(&power, "real")),
            MetricSample::new(ItemKey::new("healthCpuUsage"), number(&health, "cpu")),
            MetricSample::new(ItemKey::new("healthMemoryUsage"), number(&health, "memory_pct")),
            MetricSample::new(ItemKey::new("healthMemoryUsed"), number(&health, "memory_used")),
            MetricSample::new(ItemKey::new("healthMemoryTotal"), number(&health, "memory_total")),
        ]);

        let temperatures = self
            .sensors(executor)?
            .into_iter()
            .map(|sensor| {
                let key = sensor.key();
                MetricSample::new(key, sensor.temp)
            })
            .collect();

        Ok(vec![MetricGroup::batch(temperatures), MetricGroup::individual(system)])
    }

    fn name(&self) -> &'static str {
        "huawei-health"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metrics::Delivery,
        testing::with_device,
    };
    use netcli_collector_config::VendorProfile;
    use pretty_assertions::assert_eq;

    const TEMPERATURES: &str = "\
Base-Board, Unit:C, Slot 1
PCB    I2C  Addr  Chl  Status  Minor  Major  Fatal  Adj  Fan  Temp(C)
------------------------------------------------------------------
IPU    0    72    0    NORMAL  75     85     95     0    40   41
IPU    0    73    1    NORMAL  75     85     95     0    40   39
";

    fn replies() -> Vec<(&'static str, &'static str)> {
        vec![
            (CPU, "System cpu use rate is : 12%\n"),
            (
                MEMORY,
                "System Total Memory Is: 4000 Kbytes\nTotal Memory Used Is: 1000 Kbytes\nMemory Using Percentage Is: 25%\n",
            ),
            (
                VERSION,
                "VRP (R) software, Version 8.180 (NE40E V800R011C00SPC607B607)\nHUAWEI NE40E-X8A uptime is 120 days, 3 hours, 12 minutes\nPatch Version: V800R011SPH",
            ),
            (TEMPERATURE, TEMPERATURES),
            (FAN, " FanSpeed: [No.]Speed\n [1]35% [2]40%\n"),
            (POWER, "PowerNo  Present  Mode  State\n1        Yes      AC    Normal\n2        Yes      DC    Abnormal\n"),
            (POWER_SUPPLY_INFO, "Real   350 W\n"),
        ]
    }

    fn wire(group: &MetricGroup) -> Vec<(String, Option<String>)> {
        group
            .samples
            .iter()
            .map(|sample| (sample.key.to_string(), sample.wire_value()))
            .collect()
    }

    #[test]
    fn discovers_power_modules_and_sensors() {
        let documents = with_device(VendorProfile::HuaweiHealth, &replies(), |executor| {
            HuaweiHealthCollector.discover(executor).unwrap()
        });

        assert_eq!(
            documents[0].to_json().unwrap(),
            r#"{"data":[{"{#SLOT}":"1","{#MODE}":"AC","{#STATE}":"Normal","{#STATUS}":"1"},{"{#SLOT}":"2","{#MODE}":"DC","{#STATE}":"Abnormal","{#STATUS}":"0"}]}"#
        );
        assert_eq!(documents[1].key, "ipuTemperatureDiscovery");
        assert_eq!(documents[1].entities.len(), 2);
        assert_eq!(documents[1].entities[1].get("{#ADDR}"), Some("73"));
    }

    #[test]
    fn temperatures_go_out_as_one_batch() {
        let groups = with_device(VendorProfile::HuaweiHealth, &replies(), |executor| {
            HuaweiHealthCollector.collect(executor).unwrap()
        });

        assert_eq!(groups[0].delivery, Delivery::Batch);
        assert_eq!(
            wire(&groups[0]),
            vec![
                ("temperatureInfo[1,IPU,0,72,0]".to_string(), Some("41".to_string())),
                ("temperatureInfo[1,IPU,0,73,1]".to_string(), Some("39".to_string())),
            ]
        );
    }

    #[test]
    fn system_scalars() {
        let groups = with_device(VendorProfile::HuaweiHealth, &replies(), |executor| {
            HuaweiHealthCollector.collect(executor).unwrap()
        });

        let system = wire(&groups[1]);
        let value = |key: &str| {
            system
                .iter()
                .find(|(name, _)| name == key)
                .and_then(|(_, value)| value.clone())
        };
        assert_eq!(value("cpuUsage").as_deref(), Some("12"));
        assert_eq!(value("memoryFree").as_deref(), Some("3000"));
        assert_eq!(value("memoryFreePercentage").as_deref(), Some("75"));
        assert_eq!(value("firmwareVersion").as_deref(), Some("8.180"));
        assert_eq!(value("firmwareUptime").as_deref(), Some("120 days, 3 hours, 12 minutes"));
        assert_eq!(value("fanMean").as_deref(), Some("37.5"));
        assert_eq!(value("total_power_usage").as_deref(), Some("350"));
        assert_eq!(value("healthCpuUsage"), None);
    }
}
