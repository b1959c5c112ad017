#[macro_use]
extern crate tracing;

mod endpoint;
mod error;
mod overrides;
mod profile;

pub use endpoint::{
    validate_target,
    Credentials,
    Endpoint,
};
pub use error::UsageError;
pub use overrides::Overrides;
pub use profile::VendorProfile;
use directories::ProjectDirs;
use lazy_static::lazy_static;
use serde::{
    Deserialize,
    Deserializer,
};
use std::{
    collections::BTreeMap,
    env,
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

lazy_static! {
    static ref PROJECT_DIRS: Option<ProjectDirs> = ProjectDirs::from("net", "netcli", "netcli-collector");
}

/// A directory the collector keeps files in. `NETCLI_COLLECTOR_CONFIG` and
/// `NETCLI_COLLECTOR_DATA` relocate them.
#[derive(Clone, Copy, Debug)]
enum StateDir {
    Config,
    Data,
}

impl StateDir {
    fn locate(self) -> PathBuf {
        let (variable, fallback) = match self {
            StateDir::Config => ("NETCLI_COLLECTOR_CONFIG", ".config"),
            StateDir::Data => ("NETCLI_COLLECTOR_DATA", ".data"),
        };
        if let Some(path) = env::var_os(variable) {
            return PathBuf::from(path);
        }
        match PROJECT_DIRS.as_ref() {
            Some(dirs) => match self {
                StateDir::Config => dirs.config_local_dir().to_path_buf(),
                StateDir::Data => dirs.data_local_dir().to_path_buf(),
            },
            None => PathBuf::from(".").join(fallback),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    data_dir: PathBuf,
    #[serde(default)]
    config_dir: PathBuf,
    #[serde(default)]
    pub profile: VendorProfile,
    pub timeouts: Timeouts,
    pub sender: SenderConfig,
    #[serde(default)]
    pub known_hosts: Option<PathBuf>,
    #[serde(default)]
    pub aliases: Vec<AliasEntry>,
}

/// Every blocking call is bounded by one of these, and all of them by `run_deadline`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct Timeouts {
    #[serde(deserialize_with = "humantime_duration")]
    pub connect: Duration,
    #[serde(deserialize_with = "humantime_duration")]
    pub exec_light: Duration,
    #[serde(deserialize_with = "humantime_duration")]
    pub exec_heavy: Duration,
    #[serde(deserialize_with = "humantime_duration")]
    pub sender: Duration,
    #[serde(deserialize_with = "humantime_duration")]
    pub run_deadline: Duration,
}

/// How to reach the local `zabbix_sender` utility and the server it talks to.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct SenderConfig {
    /// Explicit path to the sender binary. Looked up on `PATH` when unset.
    #[serde(default)]
    pub binary: Option<PathBuf>,
    pub server: String,
    #[serde(default)]
    pub port: Option<u16>,
}

/// Static interface alias, standing in for an SNMP `ifAlias` lookup.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct AliasEntry {
    pub interface: String,
    pub alias: String,
}

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl Config {
    /// Layers the embedded defaults, `config.yaml` from the config directory, the
    /// `NETCLI_COLLECTOR__*` environment and finally the command line.
    pub fn new(overrides: Overrides) -> Result<Self, config::ConfigError> {
        Self::with_config_dir(StateDir::Config.locate(), overrides)
    }

    pub fn with_config_dir(config_dir: impl AsRef<Path>, overrides: Overrides) -> Result<Self, config::ConfigError> {
        let config_dir = config_dir.as_ref();
        let data_dir = StateDir::Data.locate();
        let mut builder = config::Config::builder()
            .set_default("data_dir", data_dir.to_string_lossy().to_string())?
            .set_default("config_dir", config_dir.to_string_lossy().to_string())?;

        builder = builder.add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        let config_files = [("config.yaml", config::FileFormat::Yaml)];

        for (file, format) in &config_files {
            let source = config::File::from(config_dir.join(file))
                .format(*format)
                .required(false);
            builder = builder.add_source(source);
        }

        builder = builder.add_source(
            config::Environment::with_prefix("NETCLI_COLLECTOR")
                .prefix_separator("__")
                .separator("__"),
        );

        builder = builder.add_source(overrides);

        let cfg: Self = builder.build()?.try_deserialize()?;
        debug!(profile = %cfg.profile, config_dir = ?cfg.config_dir, "configuration loaded");

        Ok(cfg)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Where trust-on-first-use host keys are remembered.
    pub fn known_hosts_path(&self) -> PathBuf {
        self.known_hosts
            .clone()
            .unwrap_or_else(|| self.data_dir.join("known_hosts"))
    }

    pub fn alias_map(&self) -> BTreeMap<String, String> {
        self.aliases
            .iter()
            .map(|entry| (entry.interface.clone(), entry.alias.clone()))
            .collect()
    }
}

fn humantime_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    #[test]
    fn default_config_parses() {
        let config = Config::default();
        assert_eq!(config.profile, VendorProfile::HuaweiSwitch);
        assert_eq!(config.timeouts.connect, Duration::from_secs(10));
        assert_eq!(config.timeouts.exec_light, Duration::from_secs(20));
        assert_eq!(config.timeouts.exec_heavy, Duration::from_secs(60));
        assert_eq!(config.timeouts.run_deadline, Duration::from_secs(30));
        assert_eq!(config.sender.server, "127.0.0.1");
        assert!(config.aliases.is_empty());
    }

    #[test]
    fn config_file_and_overrides_are_layered() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            r#"
profile: huawei-bgp
timeouts:
  exec_heavy: 45s
sender:
  server: 10.1.1.1
  port: 10052
aliases:
  - interface: ten-gigabit-ethernet-1/1/1
    alias: UPLINK-CORE
"#,
        )
        .unwrap();

        let config = Config::with_config_dir(
            dir.path(),
            Overrides {
                profile: Some(VendorProfile::DatacomTransceiver),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(config.profile, VendorProfile::DatacomTransceiver);
        assert_eq!(config.timeouts.exec_heavy, Duration::from_secs(45));
        assert_eq!(config.timeouts.exec_light, Duration::from_secs(20));
        assert_eq!(config.sender.server, "10.1.1.1");
        assert_eq!(config.sender.port, Some(10052));
        assert_eq!(
            config.alias_map().get("ten-gigabit-ethernet-1/1/1").map(String::as_str),
            Some("UPLINK-CORE")
        );
        assert_eq!(config.config_dir(), dir.path());
    }

    #[test]
    fn loaded_config_keeps_host_keys_in_the_data_dir() {
        let dir = TempDir::new().unwrap();
        let config = Config::with_config_dir(dir.path(), Overrides::default()).unwrap();

        assert_eq!(config.data_dir(), StateDir::Data.locate());
        assert!(!config.data_dir().as_os_str().is_empty());
        assert_eq!(config.known_hosts_path(), config.data_dir().join("known_hosts"));
    }

    #[test]
    fn known_hosts_defaults_to_the_data_dir() {
        let config = Config::default();
        assert_eq!(config.known_hosts_path(), config.data_dir().join("known_hosts"));
    }
}
