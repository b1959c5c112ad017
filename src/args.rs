use clap::Parser;
use netcli_collector_config::VendorProfile;
use std::path::PathBuf;

/// Polls a CLI-only network device over SSH and pushes discovery documents and metrics
/// to a Zabbix trapper.
///
/// Meant to be called by the monitoring server as an external check, which passes the
/// device macros as positional arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "collector", author, version, about, long_about = None)]
pub struct Args {
    /// `launch_discovery` sends discovery documents and then metrics, `collect` only metrics.
    pub mode: String,

    /// Device address.
    pub host: String,

    /// SSH port.
    pub port: String,

    /// SSH user.
    pub user: String,

    /// SSH password.
    pub password: String,

    /// Host name the monitoring server knows the device under.
    pub target: String,

    /// `debug` turns on debug logging, like `--verbose`.
    pub extra: Option<String>,

    /// Device family. Defaults to the configured profile.
    #[arg(long, env = "NETCLI_COLLECTOR_PROFILE")]
    pub profile: Option<VendorProfile>,

    /// Enable debug logging on stderr.
    #[arg(short, long)]
    pub verbose: bool,

    /// OpenSSH known_hosts file for trust-on-first-use host keys.
    #[arg(long)]
    pub known_hosts: Option<PathBuf>,

    /// Path to the `zabbix_sender` binary.
    #[arg(long)]
    pub sender: Option<PathBuf>,
}

impl Args {
    pub fn debug(&self) -> bool {
        self.verbose || self.extra.as_deref().is_some_and(|extra| extra.eq_ignore_ascii_case("debug"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("collector").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn positionals_in_external_check_order() {
        let args = parse(&["collect", "10.0.0.1", "2222", "monitor", "secret", "edge-01"]);
        assert_eq!(args.mode, "collect");
        assert_eq!(args.host, "10.0.0.1");
        assert_eq!(args.port, "2222");
        assert_eq!(args.target, "edge-01");
        assert_eq!(args.extra, None);
        assert!(!args.debug());
    }

    #[test]
    fn trailing_debug_enables_debug_logging() {
        let args = parse(&["launch_discovery", "10.0.0.1", "22", "monitor", "secret", "edge-01", "DEBUG"]);
        assert!(args.debug());
    }

    #[test]
    fn profile_by_name() {
        let args = parse(&[
            "--profile",
            "datacom-transceiver",
            "collect",
            "10.0.0.1",
            "22",
            "monitor",
            "secret",
            "edge-01",
        ]);
        assert_eq!(args.profile, Some(VendorProfile::DatacomTransceiver));
    }
}
