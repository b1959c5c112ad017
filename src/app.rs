use crate::Args;
use eyre::{
    Context as _,
    Result,
};
use netcli_collector_config::{
    validate_target,
    Config,
    Endpoint,
    Overrides,
    UsageError,
};
use netcli_collector_core::{
    Orchestrator,
    RunMode,
    RunStatus,
    SshConnector,
    StaticAliases,
    ZabbixSender,
};
use std::{
    process::ExitCode,
    str::FromStr,
};

/// Exit code for bad invocations, matching clap's own.
const USAGE_EXIT: u8 = 2;

/// Runs one invocation and prints its summary line: SUCCESS or PARTIAL on stdout,
/// ERROR on stderr.
///
/// # Errors
/// Only for problems with the local setup, such as an unreadable configuration file.
/// Everything about the device ends up in the summary line.
#[instrument(level = "debug", skip_all, fields(mode = %args.mode, host = %args.host, target = %args.target))]
pub fn run(args: Args) -> Result<ExitCode> {
    let mode = match RunMode::from_str(&args.mode) {
        Ok(mode) => mode,
        Err(_) => return Ok(usage_error(UsageError::UnknownMode(args.mode.clone()))),
    };
    if let Err(e) = validate_target(&args.target) {
        return Ok(usage_error(e));
    }

    let config = Config::new(Overrides {
        profile: args.profile,
        known_hosts: args.known_hosts.clone(),
        sender_binary: args.sender.clone(),
    })
    .wrap_err("loading configuration")?;

    let endpoint = match Endpoint::parse(&args.host, &args.port, &args.user, &args.password, config.profile) {
        Ok(endpoint) => endpoint,
        Err(e) => return Ok(usage_error(e)),
    };

    let sender = match ZabbixSender::from_config(&config.sender) {
        Ok(sender) => sender,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };
    let connector = SshConnector::new(config.known_hosts_path());
    let aliases = StaticAliases::new(config.alias_map());

    let orchestrator = Orchestrator::new(endpoint, args.target, config.timeouts, &connector, &sender, &aliases);
    let outcome = orchestrator.run(mode);

    if outcome.status == RunStatus::Failed {
        eprintln!("{outcome}");
        return Ok(ExitCode::FAILURE);
    }
    println!("{outcome}");
    Ok(ExitCode::SUCCESS)
}

fn usage_error(error: UsageError) -> ExitCode {
    eprintln!("ERROR: {error}");
    ExitCode::from(USAGE_EXIT)
}
