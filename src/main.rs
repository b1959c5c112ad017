use clap::Parser;
use color_eyre::Result;
use netcli_collector::{
    init_errors,
    init_logging,
    run,
    Args,
};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    init_errors()?;
    let args = Args::parse();
    init_logging(args.debug())?;
    run(args)
}
