use color_eyre::Result;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

/// Crate targets raised to `debug` by `--verbose`.
const DEBUG_FILTER: &str = "warn,netcli_collector=debug,netcli_collector_core=debug,netcli_collector_config=debug";

pub fn init_errors() -> Result<()> {
    color_eyre::install()
}

/// Logs go to stderr so stdout carries nothing but the summary line. `RUST_LOG` wins over
/// `verbose`.
pub fn init_logging(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { DEBUG_FILTER } else { "warn" }));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(filter))
        .with(tracing_error::ErrorLayer::default())
        .try_init()?;
    Ok(())
}
