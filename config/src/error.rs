/// Bad invocation or configuration, detected before any network I/O.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("macro {macro_name} was not resolved by the monitoring server (got {value:?})")]
    UnresolvedMacro { macro_name: &'static str, value: String },
    #[error("invalid SSH port {0:?}: must be a number between 1 and 65535")]
    InvalidPort(String),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("unknown mode {0:?}: use launch_discovery or collect")]
    UnknownMode(String),
}
