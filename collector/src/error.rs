use std::time::Duration;

pub use netcli_collector_config::UsageError;

/// Talking to the device failed. Fatal for the run.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("could not resolve {address}: {source}")]
    Resolve {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("connecting to {address} failed: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("SSH handshake with {address} failed: {source}")]
    Handshake {
        address: String,
        #[source]
        source: ssh2::Error,
    },
    #[error("authentication as {user:?} was rejected")]
    Authentication { user: String },
    #[error("host key for {host} does not match the one remembered in {known_hosts}")]
    HostKeyMismatch { host: String, known_hosts: String },
    #[error("host key check failed: {0}")]
    HostKey(String),
    #[error("running {command:?} failed: {source}")]
    Exec {
        command: String,
        #[source]
        source: ssh2::Error,
    },
    #[error("reading output of {command:?} failed: {source}")]
    Read {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command:?} did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("output of {command:?} is unusable: {reason}")]
    Unusable { command: String, reason: String },
    #[error("run deadline exceeded")]
    DeadlineExceeded,
}

/// One metric or batch could not be handed to the monitoring server. Counted, never fatal
/// on its own.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("sender utility {0:?} not found")]
    SenderNotFound(String),
    #[error("spawning the sender failed: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("sender exited with {code:?}: {stderr}")]
    Rejected { code: Option<i32>, stderr: String },
    #[error("sender did not finish within {0:?}")]
    Timeout(Duration),
    #[error("encoding the discovery document failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("run deadline exceeded")]
    DeadlineExceeded,
}

/// Everything that can end a run early.
#[derive(thiserror::Error, Debug)]
pub enum CollectorError {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("sending discovery {key:?} failed: {source}")]
    Discovery {
        key: String,
        #[source]
        source: DeliveryError,
    },
}
