//! # Network CLI Collector Core
//!
//! Polls network devices that only expose an interactive CLI and turns their screen output
//! into low-level discovery documents and trapper metrics.
//!
//! ## Architecture
//!
//! - **`executor`**: one lazily opened SSH session per run and a run-scoped command cache
//! - **`parser`**: data-driven `ParserSpec`s (tabular, key-value, multi-lane) and value
//!   conversions
//! - **`discovery`**: discovery documents, label construction and alias lookup
//! - **`delivery`**: `zabbix_sender` based item and batch delivery with success/error counts
//! - **`collectors`**: one `Collector` per vendor profile
//! - **`orchestrator`**: sequences discovery and collection and reports a single outcome
//!
//! Everything is synchronous. The only cancellation is the run-wide [`Deadline`] passed to
//! every blocking call.

#[macro_use]
extern crate tracing;

pub mod collectors;
pub mod deadline;
pub mod delivery;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod orchestrator;
pub mod parser;
#[cfg(test)]
mod testing;

pub use deadline::Deadline;
pub use delivery::{
    DeliveryEngine,
    DeliveryOutcome,
    DeliveryStatus,
    TrapperLine,
    TrapperSender,
    ZabbixSender,
};
pub use discovery::{
    AliasSource,
    NoAliases,
    StaticAliases,
};
pub use error::{
    CollectorError,
    DeliveryError,
    TransportError,
    UsageError,
};
pub use executor::{
    CommandCost,
    Connector,
    Executor,
    RemoteShell,
    SshConnector,
};
pub use orchestrator::{
    Orchestrator,
    RunMode,
    RunOutcome,
    RunStatus,
};
