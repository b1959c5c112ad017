//! # Command Executor
//!
//! Runs CLI commands on one device through a single remote shell session and memoizes the
//! raw output for the rest of the run.
//!
//! - **`Connector`** opens a session; **`RemoteShell`** runs one command on it.
//! - **`Executor`** owns the session and the run-scoped **`CommandCache`**. The session is
//!   opened on the first cache miss and closed when the executor is dropped.
//! - **`SshConnector`** is the production transport (password auth, TOFU host keys).

mod cache;
mod ssh;

use crate::{
    deadline::Deadline,
    error::TransportError,
};
pub use cache::CommandCache;
use netcli_collector_config::{
    Endpoint,
    Timeouts,
};
pub use ssh::SshConnector;
use std::time::Duration;

/// How long a command is allowed to run on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCost {
    /// Short status queries.
    Light,
    /// Verbose dumps (peer verbose, transceiver details, JSON exports).
    Heavy,
}

/// An open session on the device.
pub trait RemoteShell {
    /// Runs `command` and returns everything it printed.
    fn run(&mut self, command: &str, timeout: Duration) -> Result<String, TransportError>;

    /// Ends the session. Errors are irrelevant at this point and are swallowed.
    fn close(&mut self);
}

/// Opens sessions on a device.
pub trait Connector {
    fn connect(&self, endpoint: &Endpoint, timeout: Duration) -> Result<Box<dyn RemoteShell>, TransportError>;
}

/// Per-run command runner. Create one per orchestration call and let it drop at the end.
pub struct Executor<'a> {
    endpoint: &'a Endpoint,
    connector: &'a dyn Connector,
    timeouts: Timeouts,
    deadline: Deadline,
    session: Option<Box<dyn RemoteShell>>,
    cache: CommandCache,
    fetches: usize,
    cache_hits: usize,
}

impl<'a> Executor<'a> {
    pub fn new(endpoint: &'a Endpoint, connector: &'a dyn Connector, timeouts: Timeouts, deadline: Deadline) -> Self {
        Self {
            endpoint,
            connector,
            timeouts,
            deadline,
            session: None,
            cache: CommandCache::default(),
            fetches: 0,
            cache_hits: 0,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.endpoint
    }

    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    /// Returns the output of `command`, running it on the device only if this run has not
    /// already done so.
    #[instrument(level = "debug", skip(self), fields(host = %self.endpoint.host))]
    pub fn execute(&mut self, command: &str, cost: CommandCost) -> Result<String, TransportError> {
        if let Some(text) = self.cache.get(self.endpoint, command) {
            self.cache_hits += 1;
            debug!(command, "cache hit");
            return Ok(text.to_string());
        }

        let budget = match cost {
            CommandCost::Light => self.timeouts.exec_light,
            CommandCost::Heavy => self.timeouts.exec_heavy,
        };
        let timeout = self.deadline.clamp(budget).ok_or(TransportError::DeadlineExceeded)?;

        let preamble = self.endpoint.profile.pager_preamble();
        let full_command = match preamble {
            Some(preamble) => format!("{preamble}\n{command}"),
            None => command.to_string(),
        };

        let shell = self.session()?;
        let text = shell.run(&full_command, timeout)?;
        self.fetches += 1;
        debug!(command, bytes = text.len(), "fetched");

        self.cache.insert(self.endpoint, command, text.clone());
        Ok(text)
    }

    /// Number of commands that actually went over the wire.
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits
    }

    fn session(&mut self) -> Result<&mut Box<dyn RemoteShell>, TransportError> {
        let shell = match self.session.take() {
            Some(shell) => shell,
            None => {
                let timeout = self
                    .deadline
                    .clamp(self.timeouts.connect)
                    .ok_or(TransportError::DeadlineExceeded)?;
                info!(address = %self.endpoint.address(), "opening session");
                self.connector.connect(self.endpoint, timeout)?
            }
        };
        Ok(self.session.insert(shell))
    }
}

impl Drop for Executor<'_> {
    fn drop(&mut self) {
        self.cache.clear();
        if let Some(mut session) = self.session.take() {
            debug!(fetches = self.fetches, cache_hits = self.cache_hits, "closing session");
            session.close();
        }
    }
}
