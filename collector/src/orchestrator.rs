//! One run against one device: discovery and/or collection, then a single outcome.

use crate::{
    collectors::{
        self,
        Collector,
    },
    deadline::Deadline,
    delivery::{
        DeliveryEngine,
        TrapperSender,
    },
    discovery::AliasSource,
    error::CollectorError,
    executor::{
        Connector,
        Executor,
    },
};
use netcli_collector_config::{
    Endpoint,
    Timeouts,
};
use std::{
    fmt,
    time::{
        Duration,
        Instant,
    },
};
use strum::{
    Display,
    EnumString,
};

/// What a run does, as named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum RunMode {
    /// Send discovery documents, then metrics.
    #[strum(serialize = "launch_discovery")]
    DiscoveryAndCollect,
    /// Metrics only.
    #[strum(serialize = "collect")]
    CollectOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RunStatus {
    Success,
    Partial,
    Failed,
}

/// Everything a run has to report.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub success_count: usize,
    pub error_count: usize,
    /// Samples with no reading and no sentinel. Never failures.
    pub skipped_count: usize,
    /// Why a `Failed` run stopped.
    pub failure: Option<String>,
    pub elapsed: Duration,
    /// Commands that went over the wire.
    pub fetches: usize,
    pub cache_hits: usize,
}

impl RunOutcome {
    fn new(result: Result<(), CollectorError>, delivery: &DeliveryEngine<'_>, elapsed: Duration) -> Self {
        let success_count = delivery.success_count();
        let error_count = delivery.error_count();
        let (status, failure) = match result {
            Err(e) => (RunStatus::Failed, Some(e.to_string())),
            Ok(()) if error_count > 0 => (RunStatus::Partial, None),
            Ok(()) => (RunStatus::Success, None),
        };
        Self {
            status,
            success_count,
            error_count,
            skipped_count: delivery.skipped_count(),
            failure,
            elapsed,
            fetches: 0,
            cache_hits: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.success_count + self.error_count
    }
}

/// The one line the monitoring server shows for this run.
impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            RunStatus::Success => write!(f, "SUCCESS"),
            RunStatus::Partial => write!(f, "PARTIAL ({} of {} failed)", self.error_count, self.total()),
            RunStatus::Failed => write!(f, "ERROR: {}", self.failure.as_deref().unwrap_or("run failed")),
        }
    }
}

/// Sequences the phases of a run. Holds no state between runs: every run gets its own
/// deadline, command cache and session.
pub struct Orchestrator<'a> {
    endpoint: Endpoint,
    target: String,
    timeouts: Timeouts,
    connector: &'a dyn Connector,
    sender: &'a dyn TrapperSender,
    aliases: &'a dyn AliasSource,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        endpoint: Endpoint,
        target: impl Into<String>,
        timeouts: Timeouts,
        connector: &'a dyn Connector,
        sender: &'a dyn TrapperSender,
        aliases: &'a dyn AliasSource,
    ) -> Self {
        Self {
            endpoint,
            target: target.into(),
            timeouts,
            connector,
            sender,
            aliases,
        }
    }

    pub fn run_discovery_and_collect(&self) -> RunOutcome {
        self.run(RunMode::DiscoveryAndCollect)
    }

    pub fn run_collect_only(&self) -> RunOutcome {
        self.run(RunMode::CollectOnly)
    }

    #[instrument(level = "info", skip(self), fields(target = %self.target, profile = %self.endpoint.profile))]
    pub fn run(&self, mode: RunMode) -> RunOutcome {
        let started = Instant::now();
        let deadline = Deadline::after(self.timeouts.run_deadline);
        let collector = collectors::for_profile(self.endpoint.profile, self.aliases);
        let mut delivery = DeliveryEngine::new(self.sender, self.timeouts.sender, deadline);

        let (result, fetches, cache_hits) = {
            let mut executor = Executor::new(&self.endpoint, self.connector, self.timeouts, deadline);
            let result = self.phases(mode, collector.as_ref(), &mut executor, &mut delivery);
            (result, executor.fetches(), executor.cache_hits())
            // The executor drops here, closing the session on every path.
        };

        let outcome = RunOutcome {
            fetches,
            cache_hits,
            ..RunOutcome::new(result, &delivery, started.elapsed())
        };
        info!(
            status = %outcome.status,
            sent = outcome.success_count,
            failed = outcome.error_count,
            skipped = outcome.skipped_count,
            fetches,
            cache_hits,
            elapsed = ?outcome.elapsed,
            "run finished"
        );
        outcome
    }

    fn phases(
        &self,
        mode: RunMode,
        collector: &dyn Collector,
        executor: &mut Executor<'_>,
        delivery: &mut DeliveryEngine<'_>,
    ) -> Result<(), CollectorError> {
        if mode == RunMode::DiscoveryAndCollect {
            let documents = collector.discover(executor)?;
            debug!(collector = collector.name(), documents = documents.len(), "discovery built");
            for document in &documents {
                delivery
                    .send_discovery(&self.target, document)
                    .map_err(|source| CollectorError::Discovery {
                        key: document.key.clone(),
                        source,
                    })?;
            }
        }

        let groups = collector.collect(executor)?;
        debug!(
            collector = collector.name(),
            groups = groups.len(),
            samples = groups.iter().map(|group| group.samples.len()).sum::<usize>(),
            "collection parsed"
        );
        for group in &groups {
            delivery.deliver(&self.target, group);
        }
        Ok(())
    }
}
