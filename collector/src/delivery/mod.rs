//! # Metric Delivery Engine
//!
//! Pushes discovery documents and metric values to the monitoring server through a
//! [`TrapperSender`] and keeps the run's success and error tallies.
//!
//! - **Individual** sends isolate one bad value from the rest.
//! - **Batch** sends are all-or-nothing: the server acknowledges the batch as a whole, so a
//!   failed batch counts every member as failed.
//!
//! Nothing is retried. Sends never return errors to the caller; they only move the counters.

mod zabbix_sender;

use crate::{
    deadline::Deadline,
    discovery::DiscoveryDocument,
    error::DeliveryError,
    metrics::{
        Delivery,
        MetricGroup,
    },
};
use std::{
    fmt,
    time::Duration,
};
use strum::Display;
pub use zabbix_sender::ZabbixSender;

/// One `<target> <key> <value>` trapper item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrapperLine {
    pub target: String,
    pub key: String,
    pub value: String,
}

impl TrapperLine {
    pub fn new(target: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Renders the line in the sender's input-file syntax.
impl fmt::Display for TrapperLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            quote_field(&self.target),
            quote_field(&self.key),
            quote_field(&self.value)
        )
    }
}

fn quote_field(field: &str) -> String {
    if !field.is_empty() && !field.contains(|c: char| c.is_whitespace() || c == '"' || c == '\\') {
        return field.to_string();
    }
    let mut quoted = String::with_capacity(field.len() + 2);
    quoted.push('"');
    for c in field.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// The local path to the monitoring server's trapper port.
pub trait TrapperSender {
    fn send_item(&self, line: &TrapperLine, timeout: Duration) -> Result<(), DeliveryError>;

    /// Sends every line in one call. Success means the server accepted all of them.
    fn send_batch(&self, lines: &[TrapperLine], timeout: Duration) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum DeliveryStatus {
    Success,
    Partial,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub success_count: usize,
    pub error_count: usize,
    pub status: DeliveryStatus,
}

impl DeliveryOutcome {
    pub fn from_counts(success_count: usize, error_count: usize) -> Self {
        let status = match (success_count, error_count) {
            (_, 0) => DeliveryStatus::Success,
            (0, _) => DeliveryStatus::Failed,
            _ => DeliveryStatus::Partial,
        };
        Self {
            success_count,
            error_count,
            status,
        }
    }
}

pub struct DeliveryEngine<'a> {
    sender: &'a dyn TrapperSender,
    timeout: Duration,
    deadline: Deadline,
    success_count: usize,
    error_count: usize,
    skipped_count: usize,
}

impl<'a> DeliveryEngine<'a> {
    pub fn new(sender: &'a dyn TrapperSender, timeout: Duration, deadline: Deadline) -> Self {
        Self {
            sender,
            timeout,
            deadline,
            success_count: 0,
            error_count: 0,
            skipped_count: 0,
        }
    }

    fn budget(&self) -> Result<Duration, DeliveryError> {
        self.deadline.clamp(self.timeout).ok_or(DeliveryError::DeadlineExceeded)
    }

    /// Sends one discovery document. Not counted as a metric.
    #[instrument(level = "debug", skip(self, document), fields(key = %document.key, entities = document.entities.len()))]
    pub fn send_discovery(&self, target: &str, document: &DiscoveryDocument) -> Result<(), DeliveryError> {
        let line = TrapperLine::new(target, document.key.as_str(), document.to_json()?);
        self.sender.send_item(&line, self.budget()?)?;
        info!(key = %document.key, entities = document.entities.len(), "discovery sent");
        Ok(())
    }

    pub fn send_metric(&mut self, target: &str, key: &str, value: &str) -> bool {
        let line = TrapperLine::new(target, key, value);
        let result = self.budget().and_then(|timeout| self.sender.send_item(&line, timeout));
        match result {
            Ok(()) => {
                self.success_count += 1;
                debug!(key, value, "sent");
                true
            }
            Err(e) => {
                self.error_count += 1;
                warn!(key, error = %e, "send failed");
                false
            }
        }
    }

    pub fn send_batch(&mut self, target: &str, pairs: &[(String, String)]) -> DeliveryOutcome {
        if pairs.is_empty() {
            return DeliveryOutcome::from_counts(0, 0);
        }
        let lines: Vec<TrapperLine> = pairs
            .iter()
            .map(|(key, value)| TrapperLine::new(target, key.as_str(), value.as_str()))
            .collect();

        let result = self.budget().and_then(|timeout| self.sender.send_batch(&lines, timeout));
        let outcome = match result {
            Ok(()) => {
                debug!(items = lines.len(), "batch sent");
                DeliveryOutcome::from_counts(lines.len(), 0)
            }
            Err(e) => {
                warn!(items = lines.len(), error = %e, "batch failed");
                DeliveryOutcome::from_counts(0, lines.len())
            }
        };
        self.success_count += outcome.success_count;
        self.error_count += outcome.error_count;
        outcome
    }

    /// Renders every sample of `group` and sends them the way the group asks for.
    pub fn deliver(&mut self, target: &str, group: &MetricGroup) {
        let mut pairs = Vec::with_capacity(group.samples.len());
        for sample in &group.samples {
            match sample.wire_value() {
                Some(value) => pairs.push((sample.key.to_string(), value)),
                None => {
                    self.skipped_count += 1;
                    trace!(key = %sample.key, "no value, skipped");
                }
            }
        }

        match group.delivery {
            Delivery::Individual => {
                for (key, value) in &pairs {
                    self.send_metric(target, key, value);
                }
            }
            Delivery::Batch => {
                self.send_batch(target, &pairs);
            }
        }
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped_count
    }

    pub fn outcome(&self) -> DeliveryOutcome {
        DeliveryOutcome::from_counts(self.success_count, self.error_count)
    }
}
