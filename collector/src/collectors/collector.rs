use crate::{
    discovery::DiscoveryDocument,
    error::TransportError,
    executor::Executor,
    metrics::MetricGroup,
};

/// One vendor family: which commands to run and how to turn their output into discovery
/// documents and metrics.
///
/// Both phases fetch through the same executor, so commands shared between them hit the
/// device once per run.
pub trait Collector {
    /// Discovery documents, one per discovery key, in send order.
    fn discover(&self, executor: &mut Executor<'_>) -> Result<Vec<DiscoveryDocument>, TransportError>;

    /// Metric groups, in send order.
    fn collect(&self, executor: &mut Executor<'_>) -> Result<Vec<MetricGroup>, TransportError>;

    /// Get the name of this collector
    fn name(&self) -> &'static str;
}
