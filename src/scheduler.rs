//! Composition root wiring the five cooperating components together
//! (§2): resource weights, node sorting, the event sink, the metrics
//! registry, and the application state machine.
//!
//! Nothing here is load-bearing logic; it exists so callers don't have to
//! hand-wire an [`Application`] to a shared [`SchedulerMetrics`] and
//! [`EventStore`] themselves at every call site.

use crate::application::Application;
use crate::events::{EventSink, EventStore};
use crate::metrics::{QueueMetricsRegistry, SchedulerMetrics};
use crate::policy::NodeSortingPolicy;
use crate::resource::ResourceWeights;
use crate::types::{ApplicationId, Partition, QueuePath};
use std::sync::Arc;

/// A running scheduler's shared state: metrics, event sink, and the active
/// node sorting policy. Applications are tracked by the caller; this struct
/// only owns what they need to be constructed consistently.
pub struct SchedulerCore {
    metrics: Arc<SchedulerMetrics>,
    queue_metrics: Arc<QueueMetricsRegistry>,
    sink: Arc<EventStore>,
    sorting_policy: NodeSortingPolicy,
}

impl SchedulerCore {
    /// Builds a scheduler core with a fresh metrics registry and event
    /// store, and the given node sorting policy.
    #[must_use]
    pub fn new(policy_name: &str, resource_weights: ResourceWeights) -> Self {
        Self {
            metrics: Arc::new(SchedulerMetrics::new()),
            queue_metrics: Arc::new(QueueMetricsRegistry::new()),
            sink: Arc::new(EventStore::new()),
            sorting_policy: NodeSortingPolicy::new(policy_name, resource_weights),
        }
    }

    /// Registers a new application, bound to its queue's metrics if
    /// `queue_path` is non-empty.
    #[must_use]
    pub fn new_application(
        &self,
        id: ApplicationId,
        partition: Partition,
        queue_path: QueuePath,
    ) -> Application {
        let app = Application::new(
            id,
            partition,
            queue_path,
            Arc::clone(&self.metrics),
            Arc::clone(&self.sink) as Arc<dyn EventSink>,
        );
        app.set_queue(&self.queue_metrics);
        app
    }

    /// The scheduler-wide metrics registry.
    #[must_use]
    pub fn metrics(&self) -> &Arc<SchedulerMetrics> {
        &self.metrics
    }

    /// The per-queue metrics registry.
    #[must_use]
    pub fn queue_metrics(&self) -> &Arc<QueueMetricsRegistry> {
        &self.queue_metrics
    }

    /// The event store every tracked application publishes to.
    #[must_use]
    pub fn events(&self) -> &Arc<EventStore> {
        &self.sink
    }

    /// The active node sorting policy.
    #[must_use]
    pub fn sorting_policy(&self) -> &NodeSortingPolicy {
        &self.sorting_policy
    }
}
