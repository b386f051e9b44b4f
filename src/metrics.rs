//! In-process metrics registry: scheduler-wide monotonic counters plus
//! per-queue balanced gauges.
//!
//! Adapted from the donor runtime's own `observability::metrics` registry
//! (`Counter`/`Gauge` primitives over a name, kept simple rather than
//! lock-free, because a single lock already serializes every update this
//! crate performs per-transition).

use crate::application::State;
use crate::error::Error;
use crate::types::QueuePath;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A counter that only ever increases. Used for the scheduler-wide
/// submission counters, whose monotonicity is an invariant of the data
/// model (§3).
#[derive(Debug, Default, Clone, Copy)]
struct Counter(u64);

impl Counter {
    fn inc(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    fn get(self) -> i64 {
        self.0 as i64
    }

    fn reset(&mut self) {
        self.0 = 0;
    }
}

/// A gauge that can move in either direction. Used for per-queue state
/// counts and for the scheduler-wide running/completed totals.
#[derive(Debug, Default, Clone, Copy)]
struct Gauge(i64);

impl Gauge {
    fn inc(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    fn dec(&mut self) {
        self.0 = self.0.saturating_sub(1);
    }

    fn get(self) -> i64 {
        self.0
    }

    fn reset(&mut self) {
        self.0 = 0;
    }
}

#[derive(Debug, Default)]
struct SchedulerCounters {
    total_new: Counter,
    total_accepted: Counter,
    total_rejected: Counter,
    total_running: Gauge,
    total_completed: Counter,
}

/// Scheduler-wide metrics (§4.4, first namespace).
///
/// `new`, `accepted`, and `rejected` are monotonically non-decreasing
/// counters incremented only on first entry to their respective state.
/// `running` is gauge-like (incremented on entry to `Running`, decremented
/// on leaving it); `completed` only ever increases since `Completed` is
/// terminal.
#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    inner: Mutex<SchedulerCounters>,
}

impl SchedulerMetrics {
    /// Builds a fresh, zeroed registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_new(&self) {
        self.inner.lock().total_new.inc();
    }

    pub(crate) fn record_accepted(&self) {
        self.inner.lock().total_accepted.inc();
    }

    pub(crate) fn record_rejected(&self) {
        self.inner.lock().total_rejected.inc();
    }

    pub(crate) fn record_running_entered(&self) {
        self.inner.lock().total_running.inc();
    }

    pub(crate) fn record_running_left(&self) {
        self.inner.lock().total_running.dec();
    }

    pub(crate) fn record_completed(&self) {
        self.inner.lock().total_completed.inc();
    }

    /// Total applications that have ever entered `New`.
    pub fn total_applications_new(&self) -> i64 {
        self.inner.lock().total_new.get()
    }

    /// Total applications that have ever entered `Accepted`.
    pub fn total_applications_accepted(&self) -> i64 {
        self.inner.lock().total_accepted.get()
    }

    /// Total applications that have ever entered `Rejected`.
    pub fn total_applications_rejected(&self) -> i64 {
        self.inner.lock().total_rejected.get()
    }

    /// Applications currently in `Running`.
    pub fn total_applications_running(&self) -> i64 {
        self.inner.lock().total_running.get()
    }

    /// Total applications that have ever entered `Completed`.
    pub fn total_applications_completed(&self) -> i64 {
        self.inner.lock().total_completed.get()
    }

    /// Resets every counter and gauge to zero. Test-only in practice, but
    /// not `#[cfg(test)]`-gated since external harnesses need it too (§6.3).
    pub fn reset(&self) {
        *self.inner.lock() = SchedulerCounters::default();
    }

    /// Named getter matching the external metrics-surface contract (§6.3):
    /// returns [`Error::MetricLookupFailed`] for unrecognized names.
    pub fn get_named(&self, name: &str) -> Result<i64, Error> {
        match name {
            "TotalApplicationsNew" => Ok(self.total_applications_new()),
            "TotalApplicationsAccepted" => Ok(self.total_applications_accepted()),
            "TotalApplicationsRejected" => Ok(self.total_applications_rejected()),
            "TotalApplicationsRunning" => Ok(self.total_applications_running()),
            "TotalApplicationsCompleted" => Ok(self.total_applications_completed()),
            other => Err(Error::metric_lookup_failed(other)),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct QueueGauges {
    new: Gauge,
    accepted: Gauge,
    running: Gauge,
    completing: Gauge,
    resuming: Gauge,
    failed: Gauge,
    rejected: Gauge,
    completed: Gauge,
}

/// Balanced per-queue gauges (§4.4, second namespace).
///
/// `failed` and `rejected` behave as counters in practice because
/// applications never leave those states, but they share the
/// increment-on-enter/decrement-on-leave machinery with the rest of the
/// gauges for uniformity.
#[derive(Debug, Default)]
pub struct QueueMetrics {
    inner: Mutex<QueueGauges>,
}

impl QueueMetrics {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn inc_new(&self) {
        self.inner.lock().new.inc();
    }

    pub(crate) fn dec_new(&self) {
        self.inner.lock().new.dec();
    }

    pub(crate) fn inc_accepted(&self) {
        self.inner.lock().accepted.inc();
    }

    pub(crate) fn dec_accepted(&self) {
        self.inner.lock().accepted.dec();
    }

    pub(crate) fn inc_running(&self) {
        self.inner.lock().running.inc();
    }

    pub(crate) fn dec_running(&self) {
        self.inner.lock().running.dec();
    }

    pub(crate) fn inc_completing(&self) {
        self.inner.lock().completing.inc();
    }

    pub(crate) fn dec_completing(&self) {
        self.inner.lock().completing.dec();
    }

    pub(crate) fn inc_resuming(&self) {
        self.inner.lock().resuming.inc();
    }

    pub(crate) fn dec_resuming(&self) {
        self.inner.lock().resuming.dec();
    }

    pub(crate) fn inc_failed(&self) {
        self.inner.lock().failed.inc();
    }

    pub(crate) fn inc_rejected(&self) {
        self.inner.lock().rejected.inc();
    }

    pub(crate) fn inc_completed(&self) {
        self.inner.lock().completed.inc();
    }

    /// Applications currently in `New` bound to this queue.
    pub fn applications_new(&self) -> i64 {
        self.inner.lock().new.get()
    }

    /// Applications currently in `Accepted` bound to this queue.
    pub fn applications_accepted(&self) -> i64 {
        self.inner.lock().accepted.get()
    }

    /// Applications currently in `Running` bound to this queue.
    pub fn applications_running(&self) -> i64 {
        self.inner.lock().running.get()
    }

    /// Applications currently in `Completing` bound to this queue.
    pub fn applications_completing(&self) -> i64 {
        self.inner.lock().completing.get()
    }

    /// Applications currently in `Resuming` bound to this queue.
    pub fn applications_resuming(&self) -> i64 {
        self.inner.lock().resuming.get()
    }

    /// Applications that entered `Failed` bound to this queue.
    pub fn applications_failed(&self) -> i64 {
        self.inner.lock().failed.get()
    }

    /// Applications that entered `Rejected` bound to this queue.
    pub fn applications_rejected(&self) -> i64 {
        self.inner.lock().rejected.get()
    }

    /// Applications that entered `Completed` bound to this queue.
    pub fn applications_completed(&self) -> i64 {
        self.inner.lock().completed.get()
    }

    fn reset(&self) {
        *self.inner.lock() = QueueGauges::default();
    }

    /// Increments the gauge matching `state`, if that state carries one.
    /// `Failing` and `Expired` have no per-queue gauge in the taxonomy (§4.4)
    /// and are silently ignored.
    pub(crate) fn enter(&self, state: State) {
        match state {
            State::New => self.inc_new(),
            State::Accepted => self.inc_accepted(),
            State::Running => self.inc_running(),
            State::Completing => self.inc_completing(),
            State::Resuming => self.inc_resuming(),
            State::Failed => self.inc_failed(),
            State::Rejected => self.inc_rejected(),
            State::Completed => self.inc_completed(),
            State::Failing | State::Expired => {}
        }
    }

    /// Decrements the gauge matching `state`. `Failed`, `Rejected`, and
    /// `Completed` behave as counters (never decremented) even though
    /// applications structurally "leave" them on a later transition.
    pub(crate) fn leave(&self, state: State) {
        match state {
            State::New => self.dec_new(),
            State::Accepted => self.dec_accepted(),
            State::Running => self.dec_running(),
            State::Completing => self.dec_completing(),
            State::Resuming => self.dec_resuming(),
            State::Failed | State::Rejected | State::Completed => {}
            State::Failing | State::Expired => {}
        }
    }
}

/// Registry of per-queue metrics, keyed by dotted queue path.
///
/// Queue gauges are created lazily on first touch and go to zero (not
/// removed) once no application holds the corresponding state, per the
/// data model invariant (§3).
#[derive(Debug, Default)]
pub struct QueueMetricsRegistry {
    queues: Mutex<HashMap<QueuePath, Arc<QueueMetrics>>>,
}

impl QueueMetricsRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the metrics handle for `path`, creating it if this is the
    /// first application bound to it. Returns `None` for the empty path: an
    /// application with no queue binding contributes to no queue metric
    /// (§3, boundary 7 in §8).
    pub fn for_queue(&self, path: &QueuePath) -> Option<Arc<QueueMetrics>> {
        if path.is_empty() {
            return None;
        }
        let mut queues = self.queues.lock();
        Some(Arc::clone(
            queues.entry(path.clone()).or_insert_with(QueueMetrics::new),
        ))
    }

    /// Resets every known queue's gauges to zero.
    pub fn reset(&self) {
        for metrics in self.queues.lock().values() {
            metrics.reset();
        }
    }

    /// Resets and forgets every queue, as if the registry were newly built.
    pub fn reset_all(&self) {
        self.queues.lock().clear();
    }
}
