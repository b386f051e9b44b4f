//! The `Node` surface consulted by node sorting policies.
//!
//! Node lifecycle, allocation, and capacity accounting are owned elsewhere
//! in the scheduler; this crate only needs enough of a node's shape to score
//! it for placement.

use std::collections::HashMap;
use std::time::Duration;

/// A candidate placement target, as seen by a [`NodeSortingPolicy`](crate::policy::NodeSortingPolicy).
pub trait Node {
    /// Stable node identifier, used by the sort driver for tie-breaking.
    fn node_id(&self) -> &str;

    /// Per-resource-kind usage share in `[0, 1]`. A dimension may be absent
    /// (unmeasured) rather than reported as `NaN`; both are treated the same
    /// by [`crate::resource::weighted_usage`].
    fn resource_usage_shares(&self) -> HashMap<String, f64>;

    /// Time elapsed since the node's last allocation attempt. Only
    /// `FairWithAging` consults this.
    fn waiting_time(&self) -> Duration;
}

/// A plain, owned snapshot of a node's scoring inputs.
///
/// Useful for tests and for callers that already have the node's usage
/// shares in hand and don't want to implement [`Node`] on their own type.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticNode {
    id: String,
    shares: HashMap<String, f64>,
    waiting: Duration,
}

impl StaticNode {
    /// Builds a static node snapshot with zero waiting time.
    #[must_use]
    pub fn new(id: impl Into<String>, shares: HashMap<String, f64>) -> Self {
        Self {
            id: id.into(),
            shares,
            waiting: Duration::ZERO,
        }
    }

    /// Sets the waiting time, for exercising `FairWithAging`.
    #[must_use]
    pub fn with_waiting_time(mut self, waiting: Duration) -> Self {
        self.waiting = waiting;
        self
    }
}

impl Node for StaticNode {
    fn node_id(&self) -> &str {
        &self.id
    }

    fn resource_usage_shares(&self) -> HashMap<String, f64> {
        self.shares.clone()
    }

    fn waiting_time(&self) -> Duration {
        self.waiting
    }
}
