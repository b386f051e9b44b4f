//! Node sorting policies: the placement-quality scorers consulted when
//! ranking candidate nodes.
//!
//! The policy set is closed (bin-packing, fairness, fair-with-aging), so it
//! is represented as a sum type rather than an open trait-object hierarchy —
//! matching the donor crate's preference for closed enums over inheritance
//! wherever the variant set is known and small.

use crate::error::Error;
use crate::node::Node;
use crate::resource::{default_resource_weights, weighted_usage, ResourceWeights};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// The bias applied toward long-idle nodes by [`SortingPolicyType::FairWithAging`].
const AGING_BIAS_PER_SECOND: f64 = 0.3;

/// Identifies which scoring policy a [`NodeSortingPolicy`] implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SortingPolicyType {
    /// Prefer the most-loaded node (pack before spreading).
    BinPacking,
    /// Prefer the least-loaded node (spread load evenly).
    Fairness,
    /// Like `Fairness`, but biased toward nodes that have been idle longest.
    FairWithAging,
}

impl fmt::Display for SortingPolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BinPacking => "binpacking",
            Self::Fairness => "fair",
            Self::FairWithAging => "fairwithaging",
        };
        write!(f, "{name}")
    }
}

impl FromStr for SortingPolicyType {
    type Err = Error;

    /// Parses a policy name into its type.
    ///
    /// `"" | "fair"` maps to [`Fairness`](Self::Fairness); anything
    /// unrecognized is an [`Error::UnknownPolicy`] — callers that want the
    /// factory's forgiving "default to Fairness" behavior should use
    /// [`NodeSortingPolicy::new`] instead of calling this directly.
    fn from_str(name: &str) -> Result<Self, Error> {
        match name {
            "" | "fair" => Ok(Self::Fairness),
            "binpacking" => Ok(Self::BinPacking),
            "fairwithaging" => Ok(Self::FairWithAging),
            other => Err(Error::unknown_policy(other)),
        }
    }
}

/// A node sorting policy bound to a concrete set of resource weights.
///
/// Construct with [`NodeSortingPolicy::new`], which never fails: an
/// unrecognized policy name is logged at debug level and silently resolved
/// to [`SortingPolicyType::Fairness`].
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSortingPolicy {
    policy_type: SortingPolicyType,
    resource_weights: ResourceWeights,
}

impl NodeSortingPolicy {
    /// Builds a policy from a name and an optional weight map.
    ///
    /// An empty or absent `resource_weights` falls back to
    /// [`default_resource_weights`]. An unrecognized `policy_name` defaults
    /// to [`SortingPolicyType::Fairness`] rather than failing — the factory
    /// contract never returns an error.
    #[must_use]
    pub fn new(policy_name: &str, resource_weights: ResourceWeights) -> Self {
        let policy_type = SortingPolicyType::from_str(policy_name).unwrap_or_else(|err| {
            debug!(error = %err, policy_name, "node sorting policy defaulted to fairness");
            SortingPolicyType::Fairness
        });

        let resource_weights = if resource_weights.is_empty() {
            default_resource_weights()
        } else {
            resource_weights
        };

        debug!(policy = %policy_type, "new node sorting policy added");

        Self {
            policy_type,
            resource_weights,
        }
    }

    /// Returns which policy this is.
    #[must_use]
    pub fn policy_type(&self) -> SortingPolicyType {
        self.policy_type
    }

    /// Returns an owned clone of the resource weights, never the live map.
    #[must_use]
    pub fn resource_weights(&self) -> ResourceWeights {
        self.resource_weights.clone()
    }

    /// Scores a node. Higher is more preferred, except `BinPacking`, whose
    /// sort driver is documented to pick the lowest score (see module docs
    /// and `DESIGN.md` for the rationale).
    pub fn score_node(&self, node: &dyn Node) -> f64 {
        let usage = weighted_usage(&node.resource_usage_shares(), &self.resource_weights);
        match self.policy_type {
            SortingPolicyType::BinPacking => 1.0 - usage,
            SortingPolicyType::Fairness => usage,
            SortingPolicyType::FairWithAging => {
                let waiting_seconds = node.waiting_time().as_secs_f64();
                let score = (1.0 - usage) + AGING_BIAS_PER_SECOND * waiting_seconds;
                debug!(
                    node = node.node_id(),
                    usage, waiting_seconds, score, "fair-with-aging node score"
                );
                score
            }
        }
    }
}
