//! Weighted resource usage over a node's per-resource-kind usage shares.

use std::collections::HashMap;

/// A mapping from resource-kind name (e.g. `"vcore"`, `"memory"`) to a
/// relative weight used when averaging usage shares.
pub type ResourceWeights = HashMap<String, f64>;

/// Returns the default resource weights: `vcore` and `memory` both at `1.0`.
///
/// Used whenever a caller supplies no weights, or an empty weight map.
#[must_use]
pub fn default_resource_weights() -> ResourceWeights {
    let mut weights = HashMap::with_capacity(2);
    weights.insert("vcore".to_string(), 1.0);
    weights.insert("memory".to_string(), 1.0);
    weights
}

/// Computes the weighted average usage share across a node's resource
/// dimensions.
///
/// Dimensions without a positive weight, or whose weight is missing from
/// `weights`, are skipped entirely; a `NaN` usage share is likewise skipped
/// rather than propagated. Returns `0.0` when no dimension contributes any
/// weight (including the degenerate all-zero-weights case).
#[must_use]
pub fn weighted_usage(shares: &HashMap<String, f64>, weights: &ResourceWeights) -> f64 {
    let mut usage = 0.0;
    let mut total_weight = 0.0;

    for (kind, share) in shares {
        let Some(&weight) = weights.get(kind) else {
            continue;
        };
        if weight == 0.0 || share.is_nan() {
            continue;
        }
        usage += share * weight;
        total_weight += weight;
    }

    if total_weight == 0.0 {
        0.0
    } else {
        usage / total_weight
    }
}
