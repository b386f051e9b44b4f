//! End-to-end node scoring scenario (S6) and policy factory behavior.

use sortwise_scheduler_core::{NodeSortingPolicy, ResourceWeights, SortingPolicyType, StaticNode};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

fn node_a() -> StaticNode {
    StaticNode::new(
        "node-a",
        HashMap::from([("vcore".to_string(), 0.2), ("memory".to_string(), 0.8)]),
    )
}

fn node_b() -> StaticNode {
    StaticNode::new(
        "node-b",
        HashMap::from([("vcore".to_string(), 0.9), ("memory".to_string(), 0.9)]),
    )
}

#[test]
fn s6_fairness_prefers_node_a() {
    let policy = NodeSortingPolicy::new("fair", ResourceWeights::new());
    assert!(policy.score_node(&node_a()) < policy.score_node(&node_b()));
}

#[test]
fn s6_bin_packing_prefers_node_b() {
    let policy = NodeSortingPolicy::new("binpacking", ResourceWeights::new());
    // The driver picks the lowest score; B is the more loaded node and
    // must score lower so it sorts first.
    assert!(policy.score_node(&node_b()) < policy.score_node(&node_a()));
}

#[test]
fn s6_fair_with_aging_prefers_idle_node_a() {
    let policy = NodeSortingPolicy::new("fairwithaging", ResourceWeights::new());
    let a = node_a().with_waiting_time(Duration::from_secs(100));
    let b = node_b().with_waiting_time(Duration::ZERO);

    let score_a = policy.score_node(&a);
    let score_b = policy.score_node(&b);
    assert!((score_a - 30.5).abs() < 1e-9);
    assert!((score_b - 0.1).abs() < 1e-9);
    assert!(score_a > score_b, "driver picks the highest score");
}

#[test]
fn unrecognized_policy_name_falls_back_to_fairness() {
    let policy = NodeSortingPolicy::new("does-not-exist", ResourceWeights::new());
    assert_eq!(policy.policy_type(), SortingPolicyType::Fairness);
}

#[test]
fn policy_type_parser_matches_every_documented_name() {
    assert_eq!(
        SortingPolicyType::from_str("binpacking").unwrap(),
        SortingPolicyType::BinPacking
    );
    assert_eq!(
        SortingPolicyType::from_str("fairwithaging").unwrap(),
        SortingPolicyType::FairWithAging
    );
    assert_eq!(SortingPolicyType::from_str("fair").unwrap(), SortingPolicyType::Fairness);
    assert_eq!(SortingPolicyType::from_str("").unwrap(), SortingPolicyType::Fairness);
    assert!(SortingPolicyType::from_str("nope").is_err());
}
