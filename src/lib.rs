//! Core scheduling primitives for a YuniKorn-style resource scheduler:
//! the application lifecycle state machine and the node sorting policy
//! subsystem consulted when ranking placement candidates.
//!
//! # Module structure
//!
//! - [`types`]: identifiers and timestamps shared across the crate.
//! - [`error`](mod@error): the crate-wide error taxonomy.
//! - [`resource`]: weighted usage over a node's per-resource-kind shares.
//! - [`node`]: the `Node` surface node sorting policies score against.
//! - [`policy`]: `BinPacking` / `Fairness` / `FairWithAging` node scoring.
//! - [`events`]: the append-only event sink the state machine publishes to.
//! - [`metrics`]: scheduler-wide counters and per-queue gauges.
//! - [`application`]: the application lifecycle state machine.
//! - [`scheduler`]: a thin composition root wiring the above together.
//!
//! Queue hierarchy, allocation matching, and the RPC/persistence surface
//! are out of scope; this crate's external interfaces are the ones listed
//! above, consumed directly by whatever owns those concerns.

pub mod application;
pub mod error;
pub mod events;
pub mod metrics;
pub mod node;
pub mod policy;
pub mod resource;
pub mod scheduler;
pub mod types;

pub use application::{Application, ApplicationEvent, State};
pub use error::{Error, Result};
pub use events::{EventChangeDetail, EventChangeType, EventObjectType, EventRecord, EventSink, EventStore};
pub use metrics::{QueueMetrics, QueueMetricsRegistry, SchedulerMetrics};
pub use node::{Node, StaticNode};
pub use policy::{NodeSortingPolicy, SortingPolicyType};
pub use resource::{default_resource_weights, weighted_usage, ResourceWeights};
pub use scheduler::SchedulerCore;
pub use types::{ApplicationId, Partition, QueuePath, Timestamp};
