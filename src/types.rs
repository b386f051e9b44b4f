//! Core identifier and timestamp types shared by the scheduler primitives.

use std::fmt;
use std::time::SystemTime;

/// Opaque, unique-within-the-scheduler identifier for an [`Application`](crate::application::Application).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct ApplicationId(String);

impl ApplicationId {
    /// Wraps an owned string as an application id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ApplicationId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ApplicationId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Top-level scheduling domain an application was submitted into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Partition(String);

impl Partition {
    /// Wraps an owned string as a partition name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the partition name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Partition {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Dotted hierarchical queue path (e.g. `root.metrics`).
///
/// An empty path means the application has not yet been bound to a
/// materialized (dynamic) queue; per the data model it still transitions
/// and emits events normally, but contributes to no queue metric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct QueuePath(String);

impl QueuePath {
    /// Wraps an owned string as a queue path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The empty queue path, used for applications not yet bound to a queue.
    #[must_use]
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when this path carries no queue binding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for QueuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for QueuePath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Default for QueuePath {
    fn default() -> Self {
        Self::empty()
    }
}

/// Wall-clock timestamp used for state transitions and event records.
///
/// Wraps [`SystemTime`] rather than exposing it directly so the rest of the
/// crate has one narrow seam to swap in a virtual clock for deterministic
/// tests, the way the donor runtime separates wall time from its own
/// virtual-time facilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(SystemTime);

impl Timestamp {
    /// Captures the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(SystemTime::now())
    }

    /// Returns the wrapped [`SystemTime`].
    #[must_use]
    pub fn into_inner(self) -> SystemTime {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(d) => write!(f, "{}.{:09}", d.as_secs(), d.subsec_nanos()),
            Err(_) => write!(f, "<before-epoch>"),
        }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}
