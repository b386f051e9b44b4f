//! Crate-wide error taxonomy.
//!
//! Every fallible entry point in this crate returns [`Error`]. Transition
//! legality is additionally exposed as a pure predicate
//! ([`crate::application::is_valid_transition`]) so callers can check before
//! acting, without paying for error construction on the hot path.

use crate::application::{ApplicationEvent, State};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// `event` is not permitted while the application is in `from`.
    #[error("invalid transition: event {event:?} is not permitted in state {from:?}")]
    InvalidTransition {
        /// The state the application was in when the event arrived.
        from: State,
        /// The event that was rejected.
        event: ApplicationEvent,
    },

    /// A node sorting policy name did not match any known policy.
    #[error("unknown node sorting policy: {name:?}")]
    UnknownPolicy {
        /// The unrecognized policy name.
        name: String,
    },

    /// A metric getter was asked for a name the registry does not track.
    #[error("no such metric: {name}")]
    MetricLookupFailed {
        /// The requested metric name.
        name: String,
    },
}

impl Error {
    pub(crate) fn invalid_transition(from: State, event: ApplicationEvent) -> Self {
        Self::InvalidTransition { from, event }
    }

    pub(crate) fn unknown_policy(name: impl Into<String>) -> Self {
        Self::UnknownPolicy { name: name.into() }
    }

    pub(crate) fn metric_lookup_failed(name: impl Into<String>) -> Self {
        Self::MetricLookupFailed { name: name.into() }
    }
}
