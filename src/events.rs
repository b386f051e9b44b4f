//! The append-only event sink that receives state-change records.
//!
//! Queue hierarchy, allocation, and the wire transport to external
//! consumers are out of scope (see `SPEC_FULL.md` §1); this module owns
//! only the in-process publish/store contract the state machine depends on.

use crate::application::State;
use crate::types::{ApplicationId, Timestamp};
use crossbeam_queue::ArrayQueue;
use parking_lot::Mutex;
use std::fmt;
use tracing::warn;

/// Default capacity of an [`EventStore`]'s bounded publish queue.
const DEFAULT_QUEUE_CAPACITY: usize = 4096;

/// The kind of object an [`EventRecord`] describes.
///
/// The core only ever emits `App`; `Node` and `Queue` are carried for
/// forward compatibility with the rest of the scheduler's event taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EventObjectType {
    /// An application lifecycle event.
    App,
    /// A node event (not emitted by this crate).
    Node,
    /// A queue event (not emitted by this crate).
    Queue,
}

/// How an event changed its subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EventChangeType {
    /// The subject's state was set to a new value.
    Set,
    /// Something was added to the subject.
    Add,
    /// Something was removed from the subject.
    Remove,
    /// No change; present for completeness of the taxonomy.
    None,
}

/// The specific sub-event an [`EventRecord`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EventChangeDetail {
    /// Emitted once, the first time an application is registered.
    AppNew,
    /// Emitted on entry to each named state.
    AppAccepted,
    AppRunning,
    AppCompleting,
    AppCompleted,
    AppRejected,
    AppFailing,
    AppFailed,
    AppResuming,
    AppExpired,
}

impl EventChangeDetail {
    /// The detail emitted when a transition lands on `state`.
    ///
    /// `New` has no corresponding "entered New" detail in the taxonomy: the
    /// only event for that state is the one-time [`EventChangeDetail::AppNew`]
    /// marker emitted by [`crate::application::Application::new`].
    #[must_use]
    pub fn for_state(state: State) -> Option<Self> {
        match state {
            State::New => None,
            State::Accepted => Some(Self::AppAccepted),
            State::Running => Some(Self::AppRunning),
            State::Completing => Some(Self::AppCompleting),
            State::Completed => Some(Self::AppCompleted),
            State::Rejected => Some(Self::AppRejected),
            State::Failing => Some(Self::AppFailing),
            State::Failed => Some(Self::AppFailed),
            State::Resuming => Some(Self::AppResuming),
            State::Expired => Some(Self::AppExpired),
        }
    }
}

/// A single typed event emitted by the scheduler core.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EventRecord {
    /// Always [`EventObjectType::App`] for events this crate emits.
    pub object_type: EventObjectType,
    /// The application the event concerns.
    pub object_id: ApplicationId,
    /// How the subject changed.
    pub change_type: EventChangeType,
    /// The specific sub-event.
    pub change_detail: EventChangeDetail,
    /// When the event was recorded.
    pub timestamp: Timestamp,
}

impl EventRecord {
    /// Builds the one-time marker emitted when an application first registers.
    #[must_use]
    pub fn new_marker(id: ApplicationId) -> Self {
        Self {
            object_type: EventObjectType::App,
            object_id: id,
            change_type: EventChangeType::None,
            change_detail: EventChangeDetail::AppNew,
            timestamp: Timestamp::now(),
        }
    }

    /// Builds the record for an accepted state transition.
    #[must_use]
    pub fn state_change(id: ApplicationId, detail: EventChangeDetail) -> Self {
        Self {
            object_type: EventObjectType::App,
            object_id: id,
            change_type: EventChangeType::Set,
            change_detail: detail,
            timestamp: Timestamp::now(),
        }
    }
}

/// Append-only sink for [`EventRecord`]s.
///
/// `publish` never blocks the caller beyond a single bounded-queue write: a
/// full queue drops the record (logged at `warn`) rather than applying
/// back-pressure, since the spec (§4.3) requires the publish call itself to
/// stay non-blocking.
pub trait EventSink: Send + Sync {
    /// Enqueues a record for storage.
    fn publish(&self, record: EventRecord);
}

/// An in-memory, order-preserving store of published events, plus the
/// test/introspection surface the core spec requires (§4.3, §6.4).
pub struct EventStore {
    queue: ArrayQueue<EventRecord>,
    collected: Mutex<Vec<EventRecord>>,
}

impl EventStore {
    /// Builds a store with the default bounded capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Builds a store with an explicit bounded capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity.max(1)),
            collected: Mutex::new(Vec::new()),
        }
    }

    /// Drains anything sitting in the publish queue into the ordered,
    /// collectable history. Tests call this (indirectly, via
    /// [`EventStore::collect_events`] / [`EventStore::count_stored_events`])
    /// instead of requiring an explicit background drain thread, since a
    /// single-writer-per-application invariant (§5) already guarantees
    /// publish order is preserved without one.
    fn drain(&self) {
        let mut collected = self.collected.lock();
        while let Some(record) = self.queue.pop() {
            collected.push(record);
        }
    }

    /// Returns how many events have been stored so far.
    #[must_use]
    pub fn count_stored_events(&self) -> usize {
        self.drain();
        self.collected.lock().len()
    }

    /// Returns the full, ordered history of stored events.
    #[must_use]
    pub fn collect_events(&self) -> Vec<EventRecord> {
        self.drain();
        self.collected.lock().clone()
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStore")
            .field("stored", &self.count_stored_events())
            .finish()
    }
}

impl EventSink for EventStore {
    fn publish(&self, record: EventRecord) {
        if self.queue.push(record).is_err() {
            warn!("event store queue full, dropping oldest publish attempt");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_then_collect_preserves_order() {
        let store = EventStore::new();
        let id = ApplicationId::new("app-00001");
        store.publish(EventRecord::new_marker(id.clone()));
        store.publish(EventRecord::state_change(
            id.clone(),
            EventChangeDetail::AppAccepted,
        ));
        store.publish(EventRecord::state_change(
            id.clone(),
            EventChangeDetail::AppRunning,
        ));

        assert_eq!(store.count_stored_events(), 3);
        let events = store.collect_events();
        assert_eq!(events[0].change_detail, EventChangeDetail::AppNew);
        assert_eq!(events[1].change_detail, EventChangeDetail::AppAccepted);
        assert_eq!(events[2].change_detail, EventChangeDetail::AppRunning);
        assert!(events.iter().all(|e| e.object_id == id));
    }

    #[test]
    fn for_state_has_no_detail_for_new() {
        assert_eq!(EventChangeDetail::for_state(State::New), None);
        assert_eq!(
            EventChangeDetail::for_state(State::Failed),
            Some(EventChangeDetail::AppFailed)
        );
    }
}
