//! The per-room current-state projection and the admission check that
//! guards it.

use log::debug;

use crate::protocol::events::Event;
use crate::state_map::{StateKey, StateMap};

/// Why an event was refused admission.
///
/// Rejections are the routine failure mode of ingestion and are reported
/// as values, not panics. An event that fails here must never reach the
/// projection.
#[derive(Debug, Clone, PartialEq, Eq, Fail)]
pub enum Rejection {
    #[fail(display = "event id does not start with '$': {}", _0)]
    MalformedEventId(String),
    #[fail(display = "room id does not start with '!': {}", _0)]
    MalformedRoomId(String),
    #[fail(display = "event id already known: {}", _0)]
    DuplicateEventId(String),
}

/// Structural admission check, run before an event is stored or folded
/// into any projection. `already_known` is the caller's duplicate lookup
/// against its event store; the check-then-insert must happen under one
/// lock (see [`crate::stores::memory::MemoryStore`]).
pub fn check_admissible(
    event: &Event,
    already_known: bool,
) -> Result<(), Rejection> {
    if !event.event_id().starts_with('$') {
        return Err(Rejection::MalformedEventId(event.event_id().to_string()));
    }

    if !event.room_id().starts_with('!') {
        return Err(Rejection::MalformedRoomId(event.room_id().to_string()));
    }

    if already_known {
        return Err(Rejection::DuplicateEventId(event.event_id().to_string()));
    }

    Ok(())
}

/// A room's current state: one event id per occupied (event type, state
/// key) slot.
///
/// Folding is last-write-wins by arrival order; the projection trusts the
/// caller's ordering and never consults timestamps. Concurrent folds into
/// the same room must be serialized by the caller (single writer per
/// room).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomState {
    map: StateMap<String>,
}

impl RoomState {
    pub fn new() -> RoomState {
        RoomState {
            map: StateMap::new(),
        }
    }

    /// Folds a state event into the projection, returning the event id it
    /// superseded, if any. Non-state events are ignored.
    pub fn apply(&mut self, event: &Event) -> Option<String> {
        let state_key = event.state_key()?;

        let previous = self
            .map
            .get(event.event_type(), state_key)
            .cloned();

        debug!(
            "state slot ({}, {}) now points at {}",
            event.event_type(),
            state_key,
            event.event_id()
        );

        self.map
            .insert(event.event_type(), state_key, event.event_id().to_string());

        previous
    }

    /// The event id currently holding the given slot.
    pub fn event_id(&self, event_type: &str, state_key: &str) -> Option<&str> {
        self.map.get(event_type, state_key).map(|e| e as &str)
    }

    /// Snapshot of the occupied slots.
    pub fn keys(&self) -> Vec<StateKey> {
        self.map.keys().map(|(t, s)| StateKey::new(t, s)).collect()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
