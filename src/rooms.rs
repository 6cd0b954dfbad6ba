//! Room assembly: event synthesis, admission and state folding.

use std::collections::BTreeMap;

use chrono::Utc;
use failure::Error;
use log::{debug, info};

use crate::identifiers;
use crate::protocol::content::{CreateContent, MemberContent};
use crate::protocol::events::{Event, EventBuilder, EventContent, EventKind};
use crate::protocol::power_levels::{
    Action, PowerLevelResolver, PowerLevelsContent,
};
use crate::protocol::state::{check_admissible, RoomState};
use crate::protocol::types::Membership;
use crate::stores::memory::MemoryStore;
use crate::stores::Store;

/// Default level granted to a room's creator.
const CREATOR_LEVEL: i64 = 100;

/// One room: its event log in arrival order and the current-state
/// projection folded from it.
///
/// All mutation goes through `&mut self`, which is the single-writer
/// discipline the projection requires.
#[derive(Debug)]
pub struct Room {
    room_id: String,
    server_name: String,
    events: MemoryStore<Event>,
    order: Vec<String>,
    state: RoomState,
}

impl Room {
    pub fn new(
        room_id: impl Into<String>,
        server_name: impl Into<String>,
    ) -> Room {
        Room {
            room_id: room_id.into(),
            server_name: server_name.into(),
            events: MemoryStore::new(),
            order: Vec::new(),
            state: RoomState::new(),
        }
    }

    /// Creates a room the way the server does on a create-room request:
    /// a fresh room id, the `m.room.create` event, the creator's join and
    /// a power-levels event granting the creator level 100.
    pub fn create(server_name: &str, creator: &str) -> Result<Room, Error> {
        let room_id = identifiers::new_room_id(server_name);
        let mut room = Room::new(room_id, server_name);

        let create = Event::builder(
            room.room_id.clone(),
            creator,
            EventContent::Create(CreateContent::new(creator)),
        )
        .state_key("");
        room.send(create)?;

        let join = Event::builder(
            room.room_id.clone(),
            creator,
            EventContent::Member(MemberContent::of(Membership::Join)),
        )
        .state_key(creator);
        room.send(join)?;

        let mut users = BTreeMap::new();
        users.insert(creator.to_string(), CREATOR_LEVEL);
        let levels = Event::builder(
            room.room_id.clone(),
            creator,
            EventContent::PowerLevels(PowerLevelsContent {
                users: Some(users),
                ..PowerLevelsContent::default()
            }),
        )
        .state_key("");
        room.send(levels)?;

        info!("created room {} for {}", room.room_id, creator);

        Ok(room)
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn state(&self) -> &RoomState {
        &self.state
    }

    /// Event ids in arrival order.
    pub fn event_ids(&self) -> &[String] {
        &self.order
    }

    /// Finishes a builder with a freshly generated event id and appends
    /// the result. Generation re-rolls on the (astronomically unlikely)
    /// id collision; `&mut self` keeps the check and the insert atomic.
    pub fn send(&mut self, builder: EventBuilder) -> Result<String, Error> {
        ensure!(
            builder.room_id() == self.room_id,
            "event built for a different room: {}",
            builder.room_id()
        );

        let mut event_id = identifiers::new_event_id(&self.server_name);
        while self.events.contains(&event_id) {
            event_id = identifiers::new_event_id(&self.server_name);
        }

        let event = builder.finish(event_id)?;
        self.append(event)
    }

    /// Admits an event into the room, stores it, and folds it into the
    /// state projection if it is a state event. Failing the admission
    /// check is the routine outcome for malformed input and surfaces as a
    /// [`crate::protocol::state::Rejection`] inside the error.
    pub fn append(&mut self, mut event: Event) -> Result<String, Error> {
        ensure!(
            event.room_id() == self.room_id,
            "event belongs to a different room: {}",
            event.room_id()
        );

        check_admissible(&event, self.events.contains(event.event_id()))?;

        if let Some(state_key) = event.state_key() {
            // Record what this event supersedes before overwriting the
            // slot.
            let superseded = self
                .state
                .event_id(event.event_type(), state_key)
                .and_then(|id| self.events.get(id));
            if let Some(previous) = superseded {
                event.set_prev_content(previous.content().clone());
            }
        }

        let event = self.events.create(event)?;
        self.order.push(event.event_id().to_string());
        self.state.apply(&event);

        debug!("appended {} to {}", event.event_id(), self.room_id);

        Ok(event.event_id().to_string())
    }

    pub fn get_event(&self, event_id: &str) -> Option<Event> {
        self.events.get(event_id)
    }

    /// Like [`Room::get_event`], but with the unsigned `age` field
    /// refreshed to reflect read time.
    pub fn get_event_with_age(&self, event_id: &str) -> Option<Event> {
        let mut event = self.events.get(event_id)?;
        let age = Utc::now().timestamp_millis() - event.origin_server_ts();
        event.unsigned_mut().age = Some(age);
        Some(event)
    }

    /// The content currently holding a state slot, if any.
    pub fn state_content(
        &self,
        event_type: &str,
        state_key: &str,
    ) -> Option<EventContent> {
        let event_id = self.state.event_id(event_type, state_key)?;
        Some(self.events.get(event_id)?.content().clone())
    }

    /// The room's current power-levels content, if the state event
    /// exists.
    pub fn power_levels(&self) -> Option<PowerLevelsContent> {
        match self.state_content(EventKind::PowerLevels.as_str(), "") {
            Some(EventContent::PowerLevels(content)) => Some(content),
            _ => None,
        }
    }

    /// Whether `user_id` may perform `action` under the room's current
    /// power levels.
    pub fn authorized(&self, user_id: &str, action: Action<'_>) -> bool {
        let levels = self.power_levels();
        PowerLevelResolver::from_option(levels.as_ref())
            .authorized(user_id, action)
    }

    /// A user's current membership. `None` means no membership record at
    /// all, which is distinct from having left.
    pub fn membership(&self, user_id: &str) -> Option<Membership> {
        match self.state_content(EventKind::Member.as_str(), user_id) {
            Some(EventContent::Member(content)) => content.membership(),
            _ => None,
        }
    }
}
