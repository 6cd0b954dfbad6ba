//! Power-level content and the resolver that turns it into effective
//! permission levels.
//!
//! Levels are `i64` throughout. All schedule fields are optional on the
//! wire; defaults are applied at lookup time, never baked into the parsed
//! content, so a round trip reproduces exactly the fields that were
//! present.

use std::collections::BTreeMap;

/// Fallback when a per-action level is unset: ban, kick, invite, redact
/// and notifications all require 50.
pub const DEFAULT_ACTION_LEVEL: i64 = 50;
/// Fallback for sending message events.
pub const DEFAULT_EVENTS_LEVEL: i64 = 0;
/// Fallback for sending state events.
pub const DEFAULT_STATE_LEVEL: i64 = 50;
/// Fallback for a user with no per-user override and no `users_default`.
pub const DEFAULT_USER_LEVEL: i64 = 0;

/// `m.room.power_levels` content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerLevelsContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ban: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<BTreeMap<String, i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_default: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kick: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationLevels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redact: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_default: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<BTreeMap<String, i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_default: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationLevels {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<i64>,
}

/// An action gated by a minimum power level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    Ban,
    Invite,
    Kick,
    Redact,
    /// Triggering an `@room` notification.
    Notify,
    /// Sending a message event of the given type.
    SendMessage(&'a str),
    /// Sending a state event of the given type.
    SendState(&'a str),
}

/// Computes effective levels from a room's power-levels content, or from
/// nothing at all when the room has no such state event.
#[derive(Debug, Clone, Copy)]
pub struct PowerLevelResolver<'a> {
    content: Option<&'a PowerLevelsContent>,
}

impl<'a> PowerLevelResolver<'a> {
    /// Resolver for a room without a power-levels state event; every
    /// lookup falls through to the documented defaults.
    pub const ABSENT: PowerLevelResolver<'static> =
        PowerLevelResolver { content: None };

    pub fn new(content: &'a PowerLevelsContent) -> PowerLevelResolver<'a> {
        PowerLevelResolver {
            content: Some(content),
        }
    }

    pub fn from_option(
        content: Option<&'a PowerLevelsContent>,
    ) -> PowerLevelResolver<'a> {
        PowerLevelResolver { content }
    }

    /// A user's effective level: per-user override, else `users_default`,
    /// else 0.
    pub fn user_level(&self, user_id: &str) -> i64 {
        let content = match self.content {
            Some(c) => c,
            None => return DEFAULT_USER_LEVEL,
        };

        content
            .users
            .as_ref()
            .and_then(|users| users.get(user_id))
            .copied()
            .unwrap_or_else(|| {
                content.users_default.unwrap_or(DEFAULT_USER_LEVEL)
            })
    }

    /// The minimum level required to perform `action`.
    pub fn required_level(&self, action: Action<'_>) -> i64 {
        match action {
            Action::Ban => self.named(|c| c.ban, DEFAULT_ACTION_LEVEL),
            Action::Invite => self.named(|c| c.invite, DEFAULT_ACTION_LEVEL),
            Action::Kick => self.named(|c| c.kick, DEFAULT_ACTION_LEVEL),
            Action::Redact => self.named(|c| c.redact, DEFAULT_ACTION_LEVEL),
            Action::Notify => self.named(
                |c| c.notifications.as_ref().and_then(|n| n.room),
                DEFAULT_ACTION_LEVEL,
            ),
            Action::SendMessage(event_type) => {
                self.send_level(event_type, DEFAULT_EVENTS_LEVEL, |c| {
                    c.events_default
                })
            }
            Action::SendState(event_type) => {
                self.send_level(event_type, DEFAULT_STATE_LEVEL, |c| {
                    c.state_default
                })
            }
        }
    }

    /// Whether `user_id` may perform `action`. Ties favor authorization.
    pub fn authorized(&self, user_id: &str, action: Action<'_>) -> bool {
        self.user_level(user_id) >= self.required_level(action)
    }

    fn named<F>(&self, field: F, default: i64) -> i64
    where
        F: Fn(&PowerLevelsContent) -> Option<i64>,
    {
        self.content.and_then(field).unwrap_or(default)
    }

    fn send_level<F>(&self, event_type: &str, default: i64, fallback: F) -> i64
    where
        F: Fn(&PowerLevelsContent) -> Option<i64>,
    {
        let content = match self.content {
            Some(c) => c,
            None => return default,
        };

        content
            .events
            .as_ref()
            .and_then(|events| events.get(event_type))
            .copied()
            .unwrap_or_else(|| fallback(content).unwrap_or(default))
    }
}
