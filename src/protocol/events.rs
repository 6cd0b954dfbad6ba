//! Event envelopes and the tagged union of known content types.
//!
//! The `event_kinds!` table below is the single registration point tying a
//! wire type tag to its content schema and its state-ness; both directions
//! of the mapping are generated from one entry, so they cannot drift
//! apart. Adding a protocol event kind means adding exactly one line.

use std::str::FromStr;

use failure::Error;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::protocol::content::*;
use crate::protocol::power_levels::PowerLevelsContent;

macro_rules! event_kinds {
    ($( $tag:literal => $variant:ident($content:ty), state: $is_state:literal; )*) => {
        /// The closed set of known event type tags.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum EventKind {
            $($variant,)*
        }

        impl EventKind {
            pub const ALL: &'static [EventKind] = &[
                $(EventKind::$variant,)*
            ];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(EventKind::$variant => $tag,)*
                }
            }

            /// True iff events of this kind establish a state slot.
            pub fn is_state(self) -> bool {
                match self {
                    $(EventKind::$variant => $is_state,)*
                }
            }
        }

        impl FromStr for EventKind {
            type Err = Error;

            fn from_str(t: &str) -> Result<EventKind, Error> {
                match t {
                    $($tag => Ok(EventKind::$variant),)*
                    _ => Err(format_err!(
                        "no matching variant for event type: {}",
                        t
                    )),
                }
            }
        }

        /// Typed content, one variant per known event kind.
        #[derive(Debug, Clone, PartialEq)]
        pub enum EventContent {
            $($variant($content),)*
        }

        impl EventContent {
            pub fn kind(&self) -> EventKind {
                match self {
                    $(EventContent::$variant(_) => EventKind::$variant,)*
                }
            }

            /// Decoder half of the registration table.
            pub fn decode(
                kind: EventKind,
                value: Value,
            ) -> Result<EventContent, Error> {
                match kind {
                    $(EventKind::$variant => {
                        Ok(EventContent::$variant(serde_json::from_value(
                            value,
                        )?))
                    })*
                }
            }

            /// Encoder half of the registration table.
            pub fn encode(&self) -> Result<Value, Error> {
                match self {
                    $(EventContent::$variant(c) => {
                        Ok(serde_json::to_value(c)?)
                    })*
                }
            }

            pub fn is_state(&self) -> bool {
                self.kind().is_state()
            }
        }
    };
}

event_kinds! {
    "m.call.answer" => CallAnswer(CallAnswerContent), state: false;
    "m.call.candidates" => CallCandidates(CallCandidatesContent), state: false;
    "m.call.hangup" => CallHangup(CallHangupContent), state: false;
    "m.call.invite" => CallInvite(CallInviteContent), state: false;
    "m.room.aliases" => Aliases(AliasesContent), state: true;
    "m.room.avatar" => Avatar(AvatarContent), state: true;
    "m.room.canonical_alias" => CanonicalAlias(CanonicalAliasContent), state: true;
    "m.room.create" => Create(CreateContent), state: true;
    "m.room.encryption" => Encryption(EncryptionContent), state: true;
    "m.room.guest_access" => GuestAccess(GuestAccessContent), state: true;
    "m.room.history_visibility" => HistoryVisibility(HistoryVisibilityContent), state: true;
    "m.room.join_rules" => JoinRules(JoinRulesContent), state: true;
    "m.room.member" => Member(MemberContent), state: true;
    "m.room.message" => Message(MessageContent), state: false;
    "m.room.name" => Name(NameContent), state: true;
    "m.room.pinned_events" => PinnedEvents(PinnedEventsContent), state: true;
    "m.room.power_levels" => PowerLevels(PowerLevelsContent), state: true;
    "m.room.redaction" => Redaction(RedactionContent), state: false;
    "m.room.server_acl" => ServerAcl(ServerAclContent), state: true;
    "m.room.third_party_invite" => ThirdPartyInvite(ThirdPartyInviteContent), state: true;
    "m.room.tombstone" => Tombstone(TombstoneContent), state: true;
    "m.room.topic" => Topic(TopicContent), state: true;
}

/// Server-side metadata delivered alongside an event.
///
/// Unlike the rest of the envelope this side channel stays mutable after
/// ingestion, so age and redaction markers can be refreshed at read time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnsignedData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redacted_because: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// The common event envelope.
///
/// The wire `type` tag is always derived from the content variant, so an
/// envelope whose tag disagrees with its content schema cannot be
/// constructed; state kinds carry a `state_key` and non-state kinds never
/// do, enforced by [`EventBuilder::finish`] and by deserialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    content: EventContent,
    event_id: String,
    origin_server_ts: i64,
    prev_content: Option<EventContent>,
    redacts: Option<String>,
    room_id: String,
    sender: String,
    state_key: Option<String>,
    unsigned: Option<UnsignedData>,
}

impl Event {
    pub fn builder(
        room_id: impl Into<String>,
        sender: impl Into<String>,
        content: EventContent,
    ) -> EventBuilder {
        EventBuilder {
            content,
            origin_server_ts: None,
            redacts: None,
            room_id: room_id.into(),
            sender: sender.into(),
            state_key: None,
        }
    }

    pub fn content(&self) -> &EventContent {
        &self.content
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn event_type(&self) -> &'static str {
        self.content.kind().as_str()
    }

    pub fn kind(&self) -> EventKind {
        self.content.kind()
    }

    /// True iff this envelope is a state-event specialization.
    pub fn is_state_event(&self) -> bool {
        self.state_key.is_some()
    }

    pub fn origin_server_ts(&self) -> i64 {
        self.origin_server_ts
    }

    pub fn prev_content(&self) -> Option<&EventContent> {
        self.prev_content.as_ref()
    }

    pub fn redacts(&self) -> Option<&str> {
        self.redacts.as_ref().map(|s| s as &str)
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn state_key(&self) -> Option<&str> {
        self.state_key.as_ref().map(|s| s as &str)
    }

    pub fn unsigned(&self) -> Option<&UnsignedData> {
        self.unsigned.as_ref()
    }

    /// Mutable access to the unsigned side channel, creating it on first
    /// use. The rest of the envelope is immutable after construction.
    pub fn unsigned_mut(&mut self) -> &mut UnsignedData {
        self.unsigned.get_or_insert_with(UnsignedData::default)
    }

    pub(crate) fn set_prev_content(&mut self, content: EventContent) {
        self.prev_content = Some(content);
    }
}

/// Assembles an [`Event`], enforcing the type/state-key contract at
/// construction time.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    content: EventContent,
    origin_server_ts: Option<i64>,
    redacts: Option<String>,
    room_id: String,
    sender: String,
    state_key: Option<String>,
}

impl EventBuilder {
    pub fn state_key(mut self, state_key: impl Into<String>) -> Self {
        self.state_key = Some(state_key.into());
        self
    }

    pub fn origin_server_ts(mut self, ts: i64) -> Self {
        self.origin_server_ts = Some(ts);
        self
    }

    pub fn redacts(mut self, event_id: impl Into<String>) -> Self {
        self.redacts = Some(event_id.into());
        self
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn finish(self, event_id: impl Into<String>) -> Result<Event, Error> {
        let kind = self.content.kind();

        if kind.is_state() {
            ensure!(
                self.state_key.is_some(),
                "{} is a state event and requires a state key",
                kind.as_str()
            );
        } else {
            ensure!(
                self.state_key.is_none(),
                "{} is not a state event and cannot carry a state key",
                kind.as_str()
            );
        }

        let origin_server_ts = self
            .origin_server_ts
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

        Ok(Event {
            content: self.content,
            event_id: event_id.into(),
            origin_server_ts,
            prev_content: None,
            redacts: self.redacts,
            room_id: self.room_id,
            sender: self.sender,
            state_key: self.state_key,
            unsigned: None,
        })
    }
}

// Wire form: fields are emitted in the fixed order below regardless of how
// callers built the event.
#[derive(Serialize)]
struct WireEventRef<'a> {
    content: Value,
    event_id: &'a str,
    origin_server_ts: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    prev_content: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redacts: Option<&'a str>,
    room_id: &'a str,
    sender: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_key: Option<&'a str>,
    #[serde(rename = "type")]
    event_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    unsigned: Option<&'a UnsignedData>,
}

#[derive(Deserialize)]
struct WireEvent {
    content: Value,
    event_id: String,
    origin_server_ts: i64,
    prev_content: Option<Value>,
    redacts: Option<String>,
    room_id: String,
    sender: String,
    state_key: Option<String>,
    #[serde(rename = "type")]
    event_type: String,
    unsigned: Option<UnsignedData>,
}

impl Serialize for Event {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let content = self.content.encode().map_err(S::Error::custom)?;

        let prev_content = match &self.prev_content {
            Some(c) => Some(c.encode().map_err(S::Error::custom)?),
            None => None,
        };

        WireEventRef {
            content,
            event_id: &self.event_id,
            origin_server_ts: self.origin_server_ts,
            prev_content,
            redacts: self.redacts.as_ref().map(|s| s as &str),
            room_id: &self.room_id,
            sender: &self.sender,
            state_key: self.state_key.as_ref().map(|s| s as &str),
            event_type: self.content.kind().as_str(),
            unsigned: self.unsigned.as_ref(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D>(deserializer: D) -> Result<Event, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = WireEvent::deserialize(deserializer)?;

        let kind: EventKind =
            wire.event_type.parse().map_err(D::Error::custom)?;

        let content = EventContent::decode(kind, wire.content)
            .map_err(D::Error::custom)?;

        if kind.is_state() && wire.state_key.is_none() {
            return Err(D::Error::custom(format_err!(
                "{} is a state event and requires a state key",
                kind.as_str()
            )));
        }

        if !kind.is_state() && wire.state_key.is_some() {
            return Err(D::Error::custom(format_err!(
                "{} is not a state event and cannot carry a state key",
                kind.as_str()
            )));
        }

        let prev_content = match wire.prev_content {
            Some(v) => {
                Some(EventContent::decode(kind, v).map_err(D::Error::custom)?)
            }
            None => None,
        };

        Ok(Event {
            content,
            event_id: wire.event_id,
            origin_server_ts: wire.origin_server_ts,
            prev_content,
            redacts: wire.redacts,
            room_id: wire.room_id,
            sender: wire.sender,
            state_key: wire.state_key,
            unsigned: wire.unsigned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::content::{MessageContent, TextMessage, TopicContent};

    #[test]
    fn kind_mapping_is_bidirectional() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), *kind);
        }
    }

    fn content_fixture(kind: EventKind) -> Value {
        match kind {
            EventKind::CallAnswer => json!({
                "answer": {"sdp": "v=0\r\n...", "type": "answer"},
                "call_id": "12345",
                "version": 0,
            }),
            EventKind::CallCandidates => json!({
                "call_id": "12345",
                "candidates": [{
                    "candidate": "candidate:1 1 UDP 2130706431 10.0.0.1 56789 typ host",
                    "sdpMLineIndex": 0,
                    "sdpMid": "audio",
                }],
                "version": 0,
            }),
            EventKind::CallHangup => json!({
                "call_id": "12345",
                "reason": "invite_timeout",
                "version": 0,
            }),
            EventKind::CallInvite => json!({
                "call_id": "12345",
                "lifetime": 60000,
                "offer": {"sdp": "v=0\r\n...", "type": "offer"},
                "version": 0,
            }),
            EventKind::Aliases => json!({
                "aliases": ["#room:example.org"],
            }),
            EventKind::Avatar => json!({
                "info": {"h": 128, "mimetype": "image/png", "w": 128},
                "url": "mxc://example.org/AbCdEfGh",
            }),
            EventKind::CanonicalAlias => json!({
                "alias": "#room:example.org",
                "alt_aliases": ["#other:example.org"],
            }),
            EventKind::Create => json!({
                "creator": "@alice:example.org",
                "m.federate": false,
                "room_version": "5",
            }),
            EventKind::Encryption => json!({
                "algorithm": "m.megolm.v1.aes-sha2",
                "rotation_period_ms": 604800000i64,
                "rotation_period_msgs": 100,
            }),
            EventKind::GuestAccess => json!({
                "guest_access": "can_join",
            }),
            EventKind::HistoryVisibility => json!({
                "history_visibility": "shared",
            }),
            EventKind::JoinRules => json!({
                "join_rule": "invite",
            }),
            EventKind::Member => json!({
                "displayname": "Alice",
                "membership": "join",
            }),
            EventKind::Message => json!({
                "body": "hello",
                "msgtype": "m.text",
            }),
            EventKind::Name => json!({
                "name": "Test room",
            }),
            EventKind::PinnedEvents => json!({
                "pinned": ["$pinned0123456789abc:example.org"],
            }),
            EventKind::PowerLevels => json!({
                "ban": 50,
                "users": {"@alice:example.org": 100},
            }),
            EventKind::Redaction => json!({
                "reason": "spam",
            }),
            EventKind::ServerAcl => json!({
                "allow": ["*"],
                "allow_ip_literals": false,
                "deny": ["evil.example.org"],
            }),
            EventKind::ThirdPartyInvite => json!({
                "display_name": "Alice",
                "key_validity_url": "https://example.org/_matrix/key",
                "public_key": "abc123",
            }),
            EventKind::Tombstone => json!({
                "body": "This room has been replaced",
                "replacement_room": "!newroomnewroomnewroo:example.org",
            }),
            EventKind::Topic => json!({
                "topic": "Hello",
            }),
        }
    }

    fn state_key_fixture(kind: EventKind) -> &'static str {
        match kind {
            EventKind::Member => "@alice:example.org",
            EventKind::Aliases => "example.org",
            EventKind::ThirdPartyInvite => "tokenTOKENtoken",
            _ => "",
        }
    }

    #[test]
    fn every_kind_round_trips() {
        for kind in EventKind::ALL {
            let mut json = json!({
                "content": content_fixture(*kind),
                "event_id": "$abcDEF0123456789ghij:example.org",
                "origin_server_ts": 1554477158528i64,
                "room_id": "!roomroomroomroomroom:example.org",
                "sender": "@alice:example.org",
                "type": kind.as_str(),
            });
            if kind.is_state() {
                json["state_key"] = json!(state_key_fixture(*kind));
            }
            if *kind == EventKind::Redaction {
                json["redacts"] = json!("$dead0123456789abcde:example.org");
            }

            let event: Event = serde_json::from_value(json.clone()).unwrap();
            assert_eq!(event.kind(), *kind);
            assert_eq!(
                serde_json::to_value(&event).unwrap(),
                json,
                "wire shape drifted for {}",
                kind.as_str()
            );

            let serialized = serde_json::to_string(&event).unwrap();
            let reparsed: Event = serde_json::from_str(&serialized).unwrap();
            assert_eq!(reparsed, event, "{}", kind.as_str());
            assert_eq!(
                serde_json::to_string(&reparsed).unwrap(),
                serialized,
                "re-serialization unstable for {}",
                kind.as_str()
            );
        }
    }

    #[test]
    fn state_event_round_trips() {
        let json = json!({
            "content": {"topic": "Hello"},
            "event_id": "$abcDEF0123456789ghij:example.org",
            "origin_server_ts": 1554477158528i64,
            "room_id": "!roomroomroomroomroom:example.org",
            "sender": "@alice:example.org",
            "state_key": "",
            "type": "m.room.topic",
            "unsigned": {"age": 1234},
        });

        let event: Event = serde_json::from_value(json.clone()).unwrap();

        assert_eq!(event.event_type(), "m.room.topic");
        assert!(event.is_state_event());
        assert_eq!(event.state_key(), Some(""));
        assert_eq!(event.unsigned().unwrap().age, Some(1234));

        assert_eq!(serde_json::to_value(&event).unwrap(), json);

        let reparsed: Event =
            serde_json::from_value(serde_json::to_value(&event).unwrap())
                .unwrap();
        assert_eq!(reparsed, event);
    }

    #[test]
    fn message_event_round_trips() {
        let json = json!({
            "content": {"body": "ok :)", "msgtype": "m.text"},
            "event_id": "$abcDEF0123456789ghij:example.org",
            "origin_server_ts": 1554477158528i64,
            "room_id": "!roomroomroomroomroom:example.org",
            "sender": "@dave:example.org",
            "type": "m.room.message",
        });

        let event: Event = serde_json::from_value(json.clone()).unwrap();

        assert!(!event.is_state_event());
        assert_eq!(serde_json::to_value(&event).unwrap(), json);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let res: Result<Event, _> = serde_json::from_value(json!({
            "content": {},
            "event_id": "$abcDEF0123456789ghij:example.org",
            "origin_server_ts": 0,
            "room_id": "!roomroomroomroomroom:example.org",
            "sender": "@alice:example.org",
            "type": "org.example.unknown",
        }));

        let err = res.unwrap_err().to_string();
        assert!(err.contains("no matching variant"), "{}", err);
    }

    #[test]
    fn state_kind_requires_state_key() {
        let res: Result<Event, _> = serde_json::from_value(json!({
            "content": {"topic": "Hello"},
            "event_id": "$abcDEF0123456789ghij:example.org",
            "origin_server_ts": 0,
            "room_id": "!roomroomroomroomroom:example.org",
            "sender": "@alice:example.org",
            "type": "m.room.topic",
        }));

        assert!(res.is_err());
    }

    #[test]
    fn message_kind_rejects_state_key() {
        let res: Result<Event, _> = serde_json::from_value(json!({
            "content": {"body": "hi", "msgtype": "m.text"},
            "event_id": "$abcDEF0123456789ghij:example.org",
            "origin_server_ts": 0,
            "room_id": "!roomroomroomroomroom:example.org",
            "sender": "@alice:example.org",
            "state_key": "",
            "type": "m.room.message",
        }));

        assert!(res.is_err());
    }

    #[test]
    fn builder_enforces_state_key_contract() {
        let message = EventContent::Message(MessageContent::Text(
            TextMessage::plain("hi"),
        ));
        let topic = EventContent::Topic(TopicContent {
            topic: "news".to_string(),
        });

        assert!(Event::builder("!r:test", "@a:test", message.clone())
            .state_key("")
            .finish("$e:test")
            .is_err());

        assert!(Event::builder("!r:test", "@a:test", topic.clone())
            .finish("$e:test")
            .is_err());

        let ok = Event::builder("!r:test", "@a:test", topic)
            .state_key("")
            .origin_server_ts(42)
            .finish("$e:test")
            .unwrap();
        assert_eq!(ok.origin_server_ts(), 42);
        assert_eq!(ok.event_type(), "m.room.topic");
    }

    #[test]
    fn unsigned_side_channel_is_mutable() {
        let mut event = Event::builder(
            "!r:test",
            "@a:test",
            EventContent::Message(MessageContent::Text(TextMessage::plain(
                "hi",
            ))),
        )
        .finish("$e:test")
        .unwrap();

        assert!(event.unsigned().is_none());
        event.unsigned_mut().age = Some(500);
        assert_eq!(event.unsigned().unwrap().age, Some(500));

        let val = serde_json::to_value(&event).unwrap();
        assert_eq!(val["unsigned"], json!({"age": 500}));
    }
}
