//! The (event type, state key) dictionary underlying a room's current
//! state.

use std::collections::HashMap;
use std::fmt::Debug;
use std::iter::FromIterator;
use std::str::FromStr;

const TYPE_CREATE: &str = "m.room.create";
const TYPE_POWER_LEVELS: &str = "m.room.power_levels";
const TYPE_JOIN_RULES: &str = "m.room.join_rules";
const TYPE_HISTORY_VISIBILITY: &str = "m.room.history_visibility";
const TYPE_NAME: &str = "m.room.name";
const TYPE_TOPIC: &str = "m.room.topic";
const TYPE_AVATAR: &str = "m.room.avatar";
const TYPE_GUEST_ACCESS: &str = "m.room.guest_access";
const TYPE_CANONICAL_ALIAS: &str = "m.room.canonical_alias";
const TYPE_ENCRYPTION: &str = "m.room.encryption";
const TYPE_PINNED_EVENTS: &str = "m.room.pinned_events";
const TYPE_SERVER_ACL: &str = "m.room.server_acl";
const TYPE_TOMBSTONE: &str = "m.room.tombstone";

const TYPE_MEMBER: &str = "m.room.member";

/// Composite key identifying one current-state slot in a room.
///
/// Equality and hashing are structural: two keys are equal iff both the
/// event type and the state key match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey {
    pub event_type: String,
    pub state_key: String,
}

impl StateKey {
    pub fn new(event_type: impl Into<String>, state_key: impl Into<String>) -> StateKey {
        StateKey {
            event_type: event_type.into(),
            state_key: state_key.into(),
        }
    }
}

/// State event types that are commonly used with empty state keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownEmptyKeys {
    Create,
    PowerLevels,
    JoinRules,
    HistoryVisibility,
    Name,
    Topic,
    Avatar,
    GuestAccess,
    CanonicalAlias,
    Encryption,
    PinnedEvents,
    ServerAcl,
    Tombstone,
}

impl WellKnownEmptyKeys {
    pub fn as_str(self) -> &'static str {
        match self {
            WellKnownEmptyKeys::Create => TYPE_CREATE,
            WellKnownEmptyKeys::PowerLevels => TYPE_POWER_LEVELS,
            WellKnownEmptyKeys::JoinRules => TYPE_JOIN_RULES,
            WellKnownEmptyKeys::HistoryVisibility => TYPE_HISTORY_VISIBILITY,
            WellKnownEmptyKeys::Name => TYPE_NAME,
            WellKnownEmptyKeys::Topic => TYPE_TOPIC,
            WellKnownEmptyKeys::Avatar => TYPE_AVATAR,
            WellKnownEmptyKeys::GuestAccess => TYPE_GUEST_ACCESS,
            WellKnownEmptyKeys::CanonicalAlias => TYPE_CANONICAL_ALIAS,
            WellKnownEmptyKeys::Encryption => TYPE_ENCRYPTION,
            WellKnownEmptyKeys::PinnedEvents => TYPE_PINNED_EVENTS,
            WellKnownEmptyKeys::ServerAcl => TYPE_SERVER_ACL,
            WellKnownEmptyKeys::Tombstone => TYPE_TOMBSTONE,
        }
    }
}

impl FromStr for WellKnownEmptyKeys {
    type Err = failure::Error;

    fn from_str(t: &str) -> Result<Self, failure::Error> {
        match t {
            TYPE_CREATE => Ok(WellKnownEmptyKeys::Create),
            TYPE_POWER_LEVELS => Ok(WellKnownEmptyKeys::PowerLevels),
            TYPE_JOIN_RULES => Ok(WellKnownEmptyKeys::JoinRules),
            TYPE_HISTORY_VISIBILITY => {
                Ok(WellKnownEmptyKeys::HistoryVisibility)
            }
            TYPE_NAME => Ok(WellKnownEmptyKeys::Name),
            TYPE_TOPIC => Ok(WellKnownEmptyKeys::Topic),
            TYPE_AVATAR => Ok(WellKnownEmptyKeys::Avatar),
            TYPE_GUEST_ACCESS => Ok(WellKnownEmptyKeys::GuestAccess),
            TYPE_CANONICAL_ALIAS => Ok(WellKnownEmptyKeys::CanonicalAlias),
            TYPE_ENCRYPTION => Ok(WellKnownEmptyKeys::Encryption),
            TYPE_PINNED_EVENTS => Ok(WellKnownEmptyKeys::PinnedEvents),
            TYPE_SERVER_ACL => Ok(WellKnownEmptyKeys::ServerAcl),
            TYPE_TOMBSTONE => Ok(WellKnownEmptyKeys::Tombstone),
            _ => Err(format_err!("not a well-known empty-key type: {}", t)),
        }
    }
}

/// A specialised container for storing a state mapping.
///
/// Well-known empty-key types and membership entries (state keys are user
/// ids) get their own buckets; everything else lives in a generic
/// two-level map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateMap<E: Debug + Clone> {
    well_known: HashMap<WellKnownEmptyKeys, E>,
    membership: HashMap<String, E>,
    others: HashMap<String, HashMap<String, E>>,
}

impl<E> StateMap<E>
where
    E: Debug + Clone,
{
    pub fn new() -> StateMap<E> {
        StateMap {
            well_known: HashMap::new(),
            membership: HashMap::new(),
            others: HashMap::new(),
        }
    }

    pub fn get_well_known(&self, key: WellKnownEmptyKeys) -> Option<&E> {
        self.well_known.get(&key)
    }

    pub fn get_membership(&self, user: &str) -> Option<&E> {
        self.membership.get(user)
    }

    pub fn get(&self, t: &str, s: &str) -> Option<&E> {
        if s.is_empty() {
            if let Ok(key) = WellKnownEmptyKeys::from_str(t) {
                return self.get_well_known(key);
            }
        }

        match (t, s) {
            (TYPE_MEMBER, user) => self.get_membership(user),
            (t, s) => self.others.get(t).and_then(|m| m.get(s)),
        }
    }

    pub fn insert(&mut self, t: &str, s: &str, value: E) {
        if s.is_empty() {
            if let Ok(key) = WellKnownEmptyKeys::from_str(t) {
                self.well_known.insert(key, value);
                return;
            }
        }

        match (t, s) {
            (TYPE_MEMBER, user) => {
                self.membership.insert(user.into(), value)
            }
            (t, s) => self
                .others
                .entry(t.into())
                .or_insert_with(HashMap::new)
                .insert(s.into(), value),
        };
    }

    pub fn remove(&mut self, t: &str, s: &str) {
        if s.is_empty() {
            if let Ok(key) = WellKnownEmptyKeys::from_str(t) {
                self.well_known.remove(&key);
                return;
            }
        }

        match (t, s) {
            (TYPE_MEMBER, user) => self.membership.remove(user),
            (t, s) => self.others.get_mut(t).and_then(|m| m.remove(s)),
        };
    }

    pub fn contains_key(&self, t: &str, s: &str) -> bool {
        self.get(t, s).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = (&str, &str)> {
        let well_known = self.well_known.keys().map(|k| (k.as_str(), ""));

        let members =
            self.membership.keys().map(|u| (TYPE_MEMBER, u as &str));

        let others = self
            .others
            .iter()
            .flat_map(|(t, h)| h.keys().map(move |s| (t as &str, s as &str)));

        well_known.chain(members).chain(others)
    }

    pub fn iter(&self) -> impl Iterator<Item = ((&str, &str), &E)> {
        let well_known =
            self.well_known.iter().map(|(k, e)| ((k.as_str(), ""), e));

        let members = self
            .membership
            .iter()
            .map(|(u, e)| ((TYPE_MEMBER, u as &str), e));

        let others = self.others.iter().flat_map(|(t, h)| {
            h.iter().map(move |(s, e)| ((t as &str, s as &str), e))
        });

        well_known.chain(members).chain(others)
    }

    pub fn len(&self) -> usize {
        let others: usize = self.others.values().map(HashMap::len).sum();
        self.well_known.len() + self.membership.len() + others
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> FromIterator<((String, String), E)> for StateMap<E>
where
    E: Debug + Clone,
{
    fn from_iter<T: IntoIterator<Item = ((String, String), E)>>(
        iter: T,
    ) -> StateMap<E> {
        let mut state_map = StateMap::new();

        for ((t, s), e) in iter {
            state_map.insert(&t, &s, e);
        }

        state_map
    }
}

impl<'a, E> FromIterator<((&'a str, &'a str), E)> for StateMap<E>
where
    E: Debug + Clone,
{
    fn from_iter<T: IntoIterator<Item = ((&'a str, &'a str), E)>>(
        iter: T,
    ) -> StateMap<E> {
        let mut state_map = StateMap::new();

        for ((t, s), e) in iter {
            state_map.insert(t, s, e);
        }

        state_map
    }
}

impl<E> Extend<((String, String), E)> for StateMap<E>
where
    E: Debug + Clone,
{
    fn extend<T>(&mut self, iter: T)
    where
        T: IntoIterator<Item = ((String, String), E)>,
    {
        for ((t, s), e) in iter {
            self.insert(&t, &s, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(key: &StateKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn state_key_structural_equality() {
        let a = StateKey::new("m.room.member", "@alice:test");
        let b = StateKey::new("m.room.member", "@alice:test");
        let c = StateKey::new("m.room.member", "@bob:test");
        let d = StateKey::new("m.room.topic", "@alice:test");

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn insert_and_get_across_buckets() {
        let mut map = StateMap::new();

        map.insert("m.room.topic", "", 1);
        map.insert("m.room.member", "@alice:test", 2);
        map.insert("org.example.widget", "side", 3);

        assert_eq!(map.get("m.room.topic", ""), Some(&1));
        assert_eq!(map.get("m.room.member", "@alice:test"), Some(&2));
        assert_eq!(map.get("org.example.widget", "side"), Some(&3));
        assert_eq!(map.get("m.room.name", ""), None);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn insert_overwrites_same_slot() {
        let mut map = StateMap::new();

        map.insert("m.room.topic", "", "first");
        map.insert("m.room.topic", "", "second");

        assert_eq!(map.get("m.room.topic", ""), Some(&"second"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn remove_clears_slot() {
        let mut map = StateMap::new();

        map.insert("m.room.member", "@alice:test", 1);
        map.remove("m.room.member", "@alice:test");

        assert!(!map.contains_key("m.room.member", "@alice:test"));
        assert!(map.is_empty());
    }

    #[test]
    fn keys_cover_all_buckets() {
        let map: StateMap<u8> = vec![
            (("m.room.create", ""), 1),
            (("m.room.member", "@alice:test"), 2),
            (("org.example.widget", "side"), 3),
        ]
        .into_iter()
        .collect();

        let mut keys: Vec<_> = map.keys().collect();
        keys.sort();

        assert_eq!(
            keys,
            vec![
                ("m.room.create", ""),
                ("m.room.member", "@alice:test"),
                ("org.example.widget", "side"),
            ]
        );

        let mut entries: Vec<_> =
            map.iter().map(|((t, s), e)| ((t, s), *e)).collect();
        entries.sort();

        assert_eq!(
            entries,
            vec![
                (("m.room.create", ""), 1),
                (("m.room.member", "@alice:test"), 2),
                (("org.example.widget", "side"), 3),
            ]
        );
    }
}
