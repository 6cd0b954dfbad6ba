//! Keyed storage collaborators.
//!
//! The event/state core only ever needs create / get / find-all over
//! entities with a unique string key. At most one entity exists per key;
//! iteration order is insertion-independent and callers must not rely on
//! it beyond that.

use failure::Error;

use crate::protocol::events::Event;

pub mod memory;

/// An entity addressable by a unique string key.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// The storage seam the core is written against.
pub trait Store<T: Keyed + Clone>: Clone {
    /// Inserts a new entity; a duplicate key is an error.
    fn create(&self, entity: T) -> Result<T, Error>;

    fn get(&self, key: &str) -> Option<T>;

    fn find_all(&self, predicate: &dyn Fn(&T) -> bool) -> Vec<T>;
}

impl Keyed for Event {
    fn key(&self) -> &str {
        self.event_id()
    }
}

/// An access token handed out at login, correlated by (user, device).
#[derive(Debug, Clone, PartialEq)]
pub struct AccessToken {
    pub token: String,
    pub user_id: String,
    pub device_id: String,
}

impl Keyed for AccessToken {
    fn key(&self) -> &str {
        &self.token
    }
}

/// A device record for a logged-in user.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub device_id: String,
    pub user_id: String,
    pub display_name: Option<String>,
}

impl Keyed for Device {
    fn key(&self) -> &str {
        &self.device_id
    }
}

/// An uploaded piece of media.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub media_id: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Keyed for MediaItem {
    fn key(&self) -> &str {
        &self.media_id
    }
}
