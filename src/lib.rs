//! An in-memory mock of a Matrix-style homeserver's event and state model.
//!
//! This is a test double for client implementations, not a real server: it
//! models the protocol's event envelopes and content schemas, folds state
//! events into a per-room current-state projection, resolves power levels,
//! and generates the various opaque identifiers the protocol hands out.
//! Transport, signing and persistence are deliberately absent.

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate failure;
#[cfg(test)]
#[macro_use]
extern crate serde_json;

pub mod identifiers;
pub mod protocol;
pub mod rooms;
pub mod state_map;
pub mod stores;
