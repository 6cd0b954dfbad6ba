//! The protocol core: content schemas, event envelopes, the state
//! projection and power-level resolution.

pub mod content;
pub mod events;
pub mod power_levels;
pub mod state;
pub mod types;
