//! Random identifier generation for events, rooms, tokens, media and
//! devices.
//!
//! Each identifier class draws from its own alphabet and length. Generation
//! itself never fails for a non-empty alphabet; collision handling is the
//! caller's job and lives next to the store insert (see
//! [`crate::stores::memory::MemoryStore::create_with_id`]).

use failure::Error;
use rand::{thread_rng, Rng};

/// Mixed-case letters and digits, used for event ids, room ids and access
/// tokens.
const ALPHANUMERIC: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Mixed-case letters only, used for media ids.
const ALPHABETIC: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Uppercase letters only, used for device ids.
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub const EVENT_ID_LENGTH: usize = 20;
pub const ROOM_ID_LENGTH: usize = 20;
pub const ACCESS_TOKEN_LENGTH: usize = 32;
pub const MEDIA_ID_LENGTH: usize = 24;
pub const DEVICE_ID_LENGTH: usize = 12;

/// Draws `length` independent, uniformly random characters from `alphabet`.
///
/// `thread_rng` is a cryptographically secure generator, so the result is
/// suitable for access tokens as well as ids.
pub fn generate(alphabet: &str, length: usize) -> Result<String, Error> {
    ensure!(!alphabet.is_empty(), "identifier alphabet must not be empty");
    ensure!(length > 0, "identifier length must be positive");

    let chars: Vec<char> = alphabet.chars().collect();
    let mut rng = thread_rng();

    Ok((0..length).map(|_| chars[rng.gen_range(0, chars.len())]).collect())
}

fn generate_known(alphabet: &str, length: usize) -> String {
    // The fixed alphabets above satisfy generate's contract.
    generate(alphabet, length).expect("alphabet is non-empty")
}

/// New event id in the form `$<20 alphanumerics>:<server name>`.
pub fn new_event_id(server_name: &str) -> String {
    format!("${}:{}", generate_known(ALPHANUMERIC, EVENT_ID_LENGTH), server_name)
}

/// New room id in the form `!<20 alphanumerics>:<server name>`.
pub fn new_room_id(server_name: &str) -> String {
    format!("!{}:{}", generate_known(ALPHANUMERIC, ROOM_ID_LENGTH), server_name)
}

/// New opaque access token, 32 mixed-case alphanumerics.
pub fn new_access_token() -> String {
    generate_known(ALPHANUMERIC, ACCESS_TOKEN_LENGTH)
}

/// New media id, 24 mixed-case letters.
pub fn new_media_id() -> String {
    generate_known(ALPHABETIC, MEDIA_ID_LENGTH)
}

/// New device id, 12 uppercase letters.
pub fn new_device_id() -> String {
    generate_known(UPPERCASE, DEVICE_ID_LENGTH)
}
