//! Field checks for room configuration.
//!
//! These mirror what an administrator sees while editing rooms. They never
//! block the registry: duplicate names are only warned about, and lookups
//! resolve them first-match-wins.

use crate::config::RoomConfig;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Ok,
    Warning(String),
    Error(String),
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        matches!(self, Validation::Ok)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Validation::Error(_))
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validation::Ok => f.write_str("ok"),
            Validation::Warning(msg) => write!(f, "warning: {}", msg),
            Validation::Error(msg) => write!(f, "error: {}", msg),
        }
    }
}

/// A non-ok result for one field of one configured room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Position of the room in the configuration.
    pub index: usize,
    pub field: &'static str,
    pub result: Validation,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rooms[{}].{}: {}", self.index, self.field, self.result)
    }
}

/// Fails when `value` is empty. Whitespace counts as a value.
pub fn check_required(value: &str, label: &str) -> Validation {
    if value.is_empty() {
        Validation::Error(format!("please input {}", label))
    } else {
        Validation::Ok
    }
}

/// Checks a room name against every configured room name, including its own entry.
///
/// A name that appears more than once (trimmed, ignoring case) is a warning.
pub fn check_room_name(name: &str, configured: &[&str]) -> Validation {
    let basic = check_required(name, "name");
    if !basic.is_ok() {
        return basic;
    }

    let wanted = name.trim().to_lowercase();
    let total = configured
        .iter()
        .filter(|other| other.trim().to_lowercase() == wanted)
        .count();

    if total > 1 {
        Validation::Warning(format!("duplicated name: {}", name))
    } else {
        Validation::Ok
    }
}

/// Runs every field check over the configured rooms.
pub fn validate_rooms(rooms: &[RoomConfig]) -> Vec<Finding> {
    let names: Vec<&str> = rooms.iter().map(|r| r.name.as_str()).collect();

    rooms
        .iter()
        .enumerate()
        .flat_map(|(index, room)| {
            [
                ("name", check_room_name(&room.name, &names)),
                ("room_id", check_required(&room.room_id, "room id")),
                ("token", check_required(room.token.expose_secret(), "bearer token")),
            ]
            .into_iter()
            .filter(|(_, result)| !result.is_ok())
            .map(move |(field, result)| Finding { index, field, result })
        })
        .collect()
}
