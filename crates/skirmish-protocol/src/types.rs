//! Core protocol types for Skirmish's wire format.
//!
//! Every message on the wire is a flat JSON object tagged by a `"type"`
//! field, one object per text frame. Inbound frames are parsed with the
//! `parse` constructors below rather than plain serde derives because the
//! protocol distinguishes *which* part of a frame is malformed (not JSON
//! at all, missing tag, missing deck id, ...) and reports a different
//! error text for each — see [`ProtocolError`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Newtype over `u64` so a player id can't be confused with a deck id
/// even though both are plain numbers on the wire
/// (`#[serde(transparent)]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a deck, issued by the catalog service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeckId(pub u64);

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D-{}", self.0)
    }
}

/// The URL-safe identifier of a room: a fixed-length random
/// alphanumeric string, generated at room creation and used as the
/// room-channel path segment (`/room/<slug>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomSlug(String);

impl RoomSlug {
    /// Slugs are always exactly this many characters.
    pub const LEN: usize = 16;

    /// Wraps an already-generated slug string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the slug as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Unit kinds
// ---------------------------------------------------------------------------

/// The closed set of unit types.
///
/// Movement legality dispatches on this enum (never on strings); the
/// uppercase wire spelling matches the catalog service's type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitKind {
    King,
    Wizard,
    Archer,
    Warrior,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::King => write!(f, "KING"),
            Self::Wizard => write!(f, "WIZARD"),
            Self::Archer => write!(f, "ARCHER"),
            Self::Warrior => write!(f, "WARRIOR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Queue channel
// ---------------------------------------------------------------------------

/// An inbound request on the queue channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueRequest {
    /// Join the matchmaking queue with the given deck.
    Connect { deck_id: DeckId },
}

impl QueueRequest {
    /// Parses one queue-channel frame.
    ///
    /// Returns `Ok(None)` for frames with an unrecognized `type` value —
    /// those are silently ignored rather than rejected. A `type` field
    /// that is present but not a string is also ignored.
    pub fn parse(text: &str) -> Result<Option<Self>, ProtocolError> {
        let (obj, kind) = parse_tagged(text)?;
        match kind.as_str() {
            "connect" => {
                let raw = obj
                    .get("deck_id")
                    .ok_or(ProtocolError::DeckIdMissing)?;
                let deck_id = coerce_u64(raw)
                    .map(DeckId)
                    .ok_or(ProtocolError::DeckIdInvalid)?;
                Ok(Some(Self::Connect { deck_id }))
            }
            _ => Ok(None),
        }
    }
}

/// An outbound message on the queue channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QueueMessage {
    /// Progress report; `room` is only present on a successful match.
    #[serde(rename = "INFO")]
    Info {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<RoomSlug>,
    },

    /// A rejected request, with the reason.
    #[serde(rename = "ERROR")]
    Error { message: String },
}

impl QueueMessage {
    /// An `INFO` message with no room attached.
    pub fn info(message: impl Into<String>) -> Self {
        Self::Info {
            message: message.into(),
            room: None,
        }
    }

    /// The `INFO` message announcing a found match.
    pub fn matched(slug: RoomSlug) -> Self {
        Self::Info {
            message: "user found".into(),
            room: Some(slug),
        }
    }

    /// An `ERROR` message.
    pub fn error(message: impl fmt::Display) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Room channel
// ---------------------------------------------------------------------------

/// The coordinates of a requested move, 1-indexed board cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCommand {
    pub from_x: u8,
    pub from_y: u8,
    pub to_x: u8,
    pub to_y: u8,
}

/// An inbound request on the room channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomRequest {
    /// Signal readiness to the opponent.
    Start,
    /// Move a unit.
    Move(MoveCommand),
}

impl RoomRequest {
    /// Parses one room-channel frame. `Ok(None)` for unrecognized types,
    /// as on the queue channel.
    pub fn parse(text: &str) -> Result<Option<Self>, ProtocolError> {
        let (obj, kind) = parse_tagged(text)?;
        match kind.as_str() {
            "start" => Ok(Some(Self::Start)),
            "move" => {
                let coord = |field: &str| -> Result<u8, ProtocolError> {
                    obj.get(field)
                        .and_then(coerce_u64)
                        .and_then(|n| u8::try_from(n).ok())
                        .ok_or(ProtocolError::MoveInvalid)
                };
                Ok(Some(Self::Move(MoveCommand {
                    from_x: coord("from_x")?,
                    from_y: coord("from_y")?,
                    to_x: coord("to_x")?,
                    to_y: coord("to_y")?,
                })))
            }
            _ => Ok(None),
        }
    }
}

/// An outbound message on the room channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoomMessage {
    /// The attach snapshot, pushed once when a seat connects.
    ///
    /// `state` and `round` are the caller's own latest round-log entry so
    /// a reconnecting client can pick up where it left off.
    #[serde(rename = "INFO")]
    Attached {
        opponent_score: i32,
        opponent_deck: DeckId,
        opponent_online: bool,
        first: bool,
        state: String,
        round: u32,
    },

    /// The opponent's presence changed.
    #[serde(rename = "connection_info")]
    ConnectionInfo { online: bool },

    /// The opponent declared readiness.
    #[serde(rename = "start")]
    Start,

    /// A move was applied; broadcast to both seats.
    #[serde(rename = "move")]
    Move {
        player: PlayerId,
        from_x: u8,
        from_y: u8,
        to_x: u8,
        to_y: u8,
        captured: bool,
        round: u32,
        ended: bool,
    },

    /// A rejected request, delivered only to the offender.
    #[serde(rename = "ERROR")]
    Error { message: String },
}

impl RoomMessage {
    /// An `ERROR` message.
    pub fn error(message: impl fmt::Display) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse helpers
// ---------------------------------------------------------------------------

/// Parses a frame into a JSON object and extracts its `type` tag.
fn parse_tagged(
    text: &str,
) -> Result<(serde_json::Map<String, Value>, String), ProtocolError> {
    let value: Value =
        serde_json::from_str(text).map_err(ProtocolError::NotJson)?;
    let Value::Object(obj) = value else {
        return Err(ProtocolError::MissingType);
    };
    let kind = match obj.get("type") {
        None => return Err(ProtocolError::MissingType),
        // A non-string tag can never match a known type; callers treat
        // the empty string as "unrecognized" and ignore the frame.
        Some(v) => v.as_str().unwrap_or_default().to_string(),
    };
    Ok((obj, kind))
}

/// Reads a non-negative integer from a JSON number or a numeric string
/// (clients are allowed to send `"deck_id": "7"`).
fn coerce_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// =========================================================================
// Tests
// =========================================================================
