//! The room/session registry: durable store of rooms, seats, units, and
//! the round log.
//!
//! The registry is the sole owner and sole mutator of this data.
//! Connection actors never touch it directly — they go through the game
//! state machine ([`crate::game`]) and the factory
//! ([`crate::create_room`]), so a reconnecting client can always
//! resynchronize from the registry's current truth rather than any
//! actor's ephemeral state.
//!
//! # Concurrency note
//!
//! `Registry` is NOT thread-safe by itself — it's a plain `HashMap`
//! serialized behind a mutex one level up (the server state). All
//! methods are synchronous and complete without suspension, which is
//! what makes room creation and move application atomic.

use std::collections::HashMap;
use std::time::SystemTime;

use skirmish_protocol::{DeckId, PlayerId, RoomSlug, UnitKind};
use tokio::sync::mpsc;

use crate::RoomError;
use crate::rules::{BOARD_MAX, BOARD_MIN};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Notifications delivered to a seat's connection actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// The opponent's presence changed.
    Presence { online: bool },
    /// The opponent declared readiness.
    Ready,
    /// A move was applied (sent to both seats, including the mover).
    Moved(MoveRecord),
}

/// Channel sender for reaching a seat's connection actor.
pub type SeatSender = mpsc::UnboundedSender<RoomEvent>;

/// The outcome of a successfully applied move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub player: PlayerId,
    pub from_x: u8,
    pub from_y: u8,
    pub to_x: u8,
    pub to_y: u8,
    /// Whether an opposing unit was captured at the destination.
    pub captured: bool,
    /// The mover's round counter after this move.
    pub round: u32,
    /// Whether this move ended the game (a King was captured).
    pub ended: bool,
}

// ---------------------------------------------------------------------------
// Stored records
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// AwaitingBothOnline → InProgress → Ended
/// ```
///
/// A room enters `InProgress` the first time both seats are online
/// simultaneously and never goes back; `Ended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    AwaitingBothOnline,
    InProgress,
    Ended,
}

impl RoomPhase {
    /// Whether moves are currently accepted.
    pub fn is_in_progress(self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingBothOnline => write!(f, "AwaitingBothOnline"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}

/// One active match. Immutable once ended; never deleted.
pub struct Room {
    pub slug: RoomSlug,
    pub created_at: SystemTime,
    pub ended: bool,
    pub phase: RoomPhase,
}

/// One player's seat in a room.
pub struct Seat {
    pub player_id: PlayerId,
    pub deck_id: DeckId,
    /// Score snapshot taken at match time.
    pub score: i32,
    /// Whether this seat moves on odd rounds.
    pub first: bool,
    pub online: bool,
    /// Live line to the seat's connection actor; `None` while offline.
    pub(crate) sender: Option<SeatSender>,
}

impl Seat {
    /// Whether this seat is currently attached through the given sender's
    /// channel. Lets a connection recognize that a newer connection for
    /// the same player has replaced it before tearing the seat down.
    pub fn is_attached_via(&self, sender: &SeatSender) -> bool {
        self.sender
            .as_ref()
            .is_some_and(|s| s.same_channel(sender))
    }
}

/// One live unit on the board. Dead units stay as history but are
/// excluded from every occupancy and path check.
pub struct Unit {
    pub kind: UnitKind,
    pub owner: PlayerId,
    pub x: u8,
    pub y: u8,
    pub health: i32,
    pub attack: i32,
    pub speed: i32,
    pub dead: bool,
    /// Set after the unit's first move (the Warrior's diagonal step is
    /// only available before this flips).
    pub moved: bool,
}

/// One append-only round-log entry. `(player, round)` is unique within
/// a room; `round` is monotonically increasing per player.
pub struct RoundEntry {
    pub player: PlayerId,
    pub round: u32,
    pub message: String,
}

/// The attach snapshot pushed to a seat when it connects, built from the
/// opponent's seat and the caller's own latest round-log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachSnapshot {
    pub opponent_score: i32,
    pub opponent_deck: DeckId,
    pub opponent_online: bool,
    pub first: bool,
    pub state: String,
    pub round: u32,
}

// ---------------------------------------------------------------------------
// RoomRecord
// ---------------------------------------------------------------------------

/// Everything the registry stores about one room.
pub struct RoomRecord {
    pub(crate) room: Room,
    pub(crate) seats: [Seat; 2],
    pub(crate) units: Vec<Unit>,
    pub(crate) rounds: Vec<RoundEntry>,
}

impl RoomRecord {
    pub(crate) fn new(
        room: Room,
        seats: [Seat; 2],
        units: Vec<Unit>,
        rounds: Vec<RoundEntry>,
    ) -> Self {
        Self {
            room,
            seats,
            units,
            rounds,
        }
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn seats(&self) -> &[Seat; 2] {
        &self.seats
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn rounds(&self) -> &[RoundEntry] {
        &self.rounds
    }

    /// The seat held by `player`, if they are in this room.
    pub fn seat(&self, player: PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.player_id == player)
    }

    pub(crate) fn seat_index(&self, player: PlayerId) -> Option<usize> {
        self.seats.iter().position(|s| s.player_id == player)
    }

    /// The living unit at a cell, if any. At most one can exist — the
    /// occupancy invariant — so the first hit is the answer.
    pub fn living_unit_at(&self, x: u8, y: u8) -> Option<&Unit> {
        self.units
            .iter()
            .find(|u| !u.dead && u.x == x && u.y == y)
    }

    pub(crate) fn living_index_at(&self, x: u8, y: u8) -> Option<usize> {
        self.units
            .iter()
            .position(|u| !u.dead && u.x == x && u.y == y)
    }

    /// The player's latest round-log entry.
    pub fn last_round(&self, player: PlayerId) -> Option<&RoundEntry> {
        self.rounds
            .iter()
            .filter(|r| r.player == player)
            .max_by_key(|r| r.round)
    }

    /// Appends the player's next round entry and returns its number.
    pub(crate) fn push_round(
        &mut self,
        player: PlayerId,
        message: impl Into<String>,
    ) -> u32 {
        let round = self
            .last_round(player)
            .map(|r| r.round + 1)
            .unwrap_or_default();
        self.rounds.push(RoundEntry {
            player,
            round,
            message: message.into(),
        });
        round
    }

    /// Renders the live board for debug logs, top row first. Empty cells
    /// are `*`; glyphs are white for the first seat, black for the other.
    pub fn render_board(&self) -> String {
        let mut out = String::new();
        for y in (BOARD_MIN..=BOARD_MAX).rev() {
            for x in BOARD_MIN..=BOARD_MAX {
                match self.living_unit_at(x, y) {
                    Some(unit) => {
                        let first = self
                            .seat(unit.owner)
                            .is_some_and(|s| s.first);
                        out.push(unit_glyph(unit.kind, first));
                    }
                    None => out.push('*'),
                }
            }
            out.push('\n');
        }
        out
    }
}

fn unit_glyph(kind: UnitKind, first: bool) -> char {
    match (kind, first) {
        (UnitKind::King, true) => '♔',
        (UnitKind::King, false) => '♚',
        (UnitKind::Wizard, true) => '♕',
        (UnitKind::Wizard, false) => '♛',
        (UnitKind::Archer, true) => '♗',
        (UnitKind::Archer, false) => '♝',
        (UnitKind::Warrior, true) => '♙',
        (UnitKind::Warrior, false) => '♟',
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The store of all rooms, keyed by slug.
pub struct Registry {
    rooms: HashMap<RoomSlug, RoomRecord>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
        }
    }

    /// Whether a room with this slug exists (used by the factory's
    /// collision retry).
    pub fn contains(&self, slug: &RoomSlug) -> bool {
        self.rooms.contains_key(slug)
    }

    pub(crate) fn insert(&mut self, record: RoomRecord) {
        self.rooms.insert(record.room.slug.clone(), record);
    }

    /// Looks up a room by slug.
    pub fn room_by_slug(
        &self,
        slug: &RoomSlug,
    ) -> Result<&RoomRecord, RoomError> {
        self.rooms.get(slug).ok_or(RoomError::NotFound)
    }

    pub(crate) fn room_mut(
        &mut self,
        slug: &RoomSlug,
    ) -> Result<&mut RoomRecord, RoomError> {
        self.rooms.get_mut(slug).ok_or(RoomError::NotFound)
    }

    /// The seat `player` holds in the room, or `NotASeat` — the access
    /// check every room-channel operation starts with.
    pub fn seat_of(
        &self,
        slug: &RoomSlug,
        player: PlayerId,
    ) -> Result<&Seat, RoomError> {
        self.room_by_slug(slug)?
            .seat(player)
            .ok_or(RoomError::NotASeat)
    }

    /// The *other* seat of the room `player` sits in.
    pub fn opponent_seat_of(
        &self,
        slug: &RoomSlug,
        player: PlayerId,
    ) -> Result<&Seat, RoomError> {
        let record = self.room_by_slug(slug)?;
        let idx = record.seat_index(player).ok_or(RoomError::NotASeat)?;
        Ok(&record.seats[1 - idx])
    }

    /// Builds the attach snapshot for a seat.
    pub fn snapshot(
        &self,
        slug: &RoomSlug,
        player: PlayerId,
    ) -> Result<AttachSnapshot, RoomError> {
        let record = self.room_by_slug(slug)?;
        let seat = record.seat(player).ok_or(RoomError::NotASeat)?;
        let idx = record.seat_index(player).expect("seat exists");
        let opponent = &record.seats[1 - idx];
        let (state, round) = record
            .last_round(player)
            .map(|r| (r.message.clone(), r.round))
            .unwrap_or_default();
        Ok(AttachSnapshot {
            opponent_score: opponent.score,
            opponent_deck: opponent.deck_id,
            opponent_online: opponent.online,
            first: seat.first,
            state,
            round,
        })
    }

    /// Number of rooms ever created (rooms are never deleted).
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Returns `true` if no rooms exist yet.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
