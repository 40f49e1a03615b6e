//! Room lifecycle, board state, and game rules for Skirmish.
//!
//! # Key pieces
//!
//! - [`Registry`] — sole owner of rooms, seats, units, and round logs
//! - [`create_room`] — atomic room factory (slug, seats, mirrored board)
//! - [`game`] — the per-room state machine (connect / disconnect /
//!   start / move)
//! - [`rules`] — the pure movement-rule engine
//!
//! The registry never runs its own tasks: connection actors call into
//! [`game`] under the server's registry lock, and notifications flow
//! back out through each seat's [`SeatSender`].

mod error;
mod factory;
pub mod game;
mod registry;
pub mod rules;

pub use error::{GameError, RoomError};
pub use factory::{MatchedPlayer, create_room};
pub use registry::{
    AttachSnapshot, MoveRecord, Registry, Room, RoomEvent, RoomPhase,
    RoomRecord, RoundEntry, Seat, SeatSender, Unit,
};
