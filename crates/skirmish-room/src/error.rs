//! Error types for the room layer.
//!
//! Split in two: [`RoomError`] covers access to a room (existence,
//! seat ownership), [`GameError`] covers rule violations inside one.
//! Both leave state untouched when returned, and both carry their wire
//! text in the `#[error(...)]` strings.

/// Errors accessing a room or its seats.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room with this slug.
    #[error("no such room")]
    NotFound,

    /// The caller is not one of the room's two seat-holders.
    #[error("you are not a player of this room")]
    NotASeat,
}

/// Game-rule violations. The offending request is rejected; nothing in
/// the room changes.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The room hasn't seen both players online yet, or has ended.
    #[error("game is not in progress")]
    NotInProgress,

    /// No living unit of the mover's at the source cell.
    #[error("no unit at source cell")]
    NoUnitAtSource,

    /// Source and destination are the same cell.
    #[error("move does not change position")]
    InvalidMove,

    /// The unit's movement rules forbid this move.
    #[error("illegal move for this unit")]
    IllegalMove,

    /// The destination holds a unit of the mover's own side.
    #[error("cell occupied by your unit")]
    CellOccupied,

    /// `start` was requested while the opponent seat is offline.
    #[error("opponent is offline")]
    OpponentOffline,

    /// Room access failed underneath a game operation.
    #[error(transparent)]
    Room(#[from] RoomError),
}
