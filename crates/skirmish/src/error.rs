//! Unified error type for the Skirmish server.

use skirmish_protocol::ProtocolError;
use skirmish_queue::QueueError;
use skirmish_room::{GameError, RoomError};
use skirmish_session::AuthError;
use skirmish_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SkirmishError {
    /// A transport-level error (accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (parse, encode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An authentication error.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A matchmaking error (deck lookup).
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// A room access error (unknown slug, not a seat-holder).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A game-rule error.
    #[error(transparent)]
    Game(#[from] GameError),
}
