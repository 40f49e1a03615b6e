//! Wire protocol for Skirmish.
//!
//! This crate defines the "language" that clients and the server speak on
//! the two channels:
//!
//! - **Types** ([`QueueRequest`], [`QueueMessage`], [`RoomRequest`],
//!   [`RoomMessage`], the id newtypes) — the structures that travel on the
//!   wire as JSON text frames.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how outbound messages are
//!   converted to frames.
//! - **Errors** ([`ProtocolError`]) — parse failures whose `Display` text
//!   is exactly what the client sees in an `ERROR` message.
//!
//! The protocol layer sits between transport (text frames) and the
//! handlers (player context). It doesn't know about connections, queues,
//! or rooms — it only knows how to read and write messages.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    DeckId, MoveCommand, PlayerId, QueueMessage, QueueRequest, RoomMessage,
    RoomRequest, RoomSlug, UnitKind,
};
