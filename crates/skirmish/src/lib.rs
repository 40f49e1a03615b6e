//! # Skirmish
//!
//! A score-matched, head-to-head tactics server over persistent
//! WebSocket connections.
//!
//! Players join the matchmaking queue with a finalized deck; the queue
//! pairs players whose deck scores fall within ±5% of each other, the
//! room factory builds a mirrored board, and the game state machine
//! referees turn-based unit moves until a King falls.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use skirmish::prelude::*;
//!
//! // Implement Authenticator and DeckProvider for your services, then:
//! // let server = Server::builder()
//! //     .bind("0.0.0.0:8080")
//! //     .build(my_auth, my_decks)
//! //     .await?;
//! // server.run().await
//! ```

mod error;
mod handler;
mod server;

pub use error::SkirmishError;
pub use server::{Server, ServerBuilder, ServerState};

/// One-stop imports for building and running a server.
pub mod prelude {
    pub use crate::{Server, ServerBuilder, SkirmishError};
    pub use skirmish_protocol::{
        DeckId, PlayerId, QueueMessage, RoomMessage, RoomSlug, UnitKind,
    };
    pub use skirmish_queue::{
        DeckProvider, DeckSummary, DeckUnit, QueueError,
    };
    pub use skirmish_session::{AuthError, Authenticator};
}
