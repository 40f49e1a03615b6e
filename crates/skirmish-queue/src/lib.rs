//! Matchmaking for Skirmish.
//!
//! Holds the players waiting for an opponent and finds score-compatible
//! pairs:
//!
//! 1. **Deck lookup** — the [`DeckProvider`] trait is the interface to
//!    the external catalog: it validates ownership and returns the deck's
//!    aggregate score plus unit placements.
//! 2. **Queue** — [`MatchQueue`] upserts one entry per player and scans
//!    the others for a score within ±5% of the caller's.
//! 3. **Claim** — [`MatchQueue::take_pair`] removes both matched entries
//!    in one call, so the caller can claim a pair atomically before
//!    creating the room.
//!
//! # Concurrency note
//!
//! `MatchQueue` is NOT thread-safe by itself — it's a plain `HashMap`
//! owned by the server state and serialized behind a mutex one level up.
//! Operations on the same entry are therefore never concurrent, which is
//! exactly the guarantee matchmaking needs.

mod deck;
mod error;
mod queue;

pub use deck::{DeckProvider, DeckSummary, DeckUnit};
pub use error::QueueError;
pub use queue::{MatchQueue, QueueEntry, QueueEvent, QueueSender};
