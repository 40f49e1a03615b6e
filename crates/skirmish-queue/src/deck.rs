//! The Deck Score Provider interface.
//!
//! Deck building, hero stats, and asset storage live in an external
//! catalog service. Matchmaking and room creation only consume the
//! finalized result: a single strength score plus an ordered list of
//! units with their board starting coordinates. This module is that
//! boundary.

use serde::{Deserialize, Serialize};
use skirmish_protocol::{DeckId, PlayerId, UnitKind};

use crate::QueueError;

/// One unit of a finalized deck: source stats plus its starting cell.
///
/// Coordinates are defined for the "near" side of the board (rows 1–2);
/// the room factory mirrors them for the seat that plays from the far
/// side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckUnit {
    pub kind: UnitKind,
    pub health: i32,
    pub attack: i32,
    pub speed: i32,
    pub x: u8,
    pub y: u8,
}

/// A finalized deck as the catalog hands it over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckSummary {
    pub id: DeckId,
    /// Aggregate strength score; the matchmaking window is computed
    /// from this single integer.
    pub score: i32,
    pub units: Vec<DeckUnit>,
}

/// Resolves a deck id to its summary, enforcing ownership.
pub trait DeckProvider: Send + Sync + 'static {
    /// Returns the deck's summary if `deck` exists and belongs to
    /// `player`; [`QueueError::DeckNotFound`] otherwise (the two cases
    /// are deliberately indistinguishable to the caller).
    fn deck(
        &self,
        player: PlayerId,
        deck: DeckId,
    ) -> impl std::future::Future<Output = Result<DeckSummary, QueueError>> + Send;
}
