//! Runnable Skirmish server with in-memory stand-ins for the external
//! services: numeric tokens for identity, and a stock 16-unit deck per
//! player in place of the real catalog.
//!
//! Connect two clients with different numeric `Authorization` headers,
//! send `{"type":"connect","deck_id":<your id>}` on `/queue`, and play
//! on the room path both sides receive.

use rand::Rng;
use skirmish::prelude::*;

// ---------------------------------------------------------------------------
// Identity: any numeric token is a player
// ---------------------------------------------------------------------------

struct TokenAuth;

impl Authenticator for TokenAuth {
    async fn authenticate(&self, token: &str) -> Result<PlayerId, AuthError> {
        let id: u64 = token.parse().map_err(|_| {
            AuthError::Failed("token must be a number".into())
        })?;
        Ok(PlayerId(id))
    }
}

// ---------------------------------------------------------------------------
// Decks: one stock deck per player, deck id == player id
// ---------------------------------------------------------------------------

struct StockDecks;

impl DeckProvider for StockDecks {
    async fn deck(
        &self,
        player: PlayerId,
        deck: DeckId,
    ) -> Result<DeckSummary, QueueError> {
        if deck.0 != player.0 {
            return Err(QueueError::DeckNotFound);
        }
        Ok(stock_deck(deck))
    }
}

/// Builds the stock composition: a King pinned at (5,1), 4 Archers,
/// 6 Warriors, 2 Wizards, and 3 more rolled between Wizard and Archer —
/// 16 units exactly filling the two near rows, stats rolled 0–10.
fn stock_deck(id: DeckId) -> DeckSummary {
    let mut rng = rand::rng();

    let mut kinds = vec![UnitKind::King];
    kinds.extend([UnitKind::Archer; 4]);
    kinds.extend([UnitKind::Warrior; 6]);
    kinds.extend([UnitKind::Wizard; 2]);
    for _ in 0..3 {
        kinds.push(if rng.random_bool(0.5) {
            UnitKind::Wizard
        } else {
            UnitKind::Archer
        });
    }

    // Every cell of rows 1-2 except the king's square, dealt randomly.
    let mut free: Vec<(u8, u8)> = (1..=8u8)
        .flat_map(|x| [(x, 1), (x, 2)])
        .filter(|&cell| cell != (5, 1))
        .collect();

    let mut units = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let (x, y) = if kind == UnitKind::King {
            (5, 1)
        } else {
            free.swap_remove(rng.random_range(0..free.len()))
        };
        units.push(DeckUnit {
            kind,
            health: rng.random_range(0..=10),
            attack: rng.random_range(0..=10),
            speed: rng.random_range(0..=10),
            x,
            y,
        });
    }

    let score = units
        .iter()
        .map(|u| u.health + u.attack + u.speed)
        .sum();
    DeckSummary { id, score, units }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let addr = std::env::var("SKIRMISH_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let server = ServerBuilder::new()
        .bind(&addr)
        .build(TokenAuth, StockDecks)
        .await?;

    tracing::info!(
        addr = %server.local_addr()?,
        "queue at /queue, rooms at /room/<slug>"
    );
    server.run().await?;
    Ok(())
}
