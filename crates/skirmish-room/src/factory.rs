//! The room factory: turns two matched queue entries into a fully
//! initialized room.
//!
//! Creation is one synchronous call under the registry lock, so partial
//! rooms (a room with one seat, seats without units) are never
//! observable. Everything the room needs — seats, mirrored units,
//! round-0 log rows — is built up front and inserted in a single step;
//! there is no post-create hook doing delayed setup.

use std::time::SystemTime;

use rand::Rng;
use rand::distr::Alphanumeric;
use skirmish_protocol::{PlayerId, RoomSlug};
use skirmish_queue::DeckSummary;

use crate::registry::{
    Registry, Room, RoomPhase, RoomRecord, RoundEntry, Seat, Unit,
};
use crate::rules::mirror_y;

/// One side of a freshly made match, as claimed from the queue.
pub struct MatchedPlayer {
    pub player_id: PlayerId,
    pub deck: DeckSummary,
}

/// Creates a room for two matched players and returns its slug.
///
/// Chooses the first-moving side by fair coin. The deck's stored
/// coordinates are defined for the near side; the seat that is NOT
/// first gets its rows reflected (`y' = 9 − y`) so both players see
/// their own units on the rows nearest to them.
pub fn create_room(
    registry: &mut Registry,
    rng: &mut impl Rng,
    a: MatchedPlayer,
    b: MatchedPlayer,
) -> RoomSlug {
    // Collisions are vanishingly rare at 16 alphanumeric chars, but a
    // stale slug must never be overwritten — retry with a fresh value.
    let slug = loop {
        let candidate = generate_slug(rng);
        if !registry.contains(&candidate) {
            break candidate;
        }
        tracing::warn!(%candidate, "slug collision, regenerating");
    };

    let a_first = rng.random_bool(0.5);

    let mut units =
        Vec::with_capacity(a.deck.units.len() + b.deck.units.len());
    place_deck(&mut units, &a, a_first);
    place_deck(&mut units, &b, !a_first);

    let rounds = vec![
        RoundEntry {
            player: a.player_id,
            round: 0,
            message: "Game started".into(),
        },
        RoundEntry {
            player: b.player_id,
            round: 0,
            message: "Game started".into(),
        },
    ];

    let record = RoomRecord::new(
        Room {
            slug: slug.clone(),
            created_at: SystemTime::now(),
            ended: false,
            phase: RoomPhase::AwaitingBothOnline,
        },
        [make_seat(&a, a_first), make_seat(&b, !a_first)],
        units,
        rounds,
    );
    registry.insert(record);

    let first_player = if a_first { a.player_id } else { b.player_id };
    tracing::info!(
        %slug,
        player_a = %a.player_id,
        player_b = %b.player_id,
        first = %first_player,
        "room created"
    );
    slug
}

fn make_seat(side: &MatchedPlayer, first: bool) -> Seat {
    Seat {
        player_id: side.player_id,
        deck_id: side.deck.id,
        score: side.deck.score,
        first,
        online: false,
        sender: None,
    }
}

fn place_deck(units: &mut Vec<Unit>, side: &MatchedPlayer, first: bool) {
    for du in &side.deck.units {
        units.push(Unit {
            kind: du.kind,
            owner: side.player_id,
            x: du.x,
            y: if first { du.y } else { mirror_y(du.y) },
            health: du.health,
            attack: du.attack,
            speed: du.speed,
            dead: false,
            moved: false,
        });
    }
}

/// Generates a random URL-safe slug of [`RoomSlug::LEN`] alphanumeric
/// characters.
fn generate_slug(rng: &mut impl Rng) -> RoomSlug {
    let raw: String = (0..RoomSlug::LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect();
    RoomSlug::new(raw)
}

// =========================================================================
// Tests
// =========================================================================
