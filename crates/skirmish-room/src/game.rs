//! The per-room game state machine.
//!
//! All four operations run synchronously under the registry lock and
//! either apply completely or leave the room untouched. Notifications to
//! the other seat are fire-and-forget sends on that seat's channel —
//! a gone receiver just means the opponent's actor already exited.

use skirmish_protocol::{MoveCommand, PlayerId, RoomSlug, UnitKind};

use crate::registry::{
    AttachSnapshot, MoveRecord, Registry, RoomEvent, RoomPhase, Seat,
    SeatSender,
};
use crate::rules;
use crate::{GameError, RoomError};

/// Attaches a player's connection to their seat.
///
/// Validates seat ownership, marks the seat online, and stores the
/// sender. The opponent (if connected) is told this side came online —
/// each side learns the other's reachability only once both have
/// connected at least once. Returns the attach snapshot for the caller.
pub fn connect(
    registry: &mut Registry,
    slug: &RoomSlug,
    player: PlayerId,
    sender: SeatSender,
) -> Result<AttachSnapshot, RoomError> {
    let record = registry.room_mut(slug)?;
    let idx = record.seat_index(player).ok_or(RoomError::NotASeat)?;

    let seat = &mut record.seats[idx];
    seat.online = true;
    seat.sender = Some(sender);

    if record.seats.iter().all(|s| s.online)
        && record.room.phase == RoomPhase::AwaitingBothOnline
    {
        record.room.phase = RoomPhase::InProgress;
        tracing::info!(%slug, "both seats online, game in progress");
    }

    let opponent = &record.seats[1 - idx];
    if opponent.online {
        notify(opponent, RoomEvent::Presence { online: true });
    }

    tracing::info!(%slug, %player, "player attached to room");
    registry.snapshot(slug, player)
}

/// Detaches a player's connection from their seat: marks it offline,
/// clears the sender, and tells the opponent if they're still there.
/// Unconditional — detaching an unknown seat or room is a no-op.
pub fn disconnect(registry: &mut Registry, slug: &RoomSlug, player: PlayerId) {
    let Ok(record) = registry.room_mut(slug) else {
        return;
    };
    let Some(idx) = record.seat_index(player) else {
        return;
    };

    let seat = &mut record.seats[idx];
    seat.online = false;
    seat.sender = None;

    let opponent = &record.seats[1 - idx];
    if opponent.online {
        notify(opponent, RoomEvent::Presence { online: false });
    }
    tracing::info!(%slug, %player, "player detached from room");
}

/// Relays this seat's readiness to the opponent.
///
/// Fails without state change when the opponent seat is offline.
pub fn request_start(
    registry: &Registry,
    slug: &RoomSlug,
    player: PlayerId,
) -> Result<(), GameError> {
    registry.seat_of(slug, player)?;
    let opponent = registry.opponent_seat_of(slug, player)?;
    if !opponent.online {
        return Err(GameError::OpponentOffline);
    }
    notify(opponent, RoomEvent::Ready);
    Ok(())
}

/// Validates and applies one move.
///
/// On success the unit is relocated (capturing whatever opposing unit
/// held the destination), the mover's round counter advances, and both
/// seats are notified. Capturing a King ends the room.
pub fn apply_move(
    registry: &mut Registry,
    slug: &RoomSlug,
    player: PlayerId,
    cmd: MoveCommand,
) -> Result<MoveRecord, GameError> {
    let record = registry.room_mut(slug)?;
    let seat_idx = record.seat_index(player).ok_or(RoomError::NotASeat)?;

    if !record.room.phase.is_in_progress() {
        return Err(GameError::NotInProgress);
    }

    let from = (cmd.from_x, cmd.from_y);
    let to = (cmd.to_x, cmd.to_y);

    // Only the mover's own living units can be moved; this is what makes
    // moves from the two seats causally independent.
    let unit_idx = record
        .units
        .iter()
        .position(|u| {
            !u.dead && u.owner == player && (u.x, u.y) == from
        })
        .ok_or(GameError::NoUnitAtSource)?;

    if from == to {
        return Err(GameError::InvalidMove);
    }
    if !rules::on_board(cmd.to_x, cmd.to_y) {
        return Err(GameError::IllegalMove);
    }

    let advancing_up = record.seats[seat_idx].first;
    let unit = &record.units[unit_idx];
    let legal = rules::is_legal_move(
        unit.kind,
        from,
        to,
        advancing_up,
        !unit.moved,
        |x, y| record.living_unit_at(x, y).is_none(),
    );
    if !legal {
        return Err(GameError::IllegalMove);
    }

    // Destination occupancy: own unit blocks, opposing unit is captured.
    let mut captured = false;
    let mut ended = false;
    if let Some(target_idx) = record.living_index_at(cmd.to_x, cmd.to_y) {
        if record.units[target_idx].owner == player {
            return Err(GameError::CellOccupied);
        }
        let target = &mut record.units[target_idx];
        target.health = 0;
        target.dead = true;
        captured = true;
        ended = target.kind == UnitKind::King;
    }

    let unit = &mut record.units[unit_idx];
    unit.x = cmd.to_x;
    unit.y = cmd.to_y;
    unit.moved = true;

    if ended {
        record.room.ended = true;
        record.room.phase = RoomPhase::Ended;
        tracing::info!(%slug, winner = %player, "king captured, game ended");
    }

    let round =
        record.push_round(player, if captured { "captured" } else { "moved" });

    let outcome = MoveRecord {
        player,
        from_x: cmd.from_x,
        from_y: cmd.from_y,
        to_x: cmd.to_x,
        to_y: cmd.to_y,
        captured,
        round,
        ended,
    };

    tracing::debug!(%slug, %player, board = %record.render_board(), "move applied");
    for seat in &record.seats {
        notify(seat, RoomEvent::Moved(outcome.clone()));
    }
    Ok(outcome)
}

/// Sends an event to a seat's actor if one is attached.
fn notify(seat: &Seat, event: RoomEvent) {
    if let Some(sender) = &seat.sender {
        let _ = sender.send(event);
    }
}

// =========================================================================
// Tests
// =========================================================================
