//! The movement-rule engine: a pure function over the closed unit-type
//! set.
//!
//! Legality never touches storage or the network — occupancy is probed
//! through a closure, so the rules are testable with a plain function
//! standing in for the board. Coordinates are 1-indexed; the destination
//! cell is NOT part of a path (whether it blocks or captures is the
//! caller's occupancy decision), and the probe is expected to ignore
//! dead units.

use skirmish_protocol::UnitKind;

/// Lowest valid board coordinate.
pub const BOARD_MIN: u8 = 1;
/// Highest valid board coordinate.
pub const BOARD_MAX: u8 = 8;

/// Whether a cell lies on the board.
pub fn on_board(x: u8, y: u8) -> bool {
    (BOARD_MIN..=BOARD_MAX).contains(&x) && (BOARD_MIN..=BOARD_MAX).contains(&y)
}

/// Vertical reflection: maps a "near side" row to the equivalent row as
/// seen from the opposite side of the board. Its own inverse.
pub fn mirror_y(y: u8) -> u8 {
    BOARD_MAX + 1 - y
}

/// Checks whether moving a unit of `kind` from `from` to `to` is legal.
///
/// - `advancing_up` — `true` for units of the first-moving seat, whose
///   Warriors advance toward increasing `y`; the other seat's advance
///   toward decreasing `y`.
/// - `first_move` — `true` until the unit has moved once; a Warrior may
///   step diagonally forward only on its first move.
/// - `cell_is_free` — occupancy probe for path checks; must return
///   `true` for cells holding no living unit.
///
/// `from == to` is assumed to be rejected by the caller before any
/// per-type rule applies.
pub fn is_legal_move(
    kind: UnitKind,
    from: (u8, u8),
    to: (u8, u8),
    advancing_up: bool,
    first_move: bool,
    cell_is_free: impl Fn(u8, u8) -> bool,
) -> bool {
    let dx = i16::from(to.0) - i16::from(from.0);
    let dy = i16::from(to.1) - i16::from(from.1);

    match kind {
        // One step in any direction.
        UnitKind::King => dx.abs() <= 1 && dy.abs() <= 1,

        // Any distance along a straight ray — diagonal, horizontal, or
        // vertical — with no jumping over living units.
        UnitKind::Wizard => {
            let straight = dx == 0 || dy == 0 || dx.abs() == dy.abs();
            straight && ray_is_clear(from, to, &cell_is_free)
        }

        // Diagonal rays only, same no-jumping rule.
        UnitKind::Archer => {
            dx.abs() == dy.abs() && ray_is_clear(from, to, &cell_is_free)
        }

        // One row forward; sideways drift of one column is allowed only
        // on the unit's very first move.
        UnitKind::Warrior => {
            let forward = if advancing_up { 1 } else { -1 };
            if dy != forward {
                return false;
            }
            if first_move { dx.abs() <= 1 } else { dx == 0 }
        }
    }
}

/// Walks the strictly-intervening cells of the ray from `from` to `to`
/// (exclusive on both ends) and reports whether all are free.
fn ray_is_clear(
    from: (u8, u8),
    to: (u8, u8),
    cell_is_free: &impl Fn(u8, u8) -> bool,
) -> bool {
    let step_x = (i16::from(to.0) - i16::from(from.0)).signum();
    let step_y = (i16::from(to.1) - i16::from(from.1)).signum();

    let mut x = i16::from(from.0) + step_x;
    let mut y = i16::from(from.1) + step_y;
    while (x, y) != (i16::from(to.0), i16::from(to.1)) {
        if !cell_is_free(x as u8, y as u8) {
            return false;
        }
        x += step_x;
        y += step_y;
    }
    true
}

// =========================================================================
// Tests
// =========================================================================
