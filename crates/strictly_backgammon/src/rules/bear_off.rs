//! Bearing off.

use crate::action::IllegalMove;
use crate::board::Board;
use crate::types::{is_playable, Color, PointIndex};
use tracing::instrument;

/// True when `color` has nothing on its bar and every checker on the
/// board sits in its home quadrant.
#[instrument(skip(board))]
pub fn can_bear_off(board: &Board, color: Color) -> bool {
    board.bar_count(color) == 0 && board.occupied_points(color).all(|p| color.is_home(p))
}

/// Whether a `color` checker sits farther from home than `point`.
fn has_checker_behind(board: &Board, point: PointIndex, color: Color) -> bool {
    board.occupied_points(color).any(|p| color.distance(p, point) > 0)
}

/// Picks the die that bears a `color` checker off from `from`.
///
/// The exact pip distance wins when available. Otherwise the smallest
/// higher die may be used, but only for the rearmost checker.
///
/// # Errors
///
/// Returns the [`IllegalMove`] reason when no die bears this checker off.
#[instrument(skip(board))]
pub fn bear_off_die(
    board: &Board,
    moves_left: &[u8],
    from: PointIndex,
    color: Color,
) -> Result<u8, IllegalMove> {
    if board.bar_count(color) > 0 {
        return Err(IllegalMove::BarNotCleared);
    }
    if !is_playable(from) {
        return Err(IllegalMove::NotAPoint(from));
    }
    if board.count(from, color) == 0 {
        return Err(IllegalMove::NoChecker(from));
    }
    if !can_bear_off(board, color) {
        return Err(IllegalMove::CannotBearOff);
    }

    let exact = color.pips_to_bear_off(from);
    if moves_left.contains(&exact) {
        return Ok(exact);
    }

    let higher = moves_left.iter().copied().filter(|&d| d > exact).min();
    match higher {
        Some(_) if has_checker_behind(board, from, color) => Err(IllegalMove::CheckerBehind(from)),
        Some(die) => Ok(die),
        None => Err(IllegalMove::DieUnavailable(exact)),
    }
}

/// Whether `color` may bear off the checker on `from` with the dice left.
pub fn is_valid_bear_off(board: &Board, moves_left: &[u8], from: PointIndex, color: Color) -> bool {
    bear_off_die(board, moves_left, from, color).is_ok()
}
