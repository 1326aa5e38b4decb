//! Ordinary moves, bar entry and the dead-roll check.

use super::bear_off::{bear_off_die, can_bear_off};
use crate::action::{Destination, IllegalMove};
use crate::board::Board;
use crate::dice::distinct_dice;
use crate::types::{is_playable, Color, PointIndex};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A single-checker move that is legal right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateMove {
    /// Starting slot.
    pub from: PointIndex,
    /// Landing point or bear-off.
    pub to: Destination,
    /// Die the move would consume.
    pub die: u8,
}

/// Checks an ordinary move (including bar entry) and returns the die it uses.
///
/// Bar entry is the case `from == color.bar_index()`; the landing point is
/// then `die` for White and `25 - die` for Black, which falls out of the
/// usual distance arithmetic.
///
/// # Errors
///
/// Returns the first [`IllegalMove`] reason that applies.
#[instrument(skip(board))]
pub fn check_move(
    board: &Board,
    moves_left: &[u8],
    from: PointIndex,
    to: PointIndex,
    color: Color,
) -> Result<u8, IllegalMove> {
    let bar = color.bar_index();
    if from != bar && !is_playable(from) {
        return Err(IllegalMove::NotAPoint(from));
    }
    if board.bar_count(color) > 0 && from != bar {
        return Err(IllegalMove::BarNotCleared);
    }
    if !is_playable(to) {
        return Err(IllegalMove::NotAPoint(to));
    }
    if board.count(from, color) == 0 {
        return Err(IllegalMove::NoChecker(from));
    }

    let distance = color.distance(from, to);
    if distance <= 0 {
        return Err(IllegalMove::WrongDirection { from, to });
    }
    let die = distance as u8;
    if !moves_left.contains(&die) {
        return Err(IllegalMove::DieUnavailable(die));
    }
    if board.point(to).is_blocked_for(color) {
        return Err(IllegalMove::Blocked(to));
    }
    Ok(die)
}

/// Whether `color` may move a checker from `from` to `to` with the dice left.
pub fn is_valid_move(
    board: &Board,
    moves_left: &[u8],
    from: PointIndex,
    to: PointIndex,
    color: Color,
) -> bool {
    check_move(board, moves_left, from, to, color).is_ok()
}

/// Whether `color` can use any remaining die at all.
///
/// With checkers on the bar only entries count. Otherwise every owned
/// point is tried for an ordinary move or a bear-off.
#[instrument(skip(board))]
pub fn has_any_valid_moves(board: &Board, moves_left: &[u8], color: Color) -> bool {
    let dice = distinct_dice(moves_left);

    if board.bar_count(color) > 0 {
        return dice
            .iter()
            .any(|&die| !board.point(color.entry_point(die)).is_blocked_for(color));
    }

    let bearing_off = can_bear_off(board, color);
    board.occupied_points(color).any(|from| {
        dice.iter().any(|&die| match color.target(from, die) {
            Some(to) => !board.point(to).is_blocked_for(color),
            None => bearing_off && bear_off_die(board, moves_left, from, color).is_ok(),
        })
    })
}

/// Every single-checker move `color` could make next.
///
/// Bear-offs are listed once per point with the die the rules would pick.
#[instrument(skip(board))]
pub fn legal_moves(board: &Board, moves_left: &[u8], color: Color) -> Vec<CandidateMove> {
    let dice = distinct_dice(moves_left);
    let bar = color.bar_index();

    if board.bar_count(color) > 0 {
        return dice
            .iter()
            .map(|&die| (die, color.entry_point(die)))
            .filter(|&(_, to)| !board.point(to).is_blocked_for(color))
            .map(|(die, to)| CandidateMove {
                from: bar,
                to: Destination::Point(to),
                die,
            })
            .collect();
    }

    let mut moves = Vec::new();
    for from in board.occupied_points(color) {
        for &die in &dice {
            if let Some(to) = color.target(from, die)
                && check_move(board, moves_left, from, to, color).is_ok()
            {
                moves.push(CandidateMove {
                    from,
                    to: Destination::Point(to),
                    die,
                });
            }
        }
        if let Ok(die) = bear_off_die(board, moves_left, from, color) {
            moves.push(CandidateMove {
                from,
                to: Destination::Off,
                die,
            });
        }
    }
    moves
}
