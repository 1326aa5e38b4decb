//! Exclusive points: no playable point holds both colors.

use super::Invariant;
use crate::board::Board;
use crate::game::Match;
use crate::types::{BLACK_BAR, WHITE_BAR};

/// Invariant: every playable point is empty or single-colored, and each
/// bar only holds its own color.
pub struct ExclusivePoints;

impl Invariant<Board> for ExclusivePoints {
    fn holds(board: &Board) -> bool {
        let points = board.points();
        points[WHITE_BAR].black() == 0
            && points[BLACK_BAR].white() == 0
            && points[1..=24].iter().all(|p| p.white() == 0 || p.black() == 0)
    }

    fn description() -> &'static str {
        "No point holds checkers of both colors"
    }
}

impl Invariant<Match> for ExclusivePoints {
    fn holds(game: &Match) -> bool {
        <Self as Invariant<Board>>::holds(game.board())
    }

    fn description() -> &'static str {
        <Self as Invariant<Board>>::description()
    }
}
