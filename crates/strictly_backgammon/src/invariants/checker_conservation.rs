//! Checker conservation: each side always accounts for fifteen checkers.

use super::Invariant;
use crate::board::Board;
use crate::game::Match;
use crate::types::{Color, CHECKERS_PER_SIDE};
use strum::IntoEnumIterator;

/// Invariant: board + bar + borne off == 15 for both colors.
pub struct CheckerConservation;

impl Invariant<Board> for CheckerConservation {
    fn holds(board: &Board) -> bool {
        Color::iter().all(|color| board.total_checkers(color) == CHECKERS_PER_SIDE as u32)
    }

    fn description() -> &'static str {
        "Each color has exactly 15 checkers across board, bar and bear-off"
    }
}

impl Invariant<Match> for CheckerConservation {
    fn holds(game: &Match) -> bool {
        <Self as Invariant<Board>>::holds(game.board())
    }

    fn description() -> &'static str {
        <Self as Invariant<Board>>::description()
    }
}
