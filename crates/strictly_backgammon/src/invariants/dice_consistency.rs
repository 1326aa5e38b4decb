//! Dice consistency: dice exist exactly while a turn is being played.

use super::Invariant;
use crate::game::{Match, Phase};

/// Invariant: dice are present only in the `DiceRolled` phase, and the
/// dice left are drawn from what was rolled.
pub struct DiceConsistency;

impl Invariant<Match> for DiceConsistency {
    fn holds(game: &Match) -> bool {
        match (game.phase(), game.dice()) {
            (Phase::DiceRolled, Some(dice)) => dice.is_consistent() && !dice.is_exhausted(),
            (Phase::DiceRolled, None) => false,
            (_, Some(_)) => false,
            (_, None) => true,
        }
    }

    fn description() -> &'static str {
        "Dice are held only mid-turn and never exceed what was rolled"
    }
}
