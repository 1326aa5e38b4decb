//! Cube bound: the doubling cube stays a power of two no higher than 64.

use super::Invariant;
use crate::game::Match;
use crate::types::{Color, CUBE_CEILING};
use strum::IntoEnumIterator;

/// Invariant: cube value is a power of two in 1..=64, and once the cube
/// has been turned exactly one side owns it.
pub struct CubeWithinCeiling;

impl Invariant<Match> for CubeWithinCeiling {
    fn holds(game: &Match) -> bool {
        let cube = game.cube();
        let value = cube.value();
        let in_range = value.is_power_of_two() && value <= CUBE_CEILING;
        let owners = Color::iter()
            .filter(|&c| cube.may_double(c))
            .count();
        in_range && (value == 1 || owners == 1)
    }

    fn description() -> &'static str {
        "Cube is a power of two no higher than 64 with a single owner once turned"
    }
}
