//! Dice for a single turn.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A die face outside 1..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[display("Die face {} is not between 1 and 6", _0)]
pub struct InvalidFace(pub u8);

impl std::error::Error for InvalidFace {}

/// The pair rolled this turn and the die values not yet used.
///
/// `moves_left` starts as the two faces, or four copies on a double,
/// and only ever shrinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dice {
    rolled: [u8; 2],
    moves_left: Vec<u8>,
}

impl Dice {
    /// Creates dice from two known faces.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFace`] if either face is outside 1..=6.
    #[instrument]
    pub fn new(first: u8, second: u8) -> Result<Self, InvalidFace> {
        for face in [first, second] {
            if !(1..=6).contains(&face) {
                return Err(InvalidFace(face));
            }
        }
        Ok(Self::from_faces(first, second))
    }

    /// Rolls two uniform dice.
    #[instrument(skip(rng))]
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let first = rng.gen_range(1..=6);
        let second = rng.gen_range(1..=6);
        Self::from_faces(first, second)
    }

    /// The two faces rolled.
    pub fn rolled(&self) -> [u8; 2] {
        self.rolled
    }

    /// True when both faces match.
    pub fn is_double(&self) -> bool {
        self.rolled[0] == self.rolled[1]
    }

    /// Die values still available this turn.
    pub fn moves_left(&self) -> &[u8] {
        &self.moves_left
    }

    /// True once every die has been used.
    pub fn is_exhausted(&self) -> bool {
        self.moves_left.is_empty()
    }

    /// Uses one copy of `die`.
    ///
    /// # Panics
    ///
    /// Panics if `die` is not available; the rules engine checks this first.
    pub(crate) fn consume(&mut self, die: u8) {
        match self.moves_left.iter().position(|&d| d == die) {
            Some(i) => {
                self.moves_left.swap_remove(i);
            }
            None => panic!("die {die} not in moves left {:?}", self.moves_left),
        }
    }

    /// Whether `moves_left` is still drawn from what was rolled.
    pub fn is_consistent(&self) -> bool {
        let full = Self::from_faces(self.rolled[0], self.rolled[1]).moves_left;
        self.moves_left.iter().all(|face| {
            let left = self.moves_left.iter().filter(|&d| d == face).count();
            let rolled = full.iter().filter(|&d| d == face).count();
            left <= rolled
        })
    }

    fn from_faces(first: u8, second: u8) -> Self {
        let moves_left = if first == second {
            vec![first; 4]
        } else {
            vec![first, second]
        };
        Self {
            rolled: [first, second],
            moves_left,
        }
    }
}

/// Sorted, de-duplicated die values from a `moves_left` slice.
pub fn distinct_dice(moves_left: &[u8]) -> Vec<u8> {
    let mut dice = moves_left.to_vec();
    dice.sort_unstable();
    dice.dedup();
    dice
}
