//! The doubling cube.

use crate::types::{Color, CUBE_CEILING};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Why a double offer or response was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum IllegalDouble {
    /// Doubles may only be offered before rolling.
    #[display("Doubles may only be offered before rolling")]
    NotBeforeRoll,

    /// The offering side does not hold the cube.
    #[display("{} does not hold doubling rights", _0)]
    NoRights(Color),

    /// The cube is already at its ceiling.
    #[display("The cube is already at {}", CUBE_CEILING)]
    AtCeiling,

    /// An offer is already waiting for an answer.
    #[display("A double offer is already pending")]
    OfferPending,

    /// There is no offer to answer.
    #[display("No double offer is pending")]
    NoPendingOffer,

    /// The offering side tried to answer its own offer.
    #[display("{} cannot answer its own double", _0)]
    OwnOffer(Color),
}

impl std::error::Error for IllegalDouble {}

/// Stake multiplier and who may raise it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoublingCube {
    value: u32,
    may_double: [bool; 2],
}

impl DoublingCube {
    /// A centered cube at 1; either side may double.
    pub fn new() -> Self {
        Self {
            value: 1,
            may_double: [true, true],
        }
    }

    /// Current stake multiplier.
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Whether `color` currently holds doubling rights.
    pub fn may_double(&self, color: Color) -> bool {
        self.may_double[color.index()]
    }

    /// Checks that `color` may offer a double right now.
    ///
    /// # Errors
    ///
    /// [`IllegalDouble::NoRights`] or [`IllegalDouble::AtCeiling`].
    pub fn check_offer(&self, color: Color) -> Result<(), IllegalDouble> {
        if !self.may_double(color) {
            return Err(IllegalDouble::NoRights(color));
        }
        if self.value >= CUBE_CEILING {
            return Err(IllegalDouble::AtCeiling);
        }
        Ok(())
    }

    /// `acceptor` takes the double: the stake doubles and only the
    /// acceptor may re-double.
    ///
    /// # Panics
    ///
    /// Panics if doubling would pass the ceiling; offers are checked first.
    #[instrument]
    pub(crate) fn accept(&mut self, acceptor: Color) {
        assert!(self.value < CUBE_CEILING, "cube already at {}", self.value);
        self.value *= 2;
        self.may_double[acceptor.index()] = true;
        self.may_double[acceptor.opponent().index()] = false;
        debug!(value = self.value, owner = %acceptor, "Double accepted");
    }
}

impl Default for DoublingCube {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_transfers_rights() {
        let mut cube = DoublingCube::new();
        cube.check_offer(Color::White).unwrap();
        cube.accept(Color::Black);
        assert_eq!(cube.value(), 2);
        assert!(cube.may_double(Color::Black));
        assert!(!cube.may_double(Color::White));
        assert_eq!(
            cube.check_offer(Color::White),
            Err(IllegalDouble::NoRights(Color::White))
        );
    }

    #[test]
    fn test_cube_never_passes_ceiling() {
        let mut cube = DoublingCube::new();
        let mut acceptor = Color::Black;
        while cube.check_offer(acceptor.opponent()).is_ok() {
            cube.accept(acceptor);
            acceptor = acceptor.opponent();
        }
        assert_eq!(cube.value(), CUBE_CEILING);
        assert_eq!(
            cube.check_offer(acceptor.opponent()),
            Err(IllegalDouble::AtCeiling)
        );
    }
}
