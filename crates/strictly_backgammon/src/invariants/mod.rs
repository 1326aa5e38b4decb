//! First-class invariants for backgammon.
//!
//! Invariants are logical properties that must hold after every match
//! transition. They are testable independently and are asserted in debug
//! builds after each state change.

mod checker_conservation;
mod cube_bound;
mod dice_consistency;
mod exclusive_points;

pub use checker_conservation::CheckerConservation;
pub use cube_bound::CubeWithinCeiling;
pub use dice_consistency::DiceConsistency;
pub use exclusive_points::ExclusivePoints;

use crate::game::Match;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
///
/// Implemented for tuples of up to four invariants.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

macro_rules! impl_invariant_set {
    ($($inv:ident),+) => {
        impl<S, $($inv),+> InvariantSet<S> for ($($inv,)+)
        where
            $($inv: Invariant<S>),+
        {
            fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
                let mut violations = Vec::new();
                $(
                    if !$inv::holds(state) {
                        violations.push(InvariantViolation::new($inv::description()));
                    }
                )+
                if violations.is_empty() {
                    Ok(())
                } else {
                    Err(violations)
                }
            }
        }
    };
}

impl_invariant_set!(I1, I2);
impl_invariant_set!(I1, I2, I3);
impl_invariant_set!(I1, I2, I3, I4);

/// Everything a [`Match`] guarantees between transitions.
pub type MatchInvariants = (
    CheckerConservation,
    ExclusivePoints,
    CubeWithinCeiling,
    DiceConsistency,
);

/// Panics in debug builds if any match invariant is broken.
pub(crate) fn assert_invariants(game: &Match) {
    if cfg!(debug_assertions)
        && let Err(violations) = MatchInvariants::check_all(game)
    {
        let descriptions = violations
            .iter()
            .map(|v| v.description.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        panic!("match invariant violated: {descriptions}");
    }
}
