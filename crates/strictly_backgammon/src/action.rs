//! Moves, turn events and the errors transitions can raise.
//!
//! Moves are domain events, not side effects: a [`Move`] records what was
//! applied, including the die actually consumed, so a match history can be
//! logged and replayed.

use crate::cube::IllegalDouble;
use crate::dice::InvalidFace;
use crate::types::{Color, PointIndex};
use serde::{Deserialize, Serialize};

/// Where a checker ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// A playable point (1..=24).
    Point(PointIndex),
    /// Borne off the board.
    Off,
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Point(p) => write!(f, "{}", p),
            Destination::Off => write!(f, "off"),
        }
    }
}

/// A single checker move that has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// The side that moved.
    pub color: Color,
    /// Starting slot (a playable point or the mover's bar).
    pub from: PointIndex,
    /// Landing point or bear-off.
    pub to: Destination,
    /// Die value consumed.
    pub die: u8,
    /// Whether an enemy blot was sent to the bar.
    pub hit: bool,
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{} ({})", self.color, self.from, self.to, self.die)?;
        if self.hit {
            write!(f, "*")?;
        }
        Ok(())
    }
}

/// Something that happened in a match, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TurnEvent {
    /// Dice were rolled.
    Rolled {
        /// Who rolled.
        color: Color,
        /// Faces shown.
        dice: [u8; 2],
    },
    /// A checker moved.
    Moved(Move),
    /// The turn passed to the opponent.
    TurnEnded {
        /// Whose turn ended.
        color: Color,
        /// True when dice were left unusable.
        dead_roll: bool,
    },
    /// A double was offered.
    DoubleOffered {
        /// The offering side.
        by: Color,
    },
    /// A double was taken.
    DoubleAccepted {
        /// The accepting side, now owning the cube.
        by: Color,
        /// New cube value.
        cube: u32,
    },
    /// A double was dropped, ending the match.
    DoubleDeclined {
        /// The declining side.
        by: Color,
    },
    /// A side conceded.
    Resigned {
        /// The conceding side.
        color: Color,
    },
    /// A side abandoned the match.
    Abandoned {
        /// The side that left.
        color: Color,
    },
}

/// Why a move was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum IllegalMove {
    /// Dice have not been rolled this turn.
    #[display("Roll the dice before moving")]
    NotRolled,

    /// A double offer must be answered first.
    #[display("A double offer is waiting for an answer")]
    DoublePending,

    /// A checker on the bar must enter before anything else moves.
    #[display("Checkers on the bar must enter first")]
    BarNotCleared,

    /// The slot is not somewhere this side can move from or to.
    #[display("Slot {} is not a valid point", _0)]
    NotAPoint(PointIndex),

    /// No checker of the mover on the source slot.
    #[display("No checker to move on {}", _0)]
    NoChecker(PointIndex),

    /// The move goes backwards for the mover.
    #[display("Cannot move backwards from {} to {}", from, to)]
    WrongDirection {
        /// Source slot.
        from: PointIndex,
        /// Requested target.
        to: PointIndex,
    },

    /// No remaining die matches the distance.
    #[display("No die of {} left to play", _0)]
    DieUnavailable(u8),

    /// Two or more enemy checkers hold the destination.
    #[display("Point {} is blocked", _0)]
    Blocked(PointIndex),

    /// Not every checker is home yet.
    #[display("All checkers must be home before bearing off")]
    CannotBearOff,

    /// A higher die was offered while a checker sits farther back.
    #[display("Cannot bear off from {} with a higher die while checkers remain behind", _0)]
    CheckerBehind(PointIndex),

    /// The die named by the client is not the one the move consumes.
    #[display("Move uses a {}, not a {}", required, requested)]
    DieMismatch {
        /// Die the client named.
        requested: u8,
        /// Die the rules select.
        required: u8,
    },
}

impl std::error::Error for IllegalMove {}

/// Error returned by a refused match transition. State is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum MatchError {
    /// The sender is not the side to act.
    #[display("It's not {}'s turn", _0)]
    OutOfTurn(Color),

    /// The move breaks the rules.
    #[display("Illegal move: {}", _0)]
    IllegalMove(IllegalMove),

    /// Dice were already rolled, or cannot be rolled now.
    #[display("Dice cannot be rolled now")]
    IllegalRoll,

    /// The double offer or answer breaks the cube rules.
    #[display("Illegal double: {}", _0)]
    IllegalDouble(IllegalDouble),

    /// Supplied dice were not valid faces.
    #[display("{}", _0)]
    InvalidDice(InvalidFace),

    /// The match has already been decided.
    #[display("The match is over")]
    MatchOver,
}

impl std::error::Error for MatchError {}

impl From<IllegalMove> for MatchError {
    fn from(reason: IllegalMove) -> Self {
        MatchError::IllegalMove(reason)
    }
}

impl From<IllegalDouble> for MatchError {
    fn from(reason: IllegalDouble) -> Self {
        MatchError::IllegalDouble(reason)
    }
}

impl From<InvalidFace> for MatchError {
    fn from(face: InvalidFace) -> Self {
        MatchError::InvalidDice(face)
    }
}
