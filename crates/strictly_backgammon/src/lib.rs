//! Strictly Backgammon - authoritative backgammon rules
//!
//! Pure game logic with no I/O: board, dice, doubling cube, the rules
//! engine and a match state machine that refuses anything illegal.
//!
//! # Architecture
//!
//! - **Board**: 26 slots (two bars plus 24 points) and borne-off counts
//! - **Rules**: pure legality queries (movement, bear-off, win kind)
//! - **Match**: turn and cube state machine owning the board
//! - **Invariants**: properties asserted after every transition
//!
//! # Example
//!
//! ```
//! use strictly_backgammon::{Color, Destination, Match, Progress};
//!
//! let mut game = Match::new();
//! game.roll_with(Color::White, [3, 1]).unwrap();
//! game.apply_move(Color::White, 17, Destination::Point(20), None).unwrap();
//! let progress = game
//!     .apply_move(Color::White, 19, Destination::Point(20), None)
//!     .unwrap();
//! assert!(matches!(progress, Progress::TurnEnded { next: Color::Black, .. }));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod action;
mod board;
mod cube;
mod dice;
mod game;
mod types;

pub mod invariants;
pub mod rules;

// Crate-level exports - Core types
pub use types::{
    is_playable, Color, Point, PointIndex, BLACK_BAR, CHECKERS_PER_SIDE, CUBE_CEILING,
    SLOT_COUNT, WHITE_BAR,
};

// Crate-level exports - Board
pub use board::{Board, BoardBuilder, BoardError};

// Crate-level exports - Dice and cube
pub use cube::{DoublingCube, IllegalDouble};
pub use dice::{distinct_dice, Dice, InvalidFace};

// Crate-level exports - Actions and errors
pub use action::{Destination, IllegalMove, MatchError, Move, TurnEvent};

// Crate-level exports - Match state machine
pub use game::{EndReason, Match, Outcome, Phase, Progress};

// Crate-level exports - Rules
pub use rules::{CandidateMove, WinKind};
