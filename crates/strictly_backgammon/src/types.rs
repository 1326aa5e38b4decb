//! Core domain types for backgammon.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Checkers each side starts with.
pub const CHECKERS_PER_SIDE: u8 = 15;

/// Slots on the board: two bars plus 24 playable points.
pub const SLOT_COUNT: usize = 26;

/// White's bar. White enters from here toward point 1.
pub const WHITE_BAR: usize = 0;

/// Black's bar. Black enters from here toward point 24.
pub const BLACK_BAR: usize = 25;

/// Highest value the doubling cube may reach.
pub const CUBE_CEILING: u32 = 64;

/// Index of a slot on the board (0..=25).
pub type PointIndex = usize;

/// Returns true for the 24 playable points (1..=24).
pub fn is_playable(index: PointIndex) -> bool {
    (1..=24).contains(&index)
}

/// One side of the game.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Color {
    /// Moves from low to high index; home board is 19..=24.
    White,
    /// Moves from high to low index; home board is 1..=6.
    Black,
}

impl Color {
    /// Returns the opposing color.
    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Dense index for per-color arrays.
    pub fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    /// The slot holding this color's hit checkers.
    pub fn bar_index(self) -> PointIndex {
        match self {
            Color::White => WHITE_BAR,
            Color::Black => BLACK_BAR,
        }
    }

    /// Points making up this color's home board.
    pub fn home_range(self) -> RangeInclusive<PointIndex> {
        match self {
            Color::White => 19..=24,
            Color::Black => 1..=6,
        }
    }

    /// Whether `point` lies in this color's home board.
    pub fn is_home(self, point: PointIndex) -> bool {
        self.home_range().contains(&point)
    }

    /// Signed number of pips travelled from `from` to `to`.
    ///
    /// Positive when the move goes in this color's direction of travel.
    pub fn distance(self, from: PointIndex, to: PointIndex) -> i32 {
        let (from, to) = (from as i32, to as i32);
        match self {
            Color::White => to - from,
            Color::Black => from - to,
        }
    }

    /// Pips a checker on `point` needs to leave the board.
    pub fn pips_to_bear_off(self, point: PointIndex) -> u8 {
        match self {
            Color::White => (25 - point) as u8,
            Color::Black => point as u8,
        }
    }

    /// Point reached by moving `die` pips forward from `from`.
    ///
    /// Returns `None` when the move would run off the board.
    pub fn target(self, from: PointIndex, die: u8) -> Option<PointIndex> {
        let landing = match self {
            Color::White => from as i32 + die as i32,
            Color::Black => from as i32 - die as i32,
        };
        (1..=24).contains(&landing).then_some(landing as PointIndex)
    }

    /// Point a checker lands on when entering from the bar with `die`.
    pub fn entry_point(self, die: u8) -> PointIndex {
        match self {
            Color::White => die as PointIndex,
            Color::Black => 25 - die as PointIndex,
        }
    }
}

/// Checker counts on a single slot.
///
/// At most one color may be non-zero on a playable point. That is kept
/// by the board's mutators, never by direct construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    white: u8,
    black: u8,
}

impl Point {
    /// A point with no checkers.
    pub const EMPTY: Point = Point { white: 0, black: 0 };

    /// Creates a point with the given counts.
    pub fn new(white: u8, black: u8) -> Self {
        Self { white, black }
    }

    /// White checkers on this point.
    pub fn white(&self) -> u8 {
        self.white
    }

    /// Black checkers on this point.
    pub fn black(&self) -> u8 {
        self.black
    }

    /// Checkers of `color` on this point.
    pub fn count(&self, color: Color) -> u8 {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    pub(crate) fn count_mut(&mut self, color: Color) -> &mut u8 {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// The color occupying this point, if any.
    pub fn owner(&self) -> Option<Color> {
        match (self.white, self.black) {
            (0, 0) => None,
            (_, 0) => Some(Color::White),
            (0, _) => Some(Color::Black),
            _ => None,
        }
    }

    /// True when two or more enemy checkers make this point unplayable for `color`.
    pub fn is_blocked_for(&self, color: Color) -> bool {
        self.count(color.opponent()) >= 2
    }

    /// True when exactly one `color` checker sits here.
    pub fn is_blot_of(&self, color: Color) -> bool {
        self.count(color) == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent_is_involution() {
        assert_eq!(Color::White.opponent(), Color::Black);
        assert_eq!(Color::White.opponent().opponent(), Color::White);
    }

    #[test]
    fn test_entry_points_mirror() {
        assert_eq!(Color::White.entry_point(3), 3);
        assert_eq!(Color::Black.entry_point(3), 22);
    }

    #[test]
    fn test_target_runs_off_board() {
        assert_eq!(Color::White.target(20, 4), Some(24));
        assert_eq!(Color::White.target(20, 5), None);
        assert_eq!(Color::Black.target(BLACK_BAR, 6), Some(19));
        assert_eq!(Color::Black.target(3, 3), None);
    }

    #[test]
    fn test_distance_sign_follows_direction() {
        assert_eq!(Color::White.distance(1, 4), 3);
        assert_eq!(Color::White.distance(4, 1), -3);
        assert_eq!(Color::Black.distance(24, 21), 3);
        assert_eq!(Color::Black.distance(BLACK_BAR, 20), 5);
    }

    #[test]
    fn test_blocked_needs_two_enemies() {
        let point = Point::new(2, 0);
        assert!(point.is_blocked_for(Color::Black));
        assert!(!point.is_blocked_for(Color::White));
        assert!(!Point::new(1, 0).is_blocked_for(Color::Black));
    }

    #[test]
    fn test_color_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Color::Black).unwrap(), "\"black\"");
        assert_eq!(Color::White.to_string(), "white");
    }
}
