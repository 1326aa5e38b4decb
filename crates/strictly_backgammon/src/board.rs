//! Board model: point counts, bars and bear-off counters.
//!
//! The board only changes through the primitives below. Each primitive
//! assumes the rules engine already approved the move and panics if the
//! color or count preconditions are broken, since that means an engine bug.

use crate::types::{
    is_playable, Color, Point, PointIndex, BLACK_BAR, CHECKERS_PER_SIDE, SLOT_COUNT, WHITE_BAR,
};
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::{debug, instrument};

/// Errors raised when constructing a board from an explicit layout.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum BoardError {
    /// Both colors occupy the same playable point.
    #[display("Point {} holds checkers of both colors", _0)]
    MixedPoint(PointIndex),

    /// A bar holds checkers of the wrong color.
    #[display("Bar slot {} holds checkers of the wrong color", _0)]
    WrongBar(PointIndex),

    /// A color does not account for exactly fifteen checkers.
    #[display("{} has {} checkers, expected 15", color, found)]
    CheckerCount {
        /// The color with the wrong total.
        color: Color,
        /// The total that was found.
        found: u32,
    },
}

impl std::error::Error for BoardError {}

/// The 26-slot backgammon board plus bear-off counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Board {
    points: [Point; SLOT_COUNT],
    borne_off: [u8; 2],
}

impl Board {
    /// Creates the standard starting position.
    #[instrument]
    pub fn standard() -> Self {
        let mut points = [Point::EMPTY; SLOT_COUNT];
        points[1] = Point::new(2, 0);
        points[12] = Point::new(5, 0);
        points[17] = Point::new(3, 0);
        points[19] = Point::new(5, 0);
        points[24] = Point::new(0, 2);
        points[13] = Point::new(0, 5);
        points[8] = Point::new(0, 3);
        points[6] = Point::new(0, 5);
        Self {
            points,
            borne_off: [0, 0],
        }
    }

    /// Builds a board from explicit slot counts, validating every invariant.
    ///
    /// # Errors
    ///
    /// Returns a [`BoardError`] if a point is shared, a bar holds the wrong
    /// color, or either side does not total fifteen checkers.
    #[instrument(skip(points))]
    pub fn from_layout(
        points: [Point; SLOT_COUNT],
        borne_off_white: u8,
        borne_off_black: u8,
    ) -> Result<Self, BoardError> {
        if points[WHITE_BAR].black() > 0 {
            return Err(BoardError::WrongBar(WHITE_BAR));
        }
        if points[BLACK_BAR].white() > 0 {
            return Err(BoardError::WrongBar(BLACK_BAR));
        }
        if let Some(index) = (1..=24).find(|&i| points[i].white() > 0 && points[i].black() > 0) {
            return Err(BoardError::MixedPoint(index));
        }

        let board = Self {
            points,
            borne_off: [borne_off_white, borne_off_black],
        };
        for color in Color::iter() {
            let found = board.total_checkers(color);
            if found != CHECKERS_PER_SIDE as u32 {
                return Err(BoardError::CheckerCount { color, found });
            }
        }
        Ok(board)
    }

    /// Starts an explicit layout, mostly useful for setting up positions.
    pub fn builder() -> BoardBuilder {
        BoardBuilder::default()
    }

    // ─────────────────────────────────────────────────────────────
    //  Queries
    // ─────────────────────────────────────────────────────────────

    /// Returns the slot at `index` (0..=25).
    pub fn point(&self, index: PointIndex) -> &Point {
        &self.points[index]
    }

    /// Returns all 26 slots.
    pub fn points(&self) -> &[Point; SLOT_COUNT] {
        &self.points
    }

    /// Checkers of `color` on slot `index`.
    pub fn count(&self, index: PointIndex, color: Color) -> u8 {
        self.points[index].count(color)
    }

    /// The color occupying slot `index`, if any.
    pub fn owner(&self, index: PointIndex) -> Option<Color> {
        self.points[index].owner()
    }

    /// Checkers of `color` waiting on its bar.
    pub fn bar_count(&self, color: Color) -> u8 {
        self.points[color.bar_index()].count(color)
    }

    /// Checkers of `color` removed from play.
    pub fn borne_off(&self, color: Color) -> u8 {
        self.borne_off[color.index()]
    }

    /// Checkers of `color` on the 24 playable points.
    pub fn checkers_on_board(&self, color: Color) -> u32 {
        (1..=24).map(|i| self.points[i].count(color) as u32).sum()
    }

    /// Board + bar + borne off for `color`. Always fifteen on a valid board.
    pub fn total_checkers(&self, color: Color) -> u32 {
        self.checkers_on_board(color)
            + self.bar_count(color) as u32
            + self.borne_off(color) as u32
    }

    /// Playable points holding at least one `color` checker.
    pub fn occupied_points(&self, color: Color) -> impl Iterator<Item = PointIndex> + '_ {
        (1..=24).filter(move |&i| self.points[i].count(color) > 0)
    }

    /// Total pips `color` still has to travel to bear everything off.
    pub fn pip_count(&self, color: Color) -> u32 {
        let on_points: u32 = self
            .occupied_points(color)
            .map(|i| color.pips_to_bear_off(i) as u32 * self.points[i].count(color) as u32)
            .sum();
        on_points + 25 * self.bar_count(color) as u32
    }

    /// Formats the board as a compact human-readable string.
    ///
    /// Top row shows points 13..=24, bottom row 12..=1, the way a player
    /// sitting on White's side sees it.
    pub fn display(&self) -> String {
        let cell = |i: PointIndex| match self.points[i].owner() {
            Some(Color::White) => format!("W{:<2}", self.points[i].white()),
            Some(Color::Black) => format!("B{:<2}", self.points[i].black()),
            None => " . ".to_string(),
        };
        let top: Vec<String> = (13..=24).map(cell).collect();
        let bottom: Vec<String> = (1..=12).rev().map(cell).collect();
        format!(
            "{}\n{}\nbar W{} B{} | off W{} B{}",
            top.join(" "),
            bottom.join(" "),
            self.bar_count(Color::White),
            self.bar_count(Color::Black),
            self.borne_off(Color::White),
            self.borne_off(Color::Black),
        )
    }

    // ─────────────────────────────────────────────────────────────
    //  Primitives
    // ─────────────────────────────────────────────────────────────

    /// Moves one `color` checker from `from` (a playable point or its own
    /// bar) to the playable point `to`, hitting a lone enemy checker there.
    ///
    /// # Panics
    ///
    /// Panics if there is no `color` checker at `from` or `to` is blocked.
    #[instrument(skip(self))]
    pub fn move_checker(&mut self, from: PointIndex, to: PointIndex, color: Color) {
        assert!(
            from == color.bar_index() || is_playable(from),
            "{color} cannot move from slot {from}"
        );
        assert!(is_playable(to), "slot {to} is not a playable point");
        assert!(self.points[from].count(color) > 0, "no {color} checker at {from}");
        assert!(!self.points[to].is_blocked_for(color), "point {to} is blocked for {color}");

        if self.points[to].is_blot_of(color.opponent()) {
            self.hit(to, color);
        }
        *self.points[from].count_mut(color) -= 1;
        *self.points[to].count_mut(color) += 1;
        self.debug_check();
    }

    /// Enters a `color` checker from the bar using `die`. Returns the landing point.
    #[instrument(skip(self))]
    pub fn enter_from_bar(&mut self, die: u8, color: Color) -> PointIndex {
        let target = color.entry_point(die);
        self.move_checker(color.bar_index(), target, color);
        target
    }

    /// Removes a `color` checker on `from` from play.
    ///
    /// # Panics
    ///
    /// Panics if `from` is not a playable point holding a `color` checker.
    #[instrument(skip(self))]
    pub fn bear_off(&mut self, from: PointIndex, color: Color) {
        assert!(is_playable(from), "cannot bear off from slot {from}");
        assert!(self.points[from].count(color) > 0, "no {color} checker at {from}");
        *self.points[from].count_mut(color) -= 1;
        self.borne_off[color.index()] += 1;
        debug!(
            %color,
            from,
            borne_off = self.borne_off[color.index()],
            "Checker borne off"
        );
        self.debug_check();
    }

    /// `color` hits the lone enemy checker on `point`, sending it to the enemy bar.
    ///
    /// # Panics
    ///
    /// Panics unless exactly one enemy checker sits on `point`.
    #[instrument(skip(self))]
    pub fn hit(&mut self, point: PointIndex, color: Color) {
        let enemy = color.opponent();
        assert!(is_playable(point), "cannot hit on slot {point}");
        assert!(
            self.points[point].is_blot_of(enemy),
            "no lone {enemy} checker to hit at {point}"
        );
        *self.points[point].count_mut(enemy) = 0;
        *self.points[enemy.bar_index()].count_mut(enemy) += 1;
        debug!(%color, point, "Blot hit");
    }

    fn debug_check(&self) {
        debug_assert_eq!(self.total_checkers(Color::White), CHECKERS_PER_SIDE as u32);
        debug_assert_eq!(self.total_checkers(Color::Black), CHECKERS_PER_SIDE as u32);
        debug_assert!(
            (1..=24).all(|i| self.points[i].white() == 0 || self.points[i].black() == 0),
            "point shared by both colors"
        );
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

/// Incremental layout for [`Board::from_layout`].
#[derive(Debug, Clone, Default)]
pub struct BoardBuilder {
    points: [Point; SLOT_COUNT],
    borne_off: [u8; 2],
    fill_borne_off: bool,
}

impl BoardBuilder {
    /// Adds `count` checkers of `color` on playable point `point`.
    pub fn place(mut self, color: Color, point: PointIndex, count: u8) -> Self {
        *self.points[point].count_mut(color) += count;
        self
    }

    /// Adds `count` White checkers on `point`.
    pub fn white(self, point: PointIndex, count: u8) -> Self {
        self.place(Color::White, point, count)
    }

    /// Adds `count` Black checkers on `point`.
    pub fn black(self, point: PointIndex, count: u8) -> Self {
        self.place(Color::Black, point, count)
    }

    /// Puts `count` checkers of `color` on its bar.
    pub fn bar(self, color: Color, count: u8) -> Self {
        self.place(color, color.bar_index(), count)
    }

    /// Marks `count` checkers of `color` as already borne off.
    pub fn off(mut self, color: Color, count: u8) -> Self {
        self.borne_off[color.index()] += count;
        self
    }

    /// Whatever is not placed explicitly counts as borne off.
    pub fn rest_borne_off(mut self) -> Self {
        self.fill_borne_off = true;
        self
    }

    /// Validates and builds the board.
    ///
    /// # Errors
    ///
    /// See [`Board::from_layout`].
    pub fn build(mut self) -> Result<Board, BoardError> {
        if self.fill_borne_off {
            for color in Color::iter() {
                let placed: u32 = self.points.iter().map(|p| p.count(color) as u32).sum::<u32>()
                    + self.borne_off[color.index()] as u32;
                let missing = (CHECKERS_PER_SIDE as u32).saturating_sub(placed);
                self.borne_off[color.index()] += missing as u8;
            }
        }
        Board::from_layout(
            self.points,
            self.borne_off[Color::White.index()],
            self.borne_off[Color::Black.index()],
        )
    }
}
