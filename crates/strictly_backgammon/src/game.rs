//! Turn and match state machine.
//!
//! A [`Match`] owns the board, the dice, the doubling cube and the side to
//! move. It only changes through the transitions below; each one validates
//! everything first and returns a [`MatchError`] without touching state when
//! a precondition fails.
//!
//! ```text
//! AwaitingRoll ──roll──▶ DiceRolled ──move*──▶ (dice used up / no legal move)
//!      ▲  │                                         │
//!      │  └─offer─▶ DoubleOffered ─accept─┐         │
//!      │                  │               │         │
//!      └──────────────────┼───────────────┘◀────────┘  (next player)
//!                         └─decline─▶ Finished
//! ```
//!
//! `Finished` is also reached from any live phase by the fifteenth
//! bear-off, a resignation or an abandoned match.

use crate::action::{Destination, IllegalMove, MatchError, Move, TurnEvent};
use crate::board::Board;
use crate::cube::{DoublingCube, IllegalDouble};
use crate::dice::Dice;
use crate::invariants::assert_invariants;
use crate::rules::{self, CandidateMove, WinKind};
use crate::types::{Color, PointIndex, CHECKERS_PER_SIDE};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Where the match is in the turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// The current player may roll or offer a double.
    AwaitingRoll,
    /// Dice are on the board and moves are being played.
    DiceRolled,
    /// A double was offered and the opponent must answer.
    DoubleOffered {
        /// The offering side.
        by: Color,
    },
    /// The match is decided.
    Finished(Outcome),
}

/// How a finished match ended.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EndReason {
    /// All fifteen checkers borne off.
    BoreOff,
    /// The opponent dropped a double.
    DoubleDeclined,
    /// The loser conceded.
    Resigned,
    /// The loser left and did not come back.
    Abandoned,
}

/// Result of a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outcome {
    /// The winning side.
    pub winner: Color,
    /// Normal, gammon or backgammon.
    pub kind: WinKind,
    /// Why the match ended.
    pub reason: EndReason,
    /// Cube value the match was decided at.
    pub cube: u32,
}

impl Outcome {
    /// Points won: cube value times the win multiplier.
    pub fn points(&self) -> u32 {
        self.cube * self.kind.multiplier()
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} wins a {} ({}) for {} point(s)",
            self.winner,
            self.kind,
            self.reason,
            self.points()
        )
    }
}

/// What a successful transition did to the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "progress", rename_all = "snake_case")]
pub enum Progress {
    /// Same player keeps acting.
    Continue,
    /// The turn passed to `next`.
    TurnEnded {
        /// The player now to roll.
        next: Color,
        /// True when the turn ended with unusable dice.
        dead_roll: bool,
    },
    /// The match is over.
    Finished(Outcome),
}

/// An authoritative backgammon match between two sides.
#[derive(Debug, Clone)]
pub struct Match {
    board: Board,
    dice: Option<Dice>,
    cube: DoublingCube,
    current_player: Color,
    phase: Phase,
    last_roll: Option<(Color, [u8; 2])>,
    history: Vec<TurnEvent>,
}

impl Match {
    /// Creates a match from the standard starting position, White to roll.
    #[instrument]
    pub fn new() -> Self {
        Self::from_position(Board::standard(), Color::White)
    }

    /// Creates a match from an arbitrary (already validated) position.
    #[instrument(skip(board))]
    pub fn from_position(board: Board, to_move: Color) -> Self {
        Self {
            board,
            dice: None,
            cube: DoublingCube::new(),
            current_player: to_move,
            phase: Phase::AwaitingRoll,
            last_roll: None,
            history: Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Accessors
    // ─────────────────────────────────────────────────────────────

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Dice for the turn in progress.
    pub fn dice(&self) -> Option<&Dice> {
        self.dice.as_ref()
    }

    /// Die values still to be played this turn.
    pub fn moves_left(&self) -> &[u8] {
        self.dice.as_ref().map(Dice::moves_left).unwrap_or(&[])
    }

    /// Returns the doubling cube.
    pub fn cube(&self) -> &DoublingCube {
        &self.cube
    }

    /// The side to act (or whose turn ended the match).
    pub fn current_player(&self) -> Color {
        self.current_player
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The outcome, once decided.
    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// True once the match is decided.
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }

    /// The most recent roll, kept after the turn ends so a dead roll can
    /// still be shown.
    pub fn last_roll(&self) -> Option<(Color, [u8; 2])> {
        self.last_roll
    }

    /// Every event so far, oldest first.
    pub fn history(&self) -> &[TurnEvent] {
        &self.history
    }

    /// Moves the current player could make right now.
    pub fn legal_moves(&self) -> Vec<CandidateMove> {
        match self.phase {
            Phase::DiceRolled => {
                rules::legal_moves(&self.board, self.moves_left(), self.current_player)
            }
            _ => Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Transitions
    // ─────────────────────────────────────────────────────────────

    /// Rolls two dice for `color`.
    ///
    /// If nothing can be played the turn ends in the same transition.
    ///
    /// # Errors
    ///
    /// `OutOfTurn`, `IllegalRoll` when dice are already out or a double is
    /// pending, `MatchOver` once decided.
    #[instrument(skip(self, rng), fields(current = %self.current_player))]
    pub fn roll<R: Rng + ?Sized>(&mut self, color: Color, rng: &mut R) -> Result<Progress, MatchError> {
        self.check_roll(color)?;
        Ok(self.start_turn(Dice::roll(rng)))
    }

    /// Like [`Match::roll`] with predetermined faces.
    ///
    /// # Errors
    ///
    /// As [`Match::roll`], plus `InvalidDice` for faces outside 1..=6.
    #[instrument(skip(self), fields(current = %self.current_player))]
    pub fn roll_with(&mut self, color: Color, faces: [u8; 2]) -> Result<Progress, MatchError> {
        self.check_roll(color)?;
        let dice = Dice::new(faces[0], faces[1])?;
        Ok(self.start_turn(dice))
    }

    /// Moves one checker for `color`.
    ///
    /// `die` is optional; when given it must be the die the rules select
    /// for this move. Ends the turn when the dice are used up or nothing
    /// else can be played, and ends the match on the fifteenth bear-off.
    ///
    /// # Errors
    ///
    /// `OutOfTurn`, `IllegalMove` with the reason, `MatchOver`.
    #[instrument(skip(self), fields(current = %self.current_player))]
    pub fn apply_move(
        &mut self,
        color: Color,
        from: PointIndex,
        to: Destination,
        die: Option<u8>,
    ) -> Result<Progress, MatchError> {
        self.ensure_live()?;
        if color != self.current_player {
            return Err(MatchError::OutOfTurn(color));
        }
        match self.phase {
            Phase::DiceRolled => {}
            Phase::DoubleOffered { .. } => return Err(IllegalMove::DoublePending.into()),
            _ => return Err(IllegalMove::NotRolled.into()),
        }
        let Some(dice) = self.dice.as_ref() else {
            return Err(IllegalMove::NotRolled.into());
        };

        let required = match to {
            Destination::Point(target) => {
                rules::check_move(&self.board, dice.moves_left(), from, target, color)?
            }
            Destination::Off => rules::bear_off_die(&self.board, dice.moves_left(), from, color)?,
        };
        if let Some(requested) = die
            && requested != required
        {
            return Err(IllegalMove::DieMismatch {
                requested,
                required,
            }
            .into());
        }

        let hit = match to {
            Destination::Point(target) => {
                let hit = self.board.point(target).is_blot_of(color.opponent());
                self.board.move_checker(from, target, color);
                hit
            }
            Destination::Off => {
                self.board.bear_off(from, color);
                false
            }
        };
        if let Some(dice) = self.dice.as_mut() {
            dice.consume(required);
        }

        let applied = Move {
            color,
            from,
            to,
            die: required,
            hit,
        };
        debug!(%applied, moves_left = ?self.moves_left(), "Move applied");
        self.history.push(TurnEvent::Moved(applied));

        let progress = if self.board.borne_off(color) == CHECKERS_PER_SIDE {
            let kind = rules::classify_win(&self.board, color);
            self.finish(Outcome {
                winner: color,
                kind,
                reason: EndReason::BoreOff,
                cube: self.cube.value(),
            })
        } else if self.moves_left().is_empty() {
            self.end_turn(false)
        } else if !rules::has_any_valid_moves(&self.board, self.moves_left(), color) {
            self.end_turn(true)
        } else {
            Progress::Continue
        };

        assert_invariants(self);
        Ok(progress)
    }

    /// `color` offers to double the stakes before rolling.
    ///
    /// # Errors
    ///
    /// `OutOfTurn`, `IllegalDouble` (after rolling, without rights, at the
    /// ceiling, offer already pending), `MatchOver`.
    #[instrument(skip(self), fields(cube = self.cube.value()))]
    pub fn offer_double(&mut self, color: Color) -> Result<(), MatchError> {
        self.ensure_live()?;
        if color != self.current_player {
            return Err(MatchError::OutOfTurn(color));
        }
        match self.phase {
            Phase::AwaitingRoll => {}
            Phase::DoubleOffered { .. } => return Err(IllegalDouble::OfferPending.into()),
            _ => return Err(IllegalDouble::NotBeforeRoll.into()),
        }
        self.cube.check_offer(color)?;

        self.phase = Phase::DoubleOffered { by: color };
        self.history.push(TurnEvent::DoubleOffered { by: color });
        info!(%color, cube = self.cube.value(), "Double offered");
        assert_invariants(self);
        Ok(())
    }

    /// `color` answers a pending double.
    ///
    /// Accepting doubles the cube and hands its ownership to `color`; the
    /// offerer then rolls. Declining ends the match for the offerer at the
    /// current cube value.
    ///
    /// # Errors
    ///
    /// `IllegalDouble` when nothing is pending or the offerer answers,
    /// `MatchOver`.
    #[instrument(skip(self), fields(cube = self.cube.value()))]
    pub fn respond_double(&mut self, color: Color, accept: bool) -> Result<Progress, MatchError> {
        self.ensure_live()?;
        let Phase::DoubleOffered { by } = self.phase else {
            return Err(IllegalDouble::NoPendingOffer.into());
        };
        if color == by {
            return Err(IllegalDouble::OwnOffer(color).into());
        }

        let progress = if accept {
            self.cube.accept(color);
            self.phase = Phase::AwaitingRoll;
            self.history.push(TurnEvent::DoubleAccepted {
                by: color,
                cube: self.cube.value(),
            });
            info!(%color, cube = self.cube.value(), "Double accepted");
            Progress::Continue
        } else {
            self.history.push(TurnEvent::DoubleDeclined { by: color });
            self.finish(Outcome {
                winner: by,
                kind: WinKind::Normal,
                reason: EndReason::DoubleDeclined,
                cube: self.cube.value(),
            })
        };
        assert_invariants(self);
        Ok(progress)
    }

    /// `color` concedes at the current cube value.
    ///
    /// # Errors
    ///
    /// `MatchOver` once decided.
    #[instrument(skip(self))]
    pub fn resign(&mut self, color: Color) -> Result<Progress, MatchError> {
        self.ensure_live()?;
        self.history.push(TurnEvent::Resigned { color });
        Ok(self.concede(color, EndReason::Resigned))
    }

    /// `color` left the match for good; the opponent takes it.
    ///
    /// # Errors
    ///
    /// `MatchOver` once decided.
    #[instrument(skip(self))]
    pub fn forfeit(&mut self, color: Color) -> Result<Progress, MatchError> {
        self.ensure_live()?;
        self.history.push(TurnEvent::Abandoned { color });
        Ok(self.concede(color, EndReason::Abandoned))
    }

    // ─────────────────────────────────────────────────────────────
    //  Internals
    // ─────────────────────────────────────────────────────────────

    fn ensure_live(&self) -> Result<(), MatchError> {
        if self.is_finished() {
            warn!("Transition attempted on a finished match");
            return Err(MatchError::MatchOver);
        }
        Ok(())
    }

    fn check_roll(&self, color: Color) -> Result<(), MatchError> {
        self.ensure_live()?;
        if color != self.current_player {
            return Err(MatchError::OutOfTurn(color));
        }
        match self.phase {
            Phase::AwaitingRoll => Ok(()),
            _ => Err(MatchError::IllegalRoll),
        }
    }

    fn start_turn(&mut self, dice: Dice) -> Progress {
        let color = self.current_player;
        let rolled = dice.rolled();
        let playable = rules::has_any_valid_moves(&self.board, dice.moves_left(), color);
        info!(%color, ?rolled, playable, "Dice rolled");

        self.last_roll = Some((color, rolled));
        self.history.push(TurnEvent::Rolled {
            color,
            dice: rolled,
        });
        self.dice = Some(dice);
        self.phase = Phase::DiceRolled;

        let progress = if playable {
            Progress::Continue
        } else {
            self.end_turn(true)
        };
        assert_invariants(self);
        progress
    }

    fn end_turn(&mut self, dead_roll: bool) -> Progress {
        let color = self.current_player;
        let next = color.opponent();
        self.history.push(TurnEvent::TurnEnded { color, dead_roll });
        self.dice = None;
        self.current_player = next;
        self.phase = Phase::AwaitingRoll;
        debug!(%color, %next, dead_roll, "Turn ended");
        Progress::TurnEnded { next, dead_roll }
    }

    fn concede(&mut self, loser: Color, reason: EndReason) -> Progress {
        let progress = self.finish(Outcome {
            winner: loser.opponent(),
            kind: WinKind::Normal,
            reason,
            cube: self.cube.value(),
        });
        assert_invariants(self);
        progress
    }

    fn finish(&mut self, outcome: Outcome) -> Progress {
        self.dice = None;
        self.phase = Phase::Finished(outcome);
        info!(%outcome, "Match finished");
        debug!(board = %self.board.display(), "Final position");
        Progress::Finished(outcome)
    }
}

impl Default for Match {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BLACK_BAR, WHITE_BAR};

    #[test]
    fn test_roll_twice_rejected() {
        let mut game = Match::new();
        game.roll_with(Color::White, [3, 1]).unwrap();
        let before = game.history().len();
        assert_eq!(
            game.roll_with(Color::White, [5, 2]),
            Err(MatchError::IllegalRoll)
        );
        assert_eq!(game.history().len(), before);
        assert_eq!(game.moves_left(), &[3, 1]);
    }

    #[test]
    fn test_move_before_roll_rejected() {
        let mut game = Match::new();
        assert_eq!(
            game.apply_move(Color::White, 1, Destination::Point(4), None),
            Err(MatchError::IllegalMove(IllegalMove::NotRolled))
        );
    }

    #[test]
    fn test_off_turn_player_rejected() {
        let mut game = Match::new();
        assert_eq!(
            game.roll_with(Color::Black, [3, 1]),
            Err(MatchError::OutOfTurn(Color::Black))
        );
        game.roll_with(Color::White, [3, 1]).unwrap();
        assert_eq!(
            game.apply_move(Color::Black, 24, Destination::Point(21), None),
            Err(MatchError::OutOfTurn(Color::Black))
        );
    }

    #[test]
    fn test_die_hint_must_match() {
        let mut game = Match::new();
        game.roll_with(Color::White, [3, 1]).unwrap();
        assert_eq!(
            game.apply_move(Color::White, 1, Destination::Point(4), Some(1)),
            Err(MatchError::IllegalMove(IllegalMove::DieMismatch {
                requested: 1,
                required: 3
            }))
        );
        assert_eq!(
            game.apply_move(Color::White, 1, Destination::Point(4), Some(3)),
            Ok(Progress::Continue)
        );
    }

    #[test]
    fn test_turn_ends_when_dice_used() {
        let mut game = Match::new();
        game.roll_with(Color::White, [3, 1]).unwrap();
        game.apply_move(Color::White, 17, Destination::Point(20), None)
            .unwrap();
        let progress = game
            .apply_move(Color::White, 19, Destination::Point(20), None)
            .unwrap();
        assert_eq!(
            progress,
            Progress::TurnEnded {
                next: Color::Black,
                dead_roll: false
            }
        );
        assert_eq!(game.current_player(), Color::Black);
        assert_eq!(game.phase(), Phase::AwaitingRoll);
        assert!(game.dice().is_none());
        assert_eq!(game.last_roll(), Some((Color::White, [3, 1])));
    }

    #[test]
    fn test_hit_sends_blot_to_bar() {
        let board = Board::builder()
            .white(1, 14)
            .white(20, 1)
            .black(4, 1)
            .black(13, 14)
            .build()
            .unwrap();
        let mut game = Match::from_position(board, Color::White);
        game.roll_with(Color::White, [3, 5]).unwrap();
        game.apply_move(Color::White, 1, Destination::Point(4), None)
            .unwrap();
        assert_eq!(game.board().bar_count(Color::Black), 1);
        match game.history().last() {
            Some(TurnEvent::Moved(mv)) => assert!(mv.hit),
            other => panic!("unexpected last event {other:?}"),
        }
    }

    #[test]
    fn test_entering_from_bar() {
        let board = Board::builder()
            .bar(Color::White, 1)
            .white(12, 14)
            .black(13, 15)
            .build()
            .unwrap();
        let mut game = Match::from_position(board, Color::White);
        game.roll_with(Color::White, [4, 2]).unwrap();
        assert_eq!(
            game.apply_move(Color::White, 12, Destination::Point(16), None),
            Err(MatchError::IllegalMove(IllegalMove::BarNotCleared))
        );
        game.apply_move(Color::White, WHITE_BAR, Destination::Point(4), None)
            .unwrap();
        assert_eq!(game.board().count(4, Color::White), 1);
        assert_eq!(game.moves_left(), &[2]);
    }

    #[test]
    fn test_double_accept_and_redouble_rights() {
        let mut game = Match::new();
        game.offer_double(Color::White).unwrap();
        assert_eq!(
            game.roll_with(Color::White, [3, 1]),
            Err(MatchError::IllegalRoll)
        );
        assert_eq!(
            game.respond_double(Color::White, true),
            Err(MatchError::IllegalDouble(IllegalDouble::OwnOffer(Color::White)))
        );
        game.respond_double(Color::Black, true).unwrap();
        assert_eq!(game.cube().value(), 2);
        assert!(game.cube().may_double(Color::Black));
        assert!(!game.cube().may_double(Color::White));
        assert_eq!(game.phase(), Phase::AwaitingRoll);
        assert_eq!(game.current_player(), Color::White);
        assert_eq!(
            game.offer_double(Color::White),
            Err(MatchError::IllegalDouble(IllegalDouble::NoRights(Color::White)))
        );
    }

    #[test]
    fn test_double_after_roll_rejected() {
        let mut game = Match::new();
        game.roll_with(Color::White, [6, 5]).unwrap();
        assert_eq!(
            game.offer_double(Color::White),
            Err(MatchError::IllegalDouble(IllegalDouble::NotBeforeRoll))
        );
    }

    #[test]
    fn test_decline_ends_match_for_offerer() {
        let mut game = Match::new();
        game.offer_double(Color::White).unwrap();
        let progress = game.respond_double(Color::Black, false).unwrap();
        let outcome = Outcome {
            winner: Color::White,
            kind: WinKind::Normal,
            reason: EndReason::DoubleDeclined,
            cube: 1,
        };
        assert_eq!(progress, Progress::Finished(outcome));
        assert_eq!(game.outcome(), Some(outcome));
        assert_eq!(
            game.roll_with(Color::White, [1, 2]),
            Err(MatchError::MatchOver)
        );
    }

    #[test]
    fn test_resign_scores_current_cube() {
        let mut game = Match::new();
        game.offer_double(Color::White).unwrap();
        game.respond_double(Color::Black, true).unwrap();
        let progress = game.resign(Color::White).unwrap();
        match progress {
            Progress::Finished(outcome) => {
                assert_eq!(outcome.winner, Color::Black);
                assert_eq!(outcome.points(), 2);
                assert_eq!(outcome.reason, EndReason::Resigned);
            }
            other => panic!("expected finish, got {other:?}"),
        }
    }

    #[test]
    fn test_black_bar_entry_uses_mirrored_point() {
        let board = Board::builder()
            .bar(Color::Black, 2)
            .black(6, 13)
            .white(19, 15)
            .build()
            .unwrap();
        let mut game = Match::from_position(board, Color::Black);
        game.roll_with(Color::Black, [2, 2]).unwrap();
        game.apply_move(Color::Black, BLACK_BAR, Destination::Point(23), None)
            .unwrap();
        game.apply_move(Color::Black, BLACK_BAR, Destination::Point(23), None)
            .unwrap();
        assert_eq!(game.board().count(23, Color::Black), 2);
        assert_eq!(game.moves_left(), &[2, 2]);
    }
}
