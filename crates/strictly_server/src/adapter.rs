//! Translation between wire messages and the engine.
//!
//! The engine numbers slots 0..=25 with the bars at both ends. Clients see
//! the 24 playable points as 0..=23, use [`BAR`] as the source of a bar
//! entry and [`OFF`] as the target of a bear-off. All conversions live here.

use crate::error::SessionError;
use crate::protocol::{
    ColorPair, CubeView, MatchId, OutcomeView, RejectCode, ServerMessage, Snapshot, WireMove,
    WirePhase,
};
use derive_more::Display;
use strictly_backgammon::{
    is_playable, Color, Destination, Match, MatchError, Phase, PointIndex,
};
use tracing::instrument;

/// Wire source meaning "my bar".
pub const BAR: i32 = -1;

/// Wire target meaning "bear off".
pub const OFF: i32 = 24;

/// A wire point number outside the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CoordinateError {
    /// Not a valid place to move from.
    #[display("{} is not a point to move from", _0)]
    Source(i32),
    /// Not a valid place to move to.
    #[display("{} is not a point to move to", _0)]
    Target(i32),
}

impl std::error::Error for CoordinateError {}

/// Translates a wire source for `color` into an engine slot.
///
/// # Errors
///
/// [`CoordinateError::Source`] for anything but `-1` or 0..=23.
pub fn source_to_slot(color: Color, from: i32) -> Result<PointIndex, CoordinateError> {
    match from {
        BAR => Ok(color.bar_index()),
        0..=23 => Ok(from as PointIndex + 1),
        _ => Err(CoordinateError::Source(from)),
    }
}

/// Translates a wire target into an engine destination.
///
/// # Errors
///
/// [`CoordinateError::Target`] for anything but 0..=24.
pub fn target_to_destination(to: i32) -> Result<Destination, CoordinateError> {
    match to {
        OFF => Ok(Destination::Off),
        0..=23 => Ok(Destination::Point(to as PointIndex + 1)),
        _ => Err(CoordinateError::Target(to)),
    }
}

/// Engine slot to wire number: bars become [`BAR`].
pub fn slot_to_wire(slot: PointIndex) -> i32 {
    if is_playable(slot) {
        slot as i32 - 1
    } else {
        BAR
    }
}

/// Engine destination to wire number.
pub fn destination_to_wire(to: Destination) -> i32 {
    match to {
        Destination::Point(point) => slot_to_wire(point),
        Destination::Off => OFF,
    }
}

/// The reject code for a refused intent.
pub fn reject_code(err: &SessionError) -> RejectCode {
    match err {
        SessionError::NoSuchMatch => RejectCode::NoSuchMatch,
        SessionError::AlreadyQueued(_) => RejectCode::AlreadyQueued,
        SessionError::NotQueued => RejectCode::NotQueued,
        SessionError::Coordinate(_) => RejectCode::IllegalMove,
        SessionError::Match(err) => match err {
            MatchError::OutOfTurn(_) => RejectCode::OutOfTurn,
            MatchError::IllegalMove(_) => RejectCode::IllegalMove,
            MatchError::IllegalRoll => RejectCode::IllegalRoll,
            MatchError::IllegalDouble(_) => RejectCode::IllegalDouble,
            MatchError::InvalidDice(_) => RejectCode::IllegalRoll,
            MatchError::MatchOver => RejectCode::NoSuchMatch,
        },
    }
}

/// The message sent back to the author of a refused intent.
pub fn rejection(err: &SessionError) -> ServerMessage {
    ServerMessage::Rejected {
        code: reject_code(err),
        message: err.to_string(),
    }
}

/// Builds the wire snapshot of `game`.
#[instrument(skip(players, game))]
pub fn snapshot(match_id: MatchId, seq: u64, players: &ColorPair<String>, game: &Match) -> Snapshot {
    let board = game.board();
    let cube = game.cube();

    let (phase, offered_by) = match game.phase() {
        Phase::AwaitingRoll => (WirePhase::AwaitingRoll, None),
        Phase::DiceRolled => (WirePhase::DiceRolled, None),
        Phase::DoubleOffered { by } => (WirePhase::DoubleOffered, Some(by)),
        Phase::Finished(_) => (WirePhase::Finished, None),
    };

    Snapshot {
        match_id,
        seq,
        players: players.clone(),
        points: (1..=24)
            .map(|i| {
                let point = board.point(i);
                ColorPair {
                    white: point.white(),
                    black: point.black(),
                }
            })
            .collect(),
        bar: ColorPair::from_fn(|c| board.bar_count(c)),
        borne_off: ColorPair::from_fn(|c| board.borne_off(c)),
        pips: ColorPair::from_fn(|c| board.pip_count(c)),
        current_player: game.current_player(),
        phase,
        dice: game.dice().map(|d| d.rolled()),
        moves_left: game.moves_left().to_vec(),
        last_roll: game.last_roll().map(|(_, faces)| faces),
        legal_moves: game
            .legal_moves()
            .into_iter()
            .map(|m| WireMove {
                from: slot_to_wire(m.from),
                to: destination_to_wire(m.to),
                die: m.die,
            })
            .collect(),
        cube: CubeView {
            value: cube.value(),
            white_may_double: cube.may_double(Color::White),
            black_may_double: cube.may_double(Color::Black),
            offered_by,
        },
        outcome: game.outcome().map(|o| OutcomeView {
            winner: o.winner,
            kind: o.kind,
            reason: o.reason,
            cube: o.cube,
            points: o.points(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strictly_backgammon::{IllegalDouble, IllegalMove, BLACK_BAR, WHITE_BAR};

    #[test]
    fn test_points_shift_by_one() {
        assert_eq!(source_to_slot(Color::White, 0), Ok(1));
        assert_eq!(source_to_slot(Color::Black, 23), Ok(24));
        assert_eq!(target_to_destination(11), Ok(Destination::Point(12)));
        assert_eq!(slot_to_wire(1), 0);
        assert_eq!(slot_to_wire(24), 23);
    }

    #[test]
    fn test_bar_source_depends_on_color() {
        assert_eq!(source_to_slot(Color::White, BAR), Ok(WHITE_BAR));
        assert_eq!(source_to_slot(Color::Black, BAR), Ok(BLACK_BAR));
        assert_eq!(slot_to_wire(WHITE_BAR), BAR);
        assert_eq!(slot_to_wire(BLACK_BAR), BAR);
    }

    #[test]
    fn test_off_is_only_a_target() {
        assert_eq!(target_to_destination(OFF), Ok(Destination::Off));
        assert_eq!(
            source_to_slot(Color::White, OFF),
            Err(CoordinateError::Source(OFF))
        );
        assert_eq!(target_to_destination(BAR), Err(CoordinateError::Target(BAR)));
        assert_eq!(destination_to_wire(Destination::Off), OFF);
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(source_to_slot(Color::White, -2).is_err());
        assert!(source_to_slot(Color::White, 24).is_err());
        assert!(target_to_destination(25).is_err());
    }

    #[test]
    fn test_round_trip_all_points() {
        for wire in 0..=23 {
            let slot = source_to_slot(Color::White, wire).unwrap();
            assert_eq!(slot_to_wire(slot), wire);
            let dest = target_to_destination(wire).unwrap();
            assert_eq!(destination_to_wire(dest), wire);
        }
    }

    #[test]
    fn test_reject_codes() {
        let cases = [
            (SessionError::NoSuchMatch, RejectCode::NoSuchMatch),
            (SessionError::NotQueued, RejectCode::NotQueued),
            (
                SessionError::Match(MatchError::OutOfTurn(Color::Black)),
                RejectCode::OutOfTurn,
            ),
            (
                SessionError::Match(MatchError::IllegalMove(IllegalMove::Blocked(5))),
                RejectCode::IllegalMove,
            ),
            (SessionError::Match(MatchError::IllegalRoll), RejectCode::IllegalRoll),
            (
                SessionError::Match(MatchError::IllegalDouble(IllegalDouble::AtCeiling)),
                RejectCode::IllegalDouble,
            ),
            (SessionError::Match(MatchError::MatchOver), RejectCode::NoSuchMatch),
            (
                SessionError::Coordinate(CoordinateError::Target(30)),
                RejectCode::IllegalMove,
            ),
        ];
        for (err, code) in cases {
            assert_eq!(reject_code(&err), code, "{err}");
        }
    }

    #[test]
    fn test_opening_snapshot() {
        let players = ColorPair {
            white: "ann".to_string(),
            black: "bob".to_string(),
        };
        let snap = snapshot(MatchId(1), 1, &players, &Match::new());

        assert_eq!(snap.points.len(), 24);
        assert_eq!(snap.points[0].white, 2);
        assert_eq!(snap.points[23].black, 2);
        assert_eq!(snap.points[11].white, 5);
        assert_eq!(snap.points[5].black, 5);
        assert_eq!(snap.pips, ColorPair { white: 167, black: 167 });
        assert_eq!(snap.phase, WirePhase::AwaitingRoll);
        assert_eq!(snap.current_player, Color::White);
        assert!(snap.dice.is_none());
        assert!(snap.legal_moves.is_empty());
        assert_eq!(snap.cube.value, 1);
        assert!(snap.outcome.is_none());
    }

    #[test]
    fn test_snapshot_lists_legal_moves_in_wire_numbers() {
        let mut game = Match::new();
        game.roll_with(Color::White, [6, 5]).unwrap();
        let snap = snapshot(MatchId(2), 3, &ColorPair::default(), &game);

        assert_eq!(snap.dice, Some([6, 5]));
        assert_eq!(snap.moves_left, vec![6, 5]);
        assert!(snap.legal_moves.contains(&WireMove {
            from: 0,
            to: 6,
            die: 6
        }));
        assert!(snap.legal_moves.iter().all(|m| (0..=23).contains(&m.from)));
    }
}
