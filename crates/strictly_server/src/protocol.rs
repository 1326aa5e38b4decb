//! Wire messages exchanged over the match socket.
//!
//! Every frame is a JSON object tagged by `"type"`. Point numbers on the
//! wire are 0..=23, with `-1` for the bar (as a source) and `24` for
//! bearing off (as a target); see [`crate::adapter`] for the translation.

use rand::Rng;
use serde::{Deserialize, Serialize};
use strictly_backgammon::{Color, EndReason, WinKind};

/// Identifies one participant. Public: the opponent can learn it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
#[display("p{_0}")]
pub struct ParticipantId(pub u64);

/// Secret handed only to its participant; required to reclaim a seat.
///
/// 128 random bits, written as 32 lowercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeToken(pub String);

impl ResumeToken {
    /// Draws a fresh token from `rng`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(format!("{:032x}", rng.r#gen::<u128>()))
    }
}

/// Identifier of a running match.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
#[display("m{_0}")]
pub struct MatchId(pub u64);

/// A value for each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColorPair<T> {
    /// White's value.
    pub white: T,
    /// Black's value.
    pub black: T,
}

impl<T> ColorPair<T> {
    /// Builds a pair from a function of the color.
    pub fn from_fn(mut f: impl FnMut(Color) -> T) -> Self {
        Self {
            white: f(Color::White),
            black: f(Color::Black),
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Inbound
// ─────────────────────────────────────────────────────────────

/// Intents a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join the matchmaking queue.
    Enqueue {
        /// Display name shown to the opponent.
        name: String,
    },
    /// Leave the queue before being paired.
    LeaveQueue,
    /// Reclaim a seat after a dropped connection.
    Resume {
        /// Participant id received in `queued`/`paired`.
        participant_id: ParticipantId,
        /// Secret received alongside it.
        resume_token: ResumeToken,
    },
    /// Roll the dice.
    Roll,
    /// Move one checker.
    Move {
        /// Source point, or `-1` for the bar.
        from: i32,
        /// Target point, or `24` to bear off.
        to: i32,
        /// Die to use; checked against the die the rules pick.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        die: Option<u8>,
    },
    /// Offer to double the stakes.
    OfferDouble,
    /// Answer a pending double.
    RespondDouble {
        /// Take (true) or drop (false).
        accept: bool,
    },
    /// Concede the match.
    Resign,
}

// ─────────────────────────────────────────────────────────────
//  Outbound
// ─────────────────────────────────────────────────────────────

/// Why an intent was refused.
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectCode {
    /// Not the sender's turn.
    OutOfTurn,
    /// The move breaks the rules.
    IllegalMove,
    /// Dice already rolled or a double is pending.
    IllegalRoll,
    /// The cube may not be offered or answered now.
    IllegalDouble,
    /// The sender has no live match.
    NoSuchMatch,
    /// The sender is already queued or seated.
    AlreadyQueued,
    /// The sender is not in the queue.
    NotQueued,
    /// The frame could not be understood.
    BadRequest,
}

/// Messages the server pushes to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Waiting for an opponent.
    Queued {
        /// The sender's id.
        participant_id: ParticipantId,
        /// The sender's secret for `resume`.
        resume_token: ResumeToken,
        /// 1-based place in the queue.
        position: usize,
    },
    /// An opponent was found.
    Paired {
        /// The recipient's id.
        participant_id: ParticipantId,
        /// The recipient's secret for `resume`.
        resume_token: ResumeToken,
        /// The new match.
        match_id: MatchId,
        /// The recipient's side.
        color: Color,
        /// The opponent's display name.
        opponent: String,
    },
    /// Full match state after a change.
    State(Snapshot),
    /// A double was offered.
    DoubleOffered {
        /// The offering side.
        by: Color,
        /// Cube value if the double is taken.
        cube: u32,
    },
    /// The recipient's last intent was refused; nothing changed.
    Rejected {
        /// Machine-readable reason.
        code: RejectCode,
        /// Human-readable detail.
        message: String,
    },
    /// The opponent's connection dropped.
    OpponentDisconnected {
        /// Seconds they have to come back.
        grace_secs: u64,
    },
    /// The opponent is back.
    OpponentReconnected,
    /// The opponent did not come back; the match was awarded.
    MatchAbandoned,
    /// Removed from the queue.
    LeftQueue,
}

/// Phase names as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WirePhase {
    /// Current player may roll or double.
    AwaitingRoll,
    /// Moves are being played.
    DiceRolled,
    /// Waiting for a double to be answered.
    DoubleOffered,
    /// Decided.
    Finished,
}

/// Doubling cube state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CubeView {
    /// Current value.
    pub value: u32,
    /// White holds doubling rights.
    pub white_may_double: bool,
    /// Black holds doubling rights.
    pub black_may_double: bool,
    /// Side with an offer pending.
    pub offered_by: Option<Color>,
}

/// A legal move in wire coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMove {
    /// Source point or `-1`.
    pub from: i32,
    /// Target point or `24`.
    pub to: i32,
    /// Die consumed.
    pub die: u8,
}

/// Result of a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeView {
    /// Winning side.
    pub winner: Color,
    /// Normal, gammon or backgammon.
    pub kind: WinKind,
    /// How it ended.
    pub reason: EndReason,
    /// Cube value at the end.
    pub cube: u32,
    /// Points won.
    pub points: u32,
}

/// Everything a client needs to render the match.
///
/// Snapshots are total: applying the same one twice is harmless, and `seq`
/// only grows within a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The match.
    pub match_id: MatchId,
    /// Increases with every published change.
    pub seq: u64,
    /// Display names.
    pub players: ColorPair<String>,
    /// Checker counts for points 0..=23.
    pub points: Vec<ColorPair<u8>>,
    /// Checkers on each bar.
    pub bar: ColorPair<u8>,
    /// Checkers borne off.
    pub borne_off: ColorPair<u8>,
    /// Pip counts.
    pub pips: ColorPair<u32>,
    /// Side to act.
    pub current_player: Color,
    /// Turn phase.
    pub phase: WirePhase,
    /// Dice for the turn in progress.
    pub dice: Option<[u8; 2]>,
    /// Die values still to play.
    pub moves_left: Vec<u8>,
    /// Most recent roll, kept after a dead turn.
    pub last_roll: Option<[u8; 2]>,
    /// Moves the current player could make.
    pub legal_moves: Vec<WireMove>,
    /// Doubling cube.
    pub cube: CubeView,
    /// Present once the match is decided.
    pub outcome: Option<OutcomeView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_intent_parses_with_and_without_die() {
        let with_die: ClientMessage =
            serde_json::from_str(r#"{"type":"move","from":-1,"to":3,"die":4}"#).unwrap();
        assert_eq!(
            with_die,
            ClientMessage::Move {
                from: -1,
                to: 3,
                die: Some(4)
            }
        );

        let without: ClientMessage =
            serde_json::from_str(r#"{"type":"move","from":18,"to":24}"#).unwrap();
        assert_eq!(
            without,
            ClientMessage::Move {
                from: 18,
                to: 24,
                die: None
            }
        );
    }

    #[test]
    fn test_unit_intents_parse() {
        for (json, expected) in [
            (r#"{"type":"roll"}"#, ClientMessage::Roll),
            (r#"{"type":"leave_queue"}"#, ClientMessage::LeaveQueue),
            (r#"{"type":"offer_double"}"#, ClientMessage::OfferDouble),
            (r#"{"type":"resign"}"#, ClientMessage::Resign),
        ] {
            assert_eq!(serde_json::from_str::<ClientMessage>(json).unwrap(), expected);
        }
    }

    #[test]
    fn test_unknown_intent_is_an_error() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"teleport"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"move","from":1}"#).is_err());
    }

    #[test]
    fn test_rejection_serializes_screaming_code() {
        let message = ServerMessage::Rejected {
            code: RejectCode::OutOfTurn,
            message: "not your turn".to_string(),
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "rejected");
        assert_eq!(value["code"], "OUT_OF_TURN");
        assert_eq!(RejectCode::NoSuchMatch.to_string(), "NO_SUCH_MATCH");
    }

    #[test]
    fn test_reject_codes_serialize_as_displayed() {
        use strum::IntoEnumIterator;

        for code in RejectCode::iter() {
            assert_eq!(serde_json::to_value(code).unwrap(), code.to_string());
        }
        assert_eq!(RejectCode::iter().count(), 8);
    }

    #[test]
    fn test_ids_are_plain_values_on_the_wire() {
        let message = ServerMessage::Queued {
            participant_id: ParticipantId(7),
            resume_token: ResumeToken("ab".repeat(16)),
            position: 1,
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["participant_id"], 7);
        assert_eq!(value["resume_token"], "ab".repeat(16));
        assert_eq!(ParticipantId(7).to_string(), "p7");
    }

    #[test]
    fn test_resume_tokens_are_random_hex() {
        use rand::SeedableRng;

        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        let first = ResumeToken::generate(&mut rng);
        let second = ResumeToken::generate(&mut rng);
        assert_eq!(first.0.len(), 32);
        assert!(first.0.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[test]
    fn test_resume_intent_needs_token() {
        let parsed: ClientMessage = serde_json::from_str(
            r#"{"type":"resume","participant_id":3,"resume_token":"00ff"}"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            ClientMessage::Resume {
                participant_id: ParticipantId(3),
                resume_token: ResumeToken("00ff".to_string()),
            }
        );
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"resume","participant_id":3}"#).is_err());
    }
}
