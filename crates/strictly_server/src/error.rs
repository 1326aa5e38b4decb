//! Session-level error types.

use crate::adapter::CoordinateError;
use crate::protocol::ParticipantId;
use derive_more::Display;
use strictly_backgammon::MatchError;

/// Why the session manager refused an intent.
///
/// None of these change any state; the sender gets a rejection and nobody
/// else hears about it.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum SessionError {
    /// The sender has no live match (never paired, or already ended).
    #[display("No active match for this connection")]
    NoSuchMatch,

    /// The sender is already waiting or playing.
    #[display("{} is already queued or seated", _0)]
    AlreadyQueued(ParticipantId),

    /// `leave_queue` from someone who is not waiting.
    #[display("Not in the queue")]
    NotQueued,

    /// A wire point number that does not exist.
    #[display("{}", _0)]
    Coordinate(CoordinateError),

    /// The match refused the intent.
    #[display("{}", _0)]
    Match(MatchError),
}

impl std::error::Error for SessionError {}

impl From<MatchError> for SessionError {
    fn from(err: MatchError) -> Self {
        Self::Match(err)
    }
}

impl From<CoordinateError> for SessionError {
    fn from(err: CoordinateError) -> Self {
        Self::Coordinate(err)
    }
}
