//! Win classification once a side has borne off all fifteen checkers.

use crate::board::Board;
use crate::types::Color;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// How big a win is.
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
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WinKind {
    /// Single game.
    Normal,
    /// Loser bore off nothing.
    Gammon,
    /// Loser is stuck on the bar or in the winner's home board.
    Backgammon,
}

impl WinKind {
    /// Stake multiplier applied on top of the cube.
    pub fn multiplier(self) -> u32 {
        match self {
            WinKind::Normal => 1,
            WinKind::Gammon => 2,
            WinKind::Backgammon => 3,
        }
    }
}

/// Classifies `winner`'s win on `board`.
///
/// Bar occupancy is checked first, then the winner's home board, then the
/// loser's bear-off count.
#[instrument(skip(board))]
pub fn classify_win(board: &Board, winner: Color) -> WinKind {
    let loser = winner.opponent();
    if board.bar_count(loser) > 0 {
        return WinKind::Backgammon;
    }
    if winner.home_range().any(|p| board.count(p, loser) > 0) {
        return WinKind::Backgammon;
    }
    if board.borne_off(loser) == 0 {
        return WinKind::Gammon;
    }
    WinKind::Normal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_beats_gammon() {
        let board = Board::builder()
            .bar(Color::Black, 1)
            .black(10, 14)
            .rest_borne_off()
            .build()
            .unwrap();
        assert_eq!(classify_win(&board, Color::White), WinKind::Backgammon);
    }

    #[test]
    fn test_checker_in_winner_home_is_backgammon() {
        let board = Board::builder()
            .black(20, 1)
            .black(6, 13)
            .off(Color::Black, 1)
            .rest_borne_off()
            .build()
            .unwrap();
        assert_eq!(classify_win(&board, Color::White), WinKind::Backgammon);
    }

    #[test]
    fn test_gammon_when_nothing_borne_off() {
        let board = Board::builder()
            .black(6, 15)
            .rest_borne_off()
            .build()
            .unwrap();
        assert_eq!(classify_win(&board, Color::White), WinKind::Gammon);
    }

    #[test]
    fn test_normal_win() {
        let board = Board::builder()
            .white(22, 3)
            .rest_borne_off()
            .build()
            .unwrap();
        assert_eq!(classify_win(&board, Color::Black), WinKind::Normal);
        assert_eq!(WinKind::Backgammon.multiplier(), 3);
        assert!(WinKind::Backgammon > WinKind::Gammon);
    }

    #[test]
    fn test_multiplier_grows_with_kind() {
        use strum::IntoEnumIterator;

        let multipliers: Vec<u32> = WinKind::iter().map(WinKind::multiplier).collect();
        assert_eq!(multipliers, vec![1, 2, 3]);
    }
}
