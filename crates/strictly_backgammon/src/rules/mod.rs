//! Rules engine: pure legality queries over a board and the dice left.
//!
//! Nothing here mutates state or knows whose turn it is; the match state
//! machine checks turn order and then asks these functions.

mod bear_off;
mod movement;
mod win;

pub use bear_off::{bear_off_die, can_bear_off, is_valid_bear_off};
pub use movement::{
    check_move, has_any_valid_moves, is_valid_move, legal_moves, CandidateMove,
};
pub use win::{classify_win, WinKind};
