//! Property tests over random legal play.
//!
//! Each case drives a match from the opening with a seeded RNG, picking a
//! random legal move or cube action at every step, and checks that the
//! match invariants hold after every transition.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strictly_backgammon::invariants::{InvariantSet, MatchInvariants};
use strictly_backgammon::{Color, Match, Phase, Progress, CHECKERS_PER_SIDE, CUBE_CEILING};
use strum::IntoEnumIterator;

const MAX_STEPS: usize = 600;

fn checkers_accounted(game: &Match, color: Color) -> u32 {
    let board = game.board();
    board.checkers_on_board(color) + board.bar_count(color) as u32 + board.borne_off(color) as u32
}

/// One random step. Returns the player to move before the step and the progress.
fn step(game: &mut Match, rng: &mut StdRng) -> (Color, Progress) {
    let color = game.current_player();
    let progress = match game.phase() {
        Phase::AwaitingRoll => {
            if game.cube().check_offer(color).is_ok() && rng.gen_bool(0.1) {
                game.offer_double(color).unwrap();
                Progress::Continue
            } else {
                game.roll(color, rng).unwrap()
            }
        }
        Phase::DoubleOffered { by } => game.respond_double(by.opponent(), rng.gen_bool(0.9)).unwrap(),
        Phase::DiceRolled => {
            let moves = game.legal_moves();
            assert!(!moves.is_empty(), "dice left with no legal move");
            let pick = moves[rng.gen_range(0..moves.len())];
            game.apply_move(color, pick.from, pick.to, Some(pick.die))
                .unwrap()
        }
        Phase::Finished(_) => unreachable!("stepped a finished match"),
    };
    (color, progress)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_random_play_conserves_checkers(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = Match::new();

        for _ in 0..MAX_STEPS {
            if game.is_finished() {
                break;
            }
            step(&mut game, &mut rng);
            for color in Color::iter() {
                prop_assert_eq!(checkers_accounted(&game, color), CHECKERS_PER_SIDE as u32);
            }
            prop_assert!(MatchInvariants::check_all(&game).is_ok());
        }
    }

    #[test]
    fn test_player_changes_only_on_turn_end(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = Match::new();

        for _ in 0..MAX_STEPS {
            if game.is_finished() {
                break;
            }
            let (before, progress) = step(&mut game, &mut rng);
            match progress {
                Progress::TurnEnded { next, .. } => {
                    prop_assert_eq!(next, before.opponent());
                    prop_assert_eq!(game.current_player(), next);
                    prop_assert!(game.dice().is_none());
                }
                Progress::Continue | Progress::Finished(_) => {
                    prop_assert_eq!(game.current_player(), before);
                }
            }
        }
    }

    #[test]
    fn test_cube_never_passes_ceiling(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = Match::new();

        for _ in 0..MAX_STEPS {
            if game.is_finished() {
                break;
            }
            step(&mut game, &mut rng);
            let value = game.cube().value();
            prop_assert!(value.is_power_of_two() && value <= CUBE_CEILING);
        }

        if let Some(outcome) = game.outcome() {
            prop_assert!(outcome.points() <= CUBE_CEILING * 3);
            prop_assert_eq!(outcome.cube, game.cube().value());
        }
    }
}
