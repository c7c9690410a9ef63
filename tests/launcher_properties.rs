mod helpers;

use game_launcher::library::Game;
use helpers::{TestLauncher, at, init_tracing};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    AddGame,
    Launch(usize),
    Session { game: usize, day: i64, hour: u32 },
    Complete(usize),
    RemoveGame(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::AddGame),
        (0usize..6).prop_map(Op::Launch),
        (0usize..6, 0i64..14, 0u32..24).prop_map(|(game, day, hour)| Op::Session { game, day, hour }),
        (0usize..6).prop_map(Op::Complete),
        (0usize..6).prop_map(Op::RemoveGame),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_automatic_unlocks_survive_library_churn(ops in prop::collection::vec(op(), 1..40)) {
        init_tracing();
        let mut t = TestLauncher::new(Default::default());
        let mut added = 0usize;

        for op in ops {
            let before = t.launcher.engine().progress().clone();
            let library = t.launcher.library_mut();
            // Failed mutations (unknown game) are part of the churn
            let _ = match op {
                Op::AddGame => {
                    added += 1;
                    library.add_game(Game::new(format!("g{}", added), "G"))
                }
                Op::Launch(i) => library.record_launch(&format!("g{}", i)),
                Op::Session { game, day, hour } => {
                    library.record_session(&format!("g{}", game), at(day, hour), None)
                }
                Op::Complete(i) => library.set_completion(&format!("g{}", i), 100.0),
                Op::RemoveGame(i) => library.remove_game(&format!("g{}", i)).map(|_| ()),
            };
            t.launcher.refresh().unwrap();

            for (key, old) in before.iter() {
                let new = t.launcher.engine().progress_of(key).unwrap();
                prop_assert!(new.current_progress >= old.current_progress, "{} went backwards", key);
                prop_assert!(!old.unlocked || new.unlocked, "{} was re-locked", key);
            }
        }

        let rate = t.launcher.summary().completion_rate;
        prop_assert!((0.0..=1.0).contains(&rate));
    }
}
