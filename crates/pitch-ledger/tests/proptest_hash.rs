//! Property tests for canonical hashing.
//!
//! These tests use `proptest` to generate random input logs and verify that
//! the replay and result hashes are stable for equal inputs and change when
//! any single committed field changes.

use pitch_core::fixed::Fixed;
use pitch_core::input::{Action, PlayerId, PlayerInput};
use pitch_ledger::canonical::CanonicalEncoder;
use pitch_ledger::hash::{replay_hash, ResultDigest, REPLAY_DOMAIN};
use proptest::prelude::*;

const VERSION: &str = "1.0.0";

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0i64..100, 0i64..60).prop_map(|(x, y)| Action::Move {
            x: Fixed::from_int(x),
            y: Fixed::from_int(y),
        }),
        (1u32..=22).prop_map(|t| Action::Pass {
            target_id: PlayerId(t)
        }),
        (0i64..=100, -180i64..=180).prop_map(|(p, a)| Action::Shoot {
            power: Fixed::from_int(p),
            angle: Fixed::from_int(a),
        }),
        (1u32..=22).prop_map(|t| Action::Tackle {
            target_id: PlayerId(t)
        }),
        Just(Action::Sprint),
        Just(Action::Skill),
    ]
}

fn input() -> impl Strategy<Value = PlayerInput> {
    (0u64..900, 0u64..100_000, action()).prop_map(|(tick, timestamp, action)| PlayerInput {
        tick,
        timestamp,
        action,
    })
}

fn inputs() -> impl Strategy<Value = Vec<PlayerInput>> {
    prop::collection::vec(input(), 0..20)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn replay_hash_is_a_pure_function(seed in "[a-z0-9]{1,16}", home in inputs(), away in inputs()) {
        let a = replay_hash(&seed, VERSION, &home, &away);
        let b = replay_hash(&seed, VERSION, &home.clone(), &away.clone());
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.len(), 64);
        prop_assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn moving_an_input_across_sides_changes_the_hash(
        seed in "[a-z0-9]{1,16}",
        mut home in inputs(),
        mut away in inputs(),
    ) {
        prop_assume!(!home.is_empty());
        let before = replay_hash(&seed, VERSION, &home, &away);
        let moved = home.pop().unwrap();
        away.insert(0, moved);
        prop_assert_ne!(before, replay_hash(&seed, VERSION, &home, &away));
    }

    #[test]
    fn shifting_one_tick_changes_the_hash(
        seed in "[a-z0-9]{1,16}",
        mut home in inputs(),
        index in any::<prop::sample::Index>(),
    ) {
        prop_assume!(!home.is_empty());
        let before = replay_hash(&seed, VERSION, &home, &[]);
        let i = index.index(home.len());
        home[i].tick += 1;
        prop_assert_ne!(before, replay_hash(&seed, VERSION, &home, &[]));
    }

    #[test]
    fn result_hash_commits_to_the_score(
        replay in "[0-9a-f]{64}",
        home_score in 0u32..20,
        away_score in 0u32..20,
        duration in 1u32..6_000,
    ) {
        let digest = ResultDigest {
            seed: "s",
            engine_version: VERSION,
            home_score,
            away_score,
            duration,
            replay_hash: &replay,
        };
        let swapped = ResultDigest {
            home_score: away_score,
            away_score: home_score,
            ..digest
        };
        let bumped = ResultDigest {
            home_score: home_score + 1,
            ..digest
        };
        prop_assert_ne!(digest.hash(), bumped.hash());
        if home_score != away_score {
            prop_assert_ne!(digest.hash(), swapped.hash());
        }
    }

    #[test]
    fn string_boundaries_are_unambiguous(a in "[a-z]{0,8}", b in "[a-z]{1,8}") {
        let mut joined = a.clone();
        joined.push_str(&b);
        let mut split = CanonicalEncoder::new(REPLAY_DOMAIN);
        split.put_str(&a).put_str(&b);
        let mut whole = CanonicalEncoder::new(REPLAY_DOMAIN);
        whole.put_str(&joined).put_str("");
        prop_assert_ne!(split.as_bytes(), whole.as_bytes());
    }
}
