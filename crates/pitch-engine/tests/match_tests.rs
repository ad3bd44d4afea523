//! Integration tests for whole-match execution.
//!
//! These tests drive complete matches through the public API and check the
//! properties a result consumer relies on: identical inputs give identical
//! results, ticks advance one at a time, early stops are recorded, and
//! independent matches can run side by side on separate threads.

use pitch_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn league_config() -> MatchConfig {
    MatchConfig {
        field_width: 100,
        field_height: 60,
        tick_rate: 10,
        match_duration: 60,
    }
}

fn short_config() -> MatchConfig {
    MatchConfig {
        match_duration: 6,
        ..MatchConfig::default()
    }
}

fn shoot(tick: i64, power: f64, angle: f64, timestamp: u64) -> InputRecord {
    InputRecord {
        tick,
        action: ActionKind::Shoot,
        params: InputParams {
            power: Some(power),
            angle: Some(angle),
            ..Default::default()
        },
        timestamp,
    }
}

fn move_to(tick: i64, x: f64, y: f64, timestamp: u64) -> InputRecord {
    InputRecord {
        tick,
        action: ActionKind::Move,
        params: InputParams {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        },
        timestamp,
    }
}

fn simple(tick: i64, action: ActionKind, timestamp: u64) -> InputRecord {
    InputRecord {
        tick,
        action,
        params: InputParams::default(),
        timestamp,
    }
}

fn busy_home() -> Vec<InputRecord> {
    vec![
        move_to(1, 52.0, 30.0, 10),
        simple(3, ActionKind::Sprint, 30),
        move_to(6, 70.0, 25.0, 60),
        simple(12, ActionKind::Skill, 120),
        shoot(20, 90.0, 0.0, 200),
    ]
}

fn busy_away() -> Vec<InputRecord> {
    vec![
        move_to(2, 48.0, 31.0, 20),
        InputRecord {
            tick: 9,
            action: ActionKind::Tackle,
            params: InputParams {
                target_id: Some(10),
                ..Default::default()
            },
            timestamp: 90,
        },
        simple(15, ActionKind::Sprint, 150),
    ]
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

#[test]
fn identical_inputs_give_identical_results() {
    let config = short_config();
    let tactics = MatchTactics::default();
    let a = run(&config, "det-seed", ENGINE_VERSION, &tactics, &busy_home(), &busy_away()).unwrap();
    let b = run(&config, "det-seed", ENGINE_VERSION, &tactics, &busy_home(), &busy_away()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.result_hash, b.result_hash);
    assert!(a.hashes_consistent());
}

#[test]
fn seed_is_bound_into_the_result_hash() {
    let config = short_config();
    let tactics = MatchTactics::default();
    let a = run(&config, "seed-a", ENGINE_VERSION, &tactics, &[], &[]).unwrap();
    let b = run(&config, "seed-b", ENGINE_VERSION, &tactics, &[], &[]).unwrap();
    assert_ne!(a.replay_hash, b.replay_hash);
    assert_ne!(a.result_hash, b.result_hash);
}

#[test]
fn submission_order_across_ticks_does_not_matter() {
    let config = short_config();
    let tactics = MatchTactics::default();
    let forward = busy_home();
    let mut reversed = busy_home();
    reversed.reverse();

    let a = run(&config, "order", ENGINE_VERSION, &tactics, &forward, &[]).unwrap();
    let b = run(&config, "order", ENGINE_VERSION, &tactics, &reversed, &[]).unwrap();
    assert_eq!(a.result_hash, b.result_hash);
    assert_eq!(a.home_inputs, b.home_inputs);
}

#[test]
fn same_tick_inputs_apply_in_timestamp_order() {
    let setup = MatchSetup::new(short_config());
    let late_first = vec![
        simple(4, ActionKind::Sprint, 900),
        move_to(4, 60.0, 30.0, 100),
    ];
    let result = setup.run("ts", ENGINE_VERSION, &late_first, &[]).unwrap();
    let timestamps: Vec<u64> = result.home_inputs.iter().map(|i| i.timestamp).collect();
    assert_eq!(timestamps, vec![100, 900]);
}

#[test]
fn parallel_matches_do_not_interfere() {
    let config = short_config();
    let tactics = MatchTactics::default();
    let expected =
        run(&config, "threads", ENGINE_VERSION, &tactics, &busy_home(), &busy_away()).unwrap();

    let results: Vec<MatchResult> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    run(&config, "threads", ENGINE_VERSION, &tactics, &busy_home(), &busy_away())
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for result in results {
        assert_eq!(result, expected);
    }
}

// ---------------------------------------------------------------------------
// Tick progression
// ---------------------------------------------------------------------------

#[test]
fn ticks_advance_one_at_a_time() {
    let config = short_config();
    let mut driver = MatchDriver::new(MatchSetup::new(config), "mono").unwrap();
    driver.submit_all(Side::Home, &busy_home());
    driver.submit_all(Side::Away, &busy_away());

    let mut expected = 0;
    assert_eq!(driver.tick(), expected);
    while driver.advance().unwrap() {
        expected += 1;
        assert_eq!(driver.tick(), expected);
        driver.state().check_invariants(&config).unwrap();
    }
    assert_eq!(expected, config.total_ticks());
    assert_eq!(driver.state().status, MatchStatus::Started);

    let result = driver.finish().unwrap();
    assert_eq!(result.ticks_played, 60);
    assert_eq!(result.duration, 6);
    assert_eq!(result.timestamp, 6_000);
}

#[test]
fn timeline_is_in_tick_order() {
    let result = MatchSetup::new(short_config())
        .run("timeline", ENGINE_VERSION, &busy_home(), &busy_away())
        .unwrap();
    let ticks: Vec<u64> = result.events.iter().map(|e| e.tick).collect();
    let mut sorted = ticks.clone();
    sorted.sort();
    assert_eq!(ticks, sorted);
    assert!(ticks.iter().all(|&t| t < result.ticks_played));
}

// ---------------------------------------------------------------------------
// Reference scenarios
// ---------------------------------------------------------------------------

#[test]
fn single_shot_without_possession_is_recorded_but_harmless() {
    let config = league_config();
    let shot = shoot(5, 80.0, 45.0, 500);
    let result = run(
        &config,
        "abc123",
        ENGINE_VERSION,
        &MatchTactics::default(),
        &[shot.clone()],
        &[],
    )
    .unwrap();

    assert_eq!(result.duration, 60);
    assert_eq!(result.ticks_played, 600);
    assert_eq!(result.engine_version, ENGINE_VERSION);
    assert_eq!(result.seed, "abc123");
    assert_eq!(result.home_inputs.len(), 1);
    assert!(result.away_inputs.is_empty());
    assert_eq!((result.home_score, result.away_score), (0, 0));

    let expected = replay_hash("abc123", ENGINE_VERSION, &[shot.parse().unwrap()], &[]);
    assert_eq!(result.replay_hash, expected);
    assert!(result.hashes_consistent());
}

#[test]
fn match_without_inputs_is_a_goalless_draw() {
    let config = league_config();
    let result = run(&config, "quiet", ENGINE_VERSION, &MatchTactics::default(), &[], &[]).unwrap();

    assert_eq!((result.home_score, result.away_score), (0, 0));
    assert_eq!(result.winner(), None);
    assert_eq!(result.inputs_consumed(), 0);
    assert!(!result
        .events
        .iter()
        .any(|e| matches!(e.kind, EventKind::Goal { .. } | EventKind::PossessionChange { .. })));
    assert_eq!(result.replay_hash, replay_hash("quiet", ENGINE_VERSION, &[], &[]));
}

#[test]
fn ball_stays_on_the_centre_spot_without_inputs() {
    let config = league_config();
    let mut driver = MatchDriver::new(MatchSetup::new(config), "quiet").unwrap();
    let kickoff = driver.state().clone();

    while driver.advance().unwrap() {
        let state = driver.state();
        assert_eq!(state.ball.position, config.center(), "tick {}", state.tick);
        assert_eq!(state.ball.velocity, Vec2::ZERO, "tick {}", state.tick);
        assert_eq!(state.possession(), None, "tick {}", state.tick);
        for (now, before) in state.players().zip(kickoff.players()) {
            assert_eq!(now.position, before.position);
        }
    }
    assert_eq!(driver.tick(), 600);
}

// ---------------------------------------------------------------------------
// Early stops and bad inputs
// ---------------------------------------------------------------------------

#[test]
fn forfeit_stops_the_match_and_keeps_only_played_inputs() {
    let setup = MatchSetup::new(short_config());
    let result = setup
        .run_until(
            "forfeit",
            ENGINE_VERSION,
            &busy_home(),
            &busy_away(),
            Some(Stoppage {
                tick: 10,
                reason: StoppageReason::Forfeit { side: Side::Away },
            }),
        )
        .unwrap();

    assert_eq!(result.ticks_played, 10);
    assert_eq!(result.duration, 1);
    assert_eq!(result.timestamp, 1_000);
    assert!(result.home_inputs.iter().all(|i| i.tick < 10));
    assert!(result.away_inputs.iter().all(|i| i.tick < 10));
    assert_eq!(result.home_inputs.len(), 3);
    assert_eq!(result.away_inputs.len(), 2);
    assert!(result.hashes_consistent());
}

#[test]
fn invalid_inputs_are_skipped_and_counted() {
    let setup = MatchSetup::new(short_config());
    let home = vec![
        simple(2, ActionKind::Sprint, 0),
        simple(-1, ActionKind::Sprint, 0),
        move_to(3, 500.0, 10.0, 0),
        shoot(4, 120.0, 0.0, 0),
        simple(9_999, ActionKind::Skill, 0),
        InputRecord {
            tick: 5,
            action: ActionKind::Pass,
            params: InputParams {
                target_id: Some(15),
                ..Default::default()
            },
            timestamp: 0,
        },
    ];
    let result = setup.run("bad-inputs", ENGINE_VERSION, &home, &[]).unwrap();

    assert_eq!(result.home_inputs.len(), 1);
    assert_eq!(result.ingest.home.accepted, 1);
    assert_eq!(result.ingest.home.rejected, 5);
    assert_eq!(result.ingest.home.consumed, 1);
    assert_eq!(result.ingest.away, SideIngest::default());
}

#[test]
fn invalid_setup_is_fatal() {
    let tactics = MatchTactics::default();
    let zero_rate = MatchConfig {
        tick_rate: 0,
        ..MatchConfig::default()
    };
    assert!(matches!(
        run(&zero_rate, "s", ENGINE_VERSION, &tactics, &[], &[]),
        Err(MatchError::Config(ConfigError::NotPositive { field: "tickRate" }))
    ));
    assert!(matches!(
        run(&MatchConfig::default(), "", ENGINE_VERSION, &tactics, &[], &[]),
        Err(MatchError::Config(ConfigError::EmptySeed))
    ));
    assert!(matches!(
        run(&MatchConfig::default(), "s", "0.9.0", &tactics, &[], &[]),
        Err(MatchError::UnsupportedEngineVersion { .. })
    ));
}
