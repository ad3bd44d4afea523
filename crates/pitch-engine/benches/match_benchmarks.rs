//! Match simulation benchmarks.
//!
//! Measures the cost of the pieces a verification service runs per request:
//!
//! - a full 90-second match at 10 Hz with no inputs (pure physics),
//! - the same match with a busy input stream on both sides,
//! - re-execution through the [`Verifier`],
//! - a single physics step in isolation,
//! - scaling of full-match cost with match length.
//!
//! Run with: `cargo bench --bench match_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use pitch_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// One input every `every` ticks, cycling through every action kind.
fn input_stream(side: Side, total_ticks: u64, every: u64) -> Vec<InputRecord> {
    let (teammate, opponent) = match side {
        Side::Home => (9, 21),
        Side::Away => (20, 10),
    };
    (0..total_ticks)
        .step_by(every as usize)
        .enumerate()
        .map(|(i, tick)| {
            let (action, params) = match i % 6 {
                0 => (
                    ActionKind::Move,
                    InputParams {
                        x: Some((20 + (i * 7) % 60) as f64),
                        y: Some((10 + (i * 11) % 40) as f64),
                        ..Default::default()
                    },
                ),
                1 => (
                    ActionKind::Pass,
                    InputParams {
                        target_id: Some(teammate),
                        ..Default::default()
                    },
                ),
                2 => (ActionKind::Sprint, InputParams::default()),
                3 => (
                    ActionKind::Tackle,
                    InputParams {
                        target_id: Some(opponent),
                        ..Default::default()
                    },
                ),
                4 => (ActionKind::Skill, InputParams::default()),
                _ => (
                    ActionKind::Shoot,
                    InputParams {
                        power: Some(85.0),
                        angle: Some(((i * 13) % 60) as f64 - 30.0),
                        ..Default::default()
                    },
                ),
            };
            InputRecord {
                tick: tick as i64,
                action,
                params,
                timestamp: tick * 100,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Benchmark 1: Full match without inputs
// ---------------------------------------------------------------------------

fn bench_full_match_idle(c: &mut Criterion) {
    let setup = MatchSetup::new(MatchConfig::default());

    c.bench_function("full_match_90s_idle", |b| {
        b.iter(|| {
            let result = setup.run("bench", ENGINE_VERSION, &[], &[]).unwrap();
            black_box(result.result_hash);
        });
    });
}

// ---------------------------------------------------------------------------
// Benchmark 2: Full match with a busy input stream
// ---------------------------------------------------------------------------

fn bench_full_match_busy(c: &mut Criterion) {
    let config = MatchConfig::default();
    let setup = MatchSetup::new(config);
    let home = input_stream(Side::Home, config.total_ticks(), 3);
    let away = input_stream(Side::Away, config.total_ticks(), 4);

    c.bench_function("full_match_90s_busy", |b| {
        b.iter(|| {
            let result = setup.run("bench", ENGINE_VERSION, &home, &away).unwrap();
            black_box(result.result_hash);
        });
    });
}

// ---------------------------------------------------------------------------
// Benchmark 3: Verification of a stored match
// ---------------------------------------------------------------------------

fn bench_verify(c: &mut Criterion) {
    let config = MatchConfig::default();
    let setup = MatchSetup::new(config);
    let home = input_stream(Side::Home, config.total_ticks(), 3);
    let away = input_stream(Side::Away, config.total_ticks(), 4);
    let result = setup.run("bench", ENGINE_VERSION, &home, &away).unwrap();
    let verifier = Verifier::new(setup);

    c.bench_function("verify_90s_busy", |b| {
        b.iter(|| {
            let verdict = verifier.verify_result(&result).unwrap();
            black_box(verdict.valid);
        });
    });
}

// ---------------------------------------------------------------------------
// Benchmark 4: Single physics step
// ---------------------------------------------------------------------------

fn bench_single_step(c: &mut Criterion) {
    let config = MatchConfig::default();
    let tactics = MatchTactics::default();
    let state = MatchState::kickoff("bench", "bench", &config, &tactics, &Squads::default());
    let ctx = StepContext {
        config: &config,
        tactics: &tactics,
    };
    let sprint = [PlayerInput {
        tick: 0,
        timestamp: 0,
        action: Action::Sprint,
    }];

    c.bench_function("physics_step_kickoff", |b| {
        b.iter(|| {
            let mut rng = MatchRng::from_seed("bench");
            let outcome = step(&state, &ctx, &sprint, &[], &mut rng);
            black_box(outcome.state.tick);
        });
    });
}

// ---------------------------------------------------------------------------
// Benchmark 5: Scaling with match length
// ---------------------------------------------------------------------------

fn bench_match_length_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_length_scaling");

    for seconds in [30u32, 90, 270] {
        let config = MatchConfig {
            match_duration: seconds,
            ..MatchConfig::default()
        };
        let setup = MatchSetup::new(config);
        let home = input_stream(Side::Home, config.total_ticks(), 5);

        group.bench_with_input(BenchmarkId::from_parameter(seconds), &seconds, |b, &_seconds| {
            b.iter(|| {
                let result = setup.run("bench", ENGINE_VERSION, &home, &[]).unwrap();
                black_box(result.result_hash);
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_full_match_idle,
    bench_full_match_busy,
    bench_verify,
    bench_single_step,
    bench_match_length_scaling,
);
criterion_main!(benches);
