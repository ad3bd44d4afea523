//! Replay logs with state-hash checkpoints.
//!
//! The result hash says *whether* two runs of a match agree; a replay log
//! says *where* they stopped agreeing. While a match runs, a
//! [`ReplayRecorder`] stores the inputs consumed at each tick and, every
//! `checkpoint_interval` ticks, the driver's [`state_hash`]. [`replay`]
//! restores the initial snapshot, feeds the same inputs tick by tick, and
//! reports the first checkpoint whose hash differs.
//!
//! # Recording and replaying
//!
//! ```
//! use pitch_engine::prelude::*;
//!
//! let setup = MatchSetup::new(MatchConfig { match_duration: 2, ..MatchConfig::default() });
//! let sprint = InputRecord {
//!     tick: 3,
//!     action: ActionKind::Sprint,
//!     params: InputParams::default(),
//!     timestamp: 0,
//! };
//!
//! let (result, log) = record(&setup, "abc123", &[sprint], &[], 5).unwrap();
//! assert_eq!(log.total_ticks, result.ticks_played);
//!
//! let outcome = replay(&setup, &log).unwrap();
//! assert!(outcome.completed);
//! assert!(outcome.first_divergence.is_none());
//! ```
//!
//! [`state_hash`]: crate::tick::MatchDriver::state_hash

use std::collections::BTreeMap;

use pitch_core::input::{InputRecord, PlayerInput, Side};
use pitch_ledger::result::MatchResult;
use serde::{Deserialize, Serialize};

use crate::snapshot::MatchSnapshot;
use crate::tick::{MatchDriver, MatchSetup};

// ---------------------------------------------------------------------------
// ReplayLog
// ---------------------------------------------------------------------------

/// Initial snapshot plus the per-tick inputs and checkpoints of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayLog {
    /// Replay starts by restoring this snapshot.
    pub initial_snapshot: MatchSnapshot,
    /// Number of ticks recorded after the snapshot.
    pub total_ticks: u64,
    /// Inputs and checkpoints, in tick order.
    pub entries: Vec<ReplayEntry>,
}

/// One recorded fact about a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayEntry {
    /// An input applied during `tick`, in application order within its side.
    Input {
        tick: u64,
        side: Side,
        input: PlayerInput,
    },
    /// The driver's state hash before `tick` was simulated.
    Checkpoint { tick: u64, state_hash: String },
}

// ---------------------------------------------------------------------------
// ReplayResult
// ---------------------------------------------------------------------------

/// Outcome of [`replay`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayResult {
    /// Every recorded tick was replayed without divergence.
    pub completed: bool,
    pub ticks_replayed: u64,
    /// The first checkpoint that did not match, if any.
    pub first_divergence: Option<ReplayDivergence>,
}

/// A checkpoint whose replayed hash differs from the recorded one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayDivergence {
    pub tick: u64,
    pub expected_hash: String,
    pub actual_hash: String,
}

// ---------------------------------------------------------------------------
// ReplayRecorder
// ---------------------------------------------------------------------------

/// Builds a [`ReplayLog`] one tick at a time.
///
/// Call [`record_tick`](Self::record_tick) before each tick is simulated,
/// with that tick's batches and the driver's current state hash.
#[derive(Debug)]
pub struct ReplayRecorder {
    log: ReplayLog,
    /// Checkpoint every this many ticks. Zero records a checkpoint whenever
    /// a hash is supplied.
    checkpoint_interval: u64,
    ticks_recorded: u64,
    last_tick: Option<u64>,
}

impl ReplayRecorder {
    /// Start a log from `snapshot`, the driver before its first recorded
    /// tick, checkpointing every `checkpoint_interval` ticks.
    pub fn new(snapshot: MatchSnapshot, checkpoint_interval: u64) -> Self {
        Self {
            log: ReplayLog {
                initial_snapshot: snapshot,
                total_ticks: 0,
                entries: Vec::new(),
            },
            checkpoint_interval,
            ticks_recorded: 0,
            last_tick: None,
        }
    }

    /// Record one tick before it is simulated.
    ///
    /// # Errors
    ///
    /// Fails if `tick` is not strictly greater than the previously recorded
    /// tick. Nothing is recorded in that case.
    pub fn record_tick(
        &mut self,
        tick: u64,
        home: &[PlayerInput],
        away: &[PlayerInput],
        state_hash: Option<String>,
    ) -> Result<(), anyhow::Error> {
        if let Some(prev) = self.last_tick {
            if tick <= prev {
                return Err(anyhow::anyhow!(
                    "tick {tick} recorded after tick {prev}; ticks must increase"
                ));
            }
        }
        self.last_tick = Some(tick);
        self.ticks_recorded += 1;

        if let Some(state_hash) = state_hash {
            if self.checkpoint_interval == 0 || tick % self.checkpoint_interval == 0 {
                self.log
                    .entries
                    .push(ReplayEntry::Checkpoint { tick, state_hash });
            }
        }
        for (side, batch) in [(Side::Home, home), (Side::Away, away)] {
            self.log
                .entries
                .extend(batch.iter().map(|input| ReplayEntry::Input {
                    tick,
                    side,
                    input: *input,
                }));
        }
        Ok(())
    }

    /// Close the log. `total_ticks` is the number of ticks recorded.
    pub fn finish(mut self) -> ReplayLog {
        self.log.total_ticks = self.ticks_recorded;
        self.log
    }
}

/// Play a whole match while recording it.
///
/// Inputs go through the same validation as [`MatchSetup::run`], so the
/// returned result is identical to an unrecorded run.
pub fn record(
    setup: &MatchSetup,
    seed: &str,
    home_inputs: &[InputRecord],
    away_inputs: &[InputRecord],
    checkpoint_interval: u64,
) -> Result<(MatchResult, ReplayLog), anyhow::Error> {
    let mut driver = MatchDriver::new(setup.clone(), seed)?;
    let mut recorder = ReplayRecorder::new(driver.capture_snapshot()?, checkpoint_interval);
    driver.submit_all(Side::Home, home_inputs);
    driver.submit_all(Side::Away, away_inputs);

    while !driver.is_finished() {
        let tick = driver.tick();
        let home = driver.queue().peek_batch(Side::Home, tick);
        let away = driver.queue().peek_batch(Side::Away, tick);
        recorder.record_tick(tick, &home, &away, Some(driver.state_hash()?))?;
        driver.advance()?;
    }

    let log = recorder.finish();
    let result = driver.finish()?;
    Ok((result, log))
}

// ---------------------------------------------------------------------------
// replay()
// ---------------------------------------------------------------------------

/// Replay `log` under `setup` and compare every checkpoint.
///
/// The log is validated in full before anything is simulated. Replay stops
/// at the first divergent checkpoint.
///
/// # Errors
///
/// Fails if the log is malformed (duplicate checkpoints, entries outside the
/// recorded range, tick overflow), if the initial snapshot cannot be
/// restored, or if the match breaks an invariant during replay.
pub fn replay(setup: &MatchSetup, log: &ReplayLog) -> Result<ReplayResult, anyhow::Error> {
    let start_tick = log.initial_snapshot.state.tick;
    let total_ticks = log.total_ticks;
    let end_tick = start_tick.checked_add(total_ticks).ok_or_else(|| {
        anyhow::anyhow!("tick range overflow: {start_tick} + {total_ticks} exceeds u64::MAX")
    })?;

    let mut inputs: BTreeMap<u64, Vec<(Side, PlayerInput)>> = BTreeMap::new();
    let mut checkpoints: BTreeMap<u64, &str> = BTreeMap::new();
    for entry in &log.entries {
        let tick = match entry {
            ReplayEntry::Input { tick, .. } | ReplayEntry::Checkpoint { tick, .. } => *tick,
        };
        if tick < start_tick || tick >= end_tick {
            return Err(anyhow::anyhow!(
                "replay entry at tick {tick} is outside the recorded range {start_tick}..{end_tick}"
            ));
        }
        match entry {
            ReplayEntry::Input { side, input, .. } => {
                inputs.entry(tick).or_default().push((*side, *input));
            }
            ReplayEntry::Checkpoint { state_hash, .. } => {
                if checkpoints.insert(tick, state_hash.as_str()).is_some() {
                    return Err(anyhow::anyhow!(
                        "replay log contains duplicate checkpoint at tick {tick}"
                    ));
                }
            }
        }
    }

    if total_ticks == 0 {
        return Ok(ReplayResult {
            completed: true,
            ticks_replayed: 0,
            first_divergence: None,
        });
    }

    let mut driver = MatchDriver::restore(setup.clone(), &log.initial_snapshot)?;
    let mut ticks_replayed = 0;

    for tick in start_tick..end_tick {
        for (side, input) in inputs.remove(&tick).unwrap_or_default() {
            driver.submit(side, &InputRecord::from(input));
        }

        if let Some(expected) = checkpoints.get(&tick) {
            let actual = driver.state_hash()?;
            if actual != *expected {
                return Ok(ReplayResult {
                    completed: false,
                    ticks_replayed,
                    first_divergence: Some(ReplayDivergence {
                        tick,
                        expected_hash: (*expected).to_owned(),
                        actual_hash: actual,
                    }),
                });
            }
        }

        if !driver.advance()? {
            break;
        }
        ticks_replayed += 1;
    }

    Ok(ReplayResult {
        completed: ticks_replayed == total_ticks,
        ticks_replayed,
        first_divergence: None,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
