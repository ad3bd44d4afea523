//! Match driver: runs a match tick by tick and produces its result.
//!
//! The [`MatchDriver`] owns the one [`MatchState`] of a match for the whole
//! run. Each call to [`advance`](MatchDriver::advance):
//!
//! 1. checks for an early stop (a scheduled [`Stoppage`] or a raised
//!    [`StopHandle`]),
//! 2. takes both sides' input batches for the current tick from the
//!    [`InputQueue`],
//! 3. runs one [`physics::step`],
//! 4. checks the per-tick invariants and commits the new state.
//!
//! Nothing in the loop reads the clock, the environment, or shared state, so
//! independent drivers can run on as many threads as the caller likes.
//!
//! # Example
//!
//! ```
//! use pitch_engine::prelude::*;
//!
//! let setup = MatchSetup::new(MatchConfig { match_duration: 3, ..MatchConfig::default() });
//! let mut driver = MatchDriver::new(setup, "abc123").unwrap();
//!
//! let sprint = InputRecord {
//!     tick: 4,
//!     action: ActionKind::Sprint,
//!     params: InputParams::default(),
//!     timestamp: 0,
//! };
//! assert!(driver.submit(Side::Away, &sprint).is_accepted());
//!
//! while driver.advance().unwrap() {}
//! let result = driver.finish().unwrap();
//! assert_eq!(result.ticks_played, 30);
//! assert_eq!(result.away_inputs.len(), 1);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pitch_core::config::MatchConfig;
use pitch_core::input::{InputRecord, PlayerInput, Side};
use pitch_core::rng::MatchRng;
use pitch_core::state::{MatchState, MatchStatus, Squads};
use pitch_core::tactics::MatchTactics;
use pitch_core::{ConfigError, DeterminismViolation};
use pitch_ledger::hash::{replay_hash, ResultDigest};
use pitch_ledger::result::{MatchResult, Stoppage, StoppageReason};
use pitch_ledger::timeline::{EventKind, MatchTimeline};
use serde::{Deserialize, Serialize};

use crate::ingest::{Admission, InputQueue};
use crate::physics::{self, StepContext};
use crate::{MatchError, ENGINE_VERSION};

// ---------------------------------------------------------------------------
// MatchSetup
// ---------------------------------------------------------------------------

/// Everything fixed before kickoff apart from the seed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSetup {
    pub config: MatchConfig,
    #[serde(default)]
    pub tactics: MatchTactics,
    #[serde(default)]
    pub squads: Squads,
}

impl MatchSetup {
    /// Default tactics and squads under `config`.
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            tactics: MatchTactics::default(),
            squads: Squads::default(),
        }
    }

    /// Replace the tactics.
    pub fn with_tactics(mut self, tactics: MatchTactics) -> Self {
        self.tactics = tactics;
        self
    }

    /// Replace the squads.
    pub fn with_squads(mut self, squads: Squads) -> Self {
        self.squads = squads;
        self
    }

    /// Validate config, tactics, and squads.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()?;
        self.tactics.validate()?;
        self.squads.validate()
    }

    /// Play a whole match under this setup.
    pub fn run(
        &self,
        seed: &str,
        engine_version: &str,
        home_inputs: &[InputRecord],
        away_inputs: &[InputRecord],
    ) -> Result<MatchResult, MatchError> {
        self.run_until(seed, engine_version, home_inputs, away_inputs, None)
    }

    /// Play a match under this setup, ending early at `stoppage` if given.
    pub fn run_until(
        &self,
        seed: &str,
        engine_version: &str,
        home_inputs: &[InputRecord],
        away_inputs: &[InputRecord],
        stoppage: Option<Stoppage>,
    ) -> Result<MatchResult, MatchError> {
        check_engine_version(engine_version)?;
        let mut driver = MatchDriver::new(self.clone(), seed)?;
        if let Some(stoppage) = stoppage {
            driver.schedule_stoppage(stoppage);
        }
        driver.submit_all(Side::Home, home_inputs);
        driver.submit_all(Side::Away, away_inputs);
        driver.finish()
    }
}

/// Play a whole match with default squads.
///
/// # Errors
///
/// - [`MatchError::UnsupportedEngineVersion`] unless `engine_version` is
///   [`ENGINE_VERSION`].
/// - [`MatchError::Config`] for an invalid config, seed, or tactics.
/// - [`MatchError::Determinism`] if an internal invariant breaks.
///
/// Individually invalid inputs are not errors: they are skipped and counted
/// in the result's ingest summary.
pub fn run(
    config: &MatchConfig,
    seed: &str,
    engine_version: &str,
    tactics: &MatchTactics,
    home_inputs: &[InputRecord],
    away_inputs: &[InputRecord],
) -> Result<MatchResult, MatchError> {
    MatchSetup::new(*config)
        .with_tactics(tactics.clone())
        .run(seed, engine_version, home_inputs, away_inputs)
}

fn check_engine_version(requested: &str) -> Result<(), MatchError> {
    if requested != ENGINE_VERSION {
        return Err(MatchError::UnsupportedEngineVersion {
            requested: requested.to_owned(),
            supported: ENGINE_VERSION,
        });
    }
    Ok(())
}

/// Default match id: the first 16 hex characters of BLAKE3 of the seed.
pub fn derive_match_id(seed: &str) -> String {
    let mut id = blake3::hash(seed.as_bytes()).to_hex().to_string();
    id.truncate(16);
    id
}

// ---------------------------------------------------------------------------
// StopHandle
// ---------------------------------------------------------------------------

/// Shared flag for stopping a running match from another thread. Checked
/// only between ticks.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// A lowered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the match to stop before its next tick.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// ConsumedInputs
// ---------------------------------------------------------------------------

/// Inputs actually applied, per side, in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumedInputs {
    pub home: Vec<PlayerInput>,
    pub away: Vec<PlayerInput>,
}

impl ConsumedInputs {
    /// Total consumed inputs across both sides.
    pub fn len(&self) -> usize {
        self.home.len() + self.away.len()
    }

    /// Whether neither side has had an input applied.
    pub fn is_empty(&self) -> bool {
        self.home.is_empty() && self.away.is_empty()
    }
}

// ---------------------------------------------------------------------------
// MatchDriver
// ---------------------------------------------------------------------------

/// Runs one match.
#[derive(Debug)]
pub struct MatchDriver {
    pub(crate) setup: MatchSetup,
    pub(crate) state: MatchState,
    pub(crate) rng: MatchRng,
    pub(crate) queue: InputQueue,
    pub(crate) consumed: ConsumedInputs,
    pub(crate) timeline: MatchTimeline,
    pub(crate) scheduled: Option<Stoppage>,
    pub(crate) stopped: Option<Stoppage>,
    pub(crate) stop: StopHandle,
}

impl MatchDriver {
    /// Line up a match under `setup` with the given seed. The match id is
    /// derived from the seed; see [`with_match_id`](Self::with_match_id).
    ///
    /// # Errors
    ///
    /// [`MatchError::Config`] if the setup is invalid or the seed is empty.
    pub fn new(setup: MatchSetup, seed: &str) -> Result<Self, MatchError> {
        if seed.is_empty() {
            return Err(ConfigError::EmptySeed.into());
        }
        setup.validate()?;

        let match_id = derive_match_id(seed);
        let state = MatchState::kickoff(
            &match_id,
            seed,
            &setup.config,
            &setup.tactics,
            &setup.squads,
        );
        Ok(Self {
            queue: InputQueue::new(setup.config),
            rng: MatchRng::from_seed(seed),
            setup,
            state,
            consumed: ConsumedInputs::default(),
            timeline: MatchTimeline::new(),
            scheduled: None,
            stopped: None,
            stop: StopHandle::new(),
        })
    }

    /// Use `match_id` instead of the derived id.
    pub fn with_match_id(mut self, match_id: &str) -> Self {
        self.state.match_id = match_id.to_owned();
        self
    }

    /// End the match before simulating tick `stoppage.tick`.
    pub fn schedule_stoppage(&mut self, stoppage: Stoppage) {
        self.scheduled = Some(stoppage);
    }

    /// A handle that stops this match at the next tick boundary.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Submit one input for `side`. Inputs for ticks already simulated are
    /// dropped as late.
    pub fn submit(&mut self, side: Side, record: &InputRecord) -> Admission {
        self.queue.submit(side, record, self.state.tick)
    }

    /// Submit inputs in order. Returns how many were accepted.
    pub fn submit_all(&mut self, side: Side, records: &[InputRecord]) -> usize {
        self.queue.submit_all(side, records, self.state.tick)
    }

    /// The setup this match was lined up under.
    pub fn setup(&self) -> &MatchSetup {
        &self.setup
    }

    /// The match state after the last simulated tick.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Number of ticks simulated so far.
    pub fn tick(&self) -> u64 {
        self.state.tick
    }

    /// Inputs applied so far, per side, in application order.
    pub fn consumed(&self) -> &ConsumedInputs {
        &self.consumed
    }

    /// Events recorded so far.
    pub fn timeline(&self) -> &MatchTimeline {
        &self.timeline
    }

    /// Inputs accepted but not yet applied, plus ingest counts.
    pub fn queue(&self) -> &InputQueue {
        &self.queue
    }

    /// The early stop that ended the match, if any.
    pub fn stoppage(&self) -> Option<Stoppage> {
        self.stopped
    }

    /// Whether no further tick will be simulated.
    pub fn is_finished(&self) -> bool {
        self.stopped.is_some() || self.state.tick >= self.setup.config.total_ticks()
    }

    /// Simulate one tick. Returns `false` without simulating if the match is
    /// over, either at full time or because of an early stop.
    ///
    /// # Errors
    ///
    /// [`MatchError::Determinism`] if the step breaks an invariant. The
    /// driver's state is left at the last good tick.
    pub fn advance(&mut self) -> Result<bool, MatchError> {
        if self.is_finished() {
            return Ok(false);
        }
        if let Some(stoppage) = self.pending_stop() {
            tracing::info!(
                match_id = %self.state.match_id,
                tick = stoppage.tick,
                reason = ?stoppage.reason,
                "match stopped early"
            );
            self.stopped = Some(stoppage);
            return Ok(false);
        }

        if self.state.status == MatchStatus::Waiting {
            self.state.transition(MatchStatus::Started)?;
            tracing::info!(
                match_id = %self.state.match_id,
                seed = %self.state.seed,
                total_ticks = self.setup.config.total_ticks(),
                "match started"
            );
        }

        let tick = self.state.tick;
        let home = self.queue.take_batch(Side::Home, tick);
        let away = self.queue.take_batch(Side::Away, tick);
        let ctx = StepContext {
            config: &self.setup.config,
            tactics: &self.setup.tactics,
        };
        let outcome = physics::step(&self.state, &ctx, &home, &away, &mut self.rng);

        if outcome.state.tick != tick + 1 {
            return Err(DeterminismViolation::TickNotAdvanced {
                from: tick,
                to: outcome.state.tick,
            }
            .into());
        }
        outcome.state.check_invariants(&self.setup.config)?;

        for event in &outcome.events {
            match event.kind {
                EventKind::Goal { side, scorer } => tracing::debug!(
                    tick,
                    %side,
                    scorer = ?scorer,
                    home = outcome.state.home.score,
                    away = outcome.state.away.score,
                    "goal"
                ),
                EventKind::PossessionChange { to, player, .. } => {
                    tracing::debug!(tick, to = ?to, player = ?player, "possession changed")
                }
                _ => {}
            }
        }

        self.state = outcome.state;
        self.consumed.home.extend(home);
        self.consumed.away.extend(away);
        self.timeline.extend(outcome.events);
        Ok(true)
    }

    fn pending_stop(&self) -> Option<Stoppage> {
        let tick = self.state.tick;
        if self.stop.is_raised() {
            return Some(Stoppage {
                tick,
                reason: StoppageReason::External,
            });
        }
        self.scheduled
            .filter(|s| s.tick <= tick)
            .map(|s| Stoppage {
                tick,
                reason: s.reason,
            })
    }

    /// Simulate until full time or an early stop.
    pub fn run_to_end(&mut self) -> Result<(), MatchError> {
        while self.advance()? {}
        Ok(())
    }

    /// Play out any remaining ticks, blow the final whistle, and build the
    /// result.
    pub fn finish(mut self) -> Result<MatchResult, MatchError> {
        self.run_to_end()?;

        if self.state.status == MatchStatus::Waiting {
            self.state.transition(MatchStatus::Started)?;
        }
        self.state.transition(MatchStatus::Ended)?;

        let config = &self.setup.config;
        let ticks_played = self.state.tick;
        let duration = config.duration_for_ticks(ticks_played);
        let seed = self.state.seed.clone();

        let mut ingest = *self.queue.summary();
        ingest.home.consumed = self.consumed.home.len() as u64;
        ingest.away.consumed = self.consumed.away.len() as u64;

        let replay = replay_hash(
            &seed,
            ENGINE_VERSION,
            &self.consumed.home,
            &self.consumed.away,
        );
        let result_hash = ResultDigest {
            seed: &seed,
            engine_version: ENGINE_VERSION,
            home_score: self.state.home.score,
            away_score: self.state.away.score,
            duration,
            replay_hash: &replay,
        }
        .hash();

        tracing::info!(
            match_id = %self.state.match_id,
            home = self.state.home.score,
            away = self.state.away.score,
            ticks_played,
            inputs = self.consumed.len(),
            result_hash = %result_hash,
            "match finished"
        );

        Ok(MatchResult {
            match_id: self.state.match_id.clone(),
            home_score: self.state.home.score,
            away_score: self.state.away.score,
            duration,
            ticks_played,
            seed,
            engine_version: ENGINE_VERSION.to_owned(),
            home_inputs: self.consumed.home,
            away_inputs: self.consumed.away,
            replay_hash: replay,
            result_hash,
            timestamp: config.clock_ms(ticks_played),
            stoppage: self.stopped,
            ingest,
            events: self.timeline.into_events(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
