//! Pitch Engine -- deterministic match simulation and verification.
//!
//! This crate builds on [`pitch_core`] (data model, fixed-point math, seeded
//! PRNG) and [`pitch_ledger`] (canonical hashing, wire records) to provide the
//! match driver itself:
//!
//! - [`ingest`] validates and orders player inputs,
//! - [`physics`] advances the match by exactly one tick,
//! - [`tick`] drives a whole match and produces the [`MatchResult`],
//! - [`verify`] re-executes a stored match and classifies the outcome,
//! - [`snapshot`] and [`replay`] capture and re-check trajectories.
//!
//! Same config, seed, engine version, tactics, and inputs always produce the
//! same result hash, on any host, in any process.
//!
//! # Quick Start
//!
//! ```
//! use pitch_engine::prelude::*;
//!
//! let config = MatchConfig { match_duration: 5, ..MatchConfig::default() };
//! let home = vec![InputRecord {
//!     tick: 2,
//!     action: ActionKind::Sprint,
//!     params: InputParams::default(),
//!     timestamp: 200,
//! }];
//!
//! let result = run(&config, "abc123", ENGINE_VERSION, &MatchTactics::default(), &home, &[])
//!     .unwrap();
//! assert_eq!(result.duration, 5);
//! assert_eq!(result.home_inputs.len(), 1);
//! assert!(result.hashes_consistent());
//! ```
//!
//! [`MatchResult`]: pitch_ledger::result::MatchResult

#![deny(unsafe_code)]

pub mod ingest;
pub mod physics;
pub mod replay;
pub mod snapshot;
pub mod tick;
pub mod verify;

use pitch_core::{ConfigError, DeterminismViolation};

pub use tick::run;

/// Re-export the core crate for convenience.
pub use pitch_core;

/// Re-export the ledger crate for convenience.
pub use pitch_ledger;

/// The only engine version this build implements. Stored results recorded
/// under another version are reported as version mismatches, never re-run as
/// if they were current.
pub const ENGINE_VERSION: &str = "1.0.0";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A match could not be run to completion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    /// Configuration, seed, tactics, or squads are invalid. Nothing was
    /// simulated.
    #[error("invalid match setup: {0}")]
    Config(#[from] ConfigError),

    /// An internal invariant broke mid-match. No result is emitted.
    #[error("determinism violation: {0}")]
    Determinism(#[from] DeterminismViolation),

    /// The caller asked for an engine version this build does not implement.
    #[error("engine version {requested} is not supported (this engine is {supported})")]
    UnsupportedEngineVersion {
        requested: String,
        supported: &'static str,
    },
}

/// A verification could not be carried out at all.
///
/// A stored match that merely fails to verify is a normal
/// [`VerificationResult`](pitch_ledger::result::VerificationResult), not an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// Re-execution failed before producing a result.
    #[error("re-execution failed: {0}")]
    Execution(#[from] MatchError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use pitch_core::prelude::*;
    pub use pitch_ledger::prelude::*;

    pub use crate::ingest::{Admission, InputQueue};
    pub use crate::physics::{step, StepContext, StepOutcome};
    pub use crate::replay::{
        record, replay, ReplayDivergence, ReplayEntry, ReplayLog, ReplayRecorder, ReplayResult,
    };
    pub use crate::snapshot::MatchSnapshot;
    pub use crate::tick::{derive_match_id, run, ConsumedInputs, MatchDriver, MatchSetup, StopHandle};
    pub use crate::verify::{StoredInputs, Verifier};
    pub use crate::{MatchError, VerifyError, ENGINE_VERSION};
}
