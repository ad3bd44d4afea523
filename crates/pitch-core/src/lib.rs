//! Pitch Core -- data model and numeric policy for the deterministic match engine.
//!
//! This crate holds everything the simulation reads or mutates but none of the
//! loop that drives it: Q16.16 fixed-point math, match configuration, player
//! inputs and their validation, the tactics layer, the mutable
//! [`MatchState`](state::MatchState) aggregate, and the seeded PRNG.
//!
//! Nothing in here reads the wall clock, touches global state, or uses
//! floating point in simulation arithmetic. Two independent processes holding
//! the same values compute the same bits.
//!
//! # Quick Start
//!
//! ```
//! use pitch_core::prelude::*;
//!
//! let config = MatchConfig::default();
//! config.validate().unwrap();
//!
//! let tactics = MatchTactics::default();
//! let state = MatchState::kickoff("m-1", "abc123", &config, &tactics, &Squads::default());
//! assert_eq!(state.tick, 0);
//! assert_eq!(state.status, MatchStatus::Waiting);
//! assert_eq!(state.ball.position, config.center());
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod fixed;
pub mod input;
pub mod rng;
pub mod state;
pub mod tactics;

use input::{ActionKind, PlayerId};
use state::MatchStatus;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A match cannot be started with the given configuration, seed, or tactics.
///
/// Fatal to starting the match: no tick is simulated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A field dimension, tick rate, or duration is zero.
    #[error("{field} must be positive")]
    NotPositive { field: &'static str },

    /// A field dimension is too large for the fixed-point range.
    #[error("{field} is {value}, maximum is {max}")]
    DimensionTooLarge {
        field: &'static str,
        value: u32,
        max: u32,
    },

    /// The seed string is empty.
    #[error("seed must not be empty")]
    EmptySeed,

    /// A formation label could not be parsed.
    #[error("invalid formation '{label}': {reason}")]
    InvalidFormation { label: String, reason: String },

    /// A tactics slider is outside `0..=100`.
    #[error("slider '{name}' is {value}, must be within 0..=100")]
    SliderOutOfRange { name: &'static str, value: u8 },

    /// A stat in a squad is outside `0..=100`, or a squad has the wrong size.
    #[error("invalid squad for {side}: {reason}")]
    InvalidSquad { side: &'static str, reason: String },
}

/// A single player input is malformed or not applicable to this match.
///
/// Rejected individually; the match continues without it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// The tick is negative.
    #[error("tick {tick} is negative")]
    NegativeTick { tick: i64 },

    /// The tick lies at or beyond the match's total tick count.
    #[error("tick {tick} is beyond the last tick of the match ({total_ticks} ticks)")]
    TickBeyondMatch { tick: u64, total_ticks: u64 },

    /// A parameter the action requires is absent.
    #[error("{action:?} requires parameter '{param}'")]
    MissingParam {
        action: ActionKind,
        param: &'static str,
    },

    /// A parameter that does not belong to the action is present.
    #[error("{action:?} does not accept parameter '{param}'")]
    UnexpectedParam {
        action: ActionKind,
        param: &'static str,
    },

    /// A numeric parameter is NaN, infinite, or absurdly large.
    #[error("parameter '{param}' is not a finite number")]
    NonFinite { param: &'static str },

    /// A numeric parameter is outside its allowed range.
    #[error("parameter '{param}' is {value}, must be within {min}..={max}")]
    OutOfRange {
        param: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// The target id does not name a player in this match.
    #[error("target {target_id} is not a player in this match")]
    UnknownPlayer { target_id: u32 },

    /// PASS must target a teammate, TACKLE an opponent.
    #[error("{action:?} cannot target player {target_id}")]
    WrongTarget {
        action: ActionKind,
        target_id: PlayerId,
    },
}

/// An internal invariant of the simulation broke.
///
/// Fatal: the run is aborted rather than emitting a result whose hashes
/// would not reproduce.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeterminismViolation {
    /// A step did not advance the tick by exactly one.
    #[error("tick advanced from {from} to {to}; expected {from} + 1")]
    TickNotAdvanced { from: u64, to: u64 },

    /// An entity left the field rectangle.
    #[error("{entity} at tick {tick} is outside the field")]
    OutOfBounds { entity: String, tick: u64 },

    /// A player's stamina left `[0, 100]`.
    #[error("player {player} stamina {raw} (raw) is outside 0..=100 at tick {tick}")]
    StaminaOutOfRange { player: PlayerId, raw: i64, tick: u64 },

    /// The status moved backwards or skipped a phase.
    #[error("illegal status transition {from:?} -> {to:?}")]
    IllegalTransition { from: MatchStatus, to: MatchStatus },

    /// Possession is set but no carrier is recorded, or the carrier is on the
    /// wrong side.
    #[error("possession at tick {tick} does not match the last touch")]
    PossessionMismatch { tick: u64 },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::MatchConfig;
    pub use crate::fixed::{Fixed, Vec2};
    pub use crate::input::{Action, ActionKind, InputParams, InputRecord, PlayerId, PlayerInput, Side};
    pub use crate::rng::MatchRng;
    pub use crate::state::{
        BallState, MatchState, MatchStatus, PlayerState, PlayerStats, Squads, TeamState, Touch,
    };
    pub use crate::tactics::{
        BehaviorMultipliers, Formation, MatchTactics, TacticalSliders, TacticsUpdate, TeamTactics,
    };
    pub use crate::{ConfigError, DeterminismViolation, ValidationError};
}
