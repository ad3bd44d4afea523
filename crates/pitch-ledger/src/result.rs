//! Wire shapes consumed by settlement and match-history collaborators.
//!
//! [`MatchResult`] is produced exactly once per match by the tick driver.
//! [`VerificationResult`] is produced on demand by the verifier and never
//! persisted by the engine. Both serialize with `camelCase` field names.

use pitch_core::input::{PlayerInput, Side};
use serde::{Deserialize, Serialize};

use crate::hash::{replay_hash, ResultDigest};
use crate::timeline::MatchEvent;

// ---------------------------------------------------------------------------
// Stoppage
// ---------------------------------------------------------------------------

/// Why a match ended before its scheduled duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StoppageReason {
    /// A side forfeited.
    Forfeit { side: Side },
    /// The calling layer gave up waiting for inputs.
    Timeout,
    /// Any other external signal.
    External,
}

/// An early end of play. `tick` is the number of ticks that were simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stoppage {
    /// Ticks simulated before play stopped. The match clock reads
    /// `tick / tick_rate` seconds.
    pub tick: u64,
    /// Why play stopped. Not part of either hash.
    pub reason: StoppageReason,
}

// ---------------------------------------------------------------------------
// IngestSummary
// ---------------------------------------------------------------------------

/// Counts for one side's input stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideIngest {
    /// Passed validation and were queued.
    pub accepted: u64,
    /// Failed validation.
    pub rejected: u64,
    /// Arrived for a tick that had already been simulated.
    pub late: u64,
    /// Actually applied by the physics step.
    pub consumed: u64,
}

/// Counts for both sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IngestSummary {
    /// Counts for inputs submitted by the home side.
    pub home: SideIngest,
    /// Counts for inputs submitted by the away side.
    pub away: SideIngest,
}

impl IngestSummary {
    /// Counts for `side`.
    pub fn side(&self, side: Side) -> &SideIngest {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    /// Mutable counts for `side`.
    pub fn side_mut(&mut self, side: Side) -> &mut SideIngest {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }
}

// ---------------------------------------------------------------------------
// MatchResult
// ---------------------------------------------------------------------------

/// Immutable outcome of one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// Caller-supplied id, or one derived from the seed. Not hashed.
    pub match_id: String,
    /// Goals scored by the home side.
    pub home_score: u32,
    /// Goals scored by the away side.
    pub away_score: u32,
    /// Elapsed match seconds, `ceil(ticks_played / tick_rate)`. Hashed.
    pub duration: u32,
    /// Number of ticks simulated. Below the configured total only after an
    /// early stop.
    pub ticks_played: u64,
    /// Seed of the match PRNG.
    pub seed: String,
    /// Engine version that produced this result.
    pub engine_version: String,
    /// Home inputs actually consumed, in application order.
    pub home_inputs: Vec<PlayerInput>,
    /// Away inputs actually consumed, in application order.
    pub away_inputs: Vec<PlayerInput>,
    /// BLAKE3 hex over seed, engine version, and both consumed input lists.
    pub replay_hash: String,
    /// BLAKE3 hex over seed, engine version, scores, duration, and
    /// `replay_hash`. This is the value anchored on chain.
    pub result_hash: String,
    /// Match clock in milliseconds at the final whistle. Not wall-clock time.
    pub timestamp: u64,
    /// Set when the match ended before full time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stoppage: Option<Stoppage>,
    /// Accepted, rejected, late, and consumed input counts. Not hashed.
    #[serde(default)]
    pub ingest: IngestSummary,
    /// Everything notable that happened, in tick order. Not hashed.
    #[serde(default)]
    pub events: Vec<MatchEvent>,
}

impl MatchResult {
    /// Total inputs consumed across both sides.
    pub fn inputs_consumed(&self) -> usize {
        self.home_inputs.len() + self.away_inputs.len()
    }

    /// The winning side, or `None` for a draw.
    pub fn winner(&self) -> Option<Side> {
        match self.home_score.cmp(&self.away_score) {
            std::cmp::Ordering::Greater => Some(Side::Home),
            std::cmp::Ordering::Less => Some(Side::Away),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Recompute `(replay_hash, result_hash)` from the result's own fields.
    pub fn recompute_hashes(&self) -> (String, String) {
        let replay = replay_hash(
            &self.seed,
            &self.engine_version,
            &self.home_inputs,
            &self.away_inputs,
        );
        let result = ResultDigest {
            seed: &self.seed,
            engine_version: &self.engine_version,
            home_score: self.home_score,
            away_score: self.away_score,
            duration: self.duration,
            replay_hash: &replay,
        }
        .hash();
        (replay, result)
    }

    /// Whether the stored hashes match the stored fields. This checks
    /// internal consistency only; it does not re-run the match.
    pub fn hashes_consistent(&self) -> bool {
        let (replay, result) = self.recompute_hashes();
        replay == self.replay_hash && result == self.result_hash
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Why a verification failed. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MismatchType {
    EngineVersionMismatch,
    HashMismatch,
    IncompleteInputs,
}

/// Audit trail attached to every verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditDetails {
    pub match_id: String,
    pub seed: String,
    /// Version recorded with the stored inputs.
    pub engine_version: String,
    pub home_score: u32,
    pub away_score: u32,
    pub inputs_processed: u64,
    pub duration: u32,
}

/// Outcome of re-executing a stored match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub valid: bool,
    pub computed_hash: String,
    pub on_chain_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mismatch_type: Option<MismatchType>,
    pub details: AuditDetails,
}

/// Everything needed to classify a verification.
#[derive(Debug, Clone, Copy)]
pub struct Judgement<'a> {
    pub stored_version: &'a str,
    pub engine_version: &'a str,
    pub computed_hash: &'a str,
    pub on_chain_hash: &'a str,
    pub inputs_processed: u64,
    pub min_inputs: u64,
}

impl Judgement<'_> {
    /// Classify, checking in order: engine version, input completeness,
    /// hash equality. The first failing check decides.
    pub fn classify(&self) -> Option<MismatchType> {
        if self.stored_version != self.engine_version {
            Some(MismatchType::EngineVersionMismatch)
        } else if self.inputs_processed < self.min_inputs {
            Some(MismatchType::IncompleteInputs)
        } else if self.computed_hash != self.on_chain_hash {
            Some(MismatchType::HashMismatch)
        } else {
            None
        }
    }
}

impl VerificationResult {
    /// Build a result from a judgement and its audit details.
    pub fn from_judgement(judgement: &Judgement<'_>, details: AuditDetails) -> Self {
        let mismatch_type = judgement.classify();
        Self {
            valid: mismatch_type.is_none(),
            computed_hash: judgement.computed_hash.to_owned(),
            on_chain_hash: judgement.on_chain_hash.to_owned(),
            mismatch_type,
            details,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn judgement<'a>(computed: &'a str, stored_version: &'a str) -> Judgement<'a> {
        Judgement {
            stored_version,
            engine_version: "1.0.0",
            computed_hash: computed,
            on_chain_hash: "aaaa",
            inputs_processed: 3,
            min_inputs: 0,
        }
    }

    #[test]
    fn matching_hash_is_valid() {
        assert_eq!(judgement("aaaa", "1.0.0").classify(), None);
    }

    #[test]
    fn different_hash_is_hash_mismatch() {
        assert_eq!(
            judgement("bbbb", "1.0.0").classify(),
            Some(MismatchType::HashMismatch)
        );
    }

    #[test]
    fn version_skew_wins_over_hash_mismatch() {
        assert_eq!(
            judgement("bbbb", "0.9.0").classify(),
            Some(MismatchType::EngineVersionMismatch)
        );
        assert_eq!(
            judgement("aaaa", "0.9.0").classify(),
            Some(MismatchType::EngineVersionMismatch)
        );
    }

    #[test]
    fn too_few_inputs_is_incomplete() {
        let mut j = judgement("bbbb", "1.0.0");
        j.min_inputs = 4;
        assert_eq!(j.classify(), Some(MismatchType::IncompleteInputs));
    }

    #[test]
    fn mismatch_type_wire_names() {
        let json = serde_json::to_string(&MismatchType::EngineVersionMismatch).unwrap();
        assert_eq!(json, "\"ENGINE_VERSION_MISMATCH\"");
        let json = serde_json::to_string(&MismatchType::IncompleteInputs).unwrap();
        assert_eq!(json, "\"INCOMPLETE_INPUTS\"");
    }

    #[test]
    fn valid_result_omits_mismatch_type() {
        let details = AuditDetails {
            match_id: "m".to_owned(),
            seed: "s".to_owned(),
            engine_version: "1.0.0".to_owned(),
            home_score: 0,
            away_score: 0,
            inputs_processed: 3,
            duration: 60,
        };
        let result = VerificationResult::from_judgement(&judgement("aaaa", "1.0.0"), details);
        assert!(result.valid);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("mismatchType").is_none());
        assert_eq!(json["details"]["inputsProcessed"], 3);
    }

    #[test]
    fn stoppage_reason_json() {
        let s = Stoppage {
            tick: 120,
            reason: StoppageReason::Forfeit { side: Side::Away },
        };
        let json = serde_json::to_value(s).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"tick": 120, "reason": {"type": "forfeit", "side": "away"}})
        );
    }
}
