//! Re-execution of stored matches.
//!
//! A [`Verifier`] replays a stored match under the current engine and
//! compares the recomputed result hash with the hash anchored on chain. It
//! reports exactly one of three failures, checked in this order:
//!
//! 1. `ENGINE_VERSION_MISMATCH` when the match was recorded under another
//!    engine version,
//! 2. `INCOMPLETE_INPUTS` when fewer inputs were processed than the caller
//!    requires,
//! 3. `HASH_MISMATCH` when the recomputed hash differs from the on-chain one.
//!
//! The verifier never persists anything.

use pitch_core::input::{InputRecord, Side};
use pitch_ledger::result::{
    AuditDetails, Judgement, MatchResult, Stoppage, StoppageReason, VerificationResult,
};
use serde::{Deserialize, Serialize};

use crate::tick::{MatchDriver, MatchSetup};
use crate::{VerifyError, ENGINE_VERSION};

// ---------------------------------------------------------------------------
// StoredInputs
// ---------------------------------------------------------------------------

/// The input log of a stored match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredInputs {
    pub home: Vec<InputRecord>,
    pub away: Vec<InputRecord>,
    /// Number of ticks played if the match ended early.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<u64>,
}

impl StoredInputs {
    /// The consumed inputs and stoppage tick of a finished match.
    pub fn from_result(result: &MatchResult) -> Self {
        Self {
            home: result.home_inputs.iter().copied().map(InputRecord::from).collect(),
            away: result.away_inputs.iter().copied().map(InputRecord::from).collect(),
            stopped_at: result.stoppage.map(|s| s.tick),
        }
    }
}

// ---------------------------------------------------------------------------
// Verifier
// ---------------------------------------------------------------------------

/// Re-executes stored matches under one setup.
#[derive(Debug, Clone)]
pub struct Verifier {
    setup: MatchSetup,
    min_inputs: u64,
}

impl Verifier {
    /// A verifier that accepts any number of processed inputs.
    pub fn new(setup: MatchSetup) -> Self {
        Self {
            setup,
            min_inputs: 0,
        }
    }

    /// Require at least `min_inputs` processed inputs.
    pub fn with_min_inputs(mut self, min_inputs: u64) -> Self {
        self.min_inputs = min_inputs;
        self
    }

    /// Re-run the match and classify the outcome.
    ///
    /// # Errors
    ///
    /// [`VerifyError::Execution`] if the match cannot be re-executed at all,
    /// for example because the setup or seed is invalid. A match that merely
    /// fails to verify is an `Ok` result with `valid == false`.
    pub fn verify(
        &self,
        match_id: &str,
        seed: &str,
        engine_version: &str,
        stored: &StoredInputs,
        on_chain_hash: &str,
    ) -> Result<VerificationResult, VerifyError> {
        let mut driver = MatchDriver::new(self.setup.clone(), seed)?.with_match_id(match_id);
        if let Some(tick) = stored.stopped_at {
            driver.schedule_stoppage(Stoppage {
                tick,
                reason: StoppageReason::External,
            });
        }
        driver.submit_all(Side::Home, &stored.home);
        driver.submit_all(Side::Away, &stored.away);
        let rerun = driver.finish()?;

        let inputs_processed = rerun.inputs_consumed() as u64;
        let judgement = Judgement {
            stored_version: engine_version,
            engine_version: ENGINE_VERSION,
            computed_hash: &rerun.result_hash,
            on_chain_hash,
            inputs_processed,
            min_inputs: self.min_inputs,
        };
        let details = AuditDetails {
            match_id: match_id.to_owned(),
            seed: seed.to_owned(),
            engine_version: engine_version.to_owned(),
            home_score: rerun.home_score,
            away_score: rerun.away_score,
            inputs_processed,
            duration: rerun.duration,
        };
        let result = VerificationResult::from_judgement(&judgement, details);

        match result.mismatch_type {
            None => tracing::info!(match_id, result_hash = %result.computed_hash, "match verified"),
            Some(mismatch) => tracing::warn!(
                match_id,
                ?mismatch,
                computed = %result.computed_hash,
                on_chain = %on_chain_hash,
                stored_version = %engine_version,
                inputs_processed,
                "match failed verification"
            ),
        }
        Ok(result)
    }

    /// Verify a finished result against its own stored hash.
    pub fn verify_result(&self, result: &MatchResult) -> Result<VerificationResult, VerifyError> {
        self.verify(
            &result.match_id,
            &result.seed,
            &result.engine_version,
            &StoredInputs::from_result(result),
            &result.result_hash,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
