//! Driver snapshot capture, restore, and state hashing.
//!
//! A [`MatchSnapshot`] holds everything a [`MatchDriver`] needs to resume a
//! match mid-way: the match state, the PRNG position, consumed and pending
//! inputs, the timeline so far, and any scheduled stoppage. The match setup
//! is not part of the snapshot; the caller supplies it again on restore.
//!
//! Snapshots carry a BLAKE3 hash of their JSON form. Restoring recomputes it
//! and refuses a snapshot that does not match.

use pitch_core::rng::MatchRng;
use pitch_core::state::MatchState;
use pitch_ledger::result::Stoppage;
use pitch_ledger::timeline::MatchTimeline;
use serde::{Deserialize, Serialize};

use crate::ingest::InputQueue;
use crate::tick::{ConsumedInputs, MatchDriver, MatchSetup, StopHandle};

// ---------------------------------------------------------------------------
// MatchSnapshot
// ---------------------------------------------------------------------------

/// A resumable copy of a driver between ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub state: MatchState,
    pub rng: MatchRng,
    pub consumed: ConsumedInputs,
    pub pending: InputQueue,
    pub timeline: MatchTimeline,
    pub scheduled: Option<Stoppage>,
    /// BLAKE3 hex digest of every field above.
    pub hash: String,
}

#[derive(Serialize)]
struct SnapshotBody<'a> {
    state: &'a MatchState,
    rng: &'a MatchRng,
    consumed: &'a ConsumedInputs,
    pending: &'a InputQueue,
    timeline: &'a MatchTimeline,
    scheduled: &'a Option<Stoppage>,
}

#[derive(Serialize)]
struct Trajectory<'a> {
    state: &'a MatchState,
    rng: &'a MatchRng,
}

fn json_digest<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(value)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

impl MatchSnapshot {
    fn body(&self) -> SnapshotBody<'_> {
        SnapshotBody {
            state: &self.state,
            rng: &self.rng,
            consumed: &self.consumed,
            pending: &self.pending,
            timeline: &self.timeline,
            scheduled: &self.scheduled,
        }
    }

    /// Recompute the hash from the snapshot's fields.
    pub fn compute_hash(&self) -> Result<String, serde_json::Error> {
        json_digest(&self.body())
    }

    /// Whether the stored hash matches the fields.
    pub fn is_intact(&self) -> bool {
        self.compute_hash().map(|h| h == self.hash).unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Driver integration
// ---------------------------------------------------------------------------

impl MatchDriver {
    /// Capture the driver between ticks.
    pub fn capture_snapshot(&self) -> Result<MatchSnapshot, serde_json::Error> {
        let mut snapshot = MatchSnapshot {
            state: self.state.clone(),
            rng: self.rng.clone(),
            consumed: self.consumed.clone(),
            pending: self.queue.clone(),
            timeline: self.timeline.clone(),
            scheduled: self.scheduled,
            hash: String::new(),
        };
        snapshot.hash = snapshot.compute_hash()?;
        Ok(snapshot)
    }

    /// Rebuild a driver from `snapshot` under `setup`.
    ///
    /// # Errors
    ///
    /// Fails if the setup is invalid, the snapshot hash does not match its
    /// contents, or the snapshot state is not a valid state for this setup.
    /// Nothing is constructed on error.
    pub fn restore(setup: MatchSetup, snapshot: &MatchSnapshot) -> Result<Self, anyhow::Error> {
        setup
            .validate()
            .map_err(|e| anyhow::anyhow!("cannot restore under an invalid setup: {e}"))?;

        let recomputed = snapshot.compute_hash()?;
        if recomputed != snapshot.hash {
            return Err(anyhow::anyhow!(
                "snapshot hash mismatch: recorded {} but recomputed {recomputed}",
                snapshot.hash
            ));
        }

        snapshot
            .state
            .check_invariants(&setup.config)
            .map_err(|e| anyhow::anyhow!("snapshot state does not fit this setup: {e}"))?;
        if snapshot.state.tick > setup.config.total_ticks() {
            return Err(anyhow::anyhow!(
                "snapshot is at tick {} but the match only has {} ticks",
                snapshot.state.tick,
                setup.config.total_ticks()
            ));
        }

        Ok(Self {
            setup,
            state: snapshot.state.clone(),
            rng: snapshot.rng.clone(),
            queue: snapshot.pending.clone(),
            consumed: snapshot.consumed.clone(),
            timeline: snapshot.timeline.clone(),
            scheduled: snapshot.scheduled,
            stopped: None,
            stop: StopHandle::new(),
        })
    }

    /// BLAKE3 digest of the simulated trajectory so far: match state plus
    /// PRNG position. Pending inputs are excluded, so two drivers fed the
    /// same inputs at different times agree at every tick.
    pub fn state_hash(&self) -> Result<String, serde_json::Error> {
        json_digest(&Trajectory {
            state: &self.state,
            rng: &self.rng,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pitch_core::config::MatchConfig;
    use pitch_core::input::{ActionKind, InputParams, InputRecord, Side};

    fn driver() -> MatchDriver {
        let setup = MatchSetup::new(MatchConfig {
            match_duration: 3,
            ..MatchConfig::default()
        });
        let mut driver = MatchDriver::new(setup, "snap").unwrap();
        let record = InputRecord {
            tick: 20,
            action: ActionKind::Move,
            params: InputParams {
                x: Some(55.0),
                y: Some(31.0),
                ..Default::default()
            },
            timestamp: 1,
        };
        driver.submit(Side::Home, &record);
        driver
    }

    #[test]
    fn restored_driver_finishes_identically() {
        let mut original = driver();
        for _ in 0..10 {
            original.advance().unwrap();
        }
        let snapshot = original.capture_snapshot().unwrap();
        assert!(snapshot.is_intact());

        let restored = MatchDriver::restore(original.setup().clone(), &snapshot).unwrap();
        assert_eq!(restored.state_hash().unwrap(), original.state_hash().unwrap());

        let a = original.finish().unwrap();
        let b = restored.finish().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn tampered_snapshot_is_refused() {
        let original = driver();
        let mut snapshot = original.capture_snapshot().unwrap();
        snapshot.state.home.score = 3;
        assert!(!snapshot.is_intact());
        let err = MatchDriver::restore(original.setup().clone(), &snapshot).unwrap_err();
        assert!(err.to_string().contains("hash mismatch"));
    }

    #[test]
    fn snapshot_survives_json() {
        let mut original = driver();
        original.advance().unwrap();
        let snapshot = original.capture_snapshot().unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: MatchSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        assert!(back.is_intact());
    }

    #[test]
    fn state_hash_changes_every_tick() {
        let mut d = driver();
        let before = d.state_hash().unwrap();
        d.advance().unwrap();
        assert_ne!(d.state_hash().unwrap(), before);
    }
}
