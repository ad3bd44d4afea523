//! Replay and result hashes.
//!
//! ```text
//! replay_hash = BLAKE3( str("pitch.replay.v1") str(seed) str(engine_version)
//!                       list(home inputs) list(away inputs) )
//! result_hash = BLAKE3( str("pitch.result.v1") str(seed) str(engine_version)
//!                       u32(home_score) u32(away_score) u32(duration)
//!                       str(replay_hash) )
//! ```
//!
//! The result hash includes the replay hash, so anchoring the result hash
//! alone commits to the exact consumed inputs as well as the outcome.
//! Neither hash reads the clock, the process, or any unseeded randomness.

use pitch_core::input::PlayerInput;

use crate::canonical::CanonicalEncoder;

/// Domain tag of the replay hash.
pub const REPLAY_DOMAIN: &str = "pitch.replay.v1";

/// Domain tag of the result hash.
pub const RESULT_DOMAIN: &str = "pitch.result.v1";

/// Hash of the seed, engine version, and both consumed input lists.
pub fn replay_hash(
    seed: &str,
    engine_version: &str,
    home: &[PlayerInput],
    away: &[PlayerInput],
) -> String {
    let mut e = CanonicalEncoder::new(REPLAY_DOMAIN);
    e.put_str(seed)
        .put_str(engine_version)
        .put_inputs(home)
        .put_inputs(away);
    e.digest()
}

/// The fields that make up a result hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultDigest<'a> {
    pub seed: &'a str,
    pub engine_version: &'a str,
    pub home_score: u32,
    pub away_score: u32,
    pub duration: u32,
    pub replay_hash: &'a str,
}

impl ResultDigest<'_> {
    /// Hash of the outcome, bound to the replay hash.
    pub fn hash(&self) -> String {
        let mut e = CanonicalEncoder::new(RESULT_DOMAIN);
        e.put_str(self.seed)
            .put_str(self.engine_version)
            .put_u32(self.home_score)
            .put_u32(self.away_score)
            .put_u32(self.duration)
            .put_str(self.replay_hash);
        e.digest()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pitch_core::fixed::Fixed;
    use pitch_core::input::Action;

    fn shoot() -> PlayerInput {
        PlayerInput {
            tick: 5,
            timestamp: 500,
            action: Action::Shoot {
                power: Fixed::from_int(80),
                angle: Fixed::from_int(45),
            },
        }
    }

    fn digest(replay: &str) -> ResultDigest<'_> {
        ResultDigest {
            seed: "abc123",
            engine_version: "1.0.0",
            home_score: 1,
            away_score: 0,
            duration: 60,
            replay_hash: replay,
        }
    }

    #[test]
    fn replay_hash_is_stable() {
        let a = replay_hash("abc123", "1.0.0", &[shoot()], &[]);
        let b = replay_hash("abc123", "1.0.0", &[shoot()], &[]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn replay_hash_depends_on_side() {
        let home = replay_hash("abc123", "1.0.0", &[shoot()], &[]);
        let away = replay_hash("abc123", "1.0.0", &[], &[shoot()]);
        assert_ne!(home, away);
    }

    #[test]
    fn replay_hash_depends_on_version_and_seed() {
        let base = replay_hash("abc123", "1.0.0", &[], &[]);
        assert_ne!(base, replay_hash("abc123", "0.9.0", &[], &[]));
        assert_ne!(base, replay_hash("abc124", "1.0.0", &[], &[]));
    }

    #[test]
    fn result_hash_binds_every_field() {
        let replay = replay_hash("abc123", "1.0.0", &[shoot()], &[]);
        let base = digest(&replay).hash();

        let mut d = digest(&replay);
        d.home_score = 0;
        assert_ne!(d.hash(), base);

        let mut d = digest(&replay);
        d.duration = 59;
        assert_ne!(d.hash(), base);

        let other = replay_hash("abc123", "1.0.0", &[], &[]);
        assert_ne!(digest(&other).hash(), base);
    }

    #[test]
    fn swapped_scores_differ() {
        let mut a = digest("r");
        a.home_score = 2;
        a.away_score = 1;
        let mut b = digest("r");
        b.home_score = 1;
        b.away_score = 2;
        assert_ne!(a.hash(), b.hash());
    }
}
