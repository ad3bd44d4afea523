//! Seeded match PRNG.
//!
//! [`MatchRng`] wraps a PCG32 generator whose state and stream are derived
//! from the match seed with BLAKE3 key derivation. PCG32 is fully specified
//! (64-bit LCG + XSH-RR output), so the sequence is identical across
//! platforms and easy to reproduce in any language.
//!
//! Only the physics step draws from it. Every helper consumes exactly one
//! `u32` per call so the number of draws per decision never depends on the
//! value drawn.

use rand::RngCore;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::fixed::Fixed;

/// BLAKE3 key-derivation context for the PRNG seed material.
const RNG_CONTEXT: &str = "pitch-engine 2024 match rng v1";

/// Deterministic, seed-initialized generator for one match.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRng {
    inner: Pcg32,
    draws: u64,
}

impl std::fmt::Debug for MatchRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchRng")
            .field("draws", &self.draws)
            .finish_non_exhaustive()
    }
}

impl MatchRng {
    /// Derive the generator from a seed string.
    pub fn from_seed(seed: &str) -> Self {
        let material = blake3::derive_key(RNG_CONTEXT, seed.as_bytes());
        let mut state = [0u8; 8];
        let mut stream = [0u8; 8];
        state.copy_from_slice(&material[0..8]);
        stream.copy_from_slice(&material[8..16]);
        Self {
            inner: Pcg32::new(u64::from_le_bytes(state), u64::from_le_bytes(stream)),
            draws: 0,
        }
    }

    /// Number of values drawn so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Next raw 32-bit value.
    pub fn next_u32(&mut self) -> u32 {
        self.draws += 1;
        self.inner.next_u32()
    }

    /// `true` with probability `p` (clamped to `[0, 1]`), at 1/65536
    /// resolution.
    pub fn chance(&mut self, p: Fixed) -> bool {
        let threshold = p.clamp(Fixed::ZERO, Fixed::ONE).raw();
        ((self.next_u32() >> 16) as i64) < threshold
    }

    /// Uniform value in `[-1, 1)`.
    pub fn signed_unit(&mut self) -> Fixed {
        Fixed::from_raw((self.next_u32() >> 15) as i64 - Fixed::ONE.raw())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
