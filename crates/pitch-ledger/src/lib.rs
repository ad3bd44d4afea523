//! Pitch Ledger -- canonical hashing and the records that leave the engine.
//!
//! Everything a settlement or match-history collaborator sees is defined
//! here: the canonical byte encoding of consumed inputs, the replay and
//! result hashes built on it, the [`MatchResult`](result::MatchResult) and
//! [`VerificationResult`](result::VerificationResult) wire shapes, and the
//! event timeline.
//!
//! The hashes depend only on their arguments. They never see the clock, the
//! host, or iteration order of any map.
//!
//! # Quick Start
//!
//! ```
//! use pitch_ledger::prelude::*;
//!
//! let replay = replay_hash("abc123", "1.0.0", &[], &[]);
//! let result = ResultDigest {
//!     seed: "abc123",
//!     engine_version: "1.0.0",
//!     home_score: 0,
//!     away_score: 0,
//!     duration: 60,
//!     replay_hash: &replay,
//! }
//! .hash();
//! assert_eq!(result.len(), 64);
//! ```

#![deny(unsafe_code)]

pub mod canonical;
pub mod hash;
pub mod result;
pub mod timeline;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::canonical::CanonicalEncoder;
    pub use crate::hash::{replay_hash, ResultDigest};
    pub use crate::result::{
        AuditDetails, IngestSummary, Judgement, MatchResult, MismatchType, SideIngest, Stoppage,
        StoppageReason, VerificationResult,
    };
    pub use crate::timeline::{EventKind, MatchEvent, MatchTimeline};
}
