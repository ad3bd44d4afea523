//! Match configuration: field geometry, tick rate, and duration.
//!
//! A [`MatchConfig`] is immutable for the lifetime of a match. Everything the
//! physics needs that scales with the pitch (capture radius, goal mouth,
//! kickoff spot) is derived from it here, in fixed point.

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed, Vec2};
use crate::ConfigError;

/// Upper bound for `field_width` and `field_height`.
///
/// Squared distances are computed in `i128`, but velocities are multiplied in
/// `i64` Q16.16; this cap leaves several orders of magnitude of headroom.
pub const MAX_FIELD_DIMENSION: u32 = 10_000;

/// Immutable parameters of a single match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchConfig {
    /// Length of the pitch along `x`, in field units. Goals sit at `x = 0`
    /// (home) and `x = field_width` (away).
    pub field_width: u32,
    /// Width of the pitch along `y`, in field units.
    pub field_height: u32,
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Match length in seconds.
    pub match_duration: u32,
}

impl Default for MatchConfig {
    /// A 100 x 60 pitch at 10 Hz for 90 seconds.
    fn default() -> Self {
        Self {
            field_width: 100,
            field_height: 60,
            tick_rate: 10,
            match_duration: 90,
        }
    }
}

impl MatchConfig {
    /// Check every field is positive and the pitch fits the numeric range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found, checking fields in
    /// declaration order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("fieldWidth", self.field_width),
            ("fieldHeight", self.field_height),
        ] {
            if value == 0 {
                return Err(ConfigError::NotPositive { field });
            }
            if value > MAX_FIELD_DIMENSION {
                return Err(ConfigError::DimensionTooLarge {
                    field,
                    value,
                    max: MAX_FIELD_DIMENSION,
                });
            }
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::NotPositive { field: "tickRate" });
        }
        if self.match_duration == 0 {
            return Err(ConfigError::NotPositive {
                field: "matchDuration",
            });
        }
        Ok(())
    }

    /// `ceil(match_duration / tick_interval)`, which for whole seconds and an
    /// integer rate is exactly `match_duration * tick_rate`.
    pub fn total_ticks(&self) -> u64 {
        self.match_duration as u64 * self.tick_rate as u64
    }

    /// Elapsed match seconds after `ticks` ticks, rounded up.
    pub fn duration_for_ticks(&self, ticks: u64) -> u32 {
        let rate = self.tick_rate.max(1) as u64;
        ticks.div_ceil(rate) as u32
    }

    /// Match clock in milliseconds after `ticks` ticks.
    pub fn clock_ms(&self, ticks: u64) -> u64 {
        ticks * 1000 / self.tick_rate.max(1) as u64
    }

    // -- geometry -----------------------------------------------------------

    /// Pitch length as a fixed-point value.
    pub fn width(&self) -> Fixed {
        Fixed::from_int(self.field_width as i64)
    }

    /// Pitch width as a fixed-point value.
    pub fn height(&self) -> Fixed {
        Fixed::from_int(self.field_height as i64)
    }

    /// Centre spot.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width() / 2, self.height() / 2)
    }

    /// Whether `p` lies inside `[0, width] x [0, height]`.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= Fixed::ZERO && p.x <= self.width() && p.y >= Fixed::ZERO && p.y <= self.height()
    }

    /// Clamp `p` into the pitch rectangle.
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(Fixed::ZERO, self.width()),
            p.y.clamp(Fixed::ZERO, self.height()),
        )
    }

    /// The `[low, high]` span of `y` occupied by each goal mouth
    /// (`field_height / 4` wide, centred).
    pub fn goal_mouth(&self) -> (Fixed, Fixed) {
        let half = self.height() / 8;
        let mid = self.height() / 2;
        (mid - half, mid + half)
    }

    /// Distance within which a player takes control of a loose ball.
    pub fn capture_radius(&self) -> Fixed {
        self.width() / 64
    }

    /// Base reach of a tackle, before tactics scaling.
    pub fn tackle_radius(&self) -> Fixed {
        self.width() / 20
    }

    /// Convert a per-second quantity to per-tick.
    pub fn per_tick(&self, per_second: Fixed) -> Fixed {
        per_second / self.tick_rate.max(1) as i64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
