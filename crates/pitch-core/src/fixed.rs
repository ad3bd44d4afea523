//! Q16.16 fixed-point numbers and 2D vectors.
//!
//! Every quantity that participates in simulation state (positions,
//! velocities, stamina, probabilities) is a [`Fixed`]. Arithmetic is plain
//! integer arithmetic on an `i64` raw value, so results are identical on every
//! target regardless of the platform math library. Floating point only
//! appears at the edges: [`Fixed::from_f64`] converts wire values once during
//! input validation, and [`Fixed::to_f64`] exists for display.
//!
//! Angles are expressed in degrees. [`sin_deg`] uses the Bhaskara I rational
//! approximation evaluated entirely in fixed point (max error ~0.0016).
//!
//! # Example
//!
//! ```
//! use pitch_core::fixed::{Fixed, Vec2};
//!
//! let a = Fixed::from_int(3);
//! let b = Fixed::from_ratio(1, 2);
//! assert_eq!((a * b).to_f64(), 1.5);
//!
//! let v = Vec2::new(Fixed::from_int(3), Fixed::from_int(4));
//! assert_eq!(v.length(), Fixed::from_int(5));
//! ```

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Number of fractional bits.
pub const FRAC_BITS: u32 = 16;

/// Largest magnitude accepted by [`Fixed::from_f64`]. Keeps the raw value well
/// inside the range where `f64` represents every integer exactly.
const MAX_WIRE_MAGNITUDE: f64 = (1u64 << 36) as f64;

// ---------------------------------------------------------------------------
// Fixed
// ---------------------------------------------------------------------------

/// A Q16.16 fixed-point number backed by an `i64`.
///
/// Serializes as its raw integer, so JSON snapshots of simulation state never
/// contain floats.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Fixed(i64);

impl Fixed {
    /// Zero.
    pub const ZERO: Fixed = Fixed(0);
    /// One.
    pub const ONE: Fixed = Fixed(1 << FRAC_BITS);

    /// Wrap a raw Q16.16 value.
    pub const fn from_raw(raw: i64) -> Self {
        Fixed(raw)
    }

    /// The raw Q16.16 value.
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Convert an integer.
    pub const fn from_int(value: i64) -> Self {
        Fixed(value << FRAC_BITS)
    }

    /// `num / den` rounded toward negative infinity.
    ///
    /// # Panics
    ///
    /// Panics if `den` is zero.
    pub const fn from_ratio(num: i64, den: i64) -> Self {
        Fixed((num << FRAC_BITS).div_euclid(den))
    }

    /// Convert a wire value. Returns `None` for NaN, infinities, and values
    /// whose magnitude exceeds 2^36.
    ///
    /// Scaling by 2^16 is exact in IEEE-754 and `round` is correctly rounded,
    /// so the conversion is identical on every platform.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value.abs() > MAX_WIRE_MAGNITUDE {
            return None;
        }
        let scaled = (value * (1u64 << FRAC_BITS) as f64).round();
        Some(Fixed(scaled as i64))
    }

    /// Lossless for every value produced by [`from_f64`](Self::from_f64).
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / (1u64 << FRAC_BITS) as f64
    }

    /// Integer part, rounded toward negative infinity.
    pub const fn floor_int(self) -> i64 {
        self.0 >> FRAC_BITS
    }

    /// Absolute value.
    pub const fn abs(self) -> Self {
        Fixed(self.0.abs())
    }

    /// Clamp into `[lo, hi]`.
    pub fn clamp(self, lo: Fixed, hi: Fixed) -> Self {
        Fixed(self.0.clamp(lo.0, hi.0))
    }

    /// Smaller of two values.
    pub fn min(self, other: Fixed) -> Self {
        Fixed(self.0.min(other.0))
    }

    /// Larger of two values.
    pub fn max(self, other: Fixed) -> Self {
        Fixed(self.0.max(other.0))
    }

    /// Whether the value is strictly negative.
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `self * pct / 100` for a percentage in `0..=100`.
    pub fn percent(self, pct: u8) -> Self {
        Fixed((self.0 * pct as i64).div_euclid(100))
    }
}

impl Add for Fixed {
    type Output = Fixed;
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 + rhs.0)
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Fixed) {
        self.0 += rhs.0;
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 - rhs.0)
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Fixed) {
        self.0 -= rhs.0;
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}

impl Mul for Fixed {
    type Output = Fixed;
    fn mul(self, rhs: Fixed) -> Fixed {
        Fixed(((self.0 as i128 * rhs.0 as i128) >> FRAC_BITS) as i64)
    }
}

impl Mul<i64> for Fixed {
    type Output = Fixed;
    fn mul(self, rhs: i64) -> Fixed {
        Fixed(self.0 * rhs)
    }
}

impl Div for Fixed {
    type Output = Fixed;
    /// # Panics
    ///
    /// Panics on division by zero.
    fn div(self, rhs: Fixed) -> Fixed {
        Fixed((((self.0 as i128) << FRAC_BITS).div_euclid(rhs.0 as i128)) as i64)
    }
}

impl Div<i64> for Fixed {
    type Output = Fixed;
    fn div(self, rhs: i64) -> Fixed {
        Fixed(self.0.div_euclid(rhs))
    }
}

impl std::fmt::Display for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.to_f64())
    }
}

// ---------------------------------------------------------------------------
// Vec2
// ---------------------------------------------------------------------------

/// A 2D vector of [`Fixed`] components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vec2 {
    /// Along the field length. Home defends `x = 0`.
    pub x: Fixed,
    /// Along the field width.
    pub y: Fixed,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Vec2 = Vec2 {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Construct from components.
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Squared length in raw Q32.32 units. Exact; use this for comparisons.
    pub fn length_sq_raw(self) -> i128 {
        let x = self.x.raw() as i128;
        let y = self.y.raw() as i128;
        x * x + y * y
    }

    /// Euclidean length, rounded down.
    pub fn length(self) -> Fixed {
        Fixed::from_raw(isqrt(self.length_sq_raw() as u128) as i64)
    }

    /// Squared distance to `other` in raw Q32.32 units.
    pub fn distance_sq_raw(self, other: Vec2) -> i128 {
        (other - self).length_sq_raw()
    }

    /// Distance to `other`.
    pub fn distance(self, other: Vec2) -> Fixed {
        (other - self).length()
    }

    /// Whether `other` lies within `radius` of `self` (inclusive).
    pub fn within(self, other: Vec2, radius: Fixed) -> bool {
        let r = radius.raw() as i128;
        self.distance_sq_raw(other) <= r * r
    }

    /// Multiply both components.
    pub fn scale(self, factor: Fixed) -> Vec2 {
        Vec2::new(self.x * factor, self.y * factor)
    }

    /// A vector of length `magnitude` pointing from `self` toward `target`.
    /// Returns zero when the points coincide.
    pub fn toward(self, target: Vec2, magnitude: Fixed) -> Vec2 {
        let delta = target - self;
        let len = delta.length();
        if len == Fixed::ZERO {
            return Vec2::ZERO;
        }
        Vec2::new(delta.x * magnitude / len, delta.y * magnitude / len)
    }

    /// Unit vector for an angle in degrees (0 = +x, counter-clockwise).
    pub fn from_angle(degrees: Fixed) -> Vec2 {
        Vec2::new(cos_deg(degrees), sin_deg(degrees))
    }

    /// Rotate counter-clockwise by an angle in degrees.
    pub fn rotate(self, degrees: Fixed) -> Vec2 {
        let (sin, cos) = (sin_deg(degrees), cos_deg(degrees));
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

// ---------------------------------------------------------------------------
// Integer math
// ---------------------------------------------------------------------------

/// Integer square root, rounded down (Newton iteration).
pub fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    // ceil(n / 2), strictly below n for every n >= 2.
    let mut y = n / 2 + n % 2;
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

/// Sine of an angle in degrees.
pub fn sin_deg(degrees: Fixed) -> Fixed {
    let full = Fixed::from_int(360).raw();
    let half = Fixed::from_int(180);
    let mut a = Fixed::from_raw(degrees.raw().rem_euclid(full));
    let mut sign = 1;
    if a >= half {
        a = a - half;
        sign = -1;
    }
    // Bhaskara I: sin(x) ~= 4x(180 - x) / (40500 - x(180 - x)), x in [0, 180].
    let p = a * (half - a);
    let value = (p * 4) / (Fixed::from_int(40_500) - p);
    if sign < 0 {
        -value
    } else {
        value
    }
}

/// Cosine of an angle in degrees.
pub fn cos_deg(degrees: Fixed) -> Fixed {
    sin_deg(degrees + Fixed::from_int(90))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
