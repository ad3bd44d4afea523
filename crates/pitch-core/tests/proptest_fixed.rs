//! Property tests for fixed-point math and the match PRNG.
//!
//! These tests use `proptest` to check that the integer-only trigonometry
//! stays close to the floating-point reference and that every PRNG helper
//! stays within its documented range.

use pitch_core::fixed::{cos_deg, isqrt, sin_deg, Fixed, Vec2};
use pitch_core::rng::MatchRng;
use proptest::prelude::*;

const TRIG_TOLERANCE: f64 = 0.005;

fn degrees() -> impl Strategy<Value = i64> {
    -720i64..=720
}

#[test]
fn isqrt_is_exact_for_every_small_value() {
    for n in 0u128..=4096 {
        let r = isqrt(n);
        assert!(r * r <= n, "isqrt({n}) = {r} is too large");
        assert!((r + 1) * (r + 1) > n, "isqrt({n}) = {r} is too small");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn sine_tracks_the_float_reference(deg in degrees()) {
        let approx = sin_deg(Fixed::from_int(deg)).to_f64();
        let exact = (deg as f64).to_radians().sin();
        prop_assert!((approx - exact).abs() <= TRIG_TOLERANCE, "sin({deg}) = {approx}, want {exact}");
    }

    #[test]
    fn trig_is_periodic(deg in degrees()) {
        let a = Fixed::from_int(deg);
        let b = Fixed::from_int(deg + 360);
        prop_assert_eq!(sin_deg(a), sin_deg(b));
        prop_assert_eq!(cos_deg(a), cos_deg(b));
    }

    #[test]
    fn unit_vectors_have_unit_length(deg in degrees()) {
        let len = Vec2::from_angle(Fixed::from_int(deg)).length().to_f64();
        prop_assert!((len - 1.0).abs() <= 0.01, "|from_angle({deg})| = {len}");
    }

    #[test]
    fn integer_products_are_exact(a in -10_000i64..10_000, b in -10_000i64..10_000) {
        let product = Fixed::from_int(a) * Fixed::from_int(b);
        prop_assert_eq!(product, Fixed::from_int(a * b));
        if b != 0 {
            prop_assert_eq!(product / Fixed::from_int(b), Fixed::from_int(a));
        }
    }

    #[test]
    fn isqrt_is_the_floor_root(n in 0u128..(1u128 << 96)) {
        let r = isqrt(n);
        prop_assert!(r * r <= n);
        prop_assert!((r + 1) * (r + 1) > n);
    }

    #[test]
    fn toward_has_the_requested_magnitude(
        (x, y) in (-500i64..500, -500i64..500),
        magnitude in 1i64..50,
    ) {
        prop_assume!(x != 0 || y != 0);
        let step = Vec2::ZERO.toward(Vec2::new(Fixed::from_int(x), Fixed::from_int(y)), Fixed::from_int(magnitude));
        let len = step.length().to_f64();
        prop_assert!((len - magnitude as f64).abs() <= 0.01, "len {len}, want {magnitude}");
    }

    #[test]
    fn same_seed_same_stream(seed in "[ -~]{1,24}") {
        let mut a = MatchRng::from_seed(&seed);
        let mut b = MatchRng::from_seed(&seed);
        for _ in 0..32 {
            prop_assert_eq!(a.next_u32(), b.next_u32());
        }
        prop_assert_eq!(a.draws(), 32);
    }

    #[test]
    fn helpers_stay_in_range(seed in "[a-z]{1,8}") {
        let mut rng = MatchRng::from_seed(&seed);
        for _ in 0..16 {
            let u = rng.signed_unit();
            prop_assert!(u >= -Fixed::ONE && u < Fixed::ONE);
            prop_assert!(!rng.chance(Fixed::ZERO));
            prop_assert!(rng.chance(Fixed::ONE));
        }
        prop_assert_eq!(rng.draws(), 48);
    }

    #[test]
    fn tiny_vectors_have_floor_length(x in -64i64..=64, y in -64i64..=64) {
        let len = Vec2::new(Fixed::from_raw(x), Fixed::from_raw(y)).length().raw();
        let sq = x * x + y * y;
        prop_assert!(len * len <= sq, "len {len} too long for ({x}, {y})");
        prop_assert!((len + 1) * (len + 1) > sq, "len {len} too short for ({x}, {y})");
    }
}
