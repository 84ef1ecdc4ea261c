//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Linearly map `value` from the `from` range onto the `to` range.
///
/// Values outside `from` are extrapolated, and either range may be descending.
pub fn lin_map<T: Float>(from: (T, T), to: (T, T), value: T) -> T {
    let fraction = (value - from.0) / (from.1 - from.0);

    to.0 + fraction * (to.1 - to.0)
}

/// Limit `value` to the inclusive range `[lower, upper]`.
///
/// NaN is passed through unchanged.
pub fn clamp<T: Float>(value: T, lower: T, upper: T) -> T {
    if value < lower {
        lower
    } else if value > upper {
        upper
    } else {
        value
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 640f64), (-0.5, 0.5), 320f64), 0.0);
        assert_eq!(lin_map((0f64, 640f64), (-0.5, 0.5), 0f64), -0.5);
        assert_eq!(lin_map((0f64, 10f64), (10f64, 0f64), 2.5f64), 7.5);
        assert_eq!(lin_map((0f64, 10f64), (0f64, 1f64), 20f64), 2.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(100f64, -60.0, 60.0), 60.0);
        assert_eq!(clamp(-100f64, -60.0, 60.0), -60.0);
        assert_eq!(clamp(12.5f64, -60.0, 60.0), 12.5);
        assert_eq!(clamp(-60f64, -60.0, 60.0), -60.0);
        assert!(clamp(f64::NAN, -60.0, 60.0).is_nan());
    }
}
