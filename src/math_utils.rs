/// Mathematical utility functions for the solidification model

/// Assert that the deviation between two values is less than a threshold
///
/// This macro combines deviation calculation with assertion for cleaner test code.
/// It calculates the percentage deviation between `actual` and `expected`, then
/// asserts that this deviation is less than the specified `max_deviation`.
#[macro_export]
macro_rules! assert_deviation {
    ($actual:expr, $expected:expr, $max_deviation:expr) => {
        {
            let actual_val = $actual;
            let expected_val = $expected;
            let max_dev = $max_deviation;
            let actual_deviation = $crate::math_utils::deviation(actual_val, expected_val);

            if actual_deviation >= max_dev {
                panic!(
                    "assertion failed: deviation {:.2}% >= {:.2}%\n  actual: {:?},\n  expected: {:?}",
                    actual_deviation, max_dev, actual_val, expected_val
                );
            }
        }
    };
    ($actual:expr, $expected:expr, $max_deviation:expr, $($arg:tt)+) => {
        {
            let actual_val = $actual;
            let expected_val = $expected;
            let max_dev = $max_deviation;
            let actual_deviation = $crate::math_utils::deviation(actual_val, expected_val);

            if actual_deviation >= max_dev {
                panic!(
                    "assertion failed: deviation {:.2}% >= {:.2}%: {}\n  actual: {:?},\n  expected: {:?}",
                    actual_deviation, max_dev, format_args!($($arg)+), actual_val, expected_val
                );
            }
        }
    };
}

/// Percentage deviation of `actual` from `expected`.
///
/// Returns 0 when both are zero and infinity when only `expected` is zero.
pub fn deviation(actual: f64, expected: f64) -> f64 {
    if expected == 0.0 {
        if actual == 0.0 { 0.0 } else { f64::INFINITY }
    } else {
        ((actual - expected) / expected).abs() * 100.0
    }
}

/// True when `value` lies within `tolerance` (a fraction, not a percentage)
/// of `target`, inclusive on both sides.
///
/// # Examples
/// ```
/// use imagma_rust::math_utils::within_relative_tolerance;
///
/// assert!(within_relative_tolerance(101.0, 100.0, 0.02));
/// assert!(!within_relative_tolerance(103.0, 100.0, 0.02));
/// ```
pub fn within_relative_tolerance(value: f64, target: f64, tolerance: f64) -> bool {
    let band = target * tolerance;
    value <= target + band && value >= target - band
}

/// Area-weighted mean of `(weight, value)` pairs; 0 when the weights sum to 0.
pub fn weighted_mean<I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (weight_sum, product_sum) = pairs
        .into_iter()
        .fold((0.0, 0.0), |(w, p), (weight, value)| (w + weight, p + weight * value));
    if weight_sum == 0.0 {
        0.0
    } else {
        product_sum / weight_sum
    }
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
