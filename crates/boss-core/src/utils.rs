//! Utility functions for working with data slices

/// Sort a slice in place, NaN last
pub fn sort_in_place(data: &mut [f64]) {
    data.sort_by(|a, b| match (a.is_nan(), b.is_nan()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (false, false) => a.total_cmp(b),
    });
}

/// Population standard deviation from raw sums, falling back to `1.0`
///
/// Windows with zero (or numerically negative) variance would otherwise
/// divide by zero when their Fourier coefficients are normalised.
pub fn population_std_or_one(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 1.0;
    }
    let n = data.len() as f64;
    let (sum, square_sum) = data
        .iter()
        .fold((0.0, 0.0), |(s, sq), &x| (s + x, sq + x * x));
    let mean = sum / n;
    let variance = square_sum / n - mean * mean;
    if variance > 0.0 {
        variance.sqrt()
    } else {
        1.0
    }
}

/// Round to `decimals` decimal places, half away from zero
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
