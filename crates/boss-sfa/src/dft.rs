//! Truncated discrete Fourier transforms
//!
//! Two ways of getting the leading Fourier coefficients of a window:
//!
//! - [`dft`]: direct evaluation, used on the disjoint windows that breakpoint
//!   learning samples
//! - [`Mft`]: the momentary Fourier transform, which slides a window one step
//!   at a time with a single complex multiply per coefficient
//!
//! Coefficients are returned interleaved as `[re_0, im_0, re_1, im_1, ...]`
//! starting at frequency `start` (1 when the mean is discarded, 0 otherwise).
//! Every window is scaled by `1 / (sqrt(w) * std)` so words are insensitive
//! to amplitude.

use std::f64::consts::PI;

use boss_core::{utils::population_std_or_one, Error, Result};

/// First frequency kept for a normalize flag
#[inline]
pub fn start_frequency(normalize: bool) -> usize {
    usize::from(normalize)
}

/// Unscaled DFT of `window`, `pairs` coefficients from frequency `start`
pub fn dft(window: &[f64], start: usize, pairs: usize) -> Vec<f64> {
    let n = window.len() as f64;
    let mut out = Vec::with_capacity(pairs * 2);
    for k in start..start + pairs {
        let mut re = 0.0;
        let mut im = 0.0;
        for (t, &x) in window.iter().enumerate() {
            let angle = 2.0 * PI * (t * k) as f64 / n;
            re += x * angle.cos();
            im -= x * angle.sin();
        }
        out.push(re);
        out.push(im);
    }
    out
}

/// DFT of `window` scaled by `1 / (sqrt(w) * std)`
pub fn normalized_dft(window: &[f64], start: usize, pairs: usize) -> Vec<f64> {
    let factor = 1.0 / ((window.len() as f64).sqrt() * population_std_or_one(window));
    let mut coefficients = dft(window, start, pairs);
    for c in &mut coefficients {
        *c *= factor;
    }
    coefficients
}

/// `ceil(m / w)` non-overlapping windows, the last one shifted left to end
/// at the series end
pub fn disjoint_windows(series: &[f64], window_size: usize) -> Result<Vec<&[f64]>> {
    check_window(series, window_size)?;
    let m = series.len();
    let count = m.div_ceil(window_size);
    Ok((0..count)
        .map(|i| {
            let offset = (i * window_size).min(m - window_size);
            &series[offset..offset + window_size]
        })
        .collect())
}

/// Mean and standard deviation of every sliding window
///
/// Standard deviation is 0 when the running variance is not positive.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingStats {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl SlidingStats {
    pub fn compute(series: &[f64], window_size: usize) -> Result<Self> {
        check_window(series, window_size)?;
        let count = series.len() - window_size + 1;
        let inv = 1.0 / window_size as f64;
        let mut means = Vec::with_capacity(count);
        let mut stds = Vec::with_capacity(count);

        let (mut sum, mut square_sum) = series[..window_size]
            .iter()
            .fold((0.0, 0.0), |(s, sq), &x| (s + x, sq + x * x));

        for t in 0..count {
            if t > 0 {
                let incoming = series[t + window_size - 1];
                let outgoing = series[t - 1];
                sum += incoming - outgoing;
                square_sum += incoming * incoming - outgoing * outgoing;
            }
            let mean = sum * inv;
            let variance = square_sum * inv - mean * mean;
            means.push(mean);
            stds.push(if variance > 0.0 { variance.sqrt() } else { 0.0 });
        }

        Ok(Self { means, stds })
    }
}

/// Momentary Fourier transform for one window size and coefficient range
#[derive(Debug, Clone)]
pub struct Mft {
    window_size: usize,
    start: usize,
    pairs: usize,
    // e^{i 2 pi k / w} per kept frequency, interleaved re/im
    phis: Vec<f64>,
}

impl Mft {
    pub fn new(window_size: usize, word_length: usize, normalize: bool) -> Self {
        let start = start_frequency(normalize);
        let pairs = word_length.div_ceil(2);
        let w = window_size as f64;
        let phis = (start..start + pairs)
            .flat_map(|k| {
                let angle = 2.0 * PI * k as f64 / w;
                [angle.cos(), angle.sin()]
            })
            .collect();
        Self {
            window_size,
            start,
            pairs,
            phis,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Scaled coefficients of every stride-1 window of `series`
    pub fn transform(&self, series: &[f64]) -> Result<Vec<Vec<f64>>> {
        let stats = SlidingStats::compute(series, self.window_size)?;
        let count = stats.stds.len();
        let inv_sqrt_w = 1.0 / (self.window_size as f64).sqrt();

        let mut current = dft(&series[..self.window_size], self.start, self.pairs);
        let mut out = Vec::with_capacity(count);

        for t in 0..count {
            if t > 0 {
                let delta = series[t + self.window_size - 1] - series[t - 1];
                for k in (0..current.len()).step_by(2) {
                    let re = current[k] + delta;
                    let im = current[k + 1];
                    let (c, s) = (self.phis[k], self.phis[k + 1]);
                    current[k] = re * c - im * s;
                    current[k + 1] = re * s + im * c;
                }
            }
            let std = stats.stds[t];
            let factor = if std > 0.0 { inv_sqrt_w / std } else { inv_sqrt_w };
            out.push(current.iter().map(|c| c * factor).collect());
        }

        Ok(out)
    }
}

fn check_window(series: &[f64], window_size: usize) -> Result<()> {
    if window_size == 0 {
        return Err(Error::InvalidParameter("window size must be positive".to_string()));
    }
    if series.len() < window_size {
        return Err(Error::InsufficientData {
            expected: window_size,
            actual: series.len(),
        });
    }
    Ok(())
}
