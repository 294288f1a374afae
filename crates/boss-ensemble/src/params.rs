//! Parameter space of the ensemble
//!
//! Word lengths and alphabet sizes are fixed; window sizes depend on the
//! series length and two search proportions.

use boss_core::{Error, Result};
use boss_sfa::SfaParams;
use serde::{Deserialize, Serialize};

/// Word lengths searched, longest first
pub const WORD_LENGTHS: [usize; 5] = [16, 14, 12, 10, 8];

/// Alphabet sizes searched
pub const ALPHABET_SIZES: [usize; 1] = [4];

/// Fraction of the best accuracy a member needs to stay in a greedy ensemble
pub const CORRECT_THRESHOLD: f64 = 0.92;

/// Smallest window considered when the series allows it
pub const MIN_WINDOW: usize = 10;

/// Window sizes `min, min + step, ..., <= max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRange {
    pub min: usize,
    pub max: usize,
    pub step: usize,
}

impl WindowRange {
    /// Window range for series of length `series_length`
    ///
    /// `max = floor(m * max_len_proportion)`; when that falls below
    /// [`MIN_WINDOW`] the minimum becomes `max / 2`. The step is chosen so
    /// that roughly `m * max_search_proportion` sizes are visited.
    pub fn for_series_length(
        series_length: usize,
        max_len_proportion: f64,
        max_search_proportion: f64,
    ) -> Result<Self> {
        if !(max_len_proportion > 0.0 && max_len_proportion <= 1.0) {
            return Err(Error::invalid_proportion("max window length proportion", max_len_proportion));
        }
        if !(max_search_proportion > 0.0 && max_search_proportion <= 1.0) {
            return Err(Error::invalid_proportion(
                "max window search proportion",
                max_search_proportion,
            ));
        }

        let m = series_length as f64;
        let max = (m * max_len_proportion).floor() as usize;
        let min = if max < MIN_WINDOW { max / 2 } else { MIN_WINDOW };
        if max < 1 || min < 1 {
            return Err(Error::InvalidParameter(format!(
                "series length {series_length} leaves no usable window size (max window {max})"
            )));
        }

        let searches = m * max_search_proportion;
        let step = (((max - min) as f64 / searches).floor() as usize).max(1);

        Ok(Self { min, max, step })
    }

    pub fn sizes(&self) -> Vec<usize> {
        (self.min..=self.max).step_by(self.step).collect()
    }
}

/// Untried parameter combinations of one channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterPool {
    candidates: Vec<SfaParams>,
}

impl ParameterPool {
    /// Every combination for `range`, normalized windows first
    pub fn full(range: &WindowRange) -> Self {
        let mut candidates = Vec::new();
        for normalize in [true, false] {
            for &alphabet_size in &ALPHABET_SIZES {
                for window_size in range.sizes() {
                    for &word_length in &WORD_LENGTHS {
                        candidates.push(SfaParams {
                            word_length,
                            alphabet_size,
                            window_size,
                            normalize,
                        });
                    }
                }
            }
        }
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn candidates(&self) -> &[SfaParams] {
        &self.candidates
    }

    /// Remove and return candidate `i`, keeping the order of the rest
    pub fn take(&mut self, i: usize) -> Option<SfaParams> {
        (i < self.candidates.len()).then(|| self.candidates.remove(i))
    }

    /// Keep only candidates for which `keep` returns true
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&SfaParams) -> bool,
    {
        self.candidates.retain(|p| keep(p));
    }
}
