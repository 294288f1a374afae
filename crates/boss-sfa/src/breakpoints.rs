//! Multiple Coefficient Binning
//!
//! Learns, for every letter of a word, the thresholds that split that
//! Fourier coefficient into equi-depth buckets over the training data.

use boss_core::{utils, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::dft::{disjoint_windows, normalized_dft, start_frequency};
use crate::word::{ALPHABET_SIZE, MAX_WORD_LENGTH};

/// Per-letter bucket thresholds
///
/// Only the finite cut points are stored; every letter implicitly ends with
/// a `+inf` bucket so any finite value maps to some symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakpoints {
    cuts: Vec<Vec<f64>>,
}

impl Breakpoints {
    /// Learn breakpoints from training series
    ///
    /// Each series is cut into disjoint windows of `window_size`, each window
    /// gives `word_length` scaled Fourier values rounded to two decimals, and
    /// the values of each letter across all windows are split into
    /// `ALPHABET_SIZE` equi-depth bins.
    pub fn learn<'a, I>(series: I, word_length: usize, window_size: usize, normalize: bool) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        validate_word_length(word_length)?;
        let start = start_frequency(normalize);
        let pairs = word_length.div_ceil(2);

        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); word_length];
        for s in series {
            for window in disjoint_windows(s, window_size)? {
                let coefficients = normalized_dft(window, start, pairs);
                for (column, &c) in columns.iter_mut().zip(&coefficients) {
                    column.push(utils::round_to(c, 2));
                }
            }
        }

        let total = columns.first().map_or(0, Vec::len);
        if total == 0 {
            return Err(Error::empty_input("breakpoint learning"));
        }

        let cuts = columns
            .into_iter()
            .map(|mut column| {
                utils::sort_in_place(&mut column);
                (1..ALPHABET_SIZE)
                    .map(|k| column[(k * total / ALPHABET_SIZE).min(total - 1)])
                    .collect()
            })
            .collect::<Vec<Vec<f64>>>();

        trace!(word_length, window_size, windows = total, "learned breakpoints");
        Ok(Self { cuts })
    }

    /// Build from explicit finite cut points
    pub fn from_cuts(cuts: Vec<Vec<f64>>) -> Result<Self> {
        validate_word_length(cuts.len())?;
        for (letter, row) in cuts.iter().enumerate() {
            if row.len() != ALPHABET_SIZE - 1 {
                return Err(Error::size_mismatch(
                    ALPHABET_SIZE - 1,
                    row.len(),
                    &format!("breakpoints of letter {letter}"),
                ));
            }
            if row.iter().any(|v| !v.is_finite()) || row.windows(2).any(|w| w[0] > w[1]) {
                return Err(Error::InvalidInput(format!(
                    "breakpoints of letter {letter} must be finite and non-decreasing"
                )));
            }
        }
        Ok(Self { cuts })
    }

    /// Number of letters covered
    pub fn word_length(&self) -> usize {
        self.cuts.len()
    }

    /// Full threshold row of a letter, ending with `+inf`
    pub fn thresholds(&self, letter: usize) -> Vec<f64> {
        let mut row = self.cuts[letter].clone();
        row.push(f64::INFINITY);
        row
    }

    /// Symbol for `value` at position `letter`: the first bucket whose
    /// threshold is `>= value`
    #[inline]
    pub fn symbol(&self, letter: usize, value: f64) -> u8 {
        self.cuts[letter]
            .iter()
            .position(|&t| value <= t)
            .unwrap_or(ALPHABET_SIZE - 1) as u8
    }

    /// Breakpoints of the first `word_length` letters
    pub fn truncated(&self, word_length: usize) -> Result<Self> {
        if word_length > self.word_length() {
            return Err(Error::InvalidParameter(format!(
                "cannot truncate breakpoints for {} letters to {word_length}",
                self.word_length()
            )));
        }
        Ok(Self {
            cuts: self.cuts[..word_length].to_vec(),
        })
    }

    pub fn footprint_bytes(&self) -> usize {
        self.cuts.len() * (ALPHABET_SIZE - 1) * std::mem::size_of::<f64>()
    }
}

pub(crate) fn validate_word_length(word_length: usize) -> Result<()> {
    if word_length == 0 || word_length > MAX_WORD_LENGTH {
        return Err(Error::InvalidParameter(format!(
            "word length {word_length} must be in 1..={MAX_WORD_LENGTH}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_series(n: usize, m: usize, seed: u64) -> Vec<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| (0..m).map(|_| rng.gen_range(-2.0..2.0)).collect())
            .collect()
    }

    #[test]
    fn test_breakpoints_monotone_with_infinite_tail() {
        let data = random_series(12, 40, 7);
        for &normalize in &[true, false] {
            let bp = Breakpoints::learn(data.iter().map(Vec::as_slice), 8, 10, normalize).unwrap();
            assert_eq!(bp.word_length(), 8);
            for letter in 0..8 {
                let row = bp.thresholds(letter);
                assert_eq!(row.len(), ALPHABET_SIZE);
                assert!(row.windows(2).all(|w| w[0] <= w[1]));
                assert_eq!(*row.last().unwrap(), f64::INFINITY);
            }
        }
    }

    #[test]
    fn test_symbol_lookup() {
        let bp = Breakpoints::from_cuts(vec![vec![-1.0, 0.0, 1.0]]).unwrap();
        assert_eq!(bp.symbol(0, -5.0), 0);
        assert_eq!(bp.symbol(0, -1.0), 0);
        assert_eq!(bp.symbol(0, -0.5), 1);
        assert_eq!(bp.symbol(0, 0.5), 2);
        assert_eq!(bp.symbol(0, 1.0), 2);
        assert_eq!(bp.symbol(0, 1e9), 3);
    }

    #[test]
    fn test_truncated_shares_prefix() {
        let data = random_series(6, 30, 3);
        let bp = Breakpoints::learn(data.iter().map(Vec::as_slice), 16, 12, true).unwrap();
        let short = bp.truncated(10).unwrap();
        assert_eq!(short.word_length(), 10);
        for letter in 0..10 {
            assert_eq!(short.thresholds(letter), bp.thresholds(letter));
        }
        assert!(bp.truncated(17).is_err());
    }

    #[test]
    fn test_invalid_inputs() {
        let data = random_series(2, 20, 1);
        assert!(Breakpoints::learn(data.iter().map(Vec::as_slice), 0, 10, true).is_err());
        assert!(Breakpoints::learn(data.iter().map(Vec::as_slice), 18, 10, true).is_err());
        assert!(Breakpoints::learn(std::iter::empty(), 8, 10, true).is_err());
        assert!(Breakpoints::from_cuts(vec![vec![1.0, 0.0, 2.0]]).is_err());
    }
}
