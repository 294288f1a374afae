//! Symbolic Fourier Approximation
//!
//! [`SfaTransform`] turns a series into one word per sliding window: the
//! window's leading Fourier coefficients are discretized letter by letter
//! against learned [`Breakpoints`].

use boss_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::bag::Bag;
use crate::breakpoints::{validate_word_length, Breakpoints};
use crate::dft::Mft;
use crate::word::{Word, ALPHABET_SIZE};

/// One BOSS parameter combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SfaParams {
    pub word_length: usize,
    pub alphabet_size: usize,
    pub window_size: usize,
    pub normalize: bool,
}

impl SfaParams {
    pub fn new(word_length: usize, window_size: usize, normalize: bool) -> Self {
        Self {
            word_length,
            alphabet_size: ALPHABET_SIZE,
            window_size,
            normalize,
        }
    }

    /// Same parameters with a different word length
    pub fn with_word_length(self, word_length: usize) -> Self {
        Self { word_length, ..self }
    }

    pub fn validate(&self) -> Result<()> {
        validate_word_length(self.word_length)?;
        if self.alphabet_size != ALPHABET_SIZE {
            return Err(Error::FeatureNotAvailable(format!(
                "alphabet size {} (only {ALPHABET_SIZE} is supported)",
                self.alphabet_size
            )));
        }
        if self.window_size == 0 {
            return Err(Error::InvalidParameter("window size must be positive".to_string()));
        }
        Ok(())
    }

    /// Parameters as a numeric feature vector
    /// `[word_length, alphabet_size, window_size, normalize]`
    pub fn features(&self) -> [f64; 4] {
        [
            self.word_length as f64,
            self.alphabet_size as f64,
            self.window_size as f64,
            if self.normalize { 1.0 } else { 0.0 },
        ]
    }
}

impl std::fmt::Display for SfaParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "windowSize={} wordLength={} alphabetSize={} norm={}",
            self.window_size, self.word_length, self.alphabet_size, self.normalize
        )
    }
}

/// Learned transform from series to SFA words
#[derive(Debug, Clone)]
pub struct SfaTransform {
    params: SfaParams,
    breakpoints: Breakpoints,
    mft: Mft,
}

impl SfaTransform {
    /// Learn breakpoints from training series
    pub fn fit<'a, I>(params: SfaParams, series: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        params.validate()?;
        let breakpoints =
            Breakpoints::learn(series, params.word_length, params.window_size, params.normalize)?;
        Ok(Self::assemble(params, breakpoints))
    }

    /// Reuse existing breakpoints, truncated to `params.word_length`
    pub fn from_breakpoints(params: SfaParams, breakpoints: &Breakpoints) -> Result<Self> {
        params.validate()?;
        let breakpoints = breakpoints.truncated(params.word_length)?;
        Ok(Self::assemble(params, breakpoints))
    }

    fn assemble(params: SfaParams, breakpoints: Breakpoints) -> Self {
        let mft = Mft::new(params.window_size, params.word_length, params.normalize);
        Self {
            params,
            breakpoints,
            mft,
        }
    }

    pub fn params(&self) -> &SfaParams {
        &self.params
    }

    pub fn breakpoints(&self) -> &Breakpoints {
        &self.breakpoints
    }

    pub fn into_breakpoints(self) -> Breakpoints {
        self.breakpoints
    }

    /// One word per stride-1 window
    pub fn words(&self, series: &[f64]) -> Result<Vec<Word>> {
        Ok(self
            .mft
            .transform(series)?
            .iter()
            .map(|coefficients| self.word(coefficients))
            .collect())
    }

    /// Word histogram of a series
    pub fn bag(&self, series: &[f64], numerosity_reduction: bool) -> Result<Bag> {
        Ok(Bag::from_words(&self.words(series)?, numerosity_reduction))
    }

    fn word(&self, coefficients: &[f64]) -> Word {
        let mut word = Word::empty();
        for (letter, &value) in coefficients.iter().take(self.params.word_length).enumerate() {
            word.push(self.breakpoints.symbol(letter, value));
        }
        word
    }
}
