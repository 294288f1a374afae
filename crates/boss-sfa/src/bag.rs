//! Word histograms
//!
//! A [`Bag`] counts how often each word occurs in one series. With
//! numerosity reduction a run of identical consecutive words counts once,
//! which keeps smooth stretches of a series from dominating its histogram.

use std::collections::HashMap;

use boss_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::word::Word;

/// Shortest word length a bag can be shortened to
pub const MIN_SHORTENED_LENGTH: usize = 2;

/// Histogram of words for one series, tagged with its class label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BagEntries", into = "BagEntries")]
pub struct Bag {
    counts: HashMap<Word, u32>,
    label: Option<usize>,
}

// JSON object keys must be strings, so bags persist as a sorted entry list
#[derive(Serialize, Deserialize)]
struct BagEntries {
    label: Option<usize>,
    entries: Vec<(Word, u32)>,
}

impl From<Bag> for BagEntries {
    fn from(bag: Bag) -> Self {
        let mut entries: Vec<(Word, u32)> = bag.counts.into_iter().collect();
        entries.sort_unstable();
        Self {
            label: bag.label,
            entries,
        }
    }
}

impl From<BagEntries> for Bag {
    fn from(repr: BagEntries) -> Self {
        Self {
            counts: repr.entries.into_iter().collect(),
            label: repr.label,
        }
    }
}

impl Bag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `words` in order
    pub fn from_words(words: &[Word], numerosity_reduction: bool) -> Self {
        let mut bag = Self::new();
        bag.extend(words.iter().copied(), numerosity_reduction);
        bag
    }

    fn extend(&mut self, words: impl Iterator<Item = Word>, numerosity_reduction: bool) {
        let mut last: Option<Word> = None;
        for word in words {
            if numerosity_reduction && last == Some(word) {
                continue;
            }
            *self.counts.entry(word).or_insert(0) += 1;
            last = Some(word);
        }
    }

    pub fn with_label(mut self, label: Option<usize>) -> Self {
        self.label = label;
        self
    }

    pub fn label(&self) -> Option<usize> {
        self.label
    }

    pub fn set_label(&mut self, label: Option<usize>) {
        self.label = label;
    }

    /// Occurrences of `word`, zero when absent
    #[inline]
    pub fn count(&self, word: &Word) -> u32 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Word, &u32)> {
        self.counts.iter()
    }

    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| c as u64).sum()
    }

    /// Rough heap footprint
    pub fn footprint_bytes(&self) -> usize {
        let entry = std::mem::size_of::<Word>() + std::mem::size_of::<u32>() + std::mem::size_of::<u64>();
        std::mem::size_of::<Self>() + self.counts.capacity() * entry
    }
}

/// Histogram of a word sequence
pub fn words_to_bag(words: &[Word], numerosity_reduction: bool) -> Bag {
    Bag::from_words(words, numerosity_reduction)
}

/// Histogram of `words` truncated to their first `word_length` symbols
///
/// The run-collapse rule is applied to the truncated words, so two words
/// that only differed in their dropped tail now collapse together.
pub fn shorten(words: &[Word], word_length: usize, numerosity_reduction: bool) -> Result<Bag> {
    let current = words.first().map_or(word_length, Word::len);
    if word_length > current {
        return Err(Error::InvalidParameter(format!(
            "cannot increase word length, current {current}, requested {word_length}"
        )));
    }
    if word_length < MIN_SHORTENED_LENGTH {
        return Err(Error::InvalidParameter(format!(
            "invalid word length requested, current {current}, requested {word_length}"
        )));
    }
    if word_length == current {
        return Ok(Bag::from_words(words, numerosity_reduction));
    }

    let shortened = words
        .iter()
        .map(|w| w.shorten(word_length))
        .collect::<Result<Vec<_>>>()?;
    Ok(Bag::from_words(&shortened, numerosity_reduction))
}
