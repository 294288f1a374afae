//! Packed SFA words
//!
//! A word holds up to [`MAX_WORD_LENGTH`] symbols drawn from an alphabet of
//! four letters. Each symbol takes two bits of a `u32`; the first symbol
//! pushed ends up in the most significant occupied position, so dropping
//! trailing symbols is a right shift.

use std::fmt;

use boss_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Longest word a `u32` can hold at two bits per symbol
pub const MAX_WORD_LENGTH: usize = 16;

/// Number of distinct symbols
pub const ALPHABET_SIZE: usize = 4;

const BITS_PER_SYMBOL: u32 = 2;
const SYMBOL_MASK: u32 = 0b11;

/// A sequence of 2-bit symbols packed into a `u32`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Word {
    bits: u32,
    length: u8,
}

impl Word {
    /// The empty word
    pub const fn empty() -> Self {
        Self { bits: 0, length: 0 }
    }

    /// Build a word from symbols in reading order
    pub fn from_symbols(symbols: &[u8]) -> Result<Self> {
        if symbols.len() > MAX_WORD_LENGTH {
            return Err(Error::InvalidParameter(format!(
                "word length {} exceeds {MAX_WORD_LENGTH}",
                symbols.len()
            )));
        }
        let mut word = Self::empty();
        for &s in symbols {
            if s as usize >= ALPHABET_SIZE {
                return Err(Error::InvalidParameter(format!(
                    "symbol {s} outside alphabet of {ALPHABET_SIZE}"
                )));
            }
            word.push(s);
        }
        Ok(word)
    }

    /// Append a symbol
    ///
    /// Callers guarantee `symbol < 4` and that the word is not full.
    #[inline]
    pub(crate) fn push(&mut self, symbol: u8) {
        debug_assert!((symbol as usize) < ALPHABET_SIZE);
        debug_assert!((self.length as usize) < MAX_WORD_LENGTH);
        self.bits = (self.bits << BITS_PER_SYMBOL) | (symbol as u32 & SYMBOL_MASK);
        self.length += 1;
    }

    /// Raw packed bits
    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Symbol at position `i` (0 = first)
    pub fn symbol(&self, i: usize) -> Option<u8> {
        if i >= self.len() {
            return None;
        }
        let shift = BITS_PER_SYMBOL * (self.len() - 1 - i) as u32;
        Some(((self.bits >> shift) & SYMBOL_MASK) as u8)
    }

    pub fn symbols(&self) -> Vec<u8> {
        (0..self.len()).filter_map(|i| self.symbol(i)).collect()
    }

    /// Keep only the first `length` symbols
    pub fn shorten(&self, length: usize) -> Result<Self> {
        if length > self.len() {
            return Err(Error::InvalidParameter(format!(
                "cannot lengthen word of {} symbols to {length}",
                self.len()
            )));
        }
        let drop = BITS_PER_SYMBOL * (self.len() - length) as u32;
        // a shift by the full width is undefined for u32
        let bits = if drop >= u32::BITS { 0 } else { self.bits >> drop };
        Ok(Self {
            bits,
            length: length as u8,
        })
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in self.symbols() {
            write!(f, "{}", (b'a' + s) as char)?;
        }
        Ok(())
    }
}
