//! Symbolic Fourier Approximation for BOSS
//!
//! Everything needed to turn a series into a bag of SFA words and compare
//! bags:
//!
//! - [`Breakpoints`]: per-letter bucket thresholds learned by Multiple
//!   Coefficient Binning
//! - [`SfaTransform`]: sliding-window words via the momentary Fourier
//!   transform
//! - [`Bag`]: word histograms, with numerosity reduction and shortening
//! - [`boss_distance`] and the 1NN helpers
//!
//! # Example
//!
//! ```rust
//! use boss_sfa::{nearest_neighbour, SfaParams, SfaTransform};
//!
//! let train: Vec<Vec<f64>> = (0..6)
//!     .map(|i| (0..32).map(|t| ((t * (i % 2 + 1)) as f64 * 0.4).sin()).collect())
//!     .collect();
//! let sfa = SfaTransform::fit(SfaParams::new(8, 10, true), train.iter().map(Vec::as_slice)).unwrap();
//!
//! let bags: Vec<_> = train
//!     .iter()
//!     .enumerate()
//!     .map(|(i, s)| sfa.bag(s, true).unwrap().with_label(Some(i % 2)))
//!     .collect();
//!
//! let query = sfa.bag(&train[1], true).unwrap();
//! let nn = nearest_neighbour(&query, &bags).unwrap();
//! assert_eq!(nn.distance, 0.0);
//! ```

pub mod bag;
pub mod breakpoints;
pub mod dft;
pub mod distance;
pub mod transform;
pub mod word;

pub use bag::{shorten, words_to_bag, Bag};
pub use breakpoints::Breakpoints;
pub use distance::{boss_distance, leave_one_out, nearest_neighbour, Neighbour};
pub use transform::{SfaParams, SfaTransform};
pub use word::{Word, ALPHABET_SIZE, MAX_WORD_LENGTH};
