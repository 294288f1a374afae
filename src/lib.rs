//! Bag-of-SFA-Symbols time series classification
//!
//! This crate re-exports the workspace crates under one roof:
//!
//! - [`core`]: error type, dataset container, execution engines
//! - [`sfa`]: SFA words, bags and the BOSS distance
//! - [`ensemble`]: individual models and contracted, checkpointable ensembles
//!
//! # Quick start
//!
//! ```rust,no_run
//! use boss_tsc::prelude::*;
//!
//! # fn main() -> boss_tsc::Result<()> {
//! let series: Vec<Vec<f64>> = (0..10)
//!     .map(|i| (0..24).map(|t| ((t * (i % 2 + 1)) as f64 * 0.5).sin()).collect())
//!     .collect();
//! let data = Dataset::univariate(series, (0..10).map(|i| i % 2).collect())?;
//!
//! let mut boss = Boss::new(BossConfig::default());
//! boss.fit(&data)?;
//! print!("{}", boss.describe());
//! # Ok(())
//! # }
//! ```

pub use boss_core as core;
pub use boss_ensemble as ensemble;
pub use boss_sfa as sfa;

pub use boss_core::{Dataset, Error, Instance, Result};
pub use boss_ensemble::{Boss, BossConfig, BossIndividual, EnsembleMode};

/// Prelude module for convenient imports
pub mod prelude {
    pub use boss_core::prelude::*;
    pub use boss_ensemble::prelude::*;
    pub use boss_sfa::{Bag, SfaParams, SfaTransform, Word};
}
