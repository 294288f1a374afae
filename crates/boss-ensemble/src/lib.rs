//! BOSS ensembles
//!
//! Builds and queries ensembles of Bag-of-SFA-Symbols models:
//!
//! - [`BossIndividual`]: one parameter combination with its training bags
//! - [`Boss`]: per-channel ensembles built by a greedy window sweep, a
//!   random search, or a random search with a bounded, accuracy-replacing
//!   member list
//! - [`BossConfig`]: sizes, time and memory contracts, subsampling,
//!   surrogate-guided selection, checkpointing
//!
//! Random builds can be contracted in time or memory, interrupted, and
//! resumed from a checkpoint directory.
//!
//! # Example
//!
//! ```rust,no_run
//! use boss_core::Dataset;
//! use boss_ensemble::{Boss, BossConfig, EnsembleMode, TimeUnit};
//!
//! # fn main() -> boss_core::Result<()> {
//! let series: Vec<Vec<f64>> = (0..30)
//!     .map(|i| (0..64).map(|t| ((t * (i % 3 + 1)) as f64 * 0.2).sin()).collect())
//!     .collect();
//! let data = Dataset::univariate(series, (0..30).map(|i| i % 3).collect())?;
//!
//! let config = BossConfig::randomized()
//!     .with_mode(EnsembleMode::RandomBounded)
//!     .with_time_contract(TimeUnit::Seconds, 5)
//!     .with_seed(7);
//! let mut boss = Boss::new(config);
//! boss.fit(&data)?;
//!
//! let estimate = boss.train_estimate(&data)?;
//! println!("{} members, train accuracy {:.3}", boss.num_members(), estimate.accuracy);
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod config;
pub mod ensemble;
pub mod estimate;
pub mod governor;
pub mod individual;
pub mod params;
pub mod sampling;
pub mod strategy;
pub mod surrogate;
pub mod voting;

pub use checkpoint::{CheckpointManager, EnsembleState};
pub use config::{
    BossConfig, CheckpointConfig, DataUnit, EnsembleMode, FastEstimate, MemoryAccounting, MemoryContract,
    RegressorKind, SurrogateConfig, TimeContract, TimeUnit, TrainSubsample, UnitParseError, MIN_TRAIN_INSTANCES,
};
pub use ensemble::{Boss, BuildReport, EnsembleEstimate};
pub use estimate::{leave_one_out_accuracy, TrainEstimate};
pub use governor::{BuildProgress, InterruptHook, ResourceGovernor};
pub use individual::{BossIndividual, DerivedModel};
pub use params::{ParameterPool, WindowRange, CORRECT_THRESHOLD, WORD_LENGTHS};
pub use strategy::ChannelEnsemble;
pub use surrogate::{GaussianProcess, LinearRegressor, NearestNeighbourRegressor, Regressor};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{BossConfig, DataUnit, EnsembleMode, TimeUnit};
    pub use crate::ensemble::{Boss, EnsembleEstimate};
    pub use crate::individual::BossIndividual;
}
