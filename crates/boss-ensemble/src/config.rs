//! Ensemble configuration
//!
//! A single [`BossConfig`] carries the construction mode, size targets and
//! optional time and memory budgets. Everything is plain data with
//! consuming `with_*` builders and serde support.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use boss_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// How members are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnsembleMode {
    /// Sweep every window size, keep those within 92% of the best
    #[default]
    GreedySweep,
    /// Keep randomly drawn parameter combinations unconditionally
    Random,
    /// Random draws, replacing the least accurate member once at capacity
    RandomBounded,
}

impl EnsembleMode {
    pub fn is_random(&self) -> bool {
        !matches!(self, Self::GreedySweep)
    }
}

/// Unit string that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitParseError {
    #[error("unrecognised time unit '{0}'")]
    Time(String),
    #[error("unrecognised data unit '{0}'")]
    Data(String),
}

impl From<UnitParseError> for Error {
    fn from(err: UnitParseError) -> Self {
        Error::InvalidParameter(err.to_string())
    }
}

/// Unit of a time contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Nanoseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub fn nanos_per_unit(&self) -> u64 {
        match self {
            Self::Nanoseconds => 1,
            Self::Seconds => 1_000_000_000,
            Self::Minutes => 60 * 1_000_000_000,
            Self::Hours => 3_600 * 1_000_000_000,
            Self::Days => 86_400 * 1_000_000_000,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = UnitParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ns" | "nanosecond" | "nanoseconds" => Ok(Self::Nanoseconds),
            "s" | "sec" | "second" | "seconds" => Ok(Self::Seconds),
            "m" | "min" | "minute" | "minutes" => Ok(Self::Minutes),
            "h" | "hour" | "hours" => Ok(Self::Hours),
            "d" | "day" | "days" => Ok(Self::Days),
            _ => Err(UnitParseError::Time(s.to_string())),
        }
    }
}

/// Unit of a memory contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataUnit {
    Bytes,
    Megabytes,
    Gigabytes,
}

impl DataUnit {
    pub fn bytes_per_unit(&self) -> u64 {
        match self {
            Self::Bytes => 1,
            Self::Megabytes => 1 << 20,
            Self::Gigabytes => 1 << 30,
        }
    }
}

impl FromStr for DataUnit {
    type Err = UnitParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "b" | "byte" | "bytes" => Ok(Self::Bytes),
            "mb" | "megabyte" | "megabytes" => Ok(Self::Megabytes),
            "gb" | "gigabyte" | "gigabytes" => Ok(Self::Gigabytes),
            _ => Err(UnitParseError::Data(s.to_string())),
        }
    }
}

/// Wall-clock budget for a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeContract {
    pub unit: TimeUnit,
    pub amount: u64,
}

impl TimeContract {
    pub fn new(unit: TimeUnit, amount: u64) -> Self {
        Self { unit, amount }
    }

    pub fn nanos(&self) -> u64 {
        self.amount.saturating_mul(self.unit.nanos_per_unit())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_nanos(self.nanos())
    }
}

/// Memory budget for the retained models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryContract {
    pub unit: DataUnit,
    pub amount: u64,
}

impl MemoryContract {
    pub fn new(unit: DataUnit, amount: u64) -> Self {
        Self { unit, amount }
    }

    pub fn bytes(&self) -> u64 {
        self.amount.saturating_mul(self.unit.bytes_per_unit())
    }
}

/// Whether model sizes can be measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MemoryAccounting {
    /// Sizes come from each model's footprint estimate
    #[default]
    Estimated,
    /// No measurement available; memory contracts are rejected
    Unavailable,
}

/// Smallest training set a candidate is built on
pub const MIN_TRAIN_INSTANCES: usize = 2;

/// Per-candidate subsampling of the training set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainSubsample {
    /// Fraction of the channel to keep; overrides `max_instances`
    pub proportion: Option<f64>,
    pub max_instances: usize,
    pub stratified: bool,
}

impl Default for TrainSubsample {
    fn default() -> Self {
        Self {
            proportion: None,
            max_instances: 1000,
            stratified: true,
        }
    }
}

impl TrainSubsample {
    pub fn with_proportion(mut self, proportion: f64) -> Self {
        self.proportion = Some(proportion);
        self
    }

    pub fn with_max_instances(mut self, max_instances: usize) -> Self {
        self.max_instances = max_instances;
        self
    }

    pub fn with_stratified(mut self, stratified: bool) -> Self {
        self.stratified = stratified;
        self
    }

    /// Subsample size for a channel of `n` instances, `None` if no
    /// subsampling applies
    ///
    /// Never below [`MIN_TRAIN_INSTANCES`], so leave-one-out always has a
    /// neighbour to compare against.
    pub fn size_for(&self, n: usize) -> Option<usize> {
        let size = match self.proportion {
            Some(p) => (n as f64 * p).floor() as usize,
            None => self.max_instances,
        }
        .max(MIN_TRAIN_INSTANCES);
        (n > size).then_some(size)
    }
}

/// Regressor used by surrogate-guided selection
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum RegressorKind {
    #[default]
    GaussianProcess,
    NearestNeighbour { k: usize },
    Linear { ridge: f64 },
}

/// Surrogate-guided parameter selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurrogateConfig {
    /// Random draws per channel before the surrogate takes over
    pub warmup: usize,
    pub regressor: RegressorKind,
}

impl Default for SurrogateConfig {
    fn default() -> Self {
        Self {
            warmup: 20,
            regressor: RegressorKind::default(),
        }
    }
}

/// Cap on the number of instances a train estimate looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastEstimate {
    pub max_eval: usize,
    /// When set, the cap becomes `num_classes * max_eval_per_class`
    pub max_eval_per_class: Option<usize>,
}

impl Default for FastEstimate {
    fn default() -> Self {
        Self {
            max_eval: 500,
            max_eval_per_class: None,
        }
    }
}

impl FastEstimate {
    pub fn cap(&self, num_classes: usize) -> usize {
        match self.max_eval_per_class {
            Some(per_class) if per_class > 0 => num_classes * per_class,
            _ => self.max_eval,
        }
    }
}

/// Where and whether build progress is persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    pub directory: PathBuf,
    /// Remove the checkpoint directory after an uninterrupted build
    pub cleanup: bool,
}

impl CheckpointConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            cleanup: true,
        }
    }

    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }
}

/// Full configuration of a BOSS ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossConfig {
    pub ensemble_size: usize,
    pub max_ensemble_size: usize,
    pub mode: EnsembleMode,
    pub confidence_weighting: bool,
    pub time_contract: Option<TimeContract>,
    pub memory_contract: Option<MemoryContract>,
    pub max_win_len_proportion: f64,
    pub max_win_search_proportion: f64,
    pub train_subsample: Option<TrainSubsample>,
    pub surrogate: Option<SurrogateConfig>,
    pub fast_estimate: Option<FastEstimate>,
    /// Drop members below 92% of their channel's best after a bounded build
    pub cutoff: bool,
    pub checkpoint: Option<CheckpointConfig>,
    pub seed: u64,
    pub num_threads: usize,
    pub memory_accounting: MemoryAccounting,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            ensemble_size: 50,
            max_ensemble_size: 500,
            mode: EnsembleMode::default(),
            confidence_weighting: false,
            time_contract: None,
            memory_contract: None,
            max_win_len_proportion: 1.0,
            max_win_search_proportion: 0.25,
            train_subsample: None,
            surrogate: None,
            fast_estimate: None,
            cutoff: false,
            checkpoint: None,
            seed: 0,
            num_threads: 1,
            memory_accounting: MemoryAccounting::default(),
        }
    }
}

impl BossConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Random-bounded mode with confidence weighting and fast estimates
    pub fn randomized() -> Self {
        Self::default()
            .with_mode(EnsembleMode::RandomBounded)
            .with_ensemble_size(250)
            .with_max_ensemble_size(50)
            .with_confidence_weighting(true)
            .with_fast_estimate(FastEstimate::default())
            .with_train_subsample(TrainSubsample::default().with_proportion(0.7))
    }

    pub fn with_ensemble_size(mut self, size: usize) -> Self {
        self.ensemble_size = size;
        self
    }

    pub fn with_max_ensemble_size(mut self, size: usize) -> Self {
        self.max_ensemble_size = size;
        self
    }

    pub fn with_mode(mut self, mode: EnsembleMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_confidence_weighting(mut self, enabled: bool) -> Self {
        self.confidence_weighting = enabled;
        self
    }

    pub fn with_time_contract(mut self, unit: TimeUnit, amount: u64) -> Self {
        self.time_contract = Some(TimeContract::new(unit, amount));
        self
    }

    /// Time contract with the unit given as a string, e.g. `"minutes"`
    pub fn with_time_contract_str(self, unit: &str, amount: u64) -> Result<Self> {
        let unit: TimeUnit = unit.parse()?;
        Ok(self.with_time_contract(unit, amount))
    }

    pub fn with_memory_contract(mut self, unit: DataUnit, amount: u64) -> Self {
        self.memory_contract = Some(MemoryContract::new(unit, amount));
        self
    }

    /// Memory contract with the unit given as a string, e.g. `"MB"`
    pub fn with_memory_contract_str(self, unit: &str, amount: u64) -> Result<Self> {
        let unit: DataUnit = unit.parse()?;
        Ok(self.with_memory_contract(unit, amount))
    }

    pub fn with_max_win_len_proportion(mut self, proportion: f64) -> Self {
        self.max_win_len_proportion = proportion;
        self
    }

    pub fn with_max_win_search_proportion(mut self, proportion: f64) -> Self {
        self.max_win_search_proportion = proportion;
        self
    }

    pub fn with_train_subsample(mut self, subsample: TrainSubsample) -> Self {
        self.train_subsample = Some(subsample);
        self
    }

    pub fn with_surrogate(mut self, surrogate: SurrogateConfig) -> Self {
        self.surrogate = Some(surrogate);
        self
    }

    pub fn with_fast_estimate(mut self, fast: FastEstimate) -> Self {
        self.fast_estimate = Some(fast);
        self
    }

    pub fn with_cutoff(mut self, cutoff: bool) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_checkpoint(mut self, checkpoint: CheckpointConfig) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// `0` uses one worker per CPU, `1` runs on the calling thread
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_memory_accounting(mut self, accounting: MemoryAccounting) -> Self {
        self.memory_accounting = accounting;
        self
    }

    /// Reject inconsistent settings before any work starts
    pub fn validate(&self) -> Result<()> {
        if self.max_ensemble_size == 0 {
            return Err(Error::InvalidParameter("max ensemble size must be positive".to_string()));
        }
        if self.mode.is_random() && self.ensemble_size == 0 && self.time_contract.is_none() {
            return Err(Error::InvalidParameter(
                "random ensembles need a positive target size or a time contract".to_string(),
            ));
        }
        if self.memory_contract.is_some() && self.memory_accounting == MemoryAccounting::Unavailable {
            return Err(Error::FeatureNotAvailable(
                "memory contract requested but memory accounting is unavailable".to_string(),
            ));
        }
        if let Some(sub) = &self.train_subsample {
            if let Some(p) = sub.proportion {
                if !(p > 0.0 && p <= 1.0) {
                    return Err(Error::invalid_proportion("train proportion", p));
                }
            } else if sub.max_instances < MIN_TRAIN_INSTANCES {
                return Err(Error::InvalidParameter(format!(
                    "max train instances must be at least {MIN_TRAIN_INSTANCES}, got {}",
                    sub.max_instances
                )));
            }
        }
        if let Some(fast) = &self.fast_estimate {
            if fast.max_eval == 0 && fast.max_eval_per_class.unwrap_or(0) == 0 {
                return Err(Error::InvalidParameter("max eval must be positive".to_string()));
            }
        }
        if let Some(RegressorKind::NearestNeighbour { k: 0 }) = self.surrogate.map(|s| s.regressor) {
            return Err(Error::InvalidParameter("nearest neighbour surrogate needs k > 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = BossConfig::default();
        assert_eq!(cfg.ensemble_size, 50);
        assert_eq!(cfg.max_ensemble_size, 500);
        assert_eq!(cfg.mode, EnsembleMode::GreedySweep);
        assert_eq!(cfg.max_win_len_proportion, 1.0);
        assert_eq!(cfg.max_win_search_proportion, 0.25);
        assert_eq!(cfg.num_threads, 1);
        assert!(cfg.validate().is_ok());
        assert_eq!(SurrogateConfig::default().warmup, 20);
        assert_eq!(FastEstimate::default().cap(3), 500);
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("minutes".parse::<TimeUnit>().unwrap(), TimeUnit::Minutes);
        assert_eq!("NS".parse::<TimeUnit>().unwrap(), TimeUnit::Nanoseconds);
        assert_eq!("MB".parse::<DataUnit>().unwrap(), DataUnit::Megabytes);
        assert_eq!(" gigabytes ".parse::<DataUnit>().unwrap(), DataUnit::Gigabytes);
        assert!("fortnights".parse::<TimeUnit>().is_err());

        let err = BossConfig::new().with_memory_contract_str("KB", 4).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
        assert!(err.to_string().contains("KB"));

        let cfg = BossConfig::new().with_time_contract_str("hours", 2).unwrap();
        assert_eq!(cfg.time_contract.unwrap().nanos(), 2 * 3_600 * 1_000_000_000);
    }

    #[test]
    fn test_contract_sizes() {
        assert_eq!(MemoryContract::new(DataUnit::Megabytes, 3).bytes(), 3 * 1024 * 1024);
        assert_eq!(TimeContract::new(TimeUnit::Seconds, 5).duration(), Duration::from_secs(5));
    }

    #[test]
    fn test_memory_contract_needs_accounting() {
        let cfg = BossConfig::new()
            .with_memory_contract(DataUnit::Megabytes, 100)
            .with_memory_accounting(MemoryAccounting::Unavailable);
        assert!(matches!(cfg.validate(), Err(Error::FeatureNotAvailable(_))));
    }

    #[test]
    fn test_invalid_proportions_rejected() {
        let cfg = BossConfig::new().with_train_subsample(TrainSubsample::default().with_proportion(0.0));
        assert!(cfg.validate().is_err());
        let cfg = BossConfig::new().with_train_subsample(TrainSubsample::default().with_proportion(1.2));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_subsample_size() {
        let sub = TrainSubsample::default();
        assert_eq!(sub.size_for(500), None);
        assert_eq!(sub.size_for(1500), Some(1000));
        let sub = sub.with_proportion(0.5);
        assert_eq!(sub.size_for(11), Some(5));
        assert_eq!(TrainSubsample::default().with_proportion(1.0).size_for(10), None);
    }

    #[test]
    fn test_tiny_subsamples_keep_two_instances() {
        // floor(50 * 0.01) = 0 and floor(15 * 0.1) = 1 both round up
        assert_eq!(TrainSubsample::default().with_proportion(0.01).size_for(50), Some(2));
        assert_eq!(TrainSubsample::default().with_proportion(0.1).size_for(15), Some(2));
        assert_eq!(TrainSubsample::default().with_proportion(0.1).size_for(2), None);

        let cfg = BossConfig::new().with_train_subsample(TrainSubsample::default().with_proportion(0.01));
        assert!(cfg.validate().is_ok());

        for max in [0, 1] {
            let cfg = BossConfig::new().with_train_subsample(TrainSubsample::default().with_max_instances(max));
            assert!(matches!(cfg.validate(), Err(Error::InvalidParameter(_))), "max_instances {max}");
        }
        let cfg = BossConfig::new().with_train_subsample(TrainSubsample::default().with_max_instances(2));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_fast_estimate_per_class_cap() {
        let fast = FastEstimate {
            max_eval: 500,
            max_eval_per_class: Some(20),
        };
        assert_eq!(fast.cap(3), 60);
    }

    #[test]
    fn test_config_serde() {
        let cfg = BossConfig::randomized()
            .with_time_contract(TimeUnit::Minutes, 5)
            .with_checkpoint(CheckpointConfig::new("/tmp/boss"));
        let json = serde_json::to_string(&cfg).unwrap();
        let back: BossConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
