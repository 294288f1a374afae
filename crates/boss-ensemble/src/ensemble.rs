//! The BOSS ensemble classifier
//!
//! [`Boss`] splits its training data into channels, builds one sub-ensemble
//! per channel with the configured strategy and predicts by weighted voting.
//!
//! ```rust,no_run
//! use boss_core::{Dataset, Instance};
//! use boss_ensemble::{Boss, BossConfig};
//!
//! # fn main() -> boss_core::Result<()> {
//! let series: Vec<Vec<f64>> = (0..20)
//!     .map(|i| (0..40).map(|t| ((t * (i % 2 + 1)) as f64 * 0.3).sin()).collect())
//!     .collect();
//! let labels = (0..20).map(|i| i % 2).collect();
//! let data = Dataset::univariate(series, labels)?;
//!
//! let mut boss = Boss::new(BossConfig::default());
//! boss.fit(&data)?;
//!
//! let query = Instance::univariate(data.series(3, 0).to_vec(), None)?;
//! println!("predicted class {}", boss.predict(&query)?);
//! # Ok(())
//! # }
//! ```

use std::fmt::Write as _;

use boss_core::{Dataset, Error, ExecutionEngine, Instance, Result, WorkerPool};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::checkpoint::CheckpointManager;
use crate::config::BossConfig;
use crate::governor::{BuildProgress, InterruptHook, ResourceGovernor};
use crate::individual::BossIndividual;
use crate::params::WindowRange;
use crate::strategy::{Builder, ChannelEnsemble};
use crate::voting::{argmax_random_tie, average, channel_distribution};

/// Leave-one-out estimate of the whole ensemble on its training data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleEstimate {
    pub accuracy: f64,
    pub predictions: Vec<usize>,
    pub distributions: Vec<Vec<f64>>,
}

/// Summary of the last build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildReport {
    /// Candidates built, over all channels and sessions
    pub built: usize,
    pub retained: usize,
    pub build_nanos: u64,
    pub checkpoint_nanos: u64,
    pub interrupted: bool,
    pub resumed: bool,
}

/// Bag-of-SFA-Symbols ensemble
pub struct Boss {
    config: BossConfig,
    channels: Vec<ChannelEnsemble>,
    num_classes: usize,
    series_length: usize,
    report: BuildReport,
    interrupt: Option<InterruptHook>,
}

impl std::fmt::Debug for Boss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Boss")
            .field("config", &self.config)
            .field("channels", &self.channels.len())
            .field("members", &self.num_members())
            .field("report", &self.report)
            .finish()
    }
}

impl Boss {
    pub fn new(config: BossConfig) -> Self {
        Self {
            config,
            channels: Vec::new(),
            num_classes: 0,
            series_length: 0,
            report: BuildReport::default(),
            interrupt: None,
        }
    }

    /// Install a hook polled between candidates of the next build; returning
    /// `true` stops the build and keeps its checkpoint
    pub fn with_interrupt<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&BuildProgress) -> bool + Send + 'static,
    {
        self.interrupt = Some(Box::new(hook));
        self
    }

    pub fn config(&self) -> &BossConfig {
        &self.config
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn is_fitted(&self) -> bool {
        !self.channels.is_empty()
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn num_members(&self) -> usize {
        self.channels.iter().map(ChannelEnsemble::len).sum()
    }

    /// Sub-ensemble of channel `c`
    pub fn channel(&self, c: usize) -> Option<&ChannelEnsemble> {
        self.channels.get(c)
    }

    /// Members of channel `c`, empty if out of range
    pub fn members(&self, c: usize) -> &[BossIndividual] {
        self.channels.get(c).map(ChannelEnsemble::members).unwrap_or(&[])
    }

    /// Build the ensemble on `data`
    ///
    /// With a checkpoint directory holding state for the same dataset and
    /// configuration, a random build resumes where it stopped.
    #[instrument(skip(self, data), fields(dataset = data.name(), instances = data.num_instances(), mode = ?self.config.mode))]
    pub fn fit(&mut self, data: &Dataset) -> Result<()> {
        self.config.validate()?;
        if data.num_instances() < 2 {
            return Err(Error::InsufficientData {
                expected: 2,
                actual: data.num_instances(),
            });
        }

        let range = WindowRange::for_series_length(
            data.series_length(),
            self.config.max_win_len_proportion,
            self.config.max_win_search_proportion,
        )?;
        let channels = data.split_channels()?;
        let engine = WorkerPool::new(self.config.num_threads)?;

        let checkpoint = match &self.config.checkpoint {
            Some(cp) if self.config.mode.is_random() => Some(CheckpointManager::new(cp, data.name(), &self.config)),
            Some(_) => {
                warn!("greedy builds do not checkpoint, ignoring checkpoint directory");
                None
            }
            None => None,
        };

        if !self.config.mode.is_random()
            && (self.config.time_contract.is_some() || self.config.memory_contract.is_some())
        {
            warn!("greedy builds sweep every window, ignoring time and memory contracts");
        }

        let governor = ResourceGovernor::new(&self.config).with_interrupt(self.interrupt.take());
        let mut builder = Builder::new(&self.config, &channels, range, &engine, governor, checkpoint);
        builder.restore()?;
        let outcome = builder.run()?;

        self.channels = outcome.channels;
        self.num_classes = data.num_classes();
        self.series_length = data.series_length();
        self.report = BuildReport {
            built: outcome.total_built,
            retained: self.num_members(),
            build_nanos: outcome.build_nanos,
            checkpoint_nanos: outcome.checkpoint_nanos,
            interrupted: outcome.interrupted,
            resumed: outcome.resumed,
        };

        info!(
            retained = self.report.retained,
            built = self.report.built,
            interrupted = self.report.interrupted,
            threads = engine.num_threads(),
            "ensemble built"
        );
        if self.report.retained == 0 {
            warn!("contract expired before any candidate finished, the ensemble is empty");
        }
        Ok(())
    }

    fn check_query(&self, instance: &Instance) -> Result<()> {
        if instance.num_channels() != self.channels.len() {
            return Err(Error::size_mismatch(
                self.channels.len(),
                instance.num_channels(),
                "query channels",
            ));
        }
        if instance.series_length() != self.series_length {
            return Err(Error::size_mismatch(self.series_length, instance.series_length(), "query length"));
        }
        Ok(())
    }

    /// Per-channel votes of every member, weighted and averaged
    fn distribution_with<E: ExecutionEngine>(&self, instance: &Instance, engine: &E) -> Result<Vec<f64>> {
        let mut per_channel = Vec::with_capacity(self.channels.len());
        for (c, ch) in self.channels.iter().enumerate() {
            let series = instance.channel(c);
            let members = ch.members();
            let votes = engine
                .execute_batch(members.len(), |m| {
                    members[m].classify(series).map(|class| (class, members[m].weight()))
                })
                .into_iter()
                .collect::<Result<Vec<_>>>()?;
            per_channel.push(channel_distribution(&votes, self.num_classes));
        }
        Ok(average(&per_channel, self.num_classes))
    }

    /// Class distribution for `instance`
    ///
    /// An empty ensemble yields all zeros.
    #[instrument(skip(self, instance), level = "debug")]
    pub fn predict_proba(&self, instance: &Instance) -> Result<Vec<f64>> {
        if !self.is_fitted() {
            return Err(Error::InvalidInput("ensemble has not been built".to_string()));
        }
        self.check_query(instance)?;
        let engine = WorkerPool::new(self.config.num_threads)?;
        self.distribution_with(instance, &engine)
    }

    /// Most likely class, ties broken at random with the configured seed
    #[instrument(skip(self, instance), level = "debug")]
    pub fn predict(&self, instance: &Instance) -> Result<usize> {
        let dist = self.predict_proba(instance)?;
        if self.num_members() == 0 {
            return Err(Error::InvalidInput("cannot predict with an empty ensemble".to_string()));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        argmax_random_tie(&dist, &mut rng)
            .ok_or_else(|| Error::InvalidInput("ensemble has no classes".to_string()))
    }

    /// Predict every instance of `data`
    #[instrument(skip(self, data), fields(instances = data.num_instances()))]
    pub fn predict_batch(&self, data: &Dataset) -> Result<Vec<usize>> {
        if self.num_members() == 0 {
            return Err(Error::InvalidInput("cannot predict with an empty ensemble".to_string()));
        }
        let engine = WorkerPool::new(self.config.num_threads)?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        data.instances()
            .iter()
            .map(|inst| {
                self.check_query(inst)?;
                let dist = self.distribution_with(inst, &engine)?;
                argmax_random_tie(&dist, &mut rng)
                    .ok_or_else(|| Error::InvalidInput("ensemble has no classes".to_string()))
            })
            .collect()
    }

    /// Leave-one-out accuracy of the ensemble on its training data
    ///
    /// A member classifies training instance `i` by leave-one-out when `i`
    /// was in its training sample, and by transforming the series otherwise.
    #[instrument(skip(self, data), fields(instances = data.num_instances()))]
    pub fn train_estimate(&self, data: &Dataset) -> Result<EnsembleEstimate> {
        if self.num_members() == 0 {
            return Err(Error::InvalidInput("cannot estimate an empty ensemble".to_string()));
        }
        if data.num_channels() != self.channels.len() {
            return Err(Error::size_mismatch(self.channels.len(), data.num_channels(), "train channels"));
        }

        let engine = WorkerPool::new(self.config.num_threads)?;
        let n = data.num_instances();
        let channels = &self.channels;
        let num_classes = self.num_classes;
        let distributions = engine
            .execute_batch(n, |i| -> Result<Vec<f64>> {
                let mut per_channel = Vec::with_capacity(channels.len());
                for (c, ch) in channels.iter().enumerate() {
                    let votes = ch
                        .members()
                        .iter()
                        .map(|m| -> Result<(usize, f64)> {
                            let class = match m.train_position(i) {
                                Some(pos) => m.classify_train(pos)?,
                                None => m.classify(data.series(i, c))?,
                            };
                            Ok((class, m.weight()))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    per_channel.push(channel_distribution(&votes, num_classes));
                }
                Ok(average(&per_channel, num_classes))
            })
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut predictions = Vec::with_capacity(n);
        let mut correct = 0;
        for (i, dist) in distributions.iter().enumerate() {
            let class = argmax_random_tie(dist, &mut rng)
                .ok_or_else(|| Error::InvalidInput("ensemble has no classes".to_string()))?;
            if class == data.label(i) {
                correct += 1;
            }
            predictions.push(class);
        }

        Ok(EnsembleEstimate {
            accuracy: correct as f64 / n as f64,
            predictions,
            distributions,
        })
    }

    /// One line per member: channel, parameters, accuracy and weight
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (c, ch) in self.channels.iter().enumerate() {
            for m in ch.members() {
                let accuracy = m.accuracy().map_or_else(|| "-".to_string(), |a| format!("{a:.4}"));
                let _ = writeln!(
                    out,
                    "channel={c} {} accuracy={accuracy} weight={:.4}",
                    m.params(),
                    m.weight()
                );
            }
        }
        out
    }
}
