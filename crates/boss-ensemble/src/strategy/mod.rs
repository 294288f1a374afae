//! Ensemble construction strategies
//!
//! A [`Builder`] owns the mutable state of one build: the per-channel member
//! lists and parameter pools, the seeded RNG, the resource governor and the
//! optional checkpoint directory. The strategies in the submodules drive it:
//!
//! - [`greedy`]: sweep every window size and keep members within 92% of the
//!   channel's best
//! - [`random`]: draw untried parameters and keep every model
//! - [`bounded`]: draw untried parameters and replace the least accurate
//!   member once a channel is full

mod bounded;
mod greedy;
mod random;

use std::time::Instant;

use boss_core::{Dataset, ExecutionEngine, Result};
use boss_sfa::{Bag, SfaParams};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::checkpoint::{ChannelState, CheckpointManager, EnsembleState};
use crate::config::{BossConfig, EnsembleMode};
use crate::estimate::{evaluation_indices, leave_one_out_accuracy, TrainEstimate};
use crate::governor::{BuildProgress, ResourceGovernor};
use crate::individual::BossIndividual;
use crate::params::{ParameterPool, WindowRange};
use crate::sampling::{random_indices, stratified_indices};
use crate::surrogate::{best_candidate, prune_over_budget, regressor_for, History};
use crate::voting::member_weight;

/// Members and search state of one channel
#[derive(Debug, Clone)]
pub struct ChannelEnsemble {
    members: Vec<BossIndividual>,
    pool: ParameterPool,
    history: History,
    built: usize,
    worst: Option<(usize, f64)>,
}

impl ChannelEnsemble {
    pub fn new(pool: ParameterPool) -> Self {
        Self {
            members: Vec::new(),
            pool,
            history: History::default(),
            built: 0,
            worst: None,
        }
    }

    pub fn members(&self) -> &[BossIndividual] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Candidates built for this channel, retained or not
    pub fn built(&self) -> usize {
        self.built
    }

    /// Untried parameter combinations
    pub fn pool(&self) -> &ParameterPool {
        &self.pool
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// First member with the lowest train accuracy
    pub fn worst_member(&self) -> Option<(usize, f64)> {
        let mut worst: Option<(usize, f64)> = None;
        for (i, m) in self.members.iter().enumerate() {
            let acc = m.accuracy().unwrap_or(0.0);
            if worst.map_or(true, |(_, w)| acc < w) {
                worst = Some((i, acc));
            }
        }
        worst
    }

    pub fn best_accuracy(&self) -> Option<f64> {
        self.members
            .iter()
            .filter_map(BossIndividual::accuracy)
            .fold(None, |best, a| Some(best.map_or(a, |b: f64| b.max(a))))
    }

    /// Keep only members with train accuracy of at least `threshold`
    fn retain_at_least(&mut self, threshold: f64) {
        let kept: Vec<BossIndividual> = std::mem::take(&mut self.members)
            .into_iter()
            .filter(|m| m.accuracy().unwrap_or(0.0) >= threshold)
            .collect();
        self.members = kept;
        self.worst = self.worst_member();
    }

    pub fn footprint_bytes(&self) -> usize {
        self.members.iter().map(BossIndividual::footprint_bytes).sum()
    }

    fn to_state(&self) -> ChannelState {
        ChannelState {
            pool: self.pool.clone(),
            history: self.history.clone(),
            built: self.built,
            worst_index: self.worst.map(|(i, _)| i),
            worst_accuracy: self.worst.map_or(0.0, |(_, a)| a),
            num_members: self.members.len(),
        }
    }

    fn from_state(state: ChannelState, members: Vec<BossIndividual>) -> Self {
        Self {
            members,
            pool: state.pool,
            history: state.history,
            built: state.built,
            worst: state.worst_index.map(|i| (i, state.worst_accuracy)),
        }
    }
}

/// What a build leaves behind
#[derive(Debug)]
pub(crate) struct BuildOutcome {
    pub channels: Vec<ChannelEnsemble>,
    pub total_built: usize,
    pub build_nanos: u64,
    pub checkpoint_nanos: u64,
    pub interrupted: bool,
    pub resumed: bool,
}

/// Mutable state of one build
pub(crate) struct Builder<'a, E: ExecutionEngine> {
    config: &'a BossConfig,
    data: &'a [Dataset],
    range: WindowRange,
    engine: &'a E,
    rng: ChaCha8Rng,
    governor: ResourceGovernor,
    checkpoint: Option<CheckpointManager>,
    channels: Vec<ChannelEnsemble>,
    current: usize,
    total_built: usize,
    resumed: bool,
}

impl<'a, E: ExecutionEngine> Builder<'a, E> {
    /// `data` holds one single-channel dataset per channel
    pub fn new(
        config: &'a BossConfig,
        data: &'a [Dataset],
        range: WindowRange,
        engine: &'a E,
        governor: ResourceGovernor,
        checkpoint: Option<CheckpointManager>,
    ) -> Self {
        let pool = if config.mode.is_random() {
            ParameterPool::full(&range)
        } else {
            ParameterPool::default()
        };
        Self {
            config,
            data,
            range,
            engine,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            governor,
            checkpoint,
            channels: (0..data.len()).map(|_| ChannelEnsemble::new(pool.clone())).collect(),
            current: 0,
            total_built: 0,
            resumed: false,
        }
    }

    /// Load a previous build's state if the checkpoint directory holds one
    pub fn restore(&mut self) -> Result<bool> {
        let Some(manager) = &self.checkpoint else {
            return Ok(false);
        };
        if !manager.has_state() {
            return Ok(false);
        }

        let state = manager.load_state()?;
        if state.channels.len() != self.data.len() {
            return Err(boss_core::Error::checkpoint(
                manager.directory(),
                format!(
                    "checkpoint has {} channels, data has {}",
                    state.channels.len(),
                    self.data.len()
                ),
            ));
        }

        let mut channels = Vec::with_capacity(state.channels.len());
        for (c, ch) in state.channels.into_iter().enumerate() {
            let members = (0..ch.num_members)
                .map(|slot| manager.load_member(c, slot))
                .collect::<Result<Vec<_>>>()?;
            channels.push(ChannelEnsemble::from_state(ch, members));
        }

        info!(
            directory = %manager.directory().display(),
            built = state.total_built,
            "resuming build from checkpoint"
        );
        self.channels = channels;
        self.rng = state.rng;
        self.current = state.current_channel % self.data.len().max(1);
        self.total_built = state.total_built;
        self.governor.resume_from(state.build_nanos, state.checkpoint_nanos);
        self.resumed = true;
        self.refresh_memory();
        Ok(true)
    }

    /// Run the configured strategy to completion, contract expiry or
    /// interruption
    pub fn run(mut self) -> Result<BuildOutcome> {
        match self.config.mode {
            EnsembleMode::GreedySweep => self.run_greedy()?,
            EnsembleMode::Random => self.run_random()?,
            EnsembleMode::RandomBounded => self.run_bounded()?,
        }

        let interrupted = self.governor.interrupted();
        if let Some(manager) = &self.checkpoint {
            if !interrupted && manager.cleanup_enabled() {
                manager.remove()?;
            }
        }

        Ok(BuildOutcome {
            channels: self.channels,
            total_built: self.total_built,
            build_nanos: self.governor.build_nanos(),
            checkpoint_nanos: self.governor.checkpoint_nanos(),
            interrupted,
            resumed: self.resumed,
        })
    }

    fn num_channels(&self) -> usize {
        self.channels.len()
    }

    fn total_retained(&self) -> usize {
        self.channels.iter().map(ChannelEnsemble::len).sum()
    }

    fn any_pool_left(&self) -> bool {
        self.channels.iter().any(|ch| !ch.pool.is_empty())
    }

    /// Move to the next channel that still has untried parameters
    fn advance_channel(&mut self) {
        let n = self.num_channels();
        for step in 1..=n {
            let c = (self.current + step) % n;
            if !self.channels[c].pool.is_empty() {
                self.current = c;
                return;
            }
        }
    }

    /// Skip forward if the current channel has nothing left to try
    fn ensure_current_has_pool(&mut self) {
        if self.channels[self.current].pool.is_empty() {
            self.advance_channel();
        }
    }

    fn refresh_memory(&mut self) {
        let bytes: usize = self.channels.iter().map(ChannelEnsemble::footprint_bytes).sum();
        self.governor.set_bytes_used(bytes as u64);
    }

    /// Time and memory contracts and the interrupt hook, checked between
    /// candidates
    fn poll(&mut self, channel: usize) -> bool {
        let progress = BuildProgress {
            channel,
            built: self.total_built,
            retained: self.channels.iter().map(ChannelEnsemble::len).collect(),
            elapsed: self.governor.elapsed(),
            bytes_used: self.governor.bytes_used(),
        };
        self.governor.poll_interrupt(&progress)
    }

    /// Next parameters to try for `channel`, removed from its pool
    ///
    /// Under a time or memory contract, candidates predicted to exceed the
    /// remaining budget are dropped first. The cost predictions use the
    /// surrogate's regressor, or the default one without surrogate selection.
    /// With surrogate selection, the candidate with the highest predicted
    /// accuracy is taken after the warm-up; otherwise the draw is uniform.
    fn select_candidate(&mut self, channel: usize) -> Result<Option<SfaParams>> {
        let remaining_time = self.governor.remaining_time_nanos();
        let remaining_bytes = self.governor.remaining_bytes();
        let kind = self.config.surrogate.map(|s| s.regressor).unwrap_or_default();
        let ch = &mut self.channels[channel];

        if !ch.history.tried.is_empty() {
            let features = ch.history.features();
            if let Some(remaining) = remaining_time {
                let mut regressor = regressor_for(kind);
                let dropped = prune_over_budget(
                    regressor.as_mut(),
                    &features,
                    &ch.history.build_nanos,
                    &mut ch.pool,
                    remaining as f64,
                )?;
                if dropped > 0 {
                    debug!(channel, dropped, "pruned candidates over the time budget");
                }
            }
            if let Some(remaining) = remaining_bytes {
                let mut regressor = regressor_for(kind);
                let dropped = prune_over_budget(
                    regressor.as_mut(),
                    &features,
                    &ch.history.footprint,
                    &mut ch.pool,
                    remaining as f64,
                )?;
                if dropped > 0 {
                    debug!(channel, dropped, "pruned candidates over the memory budget");
                }
            }
        }

        if ch.pool.is_empty() {
            return Ok(None);
        }

        let index = match self.config.surrogate {
            Some(surrogate) if ch.history.warmup_draws >= surrogate.warmup && !ch.history.tried.is_empty() => {
                let mut regressor = regressor_for(kind);
                best_candidate(
                    regressor.as_mut(),
                    &ch.history.features(),
                    &ch.history.accuracy,
                    &ch.pool,
                )?
            }
            Some(_) => {
                ch.history.warmup_draws += 1;
                Some(self.rng.gen_range(0..ch.pool.len()))
            }
            None => Some(self.rng.gen_range(0..ch.pool.len())),
        };

        Ok(index.and_then(|i| ch.pool.take(i)))
    }

    /// Build a cleaned model for `channel`, on a subsample when configured
    ///
    /// Returns the model and the labels of the series it was trained on.
    fn train_candidate(&mut self, channel: usize, params: SfaParams) -> Result<(BossIndividual, Vec<usize>)> {
        let data = &self.data[channel];
        let n = data.num_instances();
        let subsample = self.config.train_subsample.and_then(|sub| {
            sub.size_for(n).map(|size| {
                if sub.stratified {
                    stratified_indices(data.labels(), data.num_classes(), size, &mut self.rng)
                } else {
                    random_indices(n, size, &mut self.rng)
                }
            })
        });

        match subsample {
            Some(indices) => {
                let train = data.subset(&indices);
                let mut model = BossIndividual::fit(params, &train, true, self.engine)?;
                let labels = train.labels().to_vec();
                model.set_subsample(indices);
                Ok((model, labels))
            }
            None => {
                let model = BossIndividual::fit(params, data, true, self.engine)?;
                Ok((model, data.labels().to_vec()))
            }
        }
    }

    /// Leave-one-out accuracy of `bags`, abandoning below `bound`
    fn estimate(&mut self, channel: usize, bags: &[Bag], labels: &[usize], bound: f64) -> TrainEstimate {
        let num_classes = self.data[channel].num_classes();
        let indices = evaluation_indices(labels, num_classes, self.config.fast_estimate.as_ref(), &mut self.rng);
        leave_one_out_accuracy(bags, &indices, bound, self.engine)
    }

    /// Set accuracy and voting weight on a freshly estimated member
    fn score(&self, model: &mut BossIndividual, accuracy: f64) {
        model.set_accuracy(accuracy);
        model.set_weight(member_weight(accuracy, self.config.confidence_weighting));
    }

    fn record(&mut self, channel: usize, params: SfaParams, accuracy: f64, started: Instant, footprint: usize) {
        let history = &mut self.channels[channel].history;
        history.tried.push(params);
        history.accuracy.push(accuracy);
        history.build_nanos.push(started.elapsed().as_nanos() as f64);
        history.footprint.push(footprint as f64);
    }

    /// Persist member `slot` of `channel` and the scalar state
    fn save(&mut self, channel: usize, slot: usize) -> Result<()> {
        let Some(manager) = &self.checkpoint else {
            return Ok(());
        };
        let started = Instant::now();
        manager.save_member(channel, slot, &self.channels[channel].members[slot])?;
        let state = EnsembleState {
            fingerprint: manager.fingerprint().to_string(),
            rng: self.rng.clone(),
            current_channel: self.current,
            total_built: self.total_built,
            build_nanos: self.governor.build_nanos(),
            checkpoint_nanos: self.governor.checkpoint_nanos(),
            channels: self.channels.iter().map(ChannelEnsemble::to_state).collect(),
        };
        manager.save_state(&state)?;
        self.governor.add_checkpoint_time(started.elapsed());
        Ok(())
    }
}
