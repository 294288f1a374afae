//! Exhaustive window sweep
//!
//! For every `(normalize, window)` pair one model is built at the longest
//! word length; shorter word lengths are derived from its raw words. The
//! most accurate length represents the window and enters the channel's
//! ensemble if it is within [`CORRECT_THRESHOLD`] of the channel's best.
//! Window candidates are visited round-robin across channels.
//!
//! The sweep always covers every window: time and memory contracts, the
//! interrupt hook and checkpointing apply to the random strategies only.

use boss_core::{ExecutionEngine, Result};
use boss_sfa::SfaParams;
use tracing::{debug, info};

use super::Builder;
use crate::estimate::{evaluation_indices, leave_one_out_accuracy};
use crate::individual::BossIndividual;
use crate::params::{CORRECT_THRESHOLD, WORD_LENGTHS};

/// Best and admission floor of one channel's greedy ensemble
#[derive(Debug, Clone, Copy)]
struct ChannelBounds {
    max_accuracy: f64,
    min_max_accuracy: f64,
}

impl Default for ChannelBounds {
    fn default() -> Self {
        Self {
            max_accuracy: -1.0,
            min_max_accuracy: -1.0,
        }
    }
}

/// Whether a window's best model joins an ensemble of `size` members
fn makes_it_into_ensemble(accuracy: f64, bounds: ChannelBounds, size: usize, max_size: usize) -> bool {
    accuracy >= bounds.max_accuracy * CORRECT_THRESHOLD && (size < max_size || accuracy > bounds.min_max_accuracy)
}

impl<E: ExecutionEngine> Builder<'_, E> {
    /// Sweep every window of every channel, ignoring contracts
    pub(super) fn run_greedy(&mut self) -> Result<()> {
        let windows = self.range.sizes();
        let mut bounds = vec![ChannelBounds::default(); self.num_channels()];
        info!(
            windows = windows.len(),
            channels = self.num_channels(),
            "starting greedy window sweep"
        );

        for normalize in [true, false] {
            for &window in &windows {
                for (channel, b) in bounds.iter_mut().enumerate() {
                    self.sweep_window(channel, SfaParams::new(WORD_LENGTHS[0], window, normalize), b)?;
                }
            }
        }
        Ok(())
    }

    /// Build, shorten and evaluate one window for `channel`
    fn sweep_window(&mut self, channel: usize, params: SfaParams, bounds: &mut ChannelBounds) -> Result<()> {
        let data = &self.data[channel];
        let parent = BossIndividual::fit(params, data, false, self.engine)?;
        let indices = evaluation_indices(
            data.labels(),
            data.num_classes(),
            self.config.fast_estimate.as_ref(),
            &mut self.rng,
        );

        let mut best_accuracy = -1.0;
        let mut best_length = params.word_length;
        for &length in &WORD_LENGTHS {
            let estimate = if length == params.word_length {
                leave_one_out_accuracy(parent.bags(), &indices, best_accuracy, self.engine)
            } else {
                let derived = parent.derive_shortened(length)?;
                leave_one_out_accuracy(derived.bags(), &indices, best_accuracy, self.engine)
            };
            // later, shorter lengths win ties
            if estimate.accuracy >= best_accuracy {
                best_accuracy = estimate.accuracy;
                best_length = length;
            }
        }

        self.channels[channel].built += 1;
        self.total_built += 1;

        let max_size = self.config.max_ensemble_size;
        if !makes_it_into_ensemble(best_accuracy, *bounds, self.channels[channel].len(), max_size) {
            return Ok(());
        }

        let mut model = if best_length == params.word_length {
            let mut parent = parent;
            parent.clean();
            parent
        } else {
            parent.derive_shortened(best_length)?.into_owned()?
        };
        self.score(&mut model, best_accuracy);
        debug!(channel, params = %model.params(), accuracy = best_accuracy, "admitted window");

        let ch = &mut self.channels[channel];
        ch.members.push(model);

        if best_accuracy > bounds.max_accuracy {
            bounds.max_accuracy = best_accuracy;
            ch.retain_at_least(bounds.max_accuracy * CORRECT_THRESHOLD);
        }
        while ch.members.len() > max_size {
            if let Some((worst, _)) = ch.worst_member() {
                ch.members.remove(worst);
            }
        }
        ch.worst = ch.worst_member();
        bounds.min_max_accuracy = ch.worst.map_or(-1.0, |(_, a)| a);

        self.refresh_memory();
        Ok(())
    }
}
