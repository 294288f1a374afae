//! Random ensemble: every drawn candidate is kept
//!
//! The loop runs while the time contract allows and the last channel is
//! below its cap, or until the target size is reached without one. Memory
//! and the candidate pools bound it in either case. Channels are filled
//! round-robin, so the last channel is the one that reaches its cap last.
//! A contract that expires before the first candidate leaves the ensemble
//! empty.

use std::time::Instant;

use boss_core::{ExecutionEngine, Result};
use tracing::{debug, info};

use super::Builder;

impl<E: ExecutionEngine> Builder<'_, E> {
    pub(super) fn run_random(&mut self) -> Result<()> {
        let target = if self.governor.has_time_contract() {
            0
        } else {
            self.config.ensemble_size
        };
        let max_size = self.config.max_ensemble_size;
        let needs_accuracy = self.config.confidence_weighting || self.config.surrogate.is_some();
        info!(target, max_size, channels = self.num_channels(), "starting random build");

        loop {
            self.ensure_current_has_pool();
            let channel = self.current;
            let under_cap = self.channels.last().is_some_and(|ch| ch.len() < max_size);
            let keep_going = (self.governor.under_time() && under_cap) || self.total_retained() < target;
            if !(keep_going && self.governor.under_memory() && self.any_pool_left()) {
                break;
            }

            let started = Instant::now();
            let Some(params) = self.select_candidate(channel)? else {
                self.advance_channel();
                continue;
            };
            let (mut model, labels) = self.train_candidate(channel, params)?;

            let accuracy = if needs_accuracy {
                let estimate = self.estimate(channel, model.bags(), &labels, 0.0);
                self.score(&mut model, estimate.accuracy);
                estimate.accuracy
            } else {
                0.0
            };
            self.record(channel, params, accuracy, started, model.footprint_bytes());
            debug!(channel, %params, accuracy, "kept random member");

            let ch = &mut self.channels[channel];
            ch.members.push(model);
            ch.built += 1;
            let slot = ch.members.len() - 1;
            self.total_built += 1;
            self.refresh_memory();

            self.advance_channel();
            self.save(channel, slot)?;
            if self.poll(channel) {
                break;
            }
        }

        info!(
            retained = self.total_retained(),
            built = self.total_built,
            "random build finished"
        );
        Ok(())
    }
}
