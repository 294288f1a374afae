//! Random search with a per-channel size cap
//!
//! Until a channel is full every candidate joins it. Afterwards a candidate
//! replaces the channel's least accurate member only when strictly more
//! accurate, and its accuracy estimate is abandoned as soon as it cannot
//! beat that member.

use std::time::Instant;

use boss_core::{ExecutionEngine, Result};
use tracing::{debug, info};

use super::Builder;
use crate::params::CORRECT_THRESHOLD;

impl<E: ExecutionEngine> Builder<'_, E> {
    pub(super) fn run_bounded(&mut self) -> Result<()> {
        let target = if self.governor.has_time_contract() {
            0
        } else {
            self.config.ensemble_size
        };
        let max_size = self.config.max_ensemble_size;
        info!(target, max_size, channels = self.num_channels(), "starting bounded random build");

        loop {
            self.ensure_current_has_pool();
            let channel = self.current;
            let keep_going = self.governor.under_time() || self.total_built < target;
            if !(keep_going && self.governor.under_memory() && self.any_pool_left()) {
                break;
            }

            let started = Instant::now();
            let Some(params) = self.select_candidate(channel)? else {
                self.advance_channel();
                continue;
            };
            let (mut model, labels) = self.train_candidate(channel, params)?;

            let full = self.channels[channel].len() >= max_size;
            let bound = match self.channels[channel].worst {
                Some((_, worst)) if full => worst,
                _ => 0.0,
            };
            let estimate = self.estimate(channel, model.bags(), &labels, bound);
            let accuracy = estimate.accuracy;
            self.score(&mut model, accuracy);
            self.record(channel, params, estimate.observed_accuracy(bound), started, model.footprint_bytes());
            self.total_built += 1;

            let ch = &mut self.channels[channel];
            ch.built += 1;
            let changed = if !full {
                ch.members.push(model);
                let slot = ch.members.len() - 1;
                if ch.worst.map_or(true, |(_, w)| accuracy < w) {
                    ch.worst = Some((slot, accuracy));
                }
                debug!(channel, %params, accuracy, "appended member");
                Some(slot)
            } else {
                match ch.worst {
                    Some((slot, worst)) if accuracy > worst => {
                        ch.members[slot] = model;
                        ch.worst = ch.worst_member();
                        debug!(channel, %params, accuracy, replaced = worst, "replaced worst member");
                        Some(slot)
                    }
                    _ => None,
                }
            };
            self.refresh_memory();

            self.advance_channel();
            if let Some(slot) = changed {
                self.save(channel, slot)?;
            }
            if self.poll(channel) {
                break;
            }
        }

        if self.config.cutoff && !self.governor.interrupted() {
            self.apply_cutoff();
        }

        info!(
            retained = self.total_retained(),
            built = self.total_built,
            "bounded random build finished"
        );
        Ok(())
    }

    /// Drop members below [`CORRECT_THRESHOLD`] of their channel's best
    fn apply_cutoff(&mut self) {
        for (channel, ch) in self.channels.iter_mut().enumerate() {
            let Some(best) = ch.best_accuracy() else {
                continue;
            };
            let before = ch.len();
            ch.retain_at_least(best * CORRECT_THRESHOLD);
            debug!(channel, removed = before - ch.len(), "applied accuracy cutoff");
        }
        self.refresh_memory();
    }
}
