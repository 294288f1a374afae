//! Time and memory budgets for a build
//!
//! The governor is consulted strictly between candidates. Time spent writing
//! checkpoints does not count against the time contract, and time spent in
//! an earlier, interrupted session does.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::BossConfig;

/// Snapshot handed to the interrupt hook after every candidate
#[derive(Debug, Clone, PartialEq)]
pub struct BuildProgress {
    /// Channel the last candidate belonged to
    pub channel: usize,
    /// Candidates built so far, over all channels
    pub built: usize,
    /// Retained members per channel
    pub retained: Vec<usize>,
    pub elapsed: Duration,
    pub bytes_used: u64,
}

/// Called between candidates; returning `true` stops the build
pub type InterruptHook = Box<dyn FnMut(&BuildProgress) -> bool + Send>;

/// Tracks elapsed time and retained bytes against the configured contracts
pub struct ResourceGovernor {
    start: Instant,
    prior_nanos: u64,
    restored_checkpoint_nanos: u64,
    checkpoint_nanos: u64,
    time_limit: Option<u64>,
    memory_limit: Option<u64>,
    bytes_used: u64,
    interrupt: Option<InterruptHook>,
    interrupted: bool,
}

impl fmt::Debug for ResourceGovernor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceGovernor")
            .field("build_nanos", &self.build_nanos())
            .field("checkpoint_nanos", &self.checkpoint_nanos)
            .field("time_limit", &self.time_limit)
            .field("memory_limit", &self.memory_limit)
            .field("bytes_used", &self.bytes_used)
            .field("interrupted", &self.interrupted)
            .finish()
    }
}

impl ResourceGovernor {
    pub fn new(config: &BossConfig) -> Self {
        Self {
            start: Instant::now(),
            prior_nanos: 0,
            restored_checkpoint_nanos: 0,
            checkpoint_nanos: 0,
            time_limit: config.time_contract.map(|c| c.nanos()),
            memory_limit: config.memory_contract.map(|c| c.bytes()),
            bytes_used: 0,
            interrupt: None,
            interrupted: false,
        }
    }

    pub fn with_interrupt(mut self, hook: Option<InterruptHook>) -> Self {
        self.interrupt = hook;
        self
    }

    /// Carry over build and checkpoint time from a previous session
    pub fn resume_from(&mut self, build_nanos: u64, checkpoint_nanos: u64) {
        self.prior_nanos = build_nanos;
        self.restored_checkpoint_nanos = checkpoint_nanos;
        self.checkpoint_nanos = checkpoint_nanos;
        self.start = Instant::now();
    }

    /// Build time so far, excluding checkpoint I/O
    pub fn build_nanos(&self) -> u64 {
        let session = self.start.elapsed().as_nanos().min(u64::MAX as u128) as u64;
        self.prior_nanos
            .saturating_add(session.saturating_sub(self.session_checkpoint_nanos()))
    }

    // restored checkpoint time is already excluded from prior_nanos
    fn session_checkpoint_nanos(&self) -> u64 {
        self.checkpoint_nanos.saturating_sub(self.restored_checkpoint_nanos)
    }

    /// Total time spent writing checkpoints
    pub fn checkpoint_nanos(&self) -> u64 {
        self.checkpoint_nanos
    }

    /// Exclude `spent` from the time contract
    pub fn add_checkpoint_time(&mut self, spent: Duration) {
        self.checkpoint_nanos = self
            .checkpoint_nanos
            .saturating_add(spent.as_nanos().min(u64::MAX as u128) as u64);
    }

    pub fn has_time_contract(&self) -> bool {
        self.time_limit.is_some()
    }

    pub fn has_memory_contract(&self) -> bool {
        self.memory_limit.is_some()
    }

    /// `false` without a time contract
    pub fn under_time(&self) -> bool {
        self.time_limit.is_some_and(|limit| self.build_nanos() < limit)
    }

    /// `true` without a memory contract
    pub fn under_memory(&self) -> bool {
        self.memory_limit.map_or(true, |limit| self.bytes_used < limit)
    }

    pub fn remaining_time_nanos(&self) -> Option<u64> {
        self.time_limit.map(|limit| limit.saturating_sub(self.build_nanos()))
    }

    pub fn remaining_bytes(&self) -> Option<u64> {
        self.memory_limit.map(|limit| limit.saturating_sub(self.bytes_used))
    }

    pub fn bytes_used(&self) -> u64 {
        self.bytes_used
    }

    pub fn set_bytes_used(&mut self, bytes: u64) {
        self.bytes_used = bytes;
    }

    /// Poll the interrupt hook; once it asks to stop, stays stopped
    pub fn poll_interrupt(&mut self, progress: &BuildProgress) -> bool {
        if !self.interrupted {
            if let Some(hook) = self.interrupt.as_mut() {
                if hook(progress) {
                    debug!(built = progress.built, "build interrupted");
                    self.interrupted = true;
                }
            }
        }
        self.interrupted
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.build_nanos())
    }
}
