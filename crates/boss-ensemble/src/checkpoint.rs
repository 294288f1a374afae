//! Build checkpoints for the random strategies
//!
//! A checkpoint directory holds `ensemble.json`, the scalar state of the
//! build, and one `individual-<channel>-<slot>.json` per retained member.
//! Every file is written atomically (temp file, fsync, rename) so an
//! interrupted write never leaves a truncated file behind.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use boss_core::{Error, Result};
use rand_chacha::ChaCha8Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{BossConfig, CheckpointConfig, EnsembleMode};
use crate::individual::BossIndividual;
use crate::params::ParameterPool;
use crate::surrogate::History;

const STATE_FILE: &str = "ensemble.json";

/// Per-channel scalar state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelState {
    pub pool: ParameterPool,
    pub history: History,
    pub built: usize,
    pub worst_index: Option<usize>,
    pub worst_accuracy: f64,
    pub num_members: usize,
}

/// Everything but the members themselves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleState {
    pub fingerprint: String,
    pub rng: ChaCha8Rng,
    pub current_channel: usize,
    pub total_built: usize,
    pub build_nanos: u64,
    pub checkpoint_nanos: u64,
    pub channels: Vec<ChannelState>,
}

/// Configuration fingerprint used in the checkpoint directory name
///
/// `TTC<nanos>` with a time contract, otherwise `S<target size>`; then
/// `MC<bytes>` for a memory contract, `M<max size>` for bounded builds and
/// `W` with confidence weighting.
pub fn fingerprint(config: &BossConfig) -> String {
    let mut fp = match config.time_contract {
        Some(tc) => format!("TTC{}", tc.nanos()),
        None => format!("S{}", config.ensemble_size),
    };
    if let Some(mc) = config.memory_contract {
        fp.push_str(&format!("MC{}", mc.bytes()));
    }
    if config.mode == EnsembleMode::RandomBounded {
        fp.push_str(&format!("M{}", config.max_ensemble_size));
    }
    if config.confidence_weighting {
        fp.push('W');
    }
    fp
}

/// Reads and writes one build's checkpoint directory
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    directory: PathBuf,
    fingerprint: String,
    cleanup: bool,
}

impl CheckpointManager {
    pub fn new(checkpoint: &CheckpointConfig, dataset_name: &str, config: &BossConfig) -> Self {
        let fingerprint = fingerprint(config);
        let directory = checkpoint
            .directory
            .join(format!("{dataset_name}{}BOSS{fingerprint}", config.seed));
        Self {
            directory,
            fingerprint,
            cleanup: checkpoint.cleanup,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn cleanup_enabled(&self) -> bool {
        self.cleanup
    }

    /// Whether a previous build left its state behind
    pub fn has_state(&self) -> bool {
        self.directory.join(STATE_FILE).is_file()
    }

    fn member_path(&self, channel: usize, slot: usize) -> PathBuf {
        self.directory.join(format!("individual-{channel}-{slot}.json"))
    }

    pub fn save_state(&self, state: &EnsembleState) -> Result<()> {
        self.write_json(&self.directory.join(STATE_FILE), state)
    }

    pub fn save_member(&self, channel: usize, slot: usize, model: &BossIndividual) -> Result<()> {
        self.write_json(&self.member_path(channel, slot), model)
    }

    pub fn load_state(&self) -> Result<EnsembleState> {
        let path = self.directory.join(STATE_FILE);
        let state: EnsembleState = read_json(&path)?;
        if state.fingerprint != self.fingerprint {
            return Err(Error::checkpoint(
                &path,
                format!(
                    "written for configuration {}, expected {}",
                    state.fingerprint, self.fingerprint
                ),
            ));
        }
        Ok(state)
    }

    pub fn load_member(&self, channel: usize, slot: usize) -> Result<BossIndividual> {
        read_json(&self.member_path(channel, slot))
    }

    /// Delete the checkpoint directory and everything in it
    pub fn remove(&self) -> Result<()> {
        if self.directory.exists() {
            fs::remove_dir_all(&self.directory).map_err(|e| Error::checkpoint(&self.directory, e))?;
            debug!(directory = %self.directory.display(), "removed checkpoint");
        }
        Ok(())
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        fs::create_dir_all(&self.directory).map_err(|e| Error::checkpoint(&self.directory, e))?;
        let encoded = serde_json::to_vec(value)?;
        write_atomic(path, &encoded)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| Error::checkpoint(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| Error::checkpoint(path, e))
}

fn write_atomic(path: &Path, encoded: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::checkpoint(path, "path has no file name"))?
        .to_string_lossy();
    let temp_path = parent.join(format!("{file_name}.tmp-{}", process::id()));

    let result = (|| -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&temp_path)?;
        file.write_all(encoded)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if let Err(err) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::checkpoint(path, err));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DataUnit, TimeUnit};
    use crate::params::WindowRange;
    use boss_core::{sequential, Dataset};
    use boss_sfa::SfaParams;
    use rand::{RngCore, SeedableRng};

    fn state(fp: &str) -> EnsembleState {
        EnsembleState {
            fingerprint: fp.to_string(),
            rng: ChaCha8Rng::seed_from_u64(11),
            current_channel: 1,
            total_built: 7,
            build_nanos: 1_000,
            checkpoint_nanos: 20,
            channels: vec![ChannelState {
                pool: ParameterPool::full(&WindowRange { min: 10, max: 12, step: 2 }),
                history: History::default(),
                built: 7,
                worst_index: Some(2),
                worst_accuracy: 0.5,
                num_members: 3,
            }],
        }
    }

    #[test]
    fn test_fingerprint() {
        let cfg = BossConfig::default()
            .with_mode(EnsembleMode::RandomBounded)
            .with_max_ensemble_size(50)
            .with_confidence_weighting(true);
        assert_eq!(fingerprint(&cfg), "S50M50W");

        let cfg = BossConfig::default()
            .with_mode(EnsembleMode::Random)
            .with_time_contract(TimeUnit::Seconds, 2)
            .with_memory_contract(DataUnit::Megabytes, 1);
        assert_eq!(fingerprint(&cfg), "TTC2000000000MC1048576");
    }

    #[test]
    fn test_state_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = BossConfig::default().with_mode(EnsembleMode::Random).with_seed(3);
        let manager = CheckpointManager::new(&CheckpointConfig::new(dir.path()), "Toy", &cfg);
        assert!(manager.directory().ends_with("Toy3BOSSS50"));
        assert!(!manager.has_state());

        let mut saved = state(manager.fingerprint());
        saved.rng.next_u64();
        manager.save_state(&saved).unwrap();
        assert!(manager.has_state());

        let mut loaded = manager.load_state().unwrap();
        assert_eq!(loaded.channels, saved.channels);
        assert_eq!(loaded.total_built, 7);
        // the generator resumes where it left off
        assert_eq!(loaded.rng.next_u64(), saved.rng.next_u64());

        manager.remove().unwrap();
        assert!(!manager.directory().exists());
    }

    #[test]
    fn test_member_round_trip_and_failures() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = BossConfig::default().with_mode(EnsembleMode::Random);
        let manager = CheckpointManager::new(&CheckpointConfig::new(dir.path()), "Toy", &cfg);

        let series = (0..6)
            .map(|i| (0..20).map(|t| ((t + i) as f64 * 0.4).sin()).collect())
            .collect();
        let data = Dataset::univariate(series, vec![0, 1, 0, 1, 0, 1]).unwrap();
        let model = BossIndividual::fit(SfaParams::new(8, 10, true), &data, true, &sequential()).unwrap();
        manager.save_member(0, 4, &model).unwrap();
        let back = manager.load_member(0, 4).unwrap();
        assert_eq!(back.bags(), model.bags());

        assert!(matches!(manager.load_member(0, 5), Err(Error::Checkpoint(_))));

        fs::write(manager.directory().join("ensemble.json"), b"{ not json").unwrap();
        assert!(matches!(manager.load_state(), Err(Error::Checkpoint(_))));

        let other = state("S10");
        manager.save_state(&other).unwrap();
        assert!(matches!(manager.load_state(), Err(Error::Checkpoint(_))));
    }
}
