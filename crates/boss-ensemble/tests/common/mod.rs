//! Shared utilities for integration tests

#![allow(dead_code)]

use boss_core::Dataset;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Install a test-friendly tracing subscriber once; `RUST_LOG` controls it
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Class `k` is a sine at frequency `k + 1` with a random phase and noise
pub fn sine_classes(n: usize, length: usize, num_classes: usize, noise: f64, seed: u64) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(0.0, noise.max(1e-12)).expect("valid noise");
    let mut series = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let class = i % num_classes;
        series.push(sine(length, class, &normal, &mut rng));
        labels.push(class);
    }
    Dataset::univariate(series, labels).expect("valid dataset").with_name("Sines")
}

/// Like [`sine_classes`] but with `channels` channels; only the first
/// channel carries the class signal
pub fn multichannel(n: usize, length: usize, channels: usize, seed: u64) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 0.1).expect("valid noise");
    let mut instances = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let class = i % 2;
        let chans = (0..channels)
            .map(|c| {
                let freq = if c == 0 { class } else { (i / 2) % 2 };
                sine(length, freq, &normal, &mut rng)
            })
            .collect();
        instances.push(chans);
        labels.push(class);
    }
    Dataset::multivariate(instances, labels).expect("valid dataset").with_name("Multi")
}

fn sine(length: usize, class: usize, noise: &Normal<f64>, rng: &mut ChaCha8Rng) -> Vec<f64> {
    let phase = rand::Rng::gen_range(rng, 0.0..std::f64::consts::TAU);
    let freq = (class + 1) as f64 * std::f64::consts::TAU / length as f64 * 2.0;
    (0..length)
        .map(|t| (t as f64 * freq + phase).sin() + noise.sample(rng))
        .collect()
}
