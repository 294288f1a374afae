//! End-to-end builds of every strategy

mod common;

use boss_core::prelude::*;
use boss_ensemble::prelude::*;
use boss_ensemble::{FastEstimate, CORRECT_THRESHOLD, SurrogateConfig, TrainSubsample};
use common::{init_tracing, multichannel, sine_classes};

#[test]
fn test_greedy_two_class_is_reproducible() {
    init_tracing();
    let data = sine_classes(10, 24, 2, 0.1, 42);

    let mut first = Boss::new(BossConfig::default());
    first.fit(&data).unwrap();
    let mut second = Boss::new(BossConfig::default());
    second.fit(&data).unwrap();

    assert!(first.num_members() > 0);
    assert_eq!(first.describe(), second.describe());
    assert_eq!(first.predict_batch(&data).unwrap(), second.predict_batch(&data).unwrap());

    // greedy keeps every window: 8 sizes, both normalizations
    assert_eq!(first.report().built, 16);
    assert!(!first.report().interrupted);
}

#[test]
fn test_greedy_members_stay_within_threshold_of_best() {
    let data = sine_classes(16, 32, 2, 0.3, 5);
    let mut boss = Boss::new(BossConfig::default());
    boss.fit(&data).unwrap();

    let members = boss.members(0);
    let best = members.iter().filter_map(|m| m.accuracy()).fold(0.0, f64::max);
    for m in members {
        let acc = m.accuracy().unwrap();
        assert!(acc >= best * CORRECT_THRESHOLD, "{} below cutoff of {best}", m.params());
        assert!(m.is_clean());
    }
}

#[test]
fn test_greedy_cap_is_respected() {
    let data = sine_classes(12, 40, 2, 0.5, 9);
    let mut boss = Boss::new(BossConfig::default().with_max_ensemble_size(3));
    boss.fit(&data).unwrap();
    assert!(boss.num_members() <= 3);
    assert!(boss.num_members() >= 1);
}

#[test]
fn test_multivariate_greedy_prunes_per_channel() {
    let data = multichannel(12, 24, 2, 3);
    let mut boss = Boss::new(BossConfig::default());
    boss.fit(&data).unwrap();

    assert_eq!(boss.num_channels(), 2);
    for c in 0..2 {
        let members = boss.members(c);
        assert!(!members.is_empty(), "channel {c} lost all members");
        let best = members.iter().filter_map(|m| m.accuracy()).fold(0.0, f64::max);
        assert!(members.iter().all(|m| m.accuracy().unwrap() >= best * CORRECT_THRESHOLD));
    }

    let query = data.instance(1).clone();
    let dist = boss.predict_proba(&query).unwrap();
    assert_eq!(dist.len(), 2);
    assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-9);
}

#[test]
fn test_random_target_split_across_channels() {
    let data = multichannel(10, 24, 3, 11);
    let config = BossConfig::default()
        .with_mode(EnsembleMode::Random)
        .with_ensemble_size(9)
        .with_seed(1);
    let mut boss = Boss::new(config);
    boss.fit(&data).unwrap();

    for c in 0..3 {
        assert_eq!(boss.members(c).len(), 3, "channel {c}");
    }
    assert_eq!(boss.report().built, 9);
}

#[test]
fn test_timed_random_build_stops_when_last_channel_is_full() {
    let data = multichannel(10, 24, 3, 15);
    let config = BossConfig::default()
        .with_mode(EnsembleMode::Random)
        .with_max_ensemble_size(2)
        .with_time_contract(TimeUnit::Minutes, 1)
        .with_seed(9);
    let mut boss = Boss::new(config);
    boss.fit(&data).unwrap();

    for c in 0..3 {
        assert_eq!(boss.members(c).len(), 2, "channel {c}");
    }
    assert_eq!(boss.report().built, 6);
}

#[test]
fn test_greedy_sweep_ignores_contracts() {
    let data = sine_classes(10, 24, 2, 0.1, 42);
    let config = BossConfig::default()
        .with_time_contract(TimeUnit::Nanoseconds, 1)
        .with_memory_contract(DataUnit::Bytes, 1);
    let mut boss = Boss::new(config);
    boss.fit(&data).unwrap();

    let mut unconstrained = Boss::new(BossConfig::default());
    unconstrained.fit(&data).unwrap();
    assert_eq!(boss.report().built, 16);
    assert_eq!(boss.describe(), unconstrained.describe());
}

#[test]
fn test_bounded_never_exceeds_cap() {
    let data = sine_classes(12, 32, 3, 0.2, 13);
    let config = BossConfig::default()
        .with_mode(EnsembleMode::RandomBounded)
        .with_ensemble_size(15)
        .with_max_ensemble_size(4)
        .with_seed(2);
    let mut boss = Boss::new(config);
    boss.fit(&data).unwrap();

    assert_eq!(boss.report().built, 15);
    assert_eq!(boss.members(0).len(), 4);
    let channel = boss.channel(0).unwrap();
    assert_eq!(channel.built(), 15);
    assert!(boss.members(0).iter().all(|m| m.accuracy().is_some()));
}

#[test]
fn test_bounded_cutoff_drops_weak_members() {
    let data = sine_classes(12, 32, 2, 0.8, 17);
    let config = BossConfig::default()
        .with_mode(EnsembleMode::RandomBounded)
        .with_ensemble_size(12)
        .with_max_ensemble_size(6)
        .with_cutoff(true)
        .with_seed(4);
    let mut boss = Boss::new(config);
    boss.fit(&data).unwrap();

    let members = boss.members(0);
    let best = members.iter().filter_map(|m| m.accuracy()).fold(0.0, f64::max);
    assert!(!members.is_empty());
    assert!(members.iter().all(|m| m.accuracy().unwrap() >= best * CORRECT_THRESHOLD));
}

#[test]
fn test_randomized_preset_with_subsample_and_weights() {
    let data = sine_classes(20, 32, 2, 0.2, 21);
    let config = BossConfig::randomized()
        .with_ensemble_size(6)
        .with_max_ensemble_size(3)
        .with_train_subsample(TrainSubsample::default().with_proportion(0.5))
        .with_fast_estimate(FastEstimate {
            max_eval: 8,
            max_eval_per_class: None,
        })
        .with_seed(8);
    let mut boss = Boss::new(config);
    boss.fit(&data).unwrap();

    for m in boss.members(0) {
        assert_eq!(m.subsample().map(<[usize]>::len), Some(10));
        assert_eq!(m.num_train(), 10);
        let acc = m.accuracy().unwrap();
        let expected = if acc > 0.0 { acc.powi(4) } else { 1.0 };
        assert!((m.weight() - expected).abs() < 1e-12);
    }

    let estimate = boss.train_estimate(&data).unwrap();
    assert_eq!(estimate.predictions.len(), 20);
    assert_eq!(estimate.distributions.len(), 20);
    assert!((0.0..=1.0).contains(&estimate.accuracy));
}

#[test]
fn test_surrogate_guided_random_build() {
    let data = sine_classes(12, 40, 2, 0.2, 23);
    let config = BossConfig::default()
        .with_mode(EnsembleMode::Random)
        .with_ensemble_size(6)
        .with_surrogate(SurrogateConfig {
            warmup: 3,
            ..SurrogateConfig::default()
        })
        .with_seed(6);
    let mut boss = Boss::new(config);
    boss.fit(&data).unwrap();

    let channel = boss.channel(0).unwrap();
    assert_eq!(channel.len(), 6);
    assert_eq!(channel.history().tried.len(), 6);
    assert_eq!(channel.history().warmup_draws, 3);

    let mut tried = channel.history().tried.clone();
    tried.sort();
    tried.dedup();
    assert_eq!(tried.len(), 6, "a candidate was drawn twice");
}

#[test]
fn test_tiny_subsample_still_estimates() {
    // 5% of 20 instances floors to 1; candidates still train on two
    let data = sine_classes(20, 32, 2, 0.2, 25);
    let config = BossConfig::default()
        .with_mode(EnsembleMode::RandomBounded)
        .with_ensemble_size(4)
        .with_max_ensemble_size(4)
        .with_train_subsample(TrainSubsample::default().with_proportion(0.05))
        .with_seed(10);
    let mut boss = Boss::new(config);
    boss.fit(&data).unwrap();

    assert_eq!(boss.num_members(), 4);
    assert!(boss.members(0).iter().all(|m| m.num_train() == 2));
    let estimate = boss.train_estimate(&data).unwrap();
    assert_eq!(estimate.predictions.len(), 20);
}

#[test]
fn test_worker_threads_do_not_change_the_ensemble() {
    let data = sine_classes(14, 32, 2, 0.2, 27);
    let configs = [
        BossConfig::default(),
        BossConfig::default()
            .with_mode(EnsembleMode::Random)
            .with_ensemble_size(6)
            .with_confidence_weighting(true)
            .with_seed(3),
    ];
    for config in configs {
        let mut sequential = Boss::new(config.clone().with_num_threads(1));
        sequential.fit(&data).unwrap();
        let mut threaded = Boss::new(config.with_num_threads(4));
        threaded.fit(&data).unwrap();

        assert_eq!(sequential.describe(), threaded.describe());
        assert_eq!(sequential.predict_batch(&data).unwrap(), threaded.predict_batch(&data).unwrap());
        let seq = sequential.train_estimate(&data).unwrap();
        let par = threaded.train_estimate(&data).unwrap();
        assert_eq!(seq.accuracy, par.accuracy);
        assert_eq!(seq.distributions, par.distributions);
    }
}

#[test]
fn test_fewer_than_two_instances_rejected() {
    let data = Dataset::univariate(vec![vec![0.0; 24]], vec![0]).unwrap();
    let err = Boss::new(BossConfig::default()).fit(&data).unwrap_err();
    assert!(matches!(err, Error::InsufficientData { expected: 2, actual: 1 }));
}

#[test]
fn test_unfitted_ensemble_cannot_predict() {
    let boss = Boss::new(BossConfig::default());
    let query = Instance::univariate(vec![0.0; 24], None).unwrap();
    assert!(boss.predict(&query).is_err());
    assert!(boss.describe().is_empty());
}
