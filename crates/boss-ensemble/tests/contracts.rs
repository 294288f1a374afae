//! Time and memory contracts

mod common;

use std::time::{Duration, Instant};

use boss_core::prelude::*;
use boss_ensemble::prelude::*;
use boss_ensemble::{MemoryAccounting, SurrogateConfig};
use common::{init_tracing, multichannel, sine_classes};

#[test]
fn test_expired_time_contract_builds_nothing_more() {
    init_tracing();
    let data = sine_classes(10, 24, 2, 0.1, 3);
    for mode in [EnsembleMode::Random, EnsembleMode::RandomBounded] {
        let config = BossConfig::default()
            .with_mode(mode)
            .with_time_contract(TimeUnit::Nanoseconds, 1);
        let mut boss = Boss::new(config);
        boss.fit(&data).unwrap();
        assert!(boss.report().built <= 1, "{mode:?} kept building past its contract");
        assert_eq!(boss.report().retained, boss.num_members());
        if boss.num_members() == 0 {
            assert!(boss.predict(data.instance(0)).is_err());
        } else {
            assert!(boss.predict(data.instance(0)).is_ok());
        }
    }
}

#[test]
fn test_expired_contract_does_not_fill_every_channel() {
    let data = multichannel(10, 24, 5, 12);
    for mode in [EnsembleMode::Random, EnsembleMode::RandomBounded] {
        let config = BossConfig::default()
            .with_mode(mode)
            .with_time_contract(TimeUnit::Nanoseconds, 1);
        let mut boss = Boss::new(config);
        boss.fit(&data).unwrap();
        assert!(boss.report().built <= 1, "{mode:?} built {}", boss.report().built);
    }
}

#[test]
fn test_time_contract_finishes_within_slack() {
    let data = sine_classes(40, 128, 2, 0.3, 14);
    let contract = Duration::from_millis(300);
    for mode in [EnsembleMode::Random, EnsembleMode::RandomBounded] {
        let config = BossConfig::default()
            .with_mode(mode)
            .with_max_ensemble_size(10)
            .with_time_contract(TimeUnit::Nanoseconds, contract.as_nanos() as u64);
        let mut boss = Boss::new(config);
        let started = Instant::now();
        boss.fit(&data).unwrap();
        let took = started.elapsed();

        // one candidate may start just before the deadline
        let slack = Duration::from_secs(5);
        assert!(took < contract + slack, "{mode:?} took {took:?}");
        assert!(Duration::from_nanos(boss.report().build_nanos) < contract + slack);
        if boss.report().built > 0 {
            assert!(boss.num_members() > 0, "{mode:?} finished candidates but kept none");
        }
    }
}

#[test]
fn test_time_contract_replaces_target_size() {
    let data = sine_classes(10, 24, 2, 0.1, 4);
    let config = BossConfig::default()
        .with_mode(EnsembleMode::RandomBounded)
        .with_ensemble_size(1000)
        .with_max_ensemble_size(5)
        .with_time_contract(TimeUnit::Seconds, 1);
    let mut boss = Boss::new(config);
    boss.fit(&data).unwrap();
    // 80 candidates exist; the pool or the clock stops the build, not the target
    assert!(boss.report().built <= 80);
    assert!(boss.members(0).len() <= 5);
}

#[test]
fn test_memory_contract_limits_growth() {
    let data = sine_classes(10, 24, 2, 0.1, 6);
    let config = BossConfig::default()
        .with_mode(EnsembleMode::Random)
        .with_ensemble_size(50)
        .with_memory_contract(DataUnit::Bytes, 1);
    let mut boss = Boss::new(config);
    boss.fit(&data).unwrap();
    // the first member alone exhausts a one byte budget
    assert_eq!(boss.num_members(), 1);
}

#[test]
fn test_surrogate_prunes_under_memory_contract() {
    let data = sine_classes(10, 24, 2, 0.1, 7);
    let config = BossConfig::default()
        .with_mode(EnsembleMode::Random)
        .with_ensemble_size(40)
        .with_memory_contract(DataUnit::Megabytes, 64)
        .with_surrogate(SurrogateConfig {
            warmup: 2,
            ..SurrogateConfig::default()
        });
    let mut boss = Boss::new(config);
    boss.fit(&data).unwrap();
    assert_eq!(boss.num_members(), 40);
}

#[test]
fn test_memory_contract_prunes_without_surrogate() {
    let data = sine_classes(10, 24, 2, 0.1, 9);
    let base = BossConfig::default().with_mode(EnsembleMode::Random).with_seed(5);

    let mut single = Boss::new(base.clone().with_ensemble_size(1));
    single.fit(&data).unwrap();
    let footprint = single.channel(0).unwrap().footprint_bytes() as u64;
    assert!(footprint > 0);

    // room for half of another member: every remaining candidate is
    // predicted too large and dropped before it is built
    let config = base
        .with_ensemble_size(50)
        .with_memory_contract(DataUnit::Bytes, footprint + footprint / 2);
    assert!(config.surrogate.is_none());
    let mut boss = Boss::new(config);
    boss.fit(&data).unwrap();
    assert_eq!(boss.report().built, 1);
    assert_eq!(boss.num_members(), 1);
    assert_eq!(boss.describe(), single.describe());
    assert!(boss.channel(0).unwrap().pool().is_empty());
}

#[test]
fn test_memory_contract_without_accounting_fails_fast() {
    let data = sine_classes(10, 24, 2, 0.1, 8);
    let config = BossConfig::default()
        .with_mode(EnsembleMode::Random)
        .with_memory_contract(DataUnit::Gigabytes, 1)
        .with_memory_accounting(MemoryAccounting::Unavailable);
    let err = Boss::new(config).fit(&data).unwrap_err();
    assert!(matches!(err, Error::FeatureNotAvailable(_)));
}

#[test]
fn test_unit_strings() {
    let config = BossConfig::default()
        .with_time_contract_str("minutes", 2)
        .unwrap()
        .with_memory_contract_str("MB", 10)
        .unwrap();
    assert_eq!(config.time_contract.unwrap().nanos(), 120_000_000_000);
    assert_eq!(config.memory_contract.unwrap().bytes(), 10 * 1024 * 1024);

    assert!(BossConfig::default().with_time_contract_str("weeks", 1).is_err());
}
