//! Individual models and voting through the public API

use boss_core::{sequential, Dataset};
use boss_ensemble::voting::{average, channel_distribution};
use boss_ensemble::{leave_one_out_accuracy, BossIndividual, WORD_LENGTHS};
use boss_sfa::SfaParams;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

fn noisy_sines(n: usize, length: usize, seed: u64) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.2).unwrap();
    let series = (0..n)
        .map(|i| {
            let freq = if i % 2 == 0 { 0.25 } else { 0.9 };
            (0..length)
                .map(|t| (t as f64 * freq).sin() + noise.sample(&mut rng))
                .collect()
        })
        .collect();
    Dataset::univariate(series, (0..n).map(|i| i % 2).collect()).unwrap()
}

#[test]
fn test_shortened_models_score_like_direct_builds() {
    let data = noisy_sines(12, 40, 1);
    let parent = BossIndividual::fit(SfaParams::new(16, 12, true), &data, false, &sequential()).unwrap();
    let all: Vec<usize> = (0..data.num_instances()).collect();

    for &length in &WORD_LENGTHS[1..] {
        let derived = parent.derive_shortened(length).unwrap();
        let via_view = leave_one_out_accuracy(derived.bags(), &all, 0.0, &sequential());
        let owned = derived.into_owned().unwrap();
        let via_owned = leave_one_out_accuracy(owned.bags(), &all, 0.0, &sequential());
        assert_eq!(via_view.correct, via_owned.correct, "word length {length}");
        assert_eq!(owned.breakpoints().word_length(), length);
    }
}

#[test]
fn test_separable_classes_score_well() {
    let data = noisy_sines(16, 48, 2);
    let model = BossIndividual::fit(SfaParams::new(8, 16, true), &data, true, &sequential()).unwrap();
    let all: Vec<usize> = (0..data.num_instances()).collect();
    let estimate = leave_one_out_accuracy(model.bags(), &all, 0.0, &sequential());
    assert!(estimate.accuracy >= 0.7, "accuracy {}", estimate.accuracy);

    let test = noisy_sines(6, 48, 99);
    let correct = (0..6)
        .filter(|&i| model.classify(test.series(i, 0)).unwrap() == test.label(i))
        .count();
    assert!(correct >= 4);
}

proptest! {
    #[test]
    fn prop_channel_distribution_is_normalized(
        votes in prop::collection::vec((0usize..4, 0.01f64..2.0), 1..20)
    ) {
        let dist = channel_distribution(&votes, 4);
        prop_assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        prop_assert!(dist.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn prop_average_of_distributions_is_normalized(
        a in prop::collection::vec((0usize..3, 0.1f64..1.0), 1..10),
        b in prop::collection::vec((0usize..3, 0.1f64..1.0), 1..10),
    ) {
        let avg = average(&[channel_distribution(&a, 3), channel_distribution(&b, 3)], 3);
        prop_assert!((avg.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}
