//! Weighted votes and class distributions
//!
//! Each channel turns its members' votes into a distribution normalized by
//! the channel's total weight. Channel distributions are then averaged with
//! equal weight.

use rand::Rng;

/// Normalized weighted vote of one channel
///
/// `votes` are `(class, weight)` pairs. A channel with no votes (or zero
/// total weight) contributes all zeros.
pub fn channel_distribution(votes: &[(usize, f64)], num_classes: usize) -> Vec<f64> {
    let mut dist = vec![0.0; num_classes];
    let mut total = 0.0;
    for &(class, weight) in votes {
        if class < num_classes {
            dist[class] += weight;
            total += weight;
        }
    }
    if total > 0.0 {
        for p in &mut dist {
            *p /= total;
        }
    }
    dist
}

/// Uniform average of per-channel distributions
pub fn average(distributions: &[Vec<f64>], num_classes: usize) -> Vec<f64> {
    let mut out = vec![0.0; num_classes];
    if distributions.is_empty() {
        return out;
    }
    for dist in distributions {
        for (o, p) in out.iter_mut().zip(dist) {
            *o += p;
        }
    }
    let k = distributions.len() as f64;
    for o in &mut out {
        *o /= k;
    }
    out
}

/// Arg max, breaking ties uniformly at random
pub fn argmax_random_tie<R: Rng + ?Sized>(dist: &[f64], rng: &mut R) -> Option<usize> {
    let best = dist.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let tied: Vec<usize> = dist
        .iter()
        .enumerate()
        .filter(|&(_, &p)| p == best)
        .map(|(i, _)| i)
        .collect();
    match tied.len() {
        0 => None,
        1 => Some(tied[0]),
        n => Some(tied[rng.gen_range(0..n)]),
    }
}

/// Voting weight of a model with train accuracy `accuracy`
///
/// `accuracy^4` when confidence weighting is on, replaced by 1 when that is
/// zero; 1 otherwise.
pub fn member_weight(accuracy: f64, confidence_weighting: bool) -> f64 {
    if !confidence_weighting {
        return 1.0;
    }
    let w = accuracy.powi(4);
    if w > 0.0 {
        w
    } else {
        1.0
    }
}
