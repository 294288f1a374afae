//! Index samplers over labelled training sets
//!
//! All samplers draw without replacement and take the RNG by reference so
//! the caller's stream (and therefore checkpoints) stay reproducible.

use rand::seq::SliceRandom;
use rand::Rng;

fn shuffled_by_class<R: Rng + ?Sized>(labels: &[usize], num_classes: usize, rng: &mut R) -> Vec<Vec<usize>> {
    let mut by_class = vec![Vec::new(); num_classes];
    for (i, &label) in labels.iter().enumerate() {
        by_class[label].push(i);
    }
    for members in &mut by_class {
        members.shuffle(rng);
    }
    by_class
}

/// `count` indices drawn uniformly from `0..n`
pub fn random_indices<R: Rng + ?Sized>(n: usize, count: usize, rng: &mut R) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(count);
    indices
}

/// `count` indices keeping class proportions as close as possible
///
/// Each draw goes to the class whose share of the sample lags furthest
/// behind its share of the full set.
pub fn stratified_indices<R: Rng + ?Sized>(
    labels: &[usize],
    num_classes: usize,
    count: usize,
    rng: &mut R,
) -> Vec<usize> {
    let n = labels.len();
    let count = count.min(n);
    let mut by_class = shuffled_by_class(labels, num_classes, rng);
    let totals: Vec<usize> = by_class.iter().map(Vec::len).collect();
    let mut taken = vec![0usize; num_classes];
    let mut out = Vec::with_capacity(count);

    for k in 1..=count {
        // deficits scaled by n to stay in exact integer arithmetic
        let mut best: Option<(usize, i64)> = None;
        for c in 0..num_classes {
            if taken[c] == totals[c] {
                continue;
            }
            let deficit = (totals[c] * k) as i64 - (taken[c] * n) as i64;
            if best.map_or(true, |(_, d)| deficit > d) {
                best = Some((c, deficit));
            }
        }
        let Some((c, _)) = best else { break };
        if let Some(i) = by_class[c].pop() {
            out.push(i);
            taken[c] += 1;
        }
    }

    out
}

/// `count` indices visiting classes in turn, a random unused member of each
///
/// Exhausted classes are skipped, so at most `labels.len()` indices come
/// back.
pub fn class_round_robin_indices<R: Rng + ?Sized>(
    labels: &[usize],
    num_classes: usize,
    count: usize,
    rng: &mut R,
) -> Vec<usize> {
    let count = count.min(labels.len());
    let mut by_class = shuffled_by_class(labels, num_classes, rng);
    let mut out = Vec::with_capacity(count);
    let mut class = 0;

    while out.len() < count {
        if let Some(i) = by_class[class].pop() {
            out.push(i);
        }
        class = (class + 1) % num_classes;
    }

    out
}
