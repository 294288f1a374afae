//! Leave-one-out train accuracy of a single model
//!
//! Evaluation can stop early: once even a perfect run over the remaining
//! instances could not reach the accuracy a candidate must beat, it is
//! abandoned. Abandoning needs a running count, so it only happens when the
//! engine is sequential.

use boss_core::ExecutionEngine;
use boss_sfa::{leave_one_out, Bag};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::FastEstimate;
use crate::sampling::class_round_robin_indices;

/// Outcome of a train accuracy estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainEstimate {
    /// `correct / scheduled`, counting only what was seen when abandoned
    pub accuracy: f64,
    pub correct: usize,
    /// Instances actually classified
    pub evaluated: usize,
    /// Instances that were scheduled
    pub scheduled: usize,
    pub abandoned: bool,
}

impl TrainEstimate {
    /// Accuracy to learn from when predicting candidate quality
    ///
    /// An abandoned estimate only shows the accuracy stayed below `bound`,
    /// so the bound stands in for the partial count.
    pub fn observed_accuracy(&self, bound: f64) -> f64 {
        if self.abandoned {
            bound
        } else {
            self.accuracy
        }
    }
}

/// Instances a train estimate should classify
///
/// With a fast estimate whose cap is below `labels.len()`, a class
/// round-robin sample of the cap; otherwise every instance in order.
pub fn evaluation_indices<R: Rng + ?Sized>(
    labels: &[usize],
    num_classes: usize,
    fast: Option<&FastEstimate>,
    rng: &mut R,
) -> Vec<usize> {
    match fast {
        Some(fast) if fast.cap(num_classes) < labels.len() => {
            class_round_robin_indices(labels, num_classes, fast.cap(num_classes), rng)
        }
        _ => (0..labels.len()).collect(),
    }
}

/// Number of correct predictions needed to reach `lowest_accuracy`
#[inline]
pub fn required_correct(lowest_accuracy: f64, scheduled: usize) -> i64 {
    (lowest_accuracy * scheduled as f64).floor() as i64
}

/// Leave-one-out accuracy of `bags` over `indices`
///
/// Sequential engines abandon as soon as `correct + remaining` drops
/// strictly below [`required_correct`]; ending exactly on the requirement is
/// not abandoned. A `lowest_accuracy <= 0` never abandons.
pub fn leave_one_out_accuracy<E: ExecutionEngine>(
    bags: &[Bag],
    indices: &[usize],
    lowest_accuracy: f64,
    engine: &E,
) -> TrainEstimate {
    let scheduled = indices.len();
    if scheduled == 0 {
        return TrainEstimate {
            accuracy: 0.0,
            correct: 0,
            evaluated: 0,
            scheduled,
            abandoned: false,
        };
    }

    let hit = |i: usize| -> bool {
        let truth = bags[i].label();
        truth.is_some() && leave_one_out(i, bags).and_then(|nn| nn.label) == truth
    };

    if engine.is_parallel() {
        let correct = engine
            .execute_batch(scheduled, |k| hit(indices[k]))
            .into_iter()
            .filter(|&h| h)
            .count();
        return TrainEstimate {
            accuracy: correct as f64 / scheduled as f64,
            correct,
            evaluated: scheduled,
            scheduled,
            abandoned: false,
        };
    }

    let required = required_correct(lowest_accuracy, scheduled);
    let mut correct = 0usize;
    for (k, &i) in indices.iter().enumerate() {
        let remaining = (scheduled - k) as i64;
        if (correct as i64) + remaining < required {
            trace!(correct, evaluated = k, required, "abandoned train estimate");
            return TrainEstimate {
                accuracy: correct as f64 / scheduled as f64,
                correct,
                evaluated: k,
                scheduled,
                abandoned: true,
            };
        }
        if hit(i) {
            correct += 1;
        }
    }

    TrainEstimate {
        accuracy: correct as f64 / scheduled as f64,
        correct,
        evaluated: scheduled,
        scheduled,
        abandoned: false,
    }
}
