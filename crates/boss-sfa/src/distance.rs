//! BOSS distance and nearest-neighbour search
//!
//! The distance only looks at words present in the query bag, so
//! `boss_distance(a, b) != boss_distance(b, a)` in general. Words the
//! reference has but the query lacks cost nothing.

use crate::bag::Bag;

/// Squared count difference over the query's words
///
/// Returns `f64::INFINITY` as soon as the running sum exceeds `best_so_far`.
#[inline]
pub fn boss_distance(query: &Bag, reference: &Bag, best_so_far: f64) -> f64 {
    let mut dist = 0.0;
    for (word, &count) in query.iter() {
        let diff = count as f64 - reference.count(word) as f64;
        dist += diff * diff;
        if dist > best_so_far {
            return f64::INFINITY;
        }
    }
    dist
}

/// Nearest neighbour of a query among `candidates`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour {
    pub index: usize,
    pub distance: f64,
    pub label: Option<usize>,
}

/// 1NN over `bags`, the first of equally close neighbours wins
pub fn nearest_neighbour(query: &Bag, bags: &[Bag]) -> Option<Neighbour> {
    nearest_excluding(query, bags, None)
}

/// 1NN of `bags[index]` among the other bags
///
/// `None` when there is no other bag to compare against.
pub fn leave_one_out(index: usize, bags: &[Bag]) -> Option<Neighbour> {
    let query = bags.get(index)?;
    nearest_excluding(query, bags, Some(index))
}

fn nearest_excluding(query: &Bag, bags: &[Bag], skip: Option<usize>) -> Option<Neighbour> {
    let mut best: Option<Neighbour> = None;
    let mut bound = f64::INFINITY;

    for (i, candidate) in bags.iter().enumerate() {
        if Some(i) == skip {
            continue;
        }
        let distance = boss_distance(query, candidate, bound);
        let improves = match best {
            None => true,
            Some(_) => distance < bound,
        };
        if improves {
            bound = distance;
            best = Some(Neighbour {
                index: i,
                distance,
                label: candidate.label(),
            });
        }
    }

    best
}
