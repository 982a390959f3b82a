// ============================================================
// Layer 4 - Train/Validation Splitter
// ============================================================
// Shuffles the index range 0..N with a seeded Fisher-Yates
// permutation and cuts it into two disjoint index sets:
//
//   train:      first floor(N * train_fraction) indices
//   validation: the remainder
//
// The seed is explicit so a run (and its later evaluation) can
// reproduce the exact same partition. The same seed always
// yields the same permutation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Disjoint index sets covering 0..N.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train:      Vec<usize>,
    pub validation: Vec<usize>,
}

impl Split {
    pub fn total(&self) -> usize {
        self.train.len() + self.validation.len()
    }
}

/// Partition `0..total` into shuffled train/validation index sets.
///
/// Sizes are floor(total * train_fraction) and the remainder.
pub fn split_indices(total: usize, train_fraction: f64, seed: u64) -> Split {
    let mut indices: Vec<usize> = (0..total).collect();

    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let split_at = ((total as f64) * train_fraction).floor() as usize;
    let split_at = split_at.min(total);

    let validation = indices.split_off(split_at);

    tracing::debug!(
        "Dataset split (seed {}): {} training, {} validation",
        seed,
        indices.len(),
        validation.len(),
    );

    Split { train: indices, validation }
}

/// Materialize the two subsets of `items` named by a split.
pub fn partition<T: Clone>(items: &[T], split: &Split) -> (Vec<T>, Vec<T>) {
    let train = split.train.iter().map(|&i| items[i].clone()).collect();
    let validation = split.validation.iter().map(|&i| items[i].clone()).collect();
    (train, validation)
}

// --- Unit Tests --------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_correct_split_sizes() {
        let split = split_indices(1000, 0.8, 42);
        assert_eq!(split.train.len(), 800);
        assert_eq!(split.validation.len(), 200);
    }

    #[test]
    fn test_floor_rule_on_uneven_totals() {
        // floor(50 * 0.7) = 35
        let split = split_indices(50, 0.7, 1);
        assert_eq!(split.train.len(), 35);
        assert_eq!(split.validation.len(), 15);
    }

    #[test]
    fn test_disjoint_and_covering() {
        let split = split_indices(100, 0.8, 7);
        let train: HashSet<usize> = split.train.iter().copied().collect();
        let val:   HashSet<usize> = split.validation.iter().copied().collect();
        assert!(train.is_disjoint(&val));
        assert_eq!(train.len() + val.len(), 100);
        let union: HashSet<usize> = train.union(&val).copied().collect();
        assert_eq!(union, (0..100).collect());
    }

    #[test]
    fn test_same_seed_reproduces_the_split() {
        let a = split_indices(64, 0.8, 99);
        let b = split_indices(64, 0.8, 99);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = split_indices(64, 0.8, 1);
        let b = split_indices(64, 0.8, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_dataset() {
        let split = split_indices(0, 0.8, 0);
        assert!(split.train.is_empty());
        assert!(split.validation.is_empty());
    }

    #[test]
    fn test_full_training_split() {
        let split = split_indices(10, 1.0, 0);
        assert_eq!(split.train.len(), 10);
        assert!(split.validation.is_empty());
    }

    #[test]
    fn test_partition_follows_indices() {
        let items: Vec<usize> = (100..110).collect();
        let split = split_indices(10, 0.5, 3);
        let (train, val) = partition(&items, &split);
        assert_eq!(train.len(), 5);
        assert_eq!(val.len(), 5);
        for (&idx, &item) in split.train.iter().zip(train.iter()) {
            assert_eq!(item, items[idx]);
        }
    }
}
