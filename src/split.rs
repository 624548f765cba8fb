//! Stratified train/test splitting.
//!
//! Rows are grouped by label, each class is allotted a share of the train and
//! test sets proportional to its size, and the leftover rows created by
//! rounding are handed out at random among the classes with the largest
//! fractional remainder.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Number of shuffle splits drawn from the seeded stream
    pub n_splits: usize,
    /// Fraction of rows that go to the test set, in (0, 1)
    pub test_size: f64,
    pub random_state: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            n_splits: 2,
            test_size: 0.15,
            random_state: 22,
        }
    }
}

/// Row positions selected for each side of one split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct TrainTestSplit<T, L> {
    pub train_features: Vec<T>,
    pub train_labels: Vec<L>,
    pub test_features: Vec<T>,
    pub test_labels: Vec<L>,
    pub indices: SplitIndices,
}

/// Generator of repeated stratified shuffle splits.
#[derive(Debug, Clone)]
pub struct StratifiedShuffleSplit {
    config: SplitConfig,
}

impl StratifiedShuffleSplit {
    pub fn new(config: SplitConfig) -> Result<Self> {
        if config.n_splits == 0 {
            return Err(Error::InvalidParameter("n_splits must be at least 1".into()));
        }
        if !(config.test_size > 0.0 && config.test_size < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "test_size must be in (0, 1), got {}",
                config.test_size
            )));
        }
        Ok(StratifiedShuffleSplit { config })
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Validate the labels and return an iterator over `n_splits` splits.
    ///
    /// Every split is drawn from the same RNG stream, so the k-th split only
    /// depends on the seed and the labels.
    pub fn split<L: Ord>(&self, labels: &[L]) -> Result<Splits> {
        let n_samples = labels.len();
        if n_samples == 0 {
            return Err(Error::EmptyDataset);
        }

        let n_test = (self.config.test_size * n_samples as f64).ceil() as usize;
        let n_train = n_samples.saturating_sub(n_test);
        if n_train == 0 {
            return Err(Error::EmptyPartition {
                n_samples,
                test_size: self.config.test_size,
                side: "train",
            });
        }
        if n_test == 0 {
            return Err(Error::EmptyPartition {
                n_samples,
                test_size: self.config.test_size,
                side: "test",
            });
        }

        // BTreeMap keeps classes in sorted label order and members in row order
        let mut classes: BTreeMap<&L, Vec<usize>> = BTreeMap::new();
        for (row, label) in labels.iter().enumerate() {
            classes.entry(label).or_default().push(row);
        }
        let class_indices: Vec<Vec<usize>> = classes.into_values().collect();
        let class_counts: Vec<usize> = class_indices.iter().map(Vec::len).collect();

        if let Some(&smallest) = class_counts.iter().min() {
            if smallest < 2 {
                return Err(Error::ClassTooSmall(smallest));
            }
        }
        let n_classes = class_counts.len();
        if n_train < n_classes {
            return Err(Error::TooFewSamples {
                side: "train",
                size: n_train,
                classes: n_classes,
            });
        }
        if n_test < n_classes {
            return Err(Error::TooFewSamples {
                side: "test",
                size: n_test,
                classes: n_classes,
            });
        }

        debug!(n_samples, n_train, n_test, n_classes, "Prepared stratified splitter");

        Ok(Splits {
            class_indices,
            class_counts,
            n_train,
            n_test,
            remaining: self.config.n_splits,
            rng: ChaCha8Rng::seed_from_u64(self.config.random_state),
        })
    }
}

/// Iterator returned by [`StratifiedShuffleSplit::split`].
pub struct Splits {
    class_indices: Vec<Vec<usize>>,
    class_counts: Vec<usize>,
    n_train: usize,
    n_test: usize,
    remaining: usize,
    rng: ChaCha8Rng,
}

impl Iterator for Splits {
    type Item = SplitIndices;

    fn next(&mut self) -> Option<SplitIndices> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let train_counts = approximate_mode(&self.class_counts, self.n_train, &mut self.rng);
        let left_over: Vec<usize> = self
            .class_counts
            .iter()
            .zip(&train_counts)
            .map(|(&count, &taken)| count.saturating_sub(taken))
            .collect();
        let test_counts = approximate_mode(&left_over, self.n_test, &mut self.rng);

        let mut train = Vec::with_capacity(self.n_train);
        let mut test = Vec::with_capacity(self.n_test);
        for (class, members) in self.class_indices.iter().enumerate() {
            let mut permuted = members.clone();
            permuted.shuffle(&mut self.rng);

            let n_i = train_counts[class].min(permuted.len());
            let t_i = test_counts[class].min(permuted.len() - n_i);
            train.extend_from_slice(&permuted[..n_i]);
            test.extend_from_slice(&permuted[n_i..n_i + t_i]);
        }

        train.shuffle(&mut self.rng);
        test.shuffle(&mut self.rng);

        Some(SplitIndices { train, test })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Distribute `n_draws` among classes proportionally to `class_counts`.
///
/// Classes first get the floor of their exact share. The shortfall goes to
/// the classes with the largest fractional remainders; ties between equal
/// remainders are broken at random.
fn approximate_mode<R: Rng + ?Sized>(class_counts: &[usize], n_draws: usize, rng: &mut R) -> Vec<usize> {
    let total: usize = class_counts.iter().sum();
    if total == 0 {
        return vec![0; class_counts.len()];
    }

    let continuous: Vec<f64> = class_counts
        .iter()
        .map(|&count| count as f64 / total as f64 * n_draws as f64)
        .collect();
    let mut floored: Vec<usize> = continuous.iter().map(|c| c.floor() as usize).collect();
    let mut need_to_add = n_draws.saturating_sub(floored.iter().sum());

    if need_to_add > 0 {
        let remainder: Vec<f64> = continuous
            .iter()
            .zip(&floored)
            .map(|(&c, &f)| c - f as f64)
            .collect();
        let mut values = remainder.clone();
        values.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
        values.dedup();

        for value in values {
            let candidates: Vec<usize> = remainder
                .iter()
                .enumerate()
                .filter(|&(_, &r)| r == value)
                .map(|(i, _)| i)
                .collect();
            let add_now = candidates.len().min(need_to_add);
            for &class in candidates.choose_multiple(rng, add_now) {
                floored[class] += 1;
            }
            need_to_add -= add_now;
            if need_to_add == 0 {
                break;
            }
        }
    }

    floored
}

/// Split a labeled dataset into train and test subsets that preserve the
/// label proportions.
///
/// `n_splits` splits are generated from the seeded stream and the last one is
/// returned. Use [`StratifiedShuffleSplit`] directly to get all of them.
pub fn stratified_split<T: Clone, L: Ord + Clone>(
    features: &[T],
    labels: &[L],
    config: &SplitConfig,
) -> Result<TrainTestSplit<T, L>> {
    if features.len() != labels.len() {
        return Err(Error::ShapeMismatch {
            features: features.len(),
            labels: labels.len(),
        });
    }

    let splitter = StratifiedShuffleSplit::new(config.clone())?;
    let indices = splitter
        .split(labels)?
        .last()
        .ok_or_else(|| Error::InvalidParameter("n_splits must be at least 1".into()))?;

    let take = |rows: &[usize]| -> (Vec<T>, Vec<L>) {
        rows.iter()
            .map(|&row| (features[row].clone(), labels[row].clone()))
            .unzip()
    };
    let (train_features, train_labels) = take(&indices.train);
    let (test_features, test_labels) = take(&indices.test);

    info!(
        train = indices.train.len(),
        test = indices.test.len(),
        seed = config.random_state,
        "Stratified split"
    );

    Ok(TrainTestSplit {
        train_features,
        train_labels,
        test_features,
        test_labels,
        indices,
    })
}
