//! Isolation Forest outlier scoring.
//!
//! Each tree repeatedly splits a random sub-sample on a random feature at a
//! random threshold. Points that are isolated after few splits are unusual;
//! the score `s(x) = 2^(-E[h(x)] / c(psi))` lies in (0, 1] and grows with
//! how easily a point is isolated.

use crate::cancellation::CancellationToken;
use crate::config::{DEFAULT_MAX_SAMPLES, DEFAULT_N_ESTIMATORS, DEFAULT_RANDOM_SEED};
use crate::error::{AnalyticsError, Result};
use crate::utils::{quantile_sorted, sorted_copy};
use ndarray::{Array2, ArrayView1};
use rand::prelude::*;
use rand::seq::index;
use tracing::debug;

/// Euler–Mascheroni constant, used to approximate harmonic numbers.
const EULER_GAMMA: f64 = 0.577_215_664_9;

/// Average path length of an unsuccessful search in a binary search tree
/// built from `n` points.
pub(crate) fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Isolation tree node.
#[derive(Debug, Clone)]
pub enum IsolationTree {
    /// Internal node with split.
    Internal {
        feature: usize,
        threshold: f64,
        /// Values `< threshold`.
        left: Box<IsolationTree>,
        /// Values `>= threshold`.
        right: Box<IsolationTree>,
    },
    /// Leaf holding the number of training points that reached it.
    External { size: usize },
}

impl IsolationTree {
    /// Grow a tree over the rows in `indices`.
    pub fn build(
        x: &Array2<f64>,
        indices: &[usize],
        depth: usize,
        max_depth: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let n_samples = indices.len();
        if depth >= max_depth || n_samples <= 1 {
            return IsolationTree::External { size: n_samples };
        }

        // Only features that still vary inside this node can split it.
        let candidates: Vec<(usize, f64, f64)> = (0..x.ncols())
            .filter_map(|feature| {
                let (min, max) = indices.iter().fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo, hi), &i| {
                        let v = x[[i, feature]];
                        (lo.min(v), hi.max(v))
                    },
                );
                (max > min).then_some((feature, min, max))
            })
            .collect();

        let Some(&(feature, min, max)) = candidates.choose(rng) else {
            return IsolationTree::External { size: n_samples };
        };

        let threshold = rng.gen_range(min..max);
        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature]] < threshold);

        if left_indices.is_empty() || right_indices.is_empty() {
            return IsolationTree::External { size: n_samples };
        }

        let left = Box::new(Self::build(x, &left_indices, depth + 1, max_depth, rng));
        let right = Box::new(Self::build(x, &right_indices, depth + 1, max_depth, rng));

        IsolationTree::Internal {
            feature,
            threshold,
            left,
            right,
        }
    }

    /// Edges from the root to the leaf reached by `sample`, plus the
    /// expected remaining depth for the points in that leaf.
    pub fn path_length(&self, sample: ArrayView1<'_, f64>) -> f64 {
        let mut node = self;
        let mut depth = 0usize;
        loop {
            match node {
                IsolationTree::External { size } => {
                    return depth as f64 + average_path_length(*size);
                }
                IsolationTree::Internal {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] < *threshold { left } else { right };
                    depth += 1;
                }
            }
        }
    }
}

/// Seeded isolation forest with a contamination-calibrated threshold.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    n_estimators: usize,
    max_samples: usize,
    contamination: f64,
    seed: u64,
    trees: Vec<IsolationTree>,
    /// Sub-sample size the trees were grown on.
    sample_size: usize,
    threshold: Option<f64>,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::new()
    }
}

impl IsolationForest {
    pub fn new() -> Self {
        Self {
            n_estimators: DEFAULT_N_ESTIMATORS,
            max_samples: DEFAULT_MAX_SAMPLES,
            contamination: 0.1,
            seed: DEFAULT_RANDOM_SEED,
            trees: Vec::new(),
            sample_size: 0,
            threshold: None,
        }
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n.max(1);
        self
    }

    pub fn with_max_samples(mut self, n: usize) -> Self {
        self.max_samples = n.max(1);
        self
    }

    /// Share of training rows expected to be labeled anomalous.
    ///
    /// Must lie in `(0, 0.5]`; [`fit`](Self::fit) rejects anything else.
    pub fn with_contamination(mut self, c: f64) -> Self {
        self.contamination = c;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.threshold.is_some()
    }

    /// Score cut-off learned during [`fit`](Self::fit).
    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    /// Grow the trees and calibrate the threshold on `x`.
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        self.fit_inner(x, None)
    }

    /// Like [`fit`](Self::fit), checking `token` before every tree.
    pub fn fit_with_cancellation(
        &mut self,
        x: &Array2<f64>,
        token: &CancellationToken,
    ) -> Result<()> {
        self.fit_inner(x, Some(token))
    }

    fn fit_inner(&mut self, x: &Array2<f64>, token: Option<&CancellationToken>) -> Result<()> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(AnalyticsError::InvalidConfig(format!(
                "contamination must be in (0, 0.5], got {}",
                self.contamination
            )));
        }
        let n_rows = x.nrows();
        if n_rows < 2 {
            return Err(AnalyticsError::invalid_input(format!(
                "isolation forest needs at least 2 rows, got {}",
                n_rows
            )));
        }
        if x.ncols() == 0 {
            return Err(AnalyticsError::invalid_input(
                "isolation forest needs at least one feature",
            ));
        }

        // A single-row sample would make c(psi) zero.
        let sample_size = self.max_samples.min(n_rows).max(2);
        let max_depth = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut trees = Vec::with_capacity(self.n_estimators);
        for _ in 0..self.n_estimators {
            if let Some(token) = token {
                token.check()?;
            }
            // Distinct rows, without replacement.
            let indices = index::sample(&mut rng, n_rows, sample_size).into_vec();
            trees.push(IsolationTree::build(x, &indices, 0, max_depth, &mut rng));
        }

        self.trees = trees;
        self.sample_size = sample_size;

        let scores = self.score_samples(x)?;
        let sorted = sorted_copy(&scores);
        let threshold = quantile_sorted(&sorted, 1.0 - self.contamination)
            .ok_or_else(|| AnalyticsError::invalid_input("no scores to calibrate threshold"))?;
        self.threshold = Some(threshold);

        debug!(
            trees = self.trees.len(),
            sample_size,
            max_depth,
            threshold,
            "Isolation forest fitted"
        );
        Ok(())
    }

    /// Anomaly score per row of `x`, higher is more anomalous.
    pub fn score_samples(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(AnalyticsError::InvalidConfig(
                "isolation forest is not fitted".to_string(),
            ));
        }

        let normalizer = average_path_length(self.sample_size);
        let n_trees = self.trees.len() as f64;

        Ok(x
            .rows()
            .into_iter()
            .map(|sample| {
                let mean_path =
                    self.trees.iter().map(|t| t.path_length(sample)).sum::<f64>() / n_trees;
                2.0_f64.powf(-mean_path / normalizer)
            })
            .collect())
    }

    /// `true` for rows scored strictly above the calibrated threshold.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<bool>> {
        let threshold = self.threshold.ok_or_else(|| {
            AnalyticsError::InvalidConfig("isolation forest is not fitted".to_string())
        })?;
        Ok(self
            .score_samples(x)?
            .into_iter()
            .map(|s| s > threshold)
            .collect())
    }
}
