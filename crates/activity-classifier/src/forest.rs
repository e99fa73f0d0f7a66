//! Bootstrap-aggregated forest of CART trees

use std::fmt;

use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tree::{Criterion, DecisionTree, TreeConfig};
use crate::ClassifierError;

/// Hyper-parameters explored by the grid search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub criterion: Criterion,
    pub min_samples_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 25,
            criterion: Criterion::Gini,
            min_samples_split: 5,
        }
    }
}

impl fmt::Display for ForestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "criterion={}, min_samples_split={}, n_estimators={}",
            self.criterion, self.min_samples_split, self.n_estimators
        )
    }
}

/// Trained random forest
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    params: ForestParams,
    class_count: usize,
}

impl RandomForest {
    /// Train `params.n_estimators` trees, each on a bootstrap sample
    pub fn fit(
        features: ArrayView2<f64>,
        labels: &[usize],
        class_count: usize,
        params: ForestParams,
        seed: u64,
    ) -> Result<Self, ClassifierError> {
        let n = features.nrows();
        if n == 0 {
            return Err(ClassifierError::EmptyData("train a forest"));
        }
        if labels.len() != n {
            return Err(ClassifierError::InvalidInputShape {
                expected: format!("{n} labels"),
                actual: format!("{} labels", labels.len()),
            });
        }
        if params.n_estimators == 0 {
            return Err(ClassifierError::InvalidConfig("n_estimators must be positive".into()));
        }
        if let Some(&label) = labels.iter().find(|&&l| l >= class_count) {
            return Err(ClassifierError::UnknownLabel {
                label,
                classes: class_count,
            });
        }

        let d = features.ncols();
        let config = TreeConfig {
            criterion: params.criterion,
            min_samples_split: params.min_samples_split,
            max_features: ((d as f64).sqrt().floor() as usize).max(1),
        };

        let trees = (0..params.n_estimators)
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(t as u64));
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(features, labels, &bootstrap, class_count, &config, &mut rng)
            })
            .collect::<Vec<_>>();

        debug!(
            "Trained forest ({}) with {} total nodes",
            params,
            trees.iter().map(DecisionTree::node_count).sum::<usize>()
        );

        Ok(Self {
            trees,
            params,
            class_count,
        })
    }

    /// Mean class distribution over all trees, one row per input row
    pub fn predict_proba(&self, features: ArrayView2<f64>) -> Vec<Vec<f64>> {
        let scale = 1.0 / self.trees.len() as f64;
        features
            .rows()
            .into_iter()
            .map(|row| {
                let row = row.to_vec();
                let mut votes = vec![0.0; self.class_count];
                for tree in &self.trees {
                    for (vote, p) in votes.iter_mut().zip(tree.predict_proba(&row)) {
                        *vote += p * scale;
                    }
                }
                votes
            })
            .collect()
    }

    /// Most probable class per row; ties go to the lowest index
    pub fn predict(&self, features: ArrayView2<f64>) -> Vec<usize> {
        self.predict_proba(features)
            .iter()
            .map(|votes| argmax(votes))
            .collect()
    }

    pub fn params(&self) -> ForestParams {
        self.params
    }

    pub fn class_count(&self) -> usize {
        self.class_count
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn blobs() -> (Array2<f64>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for class in 0..3 {
            for i in 0..12 {
                let jitter = (i as f64 * 0.37).sin() * 0.3;
                rows.extend_from_slice(&[class as f64 * 5.0 + jitter, class as f64 * 2.0 - jitter, -(class as f64) * 3.0 + jitter]);
                labels.push(class);
            }
        }
        (Array2::from_shape_vec((36, 3), rows).unwrap(), labels)
    }

    #[test]
    fn test_forest_separates_blobs() {
        let (features, labels) = blobs();
        let params = ForestParams {
            n_estimators: 15,
            criterion: Criterion::Entropy,
            min_samples_split: 5,
        };
        let forest = RandomForest::fit(features.view(), &labels, 3, params, 7).unwrap();

        assert_eq!(forest.n_estimators(), 15);
        assert_eq!(forest.predict(features.view()), labels);

        for votes in forest.predict_proba(features.view()) {
            assert!((votes.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (features, labels) = blobs();
        let params = ForestParams::default();
        let a = RandomForest::fit(features.view(), &labels, 3, params, 11).unwrap();
        let b = RandomForest::fit(features.view(), &labels, 3, params, 11).unwrap();
        assert_eq!(a.predict_proba(features.view()), b.predict_proba(features.view()));
    }

    #[test]
    fn test_rejects_bad_input() {
        let (features, labels) = blobs();
        assert!(matches!(
            RandomForest::fit(features.view(), &labels, 2, ForestParams::default(), 0),
            Err(ClassifierError::UnknownLabel { label: 2, classes: 2 })
        ));
        assert!(matches!(
            RandomForest::fit(features.view(), &labels[..3], 3, ForestParams::default(), 0),
            Err(ClassifierError::InvalidInputShape { .. })
        ));
        let empty = Array2::<f64>::zeros((0, 3));
        assert!(matches!(
            RandomForest::fit(empty.view(), &[], 3, ForestParams::default(), 0),
            Err(ClassifierError::EmptyData(_))
        ));
    }

    #[test]
    fn test_nan_feature_column_trains() {
        let values: Vec<f64> = (0..20).map(|i| if i % 4 == 0 { f64::NAN } else { i as f64 }).collect();
        let features = Array2::from_shape_vec((20, 1), values).unwrap();
        let labels: Vec<usize> = (0..20).map(|i| usize::from(i >= 10)).collect();

        let forest = RandomForest::fit(features.view(), &labels, 2, ForestParams::default(), 3).unwrap();
        let predicted = forest.predict(features.view());
        assert_eq!(predicted.len(), 20);
        assert_eq!(predicted[2], 0);
        assert_eq!(predicted[18], 1);
    }

    #[test]
    fn test_argmax_prefers_first() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), 0);
        assert_eq!(argmax(&[0.1, 0.2, 0.7]), 2);
    }
}
