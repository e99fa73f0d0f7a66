//! CART decision tree
//!
//! Trees are grown on a (possibly repeated) set of row indices until each
//! leaf is pure or too small to split. Each split considers a random subset of
//! features, which is what decorrelates the trees of a forest.

use std::fmt;

use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Impurity measure used to rank splits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Gini,
    Entropy,
}

impl Criterion {
    /// Impurity of a node with the given class counts
    pub fn impurity(&self, counts: &[usize], total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let total = total as f64;
        match self {
            Criterion::Gini => 1.0 - counts.iter().map(|&c| (c as f64 / total).powi(2)).sum::<f64>(),
            Criterion::Entropy => -counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / total;
                    p * p.log2()
                })
                .sum::<f64>(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Criterion::Gini => "gini",
            Criterion::Entropy => "entropy",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Growth parameters of a single tree
#[derive(Debug, Clone, Copy)]
pub struct TreeConfig {
    pub criterion: Criterion,
    /// Nodes with fewer samples become leaves
    pub min_samples_split: usize,
    /// Non-constant features examined per split
    pub max_features: usize,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// Classification tree in array representation
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    class_count: usize,
}

impl DecisionTree {
    /// Grow a tree on the rows listed in `samples` (repeats allowed)
    pub fn fit(
        features: ArrayView2<f64>,
        labels: &[usize],
        samples: &[usize],
        class_count: usize,
        config: &TreeConfig,
        rng: &mut StdRng,
    ) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            class_count,
        };
        let mut indices = samples.to_vec();
        tree.build(features, labels, &mut indices, config, rng);
        tree
    }

    fn build(
        &mut self,
        features: ArrayView2<f64>,
        labels: &[usize],
        indices: &mut [usize],
        config: &TreeConfig,
        rng: &mut StdRng,
    ) -> usize {
        let node_index = self.nodes.len();
        let counts = self.class_counts(labels, indices);
        let impurity = config.criterion.impurity(&counts, indices.len());

        let split = if indices.len() < config.min_samples_split.max(2) || impurity <= f64::EPSILON {
            None
        } else {
            self.best_split(features, labels, indices, config, rng)
        };

        let partition = split.map(|split| {
            let mut boundary = 0;
            for i in 0..indices.len() {
                if features[[indices[i], split.feature]] <= split.threshold {
                    indices.swap(i, boundary);
                    boundary += 1;
                }
            }
            (split, boundary)
        });

        let (split, boundary) = match partition {
            Some((split, boundary)) if boundary > 0 && boundary < indices.len() => (split, boundary),
            _ => {
                self.nodes.push(Node::Leaf {
                    distribution: distribution(&counts, indices.len()),
                });
                return node_index;
            }
        };

        // Reserve the slot, children are appended after it
        self.nodes.push(Node::Leaf { distribution: Vec::new() });
        let (left_rows, right_rows) = indices.split_at_mut(boundary);

        let left = self.build(features, labels, left_rows, config, rng);
        let right = self.build(features, labels, right_rows, config, rng);
        self.nodes[node_index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_index
    }

    fn best_split(
        &self,
        features: ArrayView2<f64>,
        labels: &[usize],
        indices: &[usize],
        config: &TreeConfig,
        rng: &mut StdRng,
    ) -> Option<SplitCandidate> {
        let mut order: Vec<usize> = (0..features.ncols()).collect();
        order.shuffle(rng);

        let total = indices.len();
        let mut best: Option<SplitCandidate> = None;
        let mut examined = 0;
        let mut column: Vec<(f64, usize)> = Vec::with_capacity(total);

        for feature in order {
            if examined >= config.max_features {
                break;
            }

            // NaN sorts with +inf so it lands on the right of every finite threshold
            column.clear();
            column.extend(indices.iter().map(|&i| {
                let value = features[[i, feature]];
                (if value.is_nan() { f64::INFINITY } else { value }, labels[i])
            }));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));
            if column[0].0 == column[total - 1].0 {
                continue;
            }
            examined += 1;

            let mut left = vec![0usize; self.class_count];
            let mut right = self.class_counts(labels, indices);
            for pos in 0..total - 1 {
                let (value, label) = column[pos];
                left[label] += 1;
                right[label] -= 1;

                let next = column[pos + 1].0;
                if value == next || !value.is_finite() {
                    continue;
                }
                let n_left = pos + 1;
                let n_right = total - n_left;
                let weighted = (n_left as f64 * config.criterion.impurity(&left, n_left)
                    + n_right as f64 * config.criterion.impurity(&right, n_right))
                    / total as f64;

                if best.as_ref().map_or(true, |b| weighted < b.impurity) {
                    let mut threshold = value / 2.0 + next / 2.0;
                    if !next.is_finite() || threshold >= next {
                        threshold = value;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        impurity: weighted,
                    });
                }
            }
        }

        best
    }

    fn class_counts(&self, labels: &[usize], indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.class_count];
        for &i in indices {
            counts[labels[i]] += 1;
        }
        counts
    }

    /// Class distribution of the leaf reached by `row`
    pub fn predict_proba(&self, row: &[f64]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Longest root-to-leaf path, in edges
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

fn distribution(counts: &[usize], total: usize) -> Vec<f64> {
    let total = total.max(1) as f64;
    counts.iter().map(|&c| c as f64 / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn config(criterion: Criterion) -> TreeConfig {
        TreeConfig {
            criterion,
            min_samples_split: 2,
            max_features: 2,
        }
    }

    #[test]
    fn test_impurity() {
        assert_eq!(Criterion::Gini.impurity(&[5, 0], 5), 0.0);
        assert!((Criterion::Gini.impurity(&[2, 2], 4) - 0.5).abs() < 1e-12);
        assert!((Criterion::Entropy.impurity(&[2, 2], 4) - 1.0).abs() < 1e-12);
        assert_eq!(Criterion::Entropy.impurity(&[0, 3], 3), 0.0);
    }

    #[test]
    fn test_fits_separable_data() {
        let features = array![[0.0, 5.0], [1.0, 5.0], [2.0, 5.0], [10.0, 5.0], [11.0, 5.0], [12.0, 5.0]];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let samples: Vec<usize> = (0..6).collect();

        for criterion in [Criterion::Gini, Criterion::Entropy] {
            let mut rng = StdRng::seed_from_u64(3);
            let tree = DecisionTree::fit(features.view(), &labels, &samples, 2, &config(criterion), &mut rng);

            assert_eq!(tree.node_count(), 3);
            assert_eq!(tree.depth(), 1);
            assert_eq!(tree.predict_proba(&[1.5, 5.0]), &[1.0, 0.0]);
            assert_eq!(tree.predict_proba(&[9.0, 5.0]), &[0.0, 1.0]);
        }
    }

    #[test]
    fn test_min_samples_split_stops_growth() {
        let features = array![[0.0], [1.0], [2.0], [3.0]];
        let labels = vec![0, 1, 0, 1];
        let samples: Vec<usize> = (0..4).collect();
        let mut rng = StdRng::seed_from_u64(0);

        let tree = DecisionTree::fit(
            features.view(),
            &labels,
            &samples,
            2,
            &TreeConfig {
                criterion: Criterion::Gini,
                min_samples_split: 5,
                max_features: 1,
            },
            &mut rng,
        );
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict_proba(&[0.0]), &[0.5, 0.5]);
    }

    #[test]
    fn test_non_finite_values_terminate_with_finite_thresholds() {
        let values: Vec<f64> = (0..20)
            .map(|i| match i % 4 {
                0 => f64::NAN,
                1 if i == 5 => f64::INFINITY,
                _ => i as f64,
            })
            .collect();
        let features = ndarray::Array2::from_shape_vec((20, 1), values).unwrap();
        let labels: Vec<usize> = (0..20).map(|i| usize::from(i >= 10)).collect();
        let samples: Vec<usize> = (0..20).collect();
        let mut rng = StdRng::seed_from_u64(1);

        let tree = DecisionTree::fit(features.view(), &labels, &samples, 2, &config(Criterion::Gini), &mut rng);
        for node in &tree.nodes {
            if let Node::Split { threshold, .. } = node {
                assert!(threshold.is_finite());
            }
        }
        assert_eq!(tree.predict_proba(&[2.0]), &[1.0, 0.0]);
        assert!((tree.predict_proba(&[f64::NAN]).iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_nan_column_is_a_leaf() {
        let features = ndarray::Array2::from_elem((6, 1), f64::NAN);
        let labels = vec![0, 1, 0, 1, 0, 1];
        let samples: Vec<usize> = (0..6).collect();
        let mut rng = StdRng::seed_from_u64(2);

        let tree = DecisionTree::fit(features.view(), &labels, &samples, 2, &config(Criterion::Entropy), &mut rng);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_repeated_samples_weight_leaves() {
        let features = array![[0.0], [0.0]];
        let labels = vec![0, 1];
        let mut rng = StdRng::seed_from_u64(0);

        // Identical rows cannot be split; row 0 drawn three times
        let tree = DecisionTree::fit(features.view(), &labels, &[0, 0, 0, 1], 2, &config(Criterion::Gini), &mut rng);
        assert_eq!(tree.predict_proba(&[0.0]), &[0.75, 0.25]);
    }
}
