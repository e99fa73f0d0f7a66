//! Exhaustive hyper-parameter search with stratified k-fold validation

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::forest::{ForestParams, RandomForest};
use crate::tree::Criterion;
use crate::ClassifierError;

/// Candidate values for each forest parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub min_samples_split: Vec<usize>,
    pub criterion: Vec<Criterion>,
    pub n_estimators: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            min_samples_split: vec![5, 10],
            criterion: vec![Criterion::Gini, Criterion::Entropy],
            n_estimators: vec![15, 25],
        }
    }
}

impl ParamGrid {
    /// Every combination, criterion varying slowest and n_estimators fastest
    pub fn candidates(&self) -> Vec<ForestParams> {
        let mut out = Vec::with_capacity(self.len());
        for &criterion in &self.criterion {
            for &min_samples_split in &self.min_samples_split {
                for &n_estimators in &self.n_estimators {
                    out.push(ForestParams {
                        n_estimators,
                        criterion,
                        min_samples_split,
                    });
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.min_samples_split.len() * self.criterion.len() * self.n_estimators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of a search: the winning parameters refit on all data
#[derive(Debug, Clone)]
pub struct GridSearchResult {
    pub best_params: ForestParams,
    pub best_score: f64,
    /// Mean validation accuracy per candidate, in candidate order
    pub scores: Vec<(ForestParams, f64)>,
    pub model: RandomForest,
}

pub struct GridSearch {
    grid: ParamGrid,
    folds: usize,
    seed: u64,
}

impl GridSearch {
    pub fn new(grid: ParamGrid, folds: usize, seed: u64) -> Result<Self, ClassifierError> {
        if grid.is_empty() {
            return Err(ClassifierError::InvalidConfig("parameter grid is empty".into()));
        }
        if folds < 2 {
            return Err(ClassifierError::InvalidConfig(format!(
                "cross-validation needs at least 2 folds, got {folds}"
            )));
        }
        Ok(Self { grid, folds, seed })
    }

    pub fn fit(
        &self,
        features: ArrayView2<f64>,
        labels: &[usize],
        class_count: usize,
    ) -> Result<GridSearchResult, ClassifierError> {
        let n = features.nrows();
        if n < self.folds {
            return Err(ClassifierError::InvalidInputShape {
                expected: format!("at least {} samples", self.folds),
                actual: format!("{n} samples"),
            });
        }

        let assignment = stratified_folds(labels, self.folds);
        let mut scores = Vec::with_capacity(self.grid.len());
        let mut best: Option<(ForestParams, f64)> = None;

        for params in self.grid.candidates() {
            let mut total = 0.0;
            for fold in 0..self.folds {
                let (train, validate): (Vec<usize>, Vec<usize>) = (0..n).partition(|&i| assignment[i] != fold);
                let train_x = select(features, &train);
                let train_y: Vec<usize> = train.iter().map(|&i| labels[i]).collect();
                let forest = RandomForest::fit(train_x.view(), &train_y, class_count, params, self.seed)?;

                let predicted = forest.predict(select(features, &validate).view());
                let correct = predicted
                    .iter()
                    .zip(&validate)
                    .filter(|(p, &i)| **p == labels[i])
                    .count();
                total += correct as f64 / validate.len().max(1) as f64;
            }
            let score = total / self.folds as f64;
            debug!("Candidate {}: mean accuracy {:.4}", params, score);

            if best.map_or(true, |(_, s)| score > s) {
                best = Some((params, score));
            }
            scores.push((params, score));
        }

        let (best_params, best_score) = best.ok_or_else(|| ClassifierError::InvalidConfig("parameter grid is empty".into()))?;
        info!(
            "Grid search over {} candidates: best {} ({:.4})",
            scores.len(),
            best_params,
            best_score
        );

        let model = RandomForest::fit(features, labels, class_count, best_params, self.seed)?;
        Ok(GridSearchResult {
            best_params,
            best_score,
            scores,
            model,
        })
    }
}

/// Fold index per sample; each class is dealt round-robin across folds
pub fn stratified_folds(labels: &[usize], folds: usize) -> Vec<usize> {
    let classes = labels.iter().max().map_or(0, |m| m + 1);
    let mut next = vec![0usize; classes];
    let mut offset = 0;
    let mut assignment = vec![0; labels.len()];

    // Stagger class starts so small classes don't all land in fold 0
    for class in 0..classes {
        next[class] = offset;
        offset = (offset + labels.iter().filter(|&&l| l == class).count()) % folds;
    }
    for (i, &label) in labels.iter().enumerate() {
        assignment[i] = next[label] % folds;
        next[label] += 1;
    }
    assignment
}

fn select(features: ArrayView2<f64>, rows: &[usize]) -> Array2<f64> {
    features.select(Axis(0), rows)
}
