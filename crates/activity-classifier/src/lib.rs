//! Activity Classifier
//!
//! Reduces spectral feature tables per channel with PCA, trains a random
//! forest through a cross-validated grid search, and reports confusion
//! counts per sport class.

mod dataset;
mod engine;
mod forest;
mod grid_search;
mod linalg;
mod pca;
mod report;
mod tree;

pub use dataset::Dataset;
pub use engine::{ClassifierConfig, ClassifierPipeline, TrainedModel};
pub use forest::{ForestParams, RandomForest};
pub use grid_search::{GridSearch, GridSearchResult, ParamGrid};
pub use pca::{ChannelReducer, Pca};
pub use report::ConfusionReport;
pub use tree::{Criterion, DecisionTree, TreeConfig};

use thiserror::Error;

/// Errors during training and evaluation
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Row {row}: invalid value {value:?}")]
    InvalidValue { row: usize, value: String },
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
    #[error("No samples to {0}")]
    EmptyData(&'static str),
    #[error("Invalid classifier config: {0}")]
    InvalidConfig(String),
    #[error("Label {label} out of range for {classes} classes")]
    UnknownLabel { label: usize, classes: usize },
}
