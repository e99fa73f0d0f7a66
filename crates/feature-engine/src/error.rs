//! Feature Engine Error Types

use sensor_log::{LogError, SplitError};
use thiserror::Error;

/// Errors during feature extraction
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Window geometry is inconsistent
    #[error("Invalid extraction config: {0}")]
    InvalidConfig(String),

    /// Raw log could not be read
    #[error("Log error: {0}")]
    Log(#[from] LogError),

    /// Raw log is not two contiguous sensor streams
    #[error("Split error: {0}")]
    Split(#[from] SplitError),

    /// Class index outside the configured class set
    #[error("Class index {index} out of range for {classes} classes")]
    UnknownClass { index: usize, classes: usize },

    /// Appended rows do not match the accumulator layout
    #[error("{table} table: expected {expected} columns, got {actual}")]
    ColumnMismatch {
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Tables could not be stacked
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Nothing was appended before finalizing
    #[error("No feature rows were accumulated")]
    EmptyBatch,

    /// Output table could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
