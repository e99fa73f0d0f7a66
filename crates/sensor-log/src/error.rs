//! Sensor Log Error Types

use thiserror::Error;

/// Errors while reading a raw activity log
#[derive(Debug, Error)]
pub enum LogError {
    /// Underlying file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV tokenizer failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Row has fewer than the required columns
    #[error("Row {row}: expected at least {expected} columns, got {actual}")]
    MissingColumns {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Axis value is not a number
    #[error("Row {row}: invalid axis value {value:?}")]
    InvalidValue { row: usize, value: String },

    /// Tag names neither sensor
    #[error("Row {row}: unrecognized sensor tag {tag:?}")]
    UnknownSensorTag { row: usize, tag: String },
}

/// Errors while splitting a log into its two sensor streams
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    /// No records at all
    #[error("Log contains no records")]
    Empty,

    /// Every record comes from the same sensor
    #[error("Log contains a single {0} stream")]
    SingleStream(&'static str),

    /// First sensor reappears after the boundary
    #[error("Sensor streams are interleaved: {sensor} record at row {row} after boundary {boundary}")]
    Interleaved {
        sensor: &'static str,
        row: usize,
        boundary: usize,
    },
}
