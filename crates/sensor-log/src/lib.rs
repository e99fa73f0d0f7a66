//! Sensor Log
//!
//! Parses accelerometer/gyroscope activity logs and splits them into their
//! two contiguous sensor streams.

mod error;
mod reader;
mod splitter;

pub use error::{LogError, SplitError};
pub use reader::{read_log, read_log_from};
pub use splitter::{split, StreamSplit};

use serde::{Deserialize, Serialize};

/// Number of axes recorded per sensor
pub const AXES: usize = 3;

/// Physical sensor that produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
}

impl SensorKind {
    /// Sniff the sensor kind from a raw tag such as `"ACCELEROMETER_RAW"`.
    ///
    /// Matching is a case-insensitive substring test on `"gyro"` and `"accel"`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.to_ascii_lowercase();
        if tag.contains("gyro") {
            Some(SensorKind::Gyroscope)
        } else if tag.contains("accel") {
            Some(SensorKind::Accelerometer)
        } else {
            None
        }
    }

    /// Canonical output role of this sensor
    pub fn role(&self) -> SensorRole {
        match self {
            SensorKind::Accelerometer => SensorRole::Primary,
            SensorKind::Gyroscope => SensorRole::Secondary,
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::Gyroscope => "gyroscope",
        }
    }
}

/// Canonical position of a sensor in the feature layout.
///
/// Primary fills channels `0..3`, Secondary fills channels `3..6`,
/// independent of which sensor comes first in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorRole {
    Primary,
    Secondary,
}

impl SensorRole {
    /// First output channel owned by this role
    pub fn channel_offset(&self) -> usize {
        match self {
            SensorRole::Primary => 0,
            SensorRole::Secondary => AXES,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorRole::Primary => "primary",
            SensorRole::Secondary => "secondary",
        }
    }
}

/// One logged record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Sensor tag exactly as logged
    pub tag: String,
    /// Sensor kind sniffed from the tag
    pub kind: SensorKind,
    /// Timestamp column, kept unparsed
    pub timestamp: String,
    /// Axis readings
    pub axes: [f64; AXES],
}

impl RawSample {
    /// Build a sample from a tag, sniffing its kind
    pub fn new(tag: &str, timestamp: &str, axes: [f64; AXES]) -> Option<Self> {
        let kind = SensorKind::from_tag(tag)?;
        Some(Self {
            tag: tag.to_string(),
            kind,
            timestamp: timestamp.to_string(),
            axes,
        })
    }
}
