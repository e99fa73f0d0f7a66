//! Two-block sensor stream splitter

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{RawSample, SensorKind, SensorRole, SplitError};

/// Location of the two contiguous sensor streams inside a log, with the
/// canonical role of each block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSplit {
    /// Number of records in the first stream (offset of the second one)
    pub boundary: usize,
    /// Total number of records in the log
    pub total: usize,
    /// Sensor occupying the first block
    pub first: SensorKind,
    /// Sensor occupying the second block
    pub second: SensorKind,
    /// Role of the first block
    pub first_role: SensorRole,
    /// Role of the second block
    pub second_role: SensorRole,
}

impl StreamSplit {
    /// Number of records in the second stream
    pub fn second_len(&self) -> usize {
        self.total - self.boundary
    }

    /// Record offset of the stream holding `role`
    pub fn offset_of(&self, role: SensorRole) -> usize {
        if role == self.first_role {
            0
        } else {
            self.boundary
        }
    }

    /// Records of the stream holding `role`
    pub fn stream_for<'a>(&self, role: SensorRole, samples: &'a [RawSample]) -> &'a [RawSample] {
        let start = self.offset_of(role);
        let len = if role == self.first_role {
            self.boundary
        } else {
            self.second_len()
        };
        &samples[start..start + len]
    }
}

/// Find the boundary between the two sensor streams of a log.
///
/// The kind of the first record fixes the first stream; the boundary is the
/// index of the first record of another kind. Every record after the boundary
/// must belong to the second stream.
pub fn split(samples: &[RawSample]) -> Result<StreamSplit, SplitError> {
    let first = samples.first().ok_or(SplitError::Empty)?.kind;

    let boundary = samples
        .iter()
        .position(|s| s.kind != first)
        .ok_or(SplitError::SingleStream(first.as_str()))?;
    let second = samples[boundary].kind;

    if let Some(offset) = samples[boundary..].iter().position(|s| s.kind != second) {
        return Err(SplitError::Interleaved {
            sensor: samples[boundary + offset].kind.as_str(),
            row: boundary + offset,
            boundary,
        });
    }

    debug!(
        "Split log: {} {} records then {} {} records",
        boundary,
        first.as_str(),
        samples.len() - boundary,
        second.as_str()
    );

    Ok(StreamSplit {
        boundary,
        total: samples.len(),
        first,
        second,
        first_role: first.role(),
        second_role: second.role(),
    })
}
