//! Comma-space CSV log reader

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::debug;

use crate::{LogError, RawSample, SensorKind, AXES};

/// Columns every row must carry: tag, timestamp and three axes
const REQUIRED_COLUMNS: usize = 2 + AXES;

/// Read every record of an activity log file
pub fn read_log(path: impl AsRef<Path>) -> Result<Vec<RawSample>, LogError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let samples = read_log_from(file)?;
    debug!("Read {} records from {:?}", samples.len(), path);
    Ok(samples)
}

/// Read records from any reader.
///
/// Rows are `tag, timestamp, a1, a2, a3[, ...]` without a header; extra
/// trailing columns are ignored and blank lines are skipped.
pub fn read_log_from<R: Read>(source: R) -> Result<Vec<RawSample>, LogError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b',')
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source);

    let mut samples = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let row = idx + 1;
        let record = result?;
        if record.len() < REQUIRED_COLUMNS {
            return Err(LogError::MissingColumns {
                row,
                expected: REQUIRED_COLUMNS,
                actual: record.len(),
            });
        }

        let tag = &record[0];
        let kind = SensorKind::from_tag(tag).ok_or_else(|| LogError::UnknownSensorTag {
            row,
            tag: tag.to_string(),
        })?;

        let mut axes = [0.0; AXES];
        for (axis, value) in axes.iter_mut().enumerate() {
            let raw = &record[2 + axis];
            *value = raw.parse().map_err(|_| LogError::InvalidValue {
                row,
                value: raw.to_string(),
            })?;
        }

        samples.push(RawSample {
            tag: tag.to_string(),
            kind,
            timestamp: record[1].to_string(),
            axes,
        });
    }

    Ok(samples)
}
