//! Batch accumulation and table output

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::{concatenate, Array2, ArrayView2, Axis};
use tracing::info;

use crate::features::FileFeatures;
use crate::FeatureError;

/// Column delimiter of every table
pub const DELIMITER: &str = ", ";

/// Output locations of the three feature tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePaths {
    pub spectral: PathBuf,
    pub secondary: PathBuf,
    pub labels: PathBuf,
}

impl TablePaths {
    /// Tables of the training population
    pub fn standard(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            spectral: dir.join("featuresFinal.csv"),
            secondary: dir.join("secondaryFeaturesFinal.csv"),
            labels: dir.join("labelsFinal.csv"),
        }
    }

    /// Tables of a held-out person
    pub fn holdout(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            spectral: dir.join("newPersonFeaturesFinal.csv"),
            secondary: dir.join("newPersonSecondaryFeaturesFinal.csv"),
            labels: dir.join("newPersonLabelsFinal.csv"),
        }
    }
}

/// Final feature / label tables of a batch
#[derive(Debug, Clone)]
pub struct FeatureTables {
    pub spectral: Array2<f64>,
    pub secondary: Array2<f64>,
    pub labels: Array2<u8>,
}

impl FeatureTables {
    /// Number of rows
    pub fn rows(&self) -> usize {
        self.spectral.nrows()
    }

    /// Write all three tables as comma-space CSV
    pub fn write(&self, paths: &TablePaths) -> Result<(), FeatureError> {
        write_table(&paths.spectral, self.spectral.view(), |w, v| write!(w, "{:e}", v))?;
        write_table(&paths.secondary, self.secondary.view(), |w, v| write!(w, "{:e}", v))?;
        write_table(&paths.labels, self.labels.view(), |w, v| write!(w, "{}", v))?;
        info!(
            "Wrote {} rows to {:?}, {:?}, {:?}",
            self.rows(),
            paths.spectral,
            paths.secondary,
            paths.labels
        );
        Ok(())
    }
}

fn write_table<T, F>(path: &Path, table: ArrayView2<T>, mut cell: F) -> Result<(), FeatureError>
where
    F: FnMut(&mut BufWriter<File>, &T) -> std::io::Result<()>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    for row in table.rows() {
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                writer.write_all(DELIMITER.as_bytes())?;
            }
            cell(&mut writer, value)?;
        }
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Collects per-file rows for the duration of a batch
#[derive(Debug, Default)]
pub struct FeatureAccumulator {
    spectral: Vec<Array2<f64>>,
    secondary: Vec<Array2<f64>>,
    labels: Vec<Array2<u8>>,
    rows: usize,
}

impl FeatureAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the rows of one file; column counts must match earlier files
    pub fn append(&mut self, features: FileFeatures) -> Result<(), FeatureError> {
        if let (Some(s), Some(x), Some(l)) = (self.spectral.first(), self.secondary.first(), self.labels.first()) {
            check_width("spectral", s.ncols(), features.spectral.ncols())?;
            check_width("secondary", x.ncols(), features.secondary.ncols())?;
            check_width("labels", l.ncols(), features.labels.ncols())?;
        }

        self.rows += features.rows();
        self.spectral.push(features.spectral);
        self.secondary.push(features.secondary);
        self.labels.push(features.labels);
        Ok(())
    }

    /// Rows appended so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Files appended so far
    pub fn files(&self) -> usize {
        self.spectral.len()
    }

    /// Concatenate everything appended into the final tables
    pub fn finalize(self) -> Result<FeatureTables, FeatureError> {
        if self.spectral.is_empty() {
            return Err(FeatureError::EmptyBatch);
        }

        let stack_f64 = |parts: &[Array2<f64>]| {
            let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
            concatenate(Axis(0), &views)
        };
        let label_views: Vec<_> = self.labels.iter().map(|p| p.view()).collect();

        Ok(FeatureTables {
            spectral: stack_f64(&self.spectral)?,
            secondary: stack_f64(&self.secondary)?,
            labels: concatenate(Axis(0), &label_views)?,
        })
    }
}

fn check_width(table: &'static str, expected: usize, actual: usize) -> Result<(), FeatureError> {
    if expected != actual {
        return Err(FeatureError::ColumnMismatch {
            table,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::synthetic_log;
    use crate::{ExtractionConfig, FeatureAssembler};

    #[test]
    fn test_concatenates_files() {
        let mut assembler = FeatureAssembler::new(ExtractionConfig::default(), 6).unwrap();
        let mut accumulator = FeatureAccumulator::new();

        let first = assembler.assemble(&synthetic_log(1500, false), 0).unwrap();
        let second = assembler.assemble(&synthetic_log(4600, true), 4).unwrap();
        assert_eq!((first.rows(), second.rows()), (1, 3));

        accumulator.append(first).unwrap();
        accumulator.append(second).unwrap();
        assert_eq!(accumulator.rows(), 4);
        assert_eq!(accumulator.files(), 2);

        let tables = accumulator.finalize().unwrap();
        assert_eq!(tables.rows(), 4);
        assert_eq!(tables.secondary.nrows(), 4);
        for row in tables.labels.rows() {
            assert_eq!(row.iter().map(|&v| v as usize).sum::<usize>(), 1);
        }
        assert_eq!(tables.labels[[0, 0]], 1);
        assert_eq!(tables.labels[[3, 4]], 1);
    }

    #[test]
    fn test_partial_image_file_adds_no_rows() {
        let mut assembler = FeatureAssembler::new(ExtractionConfig::default(), 6).unwrap();
        let mut accumulator = FeatureAccumulator::new();

        accumulator.append(assembler.assemble(&synthetic_log(1500, false), 0).unwrap()).unwrap();
        accumulator.append(assembler.assemble(&synthetic_log(1000, false), 1).unwrap()).unwrap();
        accumulator.append(assembler.assemble(&synthetic_log(3000, true), 2).unwrap()).unwrap();
        assert_eq!(accumulator.files(), 3);

        let tables = accumulator.finalize().unwrap();
        assert_eq!(tables.rows(), 3);
        assert_eq!(tables.spectral.ncols(), 11700);
        assert_eq!(tables.labels.column(1).sum(), 0);
        assert_eq!(tables.labels.column(2).sum(), 2);
    }

    #[test]
    fn test_empty_batch() {
        let err = FeatureAccumulator::new().finalize().unwrap_err();
        assert!(matches!(err, FeatureError::EmptyBatch));
    }

    #[test]
    fn test_rejects_mismatched_layout() {
        let mut accumulator = FeatureAccumulator::new();
        let mut assembler = FeatureAssembler::new(ExtractionConfig::default(), 6).unwrap();
        accumulator.append(assembler.assemble(&synthetic_log(1500, false), 0).unwrap()).unwrap();

        let mut other = FeatureAssembler::new(ExtractionConfig::default(), 4).unwrap();
        let err = accumulator
            .append(other.assemble(&synthetic_log(1500, false), 0).unwrap())
            .unwrap_err();
        assert!(matches!(err, FeatureError::ColumnMismatch { table: "labels", expected: 6, actual: 4 }));
    }

    #[test]
    fn test_write_tables() {
        let dir = tempfile::tempdir().unwrap();
        let tables = FeatureTables {
            spectral: ndarray::array![[1.5, -2.0], [0.25, 3.0]],
            secondary: ndarray::array![[f64::NAN], [7.0]],
            labels: ndarray::array![[1u8, 0], [0, 1]],
        };
        let paths = TablePaths::standard(dir.path());
        tables.write(&paths).unwrap();

        let spectral = std::fs::read_to_string(&paths.spectral).unwrap();
        let first: Vec<f64> = spectral.lines().next().unwrap().split(DELIMITER).map(|v| v.parse().unwrap()).collect();
        assert_eq!(first, vec![1.5, -2.0]);

        let secondary = std::fs::read_to_string(&paths.secondary).unwrap();
        assert!(secondary.lines().next().unwrap().parse::<f64>().unwrap().is_nan());

        let labels = std::fs::read_to_string(&paths.labels).unwrap();
        assert_eq!(labels, "1, 0\n0, 1\n");
    }

    #[test]
    fn test_holdout_paths() {
        let paths = TablePaths::holdout("/data");
        assert_eq!(paths.spectral, PathBuf::from("/data/newPersonFeaturesFinal.csv"));
        assert_eq!(paths.labels, PathBuf::from("/data/newPersonLabelsFinal.csv"));
    }
}
