//! Feature / label table loading

use std::path::Path;

use csv::{ReaderBuilder, Trim};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use crate::ClassifierError;

/// Feature rows with their class indices
#[derive(Debug, Clone)]
pub struct Dataset {
    pub features: Array2<f64>,
    pub labels: Vec<usize>,
}

impl Dataset {
    pub fn new(features: Array2<f64>, labels: Vec<usize>) -> Result<Self, ClassifierError> {
        if features.nrows() != labels.len() {
            return Err(ClassifierError::InvalidInputShape {
                expected: format!("{} labels", features.nrows()),
                actual: format!("{} labels", labels.len()),
            });
        }
        Ok(Self { features, labels })
    }

    /// Load a feature table and its one-hot label table
    pub fn load(features_path: impl AsRef<Path>, labels_path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let features = read_table(features_path.as_ref())?;
        let one_hot = read_table(labels_path.as_ref())?;
        let labels = one_hot
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(i, _)| i)
                    .unwrap_or(0)
            })
            .collect();

        let dataset = Self::new(features, labels)?;
        info!(
            "Loaded {} samples x {} features from {:?}",
            dataset.len(),
            dataset.features.ncols(),
            features_path.as_ref()
        );
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Rows at the given indices
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Shuffled train / test split; returns `(train, test)`
    pub fn split(&self, test_fraction: f64, seed: u64) -> Result<(Self, Self), ClassifierError> {
        if !(0.0..1.0).contains(&test_fraction) {
            return Err(ClassifierError::InvalidConfig(format!(
                "test fraction {} outside [0, 1)",
                test_fraction
            )));
        }

        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(seed));

        let test_len = (self.len() as f64 * test_fraction).round() as usize;
        let (test, train) = indices.split_at(test_len);
        Ok((self.subset(train), self.subset(test)))
    }
}

fn read_table(path: &Path) -> Result<Array2<f64>, ClassifierError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b',')
        .trim(Trim::All)
        .from_path(path)?;

    let mut values = Vec::new();
    let mut width = None;
    let mut rows = 0;
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        if *width.get_or_insert(record.len()) != record.len() {
            return Err(ClassifierError::InvalidInputShape {
                expected: format!("{} columns", width.unwrap_or(0)),
                actual: format!("{} columns in row {}", record.len(), idx + 1),
            });
        }
        for field in record.iter() {
            let value: f64 = field.parse().map_err(|_| ClassifierError::InvalidValue {
                row: idx + 1,
                value: field.to_string(),
            })?;
            values.push(value);
        }
        rows += 1;
    }

    Array2::from_shape_vec((rows, width.unwrap_or(0)), values).map_err(|e| ClassifierError::InvalidInputShape {
        expected: format!("{} rows", rows),
        actual: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_decodes_one_hot() {
        let dir = tempfile::tempdir().unwrap();
        let features = write(dir.path(), "f.csv", "1.5e0, 2, 3\n4, NaN, 6\n");
        let labels = write(dir.path(), "l.csv", "0, 1, 0\n0, 0, 1\n");

        let dataset = Dataset::load(&features, &labels).unwrap();
        assert_eq!(dataset.features.dim(), (2, 3));
        assert_eq!(dataset.features[[0, 0]], 1.5);
        assert!(dataset.features[[1, 1]].is_nan());
        assert_eq!(dataset.labels, vec![1, 2]);
    }

    #[test]
    fn test_load_rejects_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let features = write(dir.path(), "f.csv", "1, 2, 3\n4, 5\n");
        let labels = write(dir.path(), "l.csv", "1\n1\n");
        assert!(Dataset::load(&features, &labels).is_err());
    }

    #[test]
    fn test_split_partitions_rows() {
        let features = Array2::from_shape_fn((10, 2), |(i, j)| (i * 2 + j) as f64);
        let dataset = Dataset::new(features, (0..10).map(|i| i % 3).collect()).unwrap();

        let (train, test) = dataset.split(0.3, 7).unwrap();
        assert_eq!((train.len(), test.len()), (7, 3));

        let mut seen: Vec<usize> = train
            .features
            .column(0)
            .iter()
            .chain(test.features.column(0).iter())
            .map(|v| *v as usize / 2)
            .collect();
        seen.sort();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());

        let (again, _) = dataset.split(0.3, 7).unwrap();
        assert_eq!(again.labels, train.labels);
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let dataset = Dataset::new(Array2::zeros((2, 1)), vec![0, 1]).unwrap();
        assert!(dataset.split(1.0, 0).is_err());
    }
}
