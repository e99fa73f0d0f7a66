//! Confusion matrix summary

use std::fmt;

use ndarray::Array2;

use crate::ClassifierError;

/// Confusion counts with rows = true class and columns = predicted class
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionReport {
    class_names: Vec<String>,
    matrix: Array2<usize>,
}

impl ConfusionReport {
    pub fn new(predicted: &[usize], actual: &[usize], class_names: &[String]) -> Result<Self, ClassifierError> {
        if predicted.len() != actual.len() {
            return Err(ClassifierError::InvalidInputShape {
                expected: format!("{} predictions", actual.len()),
                actual: format!("{} predictions", predicted.len()),
            });
        }

        let classes = class_names.len();
        let mut matrix = Array2::zeros((classes, classes));
        for (&p, &a) in predicted.iter().zip(actual) {
            if let Some(&label) = [p, a].iter().find(|&&l| l >= classes) {
                return Err(ClassifierError::UnknownLabel { label, classes });
            }
            matrix[[a, p]] += 1;
        }

        Ok(Self {
            class_names: class_names.to_vec(),
            matrix,
        })
    }

    pub fn matrix(&self) -> &Array2<usize> {
        &self.matrix
    }

    /// Samples of `class` predicted as something else
    pub fn wrong(&self, class: usize) -> usize {
        self.total(class) - self.matrix[[class, class]]
    }

    /// Samples whose true class is `class`
    pub fn total(&self, class: usize) -> usize {
        self.matrix.row(class).sum()
    }

    pub fn samples(&self) -> usize {
        self.matrix.sum()
    }

    pub fn accuracy(&self) -> f64 {
        let correct: usize = self.matrix.diag().sum();
        correct as f64 / self.samples() as f64
    }

    pub fn error_rate(&self) -> f64 {
        1.0 - self.accuracy()
    }
}

impl fmt::Display for ConfusionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (class, name) in self.class_names.iter().enumerate() {
            let row: Vec<String> = self.matrix.row(class).iter().map(usize::to_string).collect();
            writeln!(
                f,
                "{}:\t{} / {}\t[{}]",
                name,
                self.wrong(class),
                self.total(class),
                row.join(" ")
            )?;
        }
        write!(f, "Error rate: {:.4}", self.error_rate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        ["Running", "Skating", "Walking"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_counts() {
        let actual = [0, 0, 1, 1, 2, 2, 2];
        let predicted = [0, 1, 1, 1, 2, 0, 2];
        let report = ConfusionReport::new(&predicted, &actual, &names()).unwrap();

        assert_eq!(report.matrix()[[0, 1]], 1);
        assert_eq!(report.matrix()[[2, 0]], 1);
        assert_eq!(report.wrong(0), 1);
        assert_eq!(report.total(2), 3);
        assert_eq!(report.wrong(1), 0);
        assert_eq!(report.samples(), 7);
        assert!((report.accuracy() - 5.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_display_rows() {
        let report = ConfusionReport::new(&[1, 1], &[0, 1], &names()).unwrap();
        let text = report.to_string();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Running:\t1 / 1\t[0 1 0]"));
        assert_eq!(lines.next(), Some("Skating:\t0 / 1\t[0 1 0]"));
        assert_eq!(lines.next(), Some("Walking:\t0 / 0\t[0 0 0]"));
        assert_eq!(lines.next(), Some("Error rate: 0.5000"));
    }

    #[test]
    fn test_rejects_mismatch() {
        assert!(matches!(
            ConfusionReport::new(&[0], &[0, 1], &names()),
            Err(ClassifierError::InvalidInputShape { .. })
        ));
        assert!(matches!(
            ConfusionReport::new(&[3], &[0], &names()),
            Err(ClassifierError::UnknownLabel { label: 3, classes: 3 })
        ));
    }
}
