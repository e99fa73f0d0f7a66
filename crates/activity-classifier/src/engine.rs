//! Classifier pipeline: per-channel PCA followed by a grid-searched forest

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::forest::{ForestParams, RandomForest};
use crate::grid_search::{GridSearch, ParamGrid};
use crate::pca::ChannelReducer;
use crate::report::ConfusionReport;
use crate::ClassifierError;

/// Classifier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Spectrum bins per window
    pub freq_dims: usize,
    /// Windows per image
    pub time_dims: usize,
    /// Sensor channels, fastest-varying in a feature row
    pub channels: usize,
    /// Principal components kept per channel
    pub pca_components: usize,
    pub pca_whiten: bool,
    pub cv_folds: usize,
    pub grid: ParamGrid,
    pub seed: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            freq_dims: 150,
            time_dims: 13,
            channels: 6,
            pca_components: 200,
            pca_whiten: true,
            cv_folds: 5,
            grid: ParamGrid::default(),
            seed: 0,
        }
    }
}

impl ClassifierConfig {
    /// Expected width of a spectral feature row
    pub fn input_width(&self) -> usize {
        self.freq_dims * self.time_dims * self.channels
    }

    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.input_width() == 0 {
            return Err(ClassifierError::InvalidConfig(
                "freq_dims, time_dims and channels must be positive".into(),
            ));
        }
        if self.pca_components == 0 {
            return Err(ClassifierError::InvalidConfig("pca_components must be positive".into()));
        }
        if self.cv_folds < 2 {
            return Err(ClassifierError::InvalidConfig(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.grid.is_empty() {
            return Err(ClassifierError::InvalidConfig("parameter grid is empty".into()));
        }
        Ok(())
    }
}

/// Fitted reducer and forest
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub reducer: ChannelReducer,
    pub forest: RandomForest,
    pub best_params: ForestParams,
    /// Mean cross-validated accuracy of `best_params`
    pub cv_score: f64,
}

pub struct ClassifierPipeline {
    config: ClassifierConfig,
}

impl ClassifierPipeline {
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifierError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Fit the reducer on the training rows, then search forest parameters
    /// on the reduced rows. The class count is taken from the largest label.
    pub fn fit(&self, features: ArrayView2<f64>, labels: &[usize]) -> Result<TrainedModel, ClassifierError> {
        self.check_width(features)?;
        if features.nrows() == 0 {
            return Err(ClassifierError::EmptyData("train the classifier"));
        }
        if labels.len() != features.nrows() {
            return Err(ClassifierError::InvalidInputShape {
                expected: format!("{} labels", features.nrows()),
                actual: format!("{} labels", labels.len()),
            });
        }
        let class_count = labels.iter().max().map_or(0, |m| m + 1);

        let reducer = ChannelReducer::fit(
            features,
            self.config.channels,
            self.config.pca_components,
            self.config.pca_whiten,
        )?;
        let reduced = reducer.transform(features)?;
        info!(
            "Reduced {} training rows from {} to {} columns",
            reduced.nrows(),
            features.ncols(),
            reduced.ncols()
        );

        let search = GridSearch::new(self.config.grid.clone(), self.config.cv_folds, self.config.seed)?;
        let result = search.fit(reduced.view(), labels, class_count)?;

        Ok(TrainedModel {
            reducer,
            forest: result.model,
            best_params: result.best_params,
            cv_score: result.best_score,
        })
    }

    pub fn predict(&self, model: &TrainedModel, features: ArrayView2<f64>) -> Result<Vec<usize>, ClassifierError> {
        self.check_width(features)?;
        let reduced = model.reducer.transform(features)?;
        Ok(model.forest.predict(reduced.view()))
    }

    pub fn confusion_report(
        &self,
        predicted: &[usize],
        actual: &[usize],
        class_names: &[String],
    ) -> Result<ConfusionReport, ClassifierError> {
        ConfusionReport::new(predicted, actual, class_names)
    }

    fn check_width(&self, features: ArrayView2<f64>) -> Result<(), ClassifierError> {
        let expected = self.config.input_width();
        if features.ncols() != expected {
            return Err(ClassifierError::InvalidInputShape {
                expected: format!(
                    "{} columns ({} bins x {} windows x {} channels)",
                    expected, self.config.freq_dims, self.config.time_dims, self.config.channels
                ),
                actual: format!("{} columns", features.ncols()),
            });
        }
        Ok(())
    }
}
