//! Pipeline settings

use std::path::{Path, PathBuf};

use activity_classifier::ClassifierConfig;
use config::{Config, ConfigError, Environment, File};
use feature_engine::ExtractionConfig;
use serde::{Deserialize, Serialize};

/// Settings file read when `SPORT_PIPELINE_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "sport-pipeline.toml";

/// Environment variable naming an alternative settings file
pub const CONFIG_PATH_VAR: &str = "SPORT_PIPELINE_CONFIG";

/// Prefix of per-key overrides, e.g. `SPORT_PIPELINE__EXTRACTION__HOP_SEC=3`
pub const ENV_PREFIX: &str = "SPORT_PIPELINE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the recorded sessions
    pub data_dir: PathBuf,
    /// Session file name is `{sport}{file_suffix}`
    pub file_suffix: String,
    /// Class names; position is the class index
    pub sports: Vec<String>,
    /// Where the feature tables are written
    pub output_dir: PathBuf,
    /// Sessions of a held-out person, evaluated separately
    pub holdout_dir: Option<PathBuf>,
    pub log_level: String,
    pub extraction: ExtractionConfig,
    pub classifier: ClassifierConfig,
    /// Share of the extracted rows kept back for testing
    pub test_fraction: f64,
    pub seed: u64,
    /// Train and evaluate after writing the tables
    pub train: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            file_suffix: "Final.csv".to_string(),
            sports: ["Badminton", "Basketball", "Foosball", "Running", "Skating", "Walking"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            output_dir: PathBuf::from("data"),
            holdout_dir: None,
            log_level: "info".to_string(),
            extraction: ExtractionConfig::default(),
            classifier: ClassifierConfig::default(),
            test_fraction: 0.2,
            seed: 0,
            train: true,
        }
    }
}

impl Settings {
    /// Load from the settings file named by `SPORT_PIPELINE_CONFIG` (or
    /// `sport-pipeline.toml`), then environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Path::new(&path))
    }

    /// A missing file is not an error; all keys have defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("sports")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Session files, one per sport, in class order
    pub fn session_files(&self, dir: &Path) -> Vec<(usize, &str, PathBuf)> {
        self.sports
            .iter()
            .enumerate()
            .map(|(class, sport)| (class, sport.as_str(), dir.join(format!("{}{}", sport, self.file_suffix))))
            .collect()
    }

    /// Classifier settings with the input shape taken from the extraction
    /// geometry
    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            freq_dims: self.extraction.spectrum_bins(),
            time_dims: self.extraction.windows_per_image(),
            seed: self.seed,
            ..self.classifier.clone()
        }
    }
}
