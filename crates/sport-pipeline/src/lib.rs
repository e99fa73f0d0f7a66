//! Sport Pipeline
//!
//! Batch driver: extracts feature tables from one recorded session per sport,
//! writes them out, then trains and evaluates the activity classifier.

pub mod settings;

use std::path::Path;

use activity_classifier::{ClassifierPipeline, Dataset, TrainedModel};
use anyhow::{bail, Context, Result};
use feature_engine::{FeatureAccumulator, FeatureAssembler, FeatureTables, TablePaths};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub use settings::Settings;

/// Initialize logging at `level` (`error` .. `trace`); unknown levels fall
/// back to `info`
pub fn init_logging(level: &str) -> Result<()> {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

/// Extract features from every sport's session in `dir`
pub fn extract_tables(settings: &Settings, dir: &Path) -> Result<FeatureTables> {
    let mut assembler = FeatureAssembler::new(settings.extraction, settings.sports.len())
        .context("Invalid extraction settings")?;
    let mut accumulator = FeatureAccumulator::new();

    for (class, sport, path) in settings.session_files(dir) {
        info!("Extracting {} from {:?}", sport, path);
        let features = assembler
            .assemble_file(&path, class)
            .with_context(|| format!("Failed to extract features for {} from {}", sport, path.display()))?;
        accumulator
            .append(features)
            .with_context(|| format!("Failed to collect features for {}", sport))?;
    }

    info!(
        "Collected {} rows from {} sessions",
        accumulator.rows(),
        accumulator.files()
    );
    accumulator.finalize().context("No features extracted")
}

/// Write tables and log their shapes
pub fn write_tables(tables: &FeatureTables, paths: &TablePaths) -> Result<()> {
    if let Some(parent) = paths.spectral.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tables
        .write(paths)
        .with_context(|| format!("Failed to write feature tables to {}", paths.spectral.display()))?;
    info!(
        "Wrote {} rows: spectral {:?}, secondary {:?}, labels {:?}",
        tables.rows(),
        tables.spectral.dim(),
        tables.secondary.dim(),
        tables.labels.dim()
    );
    Ok(())
}

/// Train on the standard tables and report test (and held-out) errors
pub fn train_and_evaluate(settings: &Settings, standard: &TablePaths, holdout: Option<&TablePaths>) -> Result<()> {
    let pipeline = ClassifierPipeline::new(settings.classifier_config()).context("Invalid classifier settings")?;

    let data = Dataset::load(&standard.spectral, &standard.labels).context("Failed to load feature tables")?;
    let (train, test) = data
        .split(settings.test_fraction, settings.seed)
        .context("Failed to split dataset")?;
    info!("Training set: {} rows, test set: {} rows", train.len(), test.len());
    if train.is_empty() {
        bail!("Training set is empty");
    }

    let model = pipeline
        .fit(train.features.view(), &train.labels)
        .context("Failed to train classifier")?;
    info!(
        "Best parameters: {} (cross-validated accuracy {:.4})",
        model.best_params, model.cv_score
    );

    if test.is_empty() {
        warn!("Test set is empty, skipping evaluation");
    } else {
        evaluate(&pipeline, &model, &test, &settings.sports, "TEST ERRORS")?;
    }

    if let Some(paths) = holdout {
        let held_out = Dataset::load(&paths.spectral, &paths.labels).context("Failed to load held-out tables")?;
        evaluate(&pipeline, &model, &held_out, &settings.sports, "TEST ERRORS FOR NEW PERSON")?;
    }
    Ok(())
}

fn evaluate(
    pipeline: &ClassifierPipeline,
    model: &TrainedModel,
    data: &Dataset,
    sports: &[String],
    title: &str,
) -> Result<()> {
    let predicted = pipeline
        .predict(model, data.features.view())
        .context("Failed to predict")?;
    let report = pipeline.confusion_report(&predicted, &data.labels, sports)?;
    info!("{}: accuracy {:.4} over {} rows", title, report.accuracy(), report.samples());
    println!("\n{} (# of errors / # of test examples)", title);
    println!("{}", report);
    Ok(())
}

/// Full batch run
pub fn run(settings: &Settings) -> Result<()> {
    settings.extraction.validate().context("Invalid extraction settings")?;

    let standard = TablePaths::standard(&settings.output_dir);
    let tables = extract_tables(settings, &settings.data_dir)?;
    write_tables(&tables, &standard)?;
    drop(tables);

    let holdout = match &settings.holdout_dir {
        Some(dir) => {
            let paths = TablePaths::holdout(&settings.output_dir);
            let tables = extract_tables(settings, dir)
                .with_context(|| format!("Failed to extract held-out sessions from {}", dir.display()))?;
            write_tables(&tables, &paths)?;
            Some(paths)
        }
        None => None,
    };

    if settings.train {
        train_and_evaluate(settings, &standard, holdout.as_ref())?;
    }
    Ok(())
}
