//! Sport Pipeline - Main Entry Point

use anyhow::{Context, Result};
use sport_pipeline::{init_logging, run, Settings};
use tracing::info;

fn main() -> Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;
    init_logging(&settings.log_level)?;

    info!("=== Sport Pipeline v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Sessions from {:?}, tables to {:?}, {} classes",
        settings.data_dir,
        settings.output_dir,
        settings.sports.len()
    );

    run(&settings)
}
