//! Feature Engineering Engine
//!
//! Turns two-sensor activity logs into spectral, statistical and
//! cross-correlation feature tables, one row per fixed-duration image.

mod accumulator;
pub mod catalog;
mod config;
mod error;
mod features;
mod fft;
pub mod statistics;
mod windowing;

#[cfg(test)]
mod test_support;

pub use accumulator::{FeatureAccumulator, FeatureTables, TablePaths, DELIMITER};
pub use config::{ExtractionConfig, DEFAULT_SAMPLE_RATE_HZ};
pub use error::FeatureError;
pub use features::{FeatureAssembler, FileFeatures, FileTensors, CHANNELS};
pub use fft::{SpectrumAnalyzer, StreamSpectrum, OVERVIEW_IGNORED_BINS};
pub use windowing::{AxisColumns, SplitStreams, WindowFrameExtractor, WindowFrames};
