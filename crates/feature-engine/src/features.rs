//! Feature Tensor Assembly

use std::path::Path;

use ndarray::{Array2, Array3, Array4, ArrayView, Axis, Dimension};
use sensor_log::{RawSample, SensorRole, AXES};
use tracing::{debug, info, warn};

use crate::catalog::{
    correlation_slots, frame_statistics, CorrelationSlot, StatisticId, CORRELATION_COUNT, STATISTICS, STATISTIC_COUNT,
};
use crate::fft::SpectrumAnalyzer;
use crate::statistics::correlation;
use crate::windowing::{SplitStreams, WindowFrameExtractor};
use crate::{ExtractionConfig, FeatureError};

/// Output channels: three axes for each of the two sensor roles
pub const CHANNELS: usize = 2 * AXES;

/// Per-file feature tensors
#[derive(Debug, Clone)]
pub struct FileTensors {
    /// `[bin, window, channel, image]`
    pub spectral: Array4<f64>,
    /// `[statistic, window, channel, image]`
    pub statistics: Array4<f64>,
    /// `[slot, window, image]`
    pub correlations: Array3<f64>,
}

impl FileTensors {
    /// Number of images held
    pub fn images(&self) -> usize {
        self.spectral.len_of(Axis(3))
    }

    /// Flatten into one spectral row and one secondary row per image.
    ///
    /// Spectral rows are laid out `(bin, window, channel)`; secondary rows are
    /// the `(statistic, window, channel)` block followed by the
    /// `(slot, window)` block.
    pub fn flatten(&self) -> (Array2<f64>, Array2<f64>) {
        let images = self.images();
        let (bins, windows, channels, _) = self.spectral.dim();
        let spectral_width = bins * windows * channels;
        let (statistics, windows, channels, _) = self.statistics.dim();
        let stats_width = statistics * windows * channels;
        let (slots, windows, _) = self.correlations.dim();
        let corr_width = slots * windows;

        let mut spectral = Array2::zeros((images, spectral_width));
        let mut secondary = Array2::zeros((images, stats_width + corr_width));

        for n in 0..images {
            fill_row(spectral.row_mut(n).iter_mut(), self.spectral.index_axis(Axis(3), n));

            let (mut stats_part, mut corr_part) = secondary.row_mut(n).split_at(Axis(0), stats_width);
            fill_row(stats_part.iter_mut(), self.statistics.index_axis(Axis(3), n));
            fill_row(corr_part.iter_mut(), self.correlations.index_axis(Axis(2), n));
        }

        (spectral, secondary)
    }

    /// Statistics with at least one non-finite cell, in row order
    pub fn non_finite_statistics(&self) -> Vec<StatisticId> {
        STATISTICS
            .iter()
            .enumerate()
            .filter(|(row, _)| {
                self.statistics
                    .index_axis(Axis(0), *row)
                    .iter()
                    .any(|v| !v.is_finite())
            })
            .map(|(_, (id, _))| *id)
            .collect()
    }
}

fn fill_row<'a, D: Dimension>(row: impl Iterator<Item = &'a mut f64>, source: ArrayView<'_, f64, D>) {
    for (dst, src) in row.zip(source.iter()) {
        *dst = *src;
    }
}

/// Flattened feature rows of one activity file
#[derive(Debug, Clone)]
pub struct FileFeatures {
    /// One spectral row per image
    pub spectral: Array2<f64>,
    /// One statistics + correlation row per image
    pub secondary: Array2<f64>,
    /// One-hot class rows
    pub labels: Array2<u8>,
}

impl FileFeatures {
    /// Number of rows (images)
    pub fn rows(&self) -> usize {
        self.spectral.nrows()
    }
}

/// Computes feature tensors from split logs
pub struct FeatureAssembler {
    extractor: WindowFrameExtractor,
    analyzer: SpectrumAnalyzer,
    slots: Vec<CorrelationSlot>,
    class_count: usize,
}

impl FeatureAssembler {
    /// Create an assembler for `class_count` sport classes
    pub fn new(config: ExtractionConfig, class_count: usize) -> Result<Self, FeatureError> {
        let extractor = WindowFrameExtractor::new(config)?;
        Ok(Self {
            analyzer: SpectrumAnalyzer::new(config.sample_rate_hz as f64),
            extractor,
            slots: correlation_slots(),
            class_count,
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        self.extractor.config()
    }

    /// Columns of a spectral row
    pub fn spectral_width(&self) -> usize {
        let config = self.config();
        config.spectrum_bins() * config.windows_per_image() * CHANNELS
    }

    /// Columns of a secondary row
    pub fn secondary_width(&self) -> usize {
        let windows = self.config().windows_per_image();
        STATISTIC_COUNT * windows * CHANNELS + CORRELATION_COUNT * windows
    }

    /// Number of sport classes in label rows
    pub fn class_count(&self) -> usize {
        self.class_count
    }

    /// Compute the spectral, statistics and correlation tensors of a log
    pub fn tensors(&mut self, streams: &SplitStreams) -> FileTensors {
        let config = *self.config();
        let images = self.extractor.image_count(streams);
        let windows = config.windows_per_image();
        let bins = config.spectrum_bins();

        let mut spectral = Array4::zeros((bins, windows, CHANNELS, images));
        let mut statistics = Array4::zeros((STATISTIC_COUNT, windows, CHANNELS, images));
        let mut correlations = Array3::zeros((CORRELATION_COUNT, windows, images));

        for n in 0..images {
            for j in 0..windows {
                let frames = self.extractor.frames(streams, n, j);

                for role in [SensorRole::Primary, SensorRole::Secondary] {
                    let role_frames = frames.by_role(role);
                    for (axis, frame) in role_frames.iter().enumerate() {
                        let channel = role.channel_offset() + axis;

                        let magnitude = self.analyzer.magnitude(frame, config.suppressed_low_bins);
                        for (bin, value) in magnitude.into_iter().enumerate() {
                            spectral[[bin, j, channel, n]] = value;
                        }

                        for (row, value) in frame_statistics(frame).into_iter().enumerate() {
                            statistics[[row, j, channel, n]] = value;
                        }
                    }
                }

                for (row, slot) in self.slots.iter().enumerate() {
                    correlations[[row, j, n]] = correlation(frames.at(slot.left), frames.at(slot.right));
                }
            }
        }

        FileTensors {
            spectral,
            statistics,
            correlations,
        }
    }

    /// Featurize one parsed log belonging to class `class_index`
    pub fn assemble(&mut self, samples: &[RawSample], class_index: usize) -> Result<FileFeatures, FeatureError> {
        if class_index >= self.class_count {
            return Err(FeatureError::UnknownClass {
                index: class_index,
                classes: self.class_count,
            });
        }

        let split = sensor_log::split(samples)?;
        let streams = SplitStreams::new(samples, split);
        self.log_stream_spectra(&streams);

        let tensors = self.tensors(&streams);
        let (spectral, secondary) = tensors.flatten();

        let degenerate = secondary
            .rows()
            .into_iter()
            .filter(|row| row.iter().any(|v| !v.is_finite()))
            .count();
        if degenerate > 0 {
            let names: Vec<&str> = tensors.non_finite_statistics().iter().map(StatisticId::as_str).collect();
            warn!(
                "{} of {} rows contain non-finite values (statistics: [{}])",
                degenerate,
                secondary.nrows(),
                names.join(", ")
            );
        }

        let mut labels = Array2::zeros((spectral.nrows(), self.class_count));
        labels.column_mut(class_index).fill(1u8);

        Ok(FileFeatures {
            spectral,
            secondary,
            labels,
        })
    }

    /// Read and featurize one activity log file
    pub fn assemble_file(&mut self, path: impl AsRef<Path>, class_index: usize) -> Result<FileFeatures, FeatureError> {
        let path = path.as_ref();
        let samples = sensor_log::read_log(path)?;
        let features = self.assemble(&samples, class_index)?;
        info!(
            "Featurized {:?}: {} records -> {} rows (spectral {} cols, secondary {} cols)",
            path,
            samples.len(),
            features.rows(),
            features.spectral.ncols(),
            features.secondary.ncols()
        );
        Ok(features)
    }

    fn log_stream_spectra(&mut self, streams: &SplitStreams) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        for role in [SensorRole::Primary, SensorRole::Secondary] {
            let columns = streams.by_role(role);
            for axis in 0..AXES {
                let overview = self.analyzer.overview(columns.axis(axis));
                debug!(
                    "{} stream axis {}: {} samples, dominant frequency {:.2} Hz (resolution {:.4} Hz)",
                    role.as_str(),
                    axis,
                    columns.len(),
                    overview.dominant_frequency,
                    overview.resolution
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics;
    use crate::test_support::synthetic_log;

    #[test]
    fn test_single_image_end_to_end() {
        let mut assembler = FeatureAssembler::new(ExtractionConfig::default(), 6).unwrap();
        let samples = synthetic_log(1500, false);
        assert_eq!(samples.len(), 3000);

        let features = assembler.assemble(&samples, 2).unwrap();
        assert_eq!(features.spectral.dim(), (1, 150 * 13 * 6));
        assert_eq!(features.secondary.dim(), (1, 16 * 13 * 6 + 15 * 13));
        assert_eq!(features.labels.dim(), (1, 6));
        assert_eq!(features.labels.row(0).to_vec(), vec![0, 0, 1, 0, 0, 0]);
        assert_eq!(assembler.spectral_width(), features.spectral.ncols());
        assert_eq!(assembler.secondary_width(), features.secondary.ncols());
    }

    #[test]
    fn test_channel_layout_independent_of_disk_order() {
        let mut assembler = FeatureAssembler::new(ExtractionConfig::default(), 6).unwrap();
        let accel_first = assembler.assemble(&synthetic_log(1500, false), 0).unwrap();
        let gyro_first = assembler.assemble(&synthetic_log(1500, true), 0).unwrap();

        assert_eq!(accel_first.spectral, gyro_first.spectral);
        assert_eq!(
            accel_first.secondary.slice(ndarray::s![.., ..16 * 13 * 6]),
            gyro_first.secondary.slice(ndarray::s![.., ..16 * 13 * 6])
        );
    }

    #[test]
    fn test_tensor_cells_match_estimators() {
        let config = ExtractionConfig::default();
        let mut assembler = FeatureAssembler::new(config, 6).unwrap();
        let samples = synthetic_log(3000, true);
        let split = sensor_log::split(&samples).unwrap();
        let streams = SplitStreams::new(&samples, split);
        let tensors = assembler.tensors(&streams);
        assert_eq!(tensors.images(), 2);

        // Image 1, window 4: accelerometer is the second on-disk stream
        let start = 1500 + 4 * 100;
        let accel_y: Vec<f64> = samples[3000 + start..3000 + start + 300].iter().map(|s| s.axes[1]).collect();
        let gyro_x: Vec<f64> = samples[start..start + 300].iter().map(|s| s.axes[0]).collect();

        assert_eq!(tensors.statistics[[0, 4, 1, 1]], statistics::mean(&accel_y));
        assert_eq!(tensors.statistics[[12, 4, 3, 1]], statistics::kurtosis(&gyro_x));

        let mut analyzer = SpectrumAnalyzer::new(50.0);
        let magnitude = analyzer.magnitude(&gyro_x, config.suppressed_low_bins);
        assert_eq!(tensors.spectral[[0, 4, 3, 1]], 0.0);
        assert_eq!(tensors.spectral[[25, 4, 3, 1]], magnitude[25]);

        // Slot 2 of pair (0, 1): second stream axis 0 against first stream axis 1
        let accel_x: Vec<f64> = samples[3000 + start..3000 + start + 300].iter().map(|s| s.axes[0]).collect();
        let gyro_y: Vec<f64> = samples[start..start + 300].iter().map(|s| s.axes[1]).collect();
        assert_eq!(tensors.correlations[[2, 4, 1]], statistics::correlation(&accel_x, &gyro_y));
    }

    #[test]
    fn test_flatten_order() {
        let mut assembler = FeatureAssembler::new(ExtractionConfig::default(), 6).unwrap();
        let samples = synthetic_log(3000, false);
        let split = sensor_log::split(&samples).unwrap();
        let tensors = assembler.tensors(&SplitStreams::new(&samples, split));
        let (spectral, secondary) = tensors.flatten();

        assert_eq!(spectral.nrows(), 2);
        // (bin, window, channel) with channel fastest
        let (bin, window, channel) = (40, 7, 5);
        assert_eq!(spectral[[1, (bin * 13 + window) * 6 + channel]], tensors.spectral[[bin, window, channel, 1]]);

        let (stat, window, channel) = (11, 2, 4);
        assert_eq!(secondary[[0, (stat * 13 + window) * 6 + channel]], tensors.statistics[[stat, window, channel, 0]]);

        let (slot, window) = (9, 12);
        assert_eq!(secondary[[1, 16 * 13 * 6 + slot * 13 + window]], tensors.correlations[[slot, window, 1]]);
    }

    #[test]
    fn test_partial_image_yields_empty_rows_of_full_width() {
        let mut assembler = FeatureAssembler::new(ExtractionConfig::default(), 6).unwrap();
        let short = assembler.assemble(&synthetic_log(1000, false), 1).unwrap();

        assert_eq!(short.rows(), 0);
        assert_eq!(short.spectral.dim(), (0, 150 * 13 * 6));
        assert_eq!(short.secondary.dim(), (0, 16 * 13 * 6 + 15 * 13));
        assert_eq!(short.labels.dim(), (0, 6));
    }

    #[test]
    fn test_unknown_class_rejected() {
        let mut assembler = FeatureAssembler::new(ExtractionConfig::default(), 3).unwrap();
        let err = assembler.assemble(&synthetic_log(1500, false), 3).unwrap_err();
        assert!(matches!(err, FeatureError::UnknownClass { index: 3, classes: 3 }));
    }

    #[test]
    fn test_flat_window_surfaces_nan() {
        let mut assembler = FeatureAssembler::new(ExtractionConfig::default(), 2).unwrap();
        let mut samples = Vec::new();
        for tag in ["Accelerometer", "Gyroscope"] {
            for i in 0..1500 {
                samples.push(RawSample::new(tag, &i.to_string(), [1.0, 1.0, 1.0]).unwrap());
            }
        }
        let features = assembler.assemble(&samples, 1).unwrap();
        assert_eq!(features.rows(), 1);
        assert!(features.secondary.iter().any(|v| v.is_nan()));

        let split = sensor_log::split(&samples).unwrap();
        let flagged = assembler.tensors(&SplitStreams::new(&samples, split)).non_finite_statistics();
        assert!(flagged.contains(&StatisticId::Skewness));
        assert!(flagged.contains(&StatisticId::Kurtosis));
        assert!(!flagged.contains(&StatisticId::Mean));
        assert_eq!(StatisticId::Kurtosis.as_str(), "kurtosis");
    }
}
