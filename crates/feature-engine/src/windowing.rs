//! Image / window / frame decomposition of a split log

use sensor_log::{RawSample, SensorRole, StreamSplit, AXES};
use tracing::warn;

use crate::catalog::{Block, Endpoint};
use crate::{ExtractionConfig, FeatureError};

/// Axis columns of one sensor stream
#[derive(Debug, Clone, Default)]
pub struct AxisColumns {
    columns: [Vec<f64>; AXES],
}

impl AxisColumns {
    /// Transpose a run of records into per-axis columns
    pub fn from_samples(samples: &[RawSample]) -> Self {
        let mut columns: [Vec<f64>; AXES] = Default::default();
        for column in columns.iter_mut() {
            column.reserve(samples.len());
        }
        for sample in samples {
            for (column, &value) in columns.iter_mut().zip(sample.axes.iter()) {
                column.push(value);
            }
        }
        Self { columns }
    }

    /// Samples in the stream
    pub fn len(&self) -> usize {
        self.columns[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full column of one axis
    pub fn axis(&self, axis: usize) -> &[f64] {
        &self.columns[axis]
    }
}

/// A log split into its two streams, held by canonical role
#[derive(Debug, Clone)]
pub struct SplitStreams {
    pub split: StreamSplit,
    pub primary: AxisColumns,
    pub secondary: AxisColumns,
}

impl SplitStreams {
    pub fn new(samples: &[RawSample], split: StreamSplit) -> Self {
        Self {
            primary: AxisColumns::from_samples(split.stream_for(SensorRole::Primary, samples)),
            secondary: AxisColumns::from_samples(split.stream_for(SensorRole::Secondary, samples)),
            split,
        }
    }

    pub fn by_role(&self, role: SensorRole) -> &AxisColumns {
        match role {
            SensorRole::Primary => &self.primary,
            SensorRole::Secondary => &self.secondary,
        }
    }
}

/// Time-aligned frames of both streams for one (image, window)
#[derive(Debug, Clone, Copy)]
pub struct WindowFrames<'a> {
    /// Frames of the primary stream, per axis
    pub primary: [&'a [f64]; AXES],
    /// Frames of the secondary stream, per axis
    pub secondary: [&'a [f64]; AXES],
    /// Role of the first on-disk block
    pub first_role: SensorRole,
    /// Role of the second on-disk block
    pub second_role: SensorRole,
}

impl<'a> WindowFrames<'a> {
    pub fn by_role(&self, role: SensorRole) -> &[&'a [f64]; AXES] {
        match role {
            SensorRole::Primary => &self.primary,
            SensorRole::Secondary => &self.secondary,
        }
    }

    /// Frame at a correlation endpoint, addressed by on-disk block
    pub fn at(&self, endpoint: Endpoint) -> &'a [f64] {
        let role = match endpoint.block {
            Block::First => self.first_role,
            Block::Second => self.second_role,
        };
        self.by_role(role)[endpoint.axis]
    }
}

/// Slices split streams into matched frames
#[derive(Debug, Clone)]
pub struct WindowFrameExtractor {
    config: ExtractionConfig,
}

impl WindowFrameExtractor {
    /// Create an extractor from a configuration, validating it
    pub fn new(config: ExtractionConfig) -> Result<Self, FeatureError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Number of whole images extracted from a log.
    ///
    /// `images_per_file` floors over the total record count; the result is
    /// further limited to the images both streams can fully supply.
    pub fn image_count(&self, streams: &SplitStreams) -> usize {
        let nominal = self.config.images_per_file(streams.split.total);
        let image_len = self.config.image_len();
        let (primary, secondary) = (streams.primary.len(), streams.secondary.len());
        let available = (primary / image_len).min(secondary / image_len);

        if available < nominal {
            warn!(
                "Unbalanced streams ({} primary / {} secondary records): keeping {} of {} images",
                primary,
                secondary,
                available,
                nominal
            );
        }
        nominal.min(available)
    }

    /// Offset of a window inside each stream
    pub fn window_offset(&self, image: usize, window: usize) -> usize {
        image * self.config.image_len() + window * self.config.hop_len()
    }

    /// Frames of both streams at (image, window); both start at the same
    /// relative offset within their stream.
    pub fn frames<'a>(&self, streams: &'a SplitStreams, image: usize, window: usize) -> WindowFrames<'a> {
        let start = self.window_offset(image, window);
        let end = start + self.config.frame_len();
        let slice = |columns: &'a AxisColumns| -> [&'a [f64]; AXES] {
            std::array::from_fn(|axis| &columns.axis(axis)[start..end])
        };

        WindowFrames {
            primary: slice(&streams.primary),
            secondary: slice(&streams.secondary),
            first_role: streams.split.first_role,
            second_role: streams.split.second_role,
        }
    }
}
