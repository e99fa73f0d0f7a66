//! Extraction configuration

use serde::{Deserialize, Serialize};

use crate::FeatureError;

/// Sampling rate of the recording devices (Hz)
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 50;

/// Windowing configuration for feature extraction.
///
/// Durations are whole seconds so that every derived sample count is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Width of one frame / FFT (seconds)
    pub frame_duration_sec: u32,
    /// Stride between consecutive windows (seconds)
    pub hop_sec: u32,
    /// Duration covered by one output row (seconds)
    pub image_duration_sec: u32,
    /// Sampling rate (Hz)
    pub sample_rate_hz: u32,
    /// Lowest spectrum bins forced to zero to suppress DC and drift
    pub suppressed_low_bins: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            frame_duration_sec: 6,
            hop_sec: 2,
            image_duration_sec: 30,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            suppressed_low_bins: 1,
        }
    }
}

impl ExtractionConfig {
    /// Check the window arithmetic once, before any file is processed
    pub fn validate(&self) -> Result<(), FeatureError> {
        let invalid = |reason: String| Err(FeatureError::InvalidConfig(reason));

        if self.frame_duration_sec == 0 || self.hop_sec == 0 || self.image_duration_sec == 0 {
            return invalid("durations must be positive".to_string());
        }
        if self.sample_rate_hz == 0 {
            return invalid("sample rate must be positive".to_string());
        }
        if self.image_duration_sec % self.hop_sec != 0 {
            return invalid(format!(
                "image duration {}s is not divisible by hop {}s",
                self.image_duration_sec, self.hop_sec
            ));
        }
        if self.frame_duration_sec > self.image_duration_sec {
            return invalid(format!(
                "frame duration {}s exceeds image duration {}s",
                self.frame_duration_sec, self.image_duration_sec
            ));
        }
        if (self.image_duration_sec - self.frame_duration_sec) % self.hop_sec != 0 {
            return invalid(format!(
                "windows of {}s every {}s do not tile a {}s image",
                self.frame_duration_sec, self.hop_sec, self.image_duration_sec
            ));
        }
        if self.spectrum_bins() == 0 {
            return invalid("frame is too short for a one-sided spectrum".to_string());
        }
        if self.suppressed_low_bins >= self.spectrum_bins() {
            return invalid(format!(
                "cannot suppress {} of {} spectrum bins",
                self.suppressed_low_bins,
                self.spectrum_bins()
            ));
        }
        Ok(())
    }

    /// Samples per frame
    pub fn frame_len(&self) -> usize {
        (self.frame_duration_sec * self.sample_rate_hz) as usize
    }

    /// Samples between consecutive windows
    pub fn hop_len(&self) -> usize {
        (self.hop_sec * self.sample_rate_hz) as usize
    }

    /// Samples per image, per sensor
    pub fn image_len(&self) -> usize {
        (self.image_duration_sec * self.sample_rate_hz) as usize
    }

    /// Sliding windows inside one image
    pub fn windows_per_image(&self) -> usize {
        ((self.image_duration_sec - self.frame_duration_sec) / self.hop_sec + 1) as usize
    }

    /// Bins kept from the one-sided spectrum of a frame
    pub fn spectrum_bins(&self) -> usize {
        self.frame_len() / 2
    }

    /// Images in a log of `total_records` rows across both sensors.
    ///
    /// Floor division: a trailing partial image is dropped.
    pub fn images_per_file(&self, total_records: usize) -> usize {
        total_records / (2 * self.image_len())
    }
}
