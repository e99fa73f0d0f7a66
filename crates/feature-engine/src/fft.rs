//! FFT-based Frequency Analysis

use rustfft::{num_complex::Complex, FftPlanner};

/// Bins zeroed at the bottom of a whole-stream overview spectrum
pub const OVERVIEW_IGNORED_BINS: usize = 20;

/// One-sided magnitude spectrum of an entire sensor stream
#[derive(Debug, Clone, Default)]
pub struct StreamSpectrum {
    /// Spacing of the frequency axis, which spans `0..=rate/2` evenly (Hz)
    pub resolution: f64,
    /// Magnitude of each bin
    pub magnitudes: Vec<f64>,
    /// Frequency of the strongest bin (Hz)
    pub dominant_frequency: f64,
}

/// FFT analyzer producing one-sided magnitude spectra
pub struct SpectrumAnalyzer {
    /// FFT planner, caches plans per length
    planner: FftPlanner<f64>,
    /// Sampling frequency (Hz)
    sample_rate: f64,
}

impl SpectrumAnalyzer {
    /// Create a new analyzer
    pub fn new(sample_rate: f64) -> Self {
        Self {
            planner: FftPlanner::new(),
            sample_rate,
        }
    }

    /// Magnitude of the first `len / 2` FFT bins of `signal`, with the lowest
    /// `suppressed_low_bins` forced to zero.
    pub fn magnitude(&mut self, signal: &[f64], suppressed_low_bins: usize) -> Vec<f64> {
        let n = signal.len();
        if n == 0 {
            return Vec::new();
        }

        let mut buffer: Vec<Complex<f64>> = signal.iter().map(|&v| Complex::new(v, 0.0)).collect();
        let fft = self.planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        buffer
            .iter()
            .take(n / 2)
            .enumerate()
            .map(|(i, c)| if i < suppressed_low_bins { 0.0 } else { c.norm() })
            .collect()
    }

    /// Overview spectrum of a full stream with drift bins removed
    pub fn overview(&mut self, signal: &[f64]) -> StreamSpectrum {
        let magnitudes = self.magnitude(signal, OVERVIEW_IGNORED_BINS);
        if magnitudes.is_empty() {
            return StreamSpectrum::default();
        }

        let nyquist = self.sample_rate / 2.0;
        let resolution = if magnitudes.len() > 1 {
            nyquist / (magnitudes.len() - 1) as f64
        } else {
            0.0
        };

        let dominant_idx = magnitudes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);

        StreamSpectrum {
            resolution,
            dominant_frequency: dominant_idx as f64 * resolution,
            magnitudes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, rate: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / rate).sin())
            .collect()
    }

    #[test]
    fn test_magnitude_is_one_sided() {
        let mut analyzer = SpectrumAnalyzer::new(50.0);
        let spectrum = analyzer.magnitude(&sine(5.0, 50.0, 300), 0);
        assert_eq!(spectrum.len(), 150);

        // 5 Hz at 50 Hz over 300 samples lands exactly on bin 30
        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 30);
        assert!((spectrum[30] - 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_low_bins_suppressed() {
        let mut analyzer = SpectrumAnalyzer::new(50.0);
        let signal: Vec<f64> = sine(5.0, 50.0, 300).iter().map(|v| v + 9.81).collect();

        let raw = analyzer.magnitude(&signal, 0);
        assert!(raw[0] > 1000.0);

        let suppressed = analyzer.magnitude(&signal, 1);
        assert_eq!(suppressed[0], 0.0);
        assert_eq!(suppressed[30], raw[30]);
    }

    #[test]
    fn test_overview_dominant_frequency() {
        let mut analyzer = SpectrumAnalyzer::new(50.0);
        let spectrum = analyzer.overview(&sine(8.0, 50.0, 1000));

        assert_eq!(spectrum.magnitudes.len(), 500);
        assert!(spectrum.magnitudes[..OVERVIEW_IGNORED_BINS].iter().all(|&m| m == 0.0));
        // Last bin sits at the Nyquist frequency
        assert!((spectrum.resolution * 499.0 - 25.0).abs() < 1e-9);
        assert!((spectrum.dominant_frequency - 8.0).abs() < 0.1);
    }

    #[test]
    fn test_empty_signal() {
        let mut analyzer = SpectrumAnalyzer::new(50.0);
        assert!(analyzer.magnitude(&[], 0).is_empty());
        assert_eq!(analyzer.overview(&[]).dominant_frequency, 0.0);
    }
}
