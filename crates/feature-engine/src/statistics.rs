//! Statistical Estimators
//!
//! Population estimators over one frame. None of them guard against
//! degenerate input: a flat frame has zero variance and yields NaN or ±inf
//! for the normalized statistics, which is surfaced in the output tables
//! rather than treated as an error.

/// Arithmetic mean
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by `n`)
pub fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Difference between the largest and smallest value
pub fn peak_to_peak(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    max - min
}

/// Percentile of an already sorted slice, linearly interpolated between the
/// two closest ranks. `p` is in percent.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Percentile of an unsorted slice
pub fn percentile(values: &[f64], p: f64) -> f64 {
    percentile_sorted(&sorted_copy(values), p)
}

/// Ascending copy of the values (NaN sorts last)
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Lag-one autocorrelation: Σ(x_i - m)(x_{i+1} - m) / (var · n)
pub fn lag_one_autocorrelation(values: &[f64]) -> f64 {
    let m = mean(values);
    let denom = variance(values) * values.len() as f64;
    let sum: f64 = values.windows(2).map(|w| (w[0] - m) * (w[1] - m)).sum();
    sum / denom
}

/// Skewness: E[(X-μ)³] / σ³
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let m = mean(values);
    let std = std_dev(values);
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / n;
    m3 / std.powi(3)
}

/// Excess kurtosis normalized by σ⁶: E[(X-μ)⁴] / σ⁶ - 3.
///
/// The sixth power keeps feature tables compatible with previously
/// extracted datasets; the conventional statistic divides by σ⁴.
pub fn kurtosis(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let m = mean(values);
    let std = std_dev(values);
    let m4 = values.iter().map(|v| (v - m).powi(4)).sum::<f64>() / n;
    m4 / std.powi(6) - 3.0
}

/// Signal power: squared Euclidean norm
pub fn signal_power(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

/// Log-energy: Σ ln(x²) over the non-zero samples
pub fn log_energy(values: &[f64]) -> f64 {
    values
        .iter()
        .filter(|&&v| v != 0.0)
        .map(|v| (v * v).ln())
        .sum()
}

/// Number of sign changes of the mean-centred signal.
///
/// A sample landing exactly on the mean has sign 0, so passing through it
/// counts as a change on each side.
pub fn num_zero_crossings(values: &[f64]) -> usize {
    let m = mean(values);
    let signs: Vec<i8> = values.iter().map(|&v| sign(v - m)).collect();
    signs.windows(2).filter(|w| w[0] != w[1]).count()
}

/// Doubly-normalized cross-correlation:
/// Σ(x-mx)(y-my) / ((var_x · n) · (var_y · n)).
///
/// This is not the Pearson coefficient; `correlation(x, x)` is
/// `1 / (var_x · n)`.
pub fn correlation(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let mx = mean(x);
    let my = mean(y);
    let num: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let denom_x = variance(x) * x.len() as f64;
    let denom_y = variance(y) * y.len() as f64;
    num / (denom_x * denom_y)
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}
