//! Statistic and correlation layouts
//!
//! Row orders of the statistics and correlation tensors are fixed by these
//! tables. Changing them changes the column meaning of every table written.

use sensor_log::AXES;

use crate::statistics;

/// A frame with the summaries several statistics share
pub struct FrameSummary<'a> {
    pub values: &'a [f64],
    pub sorted: Vec<f64>,
    pub mean: f64,
    pub std_dev: f64,
}

impl<'a> FrameSummary<'a> {
    pub fn new(values: &'a [f64]) -> Self {
        Self {
            values,
            sorted: statistics::sorted_copy(values),
            mean: statistics::mean(values),
            std_dev: statistics::std_dev(values),
        }
    }

    fn percentile(&self, p: f64) -> f64 {
        statistics::percentile_sorted(&self.sorted, p)
    }
}

/// Per-frame statistic, in output row order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatisticId {
    Mean,
    StdDev,
    CoefficientOfVariation,
    PeakToPeak,
    Percentile10,
    Percentile25,
    Percentile50,
    Percentile75,
    Percentile90,
    InterquartileRange,
    LagOneAutocorrelation,
    Skewness,
    Kurtosis,
    SignalPower,
    LogEnergy,
    ZeroCrossings,
}

/// Estimator evaluated on one frame
pub type Estimator = fn(&FrameSummary) -> f64;

/// Ordered statistic table: row `i` of the statistics tensor is `STATISTICS[i]`
pub const STATISTICS: [(StatisticId, Estimator); 16] = [
    (StatisticId::Mean, |f| f.mean),
    (StatisticId::StdDev, |f| f.std_dev),
    (StatisticId::CoefficientOfVariation, |f| f.std_dev / f.mean),
    (StatisticId::PeakToPeak, |f| statistics::peak_to_peak(f.values)),
    (StatisticId::Percentile10, |f| f.percentile(10.0)),
    (StatisticId::Percentile25, |f| f.percentile(25.0)),
    (StatisticId::Percentile50, |f| f.percentile(50.0)),
    (StatisticId::Percentile75, |f| f.percentile(75.0)),
    (StatisticId::Percentile90, |f| f.percentile(90.0)),
    (StatisticId::InterquartileRange, |f| f.percentile(75.0) - f.percentile(25.0)),
    (StatisticId::LagOneAutocorrelation, |f| statistics::lag_one_autocorrelation(f.values)),
    (StatisticId::Skewness, |f| statistics::skewness(f.values)),
    (StatisticId::Kurtosis, |f| statistics::kurtosis(f.values)),
    (StatisticId::SignalPower, |f| statistics::signal_power(f.values)),
    (StatisticId::LogEnergy, |f| statistics::log_energy(f.values)),
    (StatisticId::ZeroCrossings, |f| statistics::num_zero_crossings(f.values) as f64),
];

/// Number of statistics per frame
pub const STATISTIC_COUNT: usize = STATISTICS.len();

impl StatisticId {
    /// Row of this statistic in the statistics tensor
    pub fn row(&self) -> usize {
        STATISTICS
            .iter()
            .position(|(id, _)| id == self)
            .unwrap_or(STATISTIC_COUNT)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticId::Mean => "mean",
            StatisticId::StdDev => "std",
            StatisticId::CoefficientOfVariation => "cv",
            StatisticId::PeakToPeak => "p2p",
            StatisticId::Percentile10 => "p10",
            StatisticId::Percentile25 => "p25",
            StatisticId::Percentile50 => "p50",
            StatisticId::Percentile75 => "p75",
            StatisticId::Percentile90 => "p90",
            StatisticId::InterquartileRange => "iqr",
            StatisticId::LagOneAutocorrelation => "lag1_autocorr",
            StatisticId::Skewness => "skewness",
            StatisticId::Kurtosis => "kurtosis",
            StatisticId::SignalPower => "power",
            StatisticId::LogEnergy => "log_energy",
            StatisticId::ZeroCrossings => "zero_crossings",
        }
    }
}

/// Evaluate every statistic on a frame, in row order
pub fn frame_statistics(values: &[f64]) -> [f64; STATISTIC_COUNT] {
    let summary = FrameSummary::new(values);
    let mut out = [0.0; STATISTIC_COUNT];
    for (slot, (_, estimator)) in out.iter_mut().zip(STATISTICS.iter()) {
        *slot = estimator(&summary);
    }
    out
}

/// Stream position in the file: correlations are laid out by on-disk order,
/// not by sensor role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    First,
    Second,
}

/// One axis of one on-disk stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub block: Block,
    pub axis: usize,
}

impl Endpoint {
    const fn new(block: Block, axis: usize) -> Self {
        Self { block, axis }
    }
}

/// One correlation row: `correlation(left, right)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationSlot {
    pub pair: (usize, usize),
    pub left: Endpoint,
    pub right: Endpoint,
}

/// Unordered axis pairs, in processing order
pub const AXIS_PAIRS: [(usize, usize); 3] = [(0, 1), (0, 2), (1, 2)];

/// Slots emitted per axis pair
pub const SLOTS_PER_PAIR: usize = 5;

/// Number of correlation rows
pub const CORRELATION_COUNT: usize = AXIS_PAIRS.len() * SLOTS_PER_PAIR;

/// Axis (of the pair) compared across sensors in the fifth slot.
/// Pair (0, 2) compares its second axis, the others their first.
const FIFTH_SLOT_AXIS: [((usize, usize), PairAxis); 3] = [
    ((0, 1), PairAxis::Low),
    ((0, 2), PairAxis::High),
    ((1, 2), PairAxis::Low),
];

#[derive(Debug, Clone, Copy)]
enum PairAxis {
    Low,
    High,
}

/// Build the correlation row table
pub fn correlation_slots() -> Vec<CorrelationSlot> {
    use Block::{First, Second};

    let mut slots = Vec::with_capacity(CORRELATION_COUNT);
    for &(k, l) in AXIS_PAIRS.iter() {
        debug_assert!(k < AXES && l < AXES);
        let pair = (k, l);
        let mut push = |left: Endpoint, right: Endpoint| slots.push(CorrelationSlot { pair, left, right });

        push(Endpoint::new(First, k), Endpoint::new(First, l));
        push(Endpoint::new(Second, k), Endpoint::new(Second, l));
        push(Endpoint::new(Second, k), Endpoint::new(First, l));
        push(Endpoint::new(Second, l), Endpoint::new(First, k));

        let axis = match FIFTH_SLOT_AXIS.iter().find(|(p, _)| *p == pair).map(|(_, a)| *a) {
            Some(PairAxis::High) => l,
            _ => k,
        };
        push(Endpoint::new(Second, axis), Endpoint::new(First, axis));
    }
    slots
}
