//! Per-trace response metrics.
//!
//! Peak:
//! - Largest sample in the trace; ties resolve to the earliest index.
//!
//! Persistence:
//! - Tolerance band is `|peak| * tolerance_pct / 100` on either side of the peak.
//! - Starting at the peak, extend backward and forward while samples stay in the band.
//! - Persistence is the time between the first and last sample of that contiguous run.
//!   Samples in the band that are not connected to the peak do not count.
//!
//! Latency:
//! - Time of the first sample that reaches the threshold (`<=` for falling, `>=` for rising).
//! - No such sample is reported as [`Latency::NoThresholdCrossing`], never as zero.
use serde::{Deserialize, Serialize};
use crate::analysis::axis::TimeAxis;
use crate::analysis::error::{Result, SweepError};
use crate::analysis::model::ResponseTrace;
pub const DEFAULT_PERSISTENCE_TOLERANCE_PCT: f64 = 1.0;
pub const DEFAULT_LATENCY_THRESHOLD_MV: f64 = -64.0;
/// Which side of the threshold counts as a crossing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossing {
    /// First sample at or below the threshold.
    #[default]
    Falling,
    /// First sample at or above the threshold.
    Rising,
}
impl Crossing {
    fn reached(self, sample: f64, threshold: f64) -> bool {
        match self {
            Crossing::Falling => sample <= threshold,
            Crossing::Rising => sample >= threshold,
        }
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    pub persistence_tolerance_pct: f64,
    pub latency_threshold_mv: f64,
    pub crossing: Crossing,
}
impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            persistence_tolerance_pct: DEFAULT_PERSISTENCE_TOLERANCE_PCT,
            latency_threshold_mv: DEFAULT_LATENCY_THRESHOLD_MV,
            crossing: Crossing::default(),
        }
    }
}
impl MetricConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.persistence_tolerance_pct.is_finite() || self.persistence_tolerance_pct < 0.0 {
            return Err(SweepError::InvalidMetricConfig(format!(
                "persistence tolerance must be a non-negative percentage, got {}",
                self.persistence_tolerance_pct
            )));
        }
        if !self.latency_threshold_mv.is_finite() {
            return Err(SweepError::InvalidMetricConfig(format!(
                "latency threshold must be finite, got {}",
                self.latency_threshold_mv
            )));
        }
        Ok(())
    }
}
/// Threshold-crossing time, or the missing-value marker when the trace never crosses.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Latency {
    Crossed { ms: f64 },
    NoThresholdCrossing,
}
impl Latency {
    pub fn ms(&self) -> Option<f64> {
        match self {
            Latency::Crossed { ms } => Some(*ms),
            Latency::NoThresholdCrossing => None,
        }
    }
    /// Tabular form: NaN stands in for a missing crossing.
    pub fn ms_or_nan(&self) -> f64 {
        self.ms().unwrap_or(f64::NAN)
    }
    pub fn is_defined(&self) -> bool {
        matches!(self, Latency::Crossed { .. })
    }
}
/// The three scalars extracted from one trace.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceMetrics {
    pub peak_mv: f64,
    pub peak_time_ms: f64,
    pub persistence_ms: f64,
    pub latency: Latency,
}
/// Index and value of the largest sample, earliest index on ties.
pub fn peak(samples_mv: &[f64]) -> Result<(usize, f64)> {
    let (&first, rest) = samples_mv.split_first().ok_or(SweepError::EmptyTrace)?;
    let mut best = (0, first);
    for (offset, &value) in rest.iter().enumerate() {
        if value > best.1 {
            best = (offset + 1, value);
        }
    }
    Ok(best)
}
/// Contiguous run of samples around `peak_index` within the tolerance band, as `(first, last)`.
pub(crate) fn persistence_window(
    samples_mv: &[f64],
    peak_index: usize,
    tolerance_pct: f64,
) -> (usize, usize) {
    let peak_mv = samples_mv[peak_index];
    let band = peak_mv.abs() * tolerance_pct / 100.0;
    let within = |v: f64| (v - peak_mv).abs() <= band;
    let mut first = peak_index;
    while first > 0 && within(samples_mv[first - 1]) {
        first -= 1;
    }
    let mut last = peak_index;
    while last + 1 < samples_mv.len() && within(samples_mv[last + 1]) {
        last += 1;
    }
    (first, last)
}
pub(crate) fn persistence_ms(
    times_ms: &[f64],
    samples_mv: &[f64],
    peak_index: usize,
    tolerance_pct: f64,
) -> f64 {
    let (first, last) = persistence_window(samples_mv, peak_index, tolerance_pct);
    times_ms[last] - times_ms[first]
}
pub(crate) fn latency(
    times_ms: &[f64],
    samples_mv: &[f64],
    threshold_mv: f64,
    crossing: Crossing,
) -> Latency {
    samples_mv
        .iter()
        .position(|&v| crossing.reached(v, threshold_mv))
        .map(|index| Latency::Crossed { ms: times_ms[index] })
        .unwrap_or(Latency::NoThresholdCrossing)
}
/// Computes peak, persistence and latency for one trace.
pub fn extract(
    trace: &ResponseTrace,
    axis: &TimeAxis,
    config: &MetricConfig,
) -> Result<TraceMetrics> {
    if trace.is_empty() {
        return Err(SweepError::EmptyTrace);
    }
    trace.validate(axis)?;
    let samples = trace.samples_mv.as_slice();
    let (peak_index, peak_mv) = peak(samples)?;
    let times = axis.times_ms();
    Ok(TraceMetrics {
        peak_mv,
        peak_time_ms: times[peak_index],
        persistence_ms: persistence_ms(
            times,
            samples,
            peak_index,
            config.persistence_tolerance_pct,
        ),
        latency: latency(times, samples, config.latency_threshold_mv, config.crossing),
    })
}
#[cfg(test)]
mod tests {
    use super::*;
    fn unit_axis(n: usize) -> TimeAxis {
        TimeAxis::new((0..n).map(|i| i as f64).collect()).unwrap()
    }
    fn trace(samples: Vec<f64>) -> ResponseTrace {
        ResponseTrace {
            current_ma: 0.5,
            samples_mv: samples,
        }
    }
    #[test]
    fn peak_prefers_earliest_tie() {
        assert_eq!(peak(&[-70.0, -50.0, -60.0, -50.0]).unwrap(), (1, -50.0));
        assert!(matches!(peak(&[]), Err(SweepError::EmptyTrace)));
    }
    #[test]
    fn persistence_is_contiguous_around_peak() {
        // index 4 is inside the band but cut off from the peak by index 3
        let samples = [-70.0, -50.2, -50.0, -60.0, -50.1];
        let (first, last) = persistence_window(&samples, 2, 1.0);
        assert_eq!((first, last), (1, 2));
        let times = [0.0, 0.5, 1.0, 1.5, 2.0];
        assert_eq!(persistence_ms(&times, &samples, 2, 1.0), 0.5);
    }
    #[test]
    fn lone_peak_has_zero_persistence() {
        let samples = [-70.0, -40.0, -70.0];
        assert_eq!(persistence_ms(&[0.0, 1.0, 2.0], &samples, 1, 1.0), 0.0);
    }
    #[test]
    fn latency_reports_first_crossing_or_missing() {
        let times = [0.0, 1.0, 2.0, 3.0];
        let samples = [-60.0, -63.0, -64.0, -70.0];
        assert_eq!(
            latency(&times, &samples, -64.0, Crossing::Falling),
            Latency::Crossed { ms: 2.0 }
        );
        assert_eq!(
            latency(&times, &samples, -80.0, Crossing::Falling),
            Latency::NoThresholdCrossing
        );
        assert_eq!(
            latency(&times, &samples, -61.0, Crossing::Rising),
            Latency::Crossed { ms: 0.0 }
        );
        assert!(Latency::NoThresholdCrossing.ms_or_nan().is_nan());
    }
    #[test]
    fn extract_combines_all_metrics() {
        let axis = unit_axis(6);
        let t = trace(vec![-55.0, -50.0, -50.3, -58.0, -65.0, -70.0]);
        let metrics = extract(&t, &axis, &MetricConfig::default()).unwrap();
        assert_eq!(metrics.peak_mv, -50.0);
        assert_eq!(metrics.peak_time_ms, 1.0);
        assert_eq!(metrics.persistence_ms, 1.0);
        assert_eq!(metrics.latency.ms(), Some(4.0));
    }
    #[test]
    fn extract_guards_empty_and_mismatched_traces() {
        let axis = unit_axis(3);
        assert!(matches!(
            extract(&trace(vec![]), &axis, &MetricConfig::default()),
            Err(SweepError::EmptyTrace)
        ));
        assert!(matches!(
            extract(&trace(vec![-60.0]), &axis, &MetricConfig::default()),
            Err(SweepError::TraceLengthMismatch { .. })
        ));
    }
    #[test]
    fn extract_rejects_non_finite_samples() {
        let axis = unit_axis(3);
        assert!(matches!(
            extract(&trace(vec![f64::NAN, -50.0, -70.0]), &axis, &MetricConfig::default()),
            Err(SweepError::NonFiniteSample { index: 0, .. })
        ));
        assert!(matches!(
            extract(&trace(vec![-60.0, f64::INFINITY, -70.0]), &axis, &MetricConfig::default()),
            Err(SweepError::NonFiniteSample { index: 1, .. })
        ));
    }
    #[test]
    fn metric_config_validation() {
        assert!(MetricConfig::default().validate().is_ok());
        let negative = MetricConfig {
            persistence_tolerance_pct: -1.0,
            ..MetricConfig::default()
        };
        assert!(negative.validate().is_err());
        let nan = MetricConfig {
            latency_threshold_mv: f64::NAN,
            ..MetricConfig::default()
        };
        assert!(nan.validate().is_err());
    }
}
