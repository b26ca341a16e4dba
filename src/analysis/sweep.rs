use log::{debug, info, warn};
use serde::Serialize;
use crate::analysis::axis::{CurrentRange, TimeAxis};
use crate::analysis::error::{Result, SweepError};
use crate::analysis::metrics::{extract, MetricConfig, TraceMetrics};
use crate::analysis::model::{generate, ResponseModel, ResponseTrace};
/// Outcome of one trial. Failed trials keep their current and carry the error text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricsRecord {
    pub current_ma: f64,
    pub metrics: Option<TraceMetrics>,
    pub error: Option<String>,
}
impl MetricsRecord {
    pub fn measured(current_ma: f64, metrics: TraceMetrics) -> Self {
        Self {
            current_ma,
            metrics: Some(metrics),
            error: None,
        }
    }
    pub fn failed(current_ma: f64, error: &SweepError) -> Self {
        Self {
            current_ma,
            metrics: None,
            error: Some(error.to_string()),
        }
    }
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
    pub fn peak_mv(&self) -> Option<f64> {
        self.metrics.map(|m| m.peak_mv)
    }
    pub fn persistence_ms(&self) -> Option<f64> {
        self.metrics.map(|m| m.persistence_ms)
    }
    pub fn latency_ms(&self) -> Option<f64> {
        self.metrics.and_then(|m| m.latency.ms())
    }
}
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub trials: usize,
    pub measured: usize,
    pub failed: usize,
    pub without_crossing: usize,
}
/// Everything a sweep produced, in input order.
#[derive(Clone, Debug, Serialize)]
pub struct SweepResult {
    pub model: String,
    pub time_axis: TimeAxis,
    pub records: Vec<MetricsRecord>,
    /// Traces of the trials that produced valid output; failed trials have none.
    pub traces: Vec<ResponseTrace>,
}
impl SweepResult {
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    pub fn currents(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.current_ma).collect()
    }
    pub fn failures(&self) -> impl Iterator<Item = &MetricsRecord> {
        self.records.iter().filter(|r| !r.is_valid())
    }
    pub fn summary(&self) -> SweepSummary {
        let mut summary = SweepSummary {
            trials: self.records.len(),
            ..SweepSummary::default()
        };
        for record in &self.records {
            match &record.metrics {
                Some(metrics) => {
                    summary.measured += 1;
                    if !metrics.latency.is_defined() {
                        summary.without_crossing += 1;
                    }
                }
                None => summary.failed += 1,
            }
        }
        summary
    }
}
/// Runs one model over a list of currents, one trial at a time.
pub struct SweepRunner<'m> {
    model: &'m ResponseModel,
    bounds: CurrentRange,
    config: MetricConfig,
}
impl<'m> SweepRunner<'m> {
    pub fn new(model: &'m ResponseModel, bounds: CurrentRange, config: MetricConfig) -> Self {
        Self {
            model,
            bounds,
            config,
        }
    }
    pub fn model(&self) -> &ResponseModel {
        self.model
    }
    /// Configuration problems abort the sweep; anything that goes wrong inside a
    /// trial is written into that trial's record instead.
    pub fn run(&self, currents: &[f64], axis: &TimeAxis) -> Result<SweepResult> {
        self.bounds.validate()?;
        self.config.validate()?;
        info!(
            "sweeping {} currents over {} samples ({} ms) with the {} model",
            currents.len(),
            axis.len(),
            axis.duration_ms(),
            self.model.label()
        );
        let mut records = Vec::with_capacity(currents.len());
        let mut traces = Vec::with_capacity(currents.len());
        for (trial, &current_ma) in currents.iter().enumerate() {
            match self.run_trial(current_ma, axis) {
                Ok((trace, metrics)) => {
                    debug!(
                        "trial {trial}: {current_ma} mA -> peak {:.3} mV, persists {:.3} ms, {:?}",
                        metrics.peak_mv, metrics.persistence_ms, metrics.latency
                    );
                    records.push(MetricsRecord::measured(current_ma, metrics));
                    traces.push(trace);
                }
                Err(err) if err.is_trial_level() => {
                    warn!("trial {trial}: {current_ma} mA failed: {err}");
                    records.push(MetricsRecord::failed(current_ma, &err));
                }
                Err(err) => return Err(err),
            }
        }
        let result = SweepResult {
            model: self.model.label(),
            time_axis: axis.clone(),
            records,
            traces,
        };
        let summary = result.summary();
        info!(
            "sweep finished: {} measured, {} failed, {} without threshold crossing",
            summary.measured, summary.failed, summary.without_crossing
        );
        Ok(result)
    }
    fn run_trial(&self, current_ma: f64, axis: &TimeAxis) -> Result<(ResponseTrace, TraceMetrics)> {
        let trace = generate(current_ma, axis, self.model, &self.bounds)?;
        let metrics = extract(&trace, axis, &self.config)?;
        Ok((trace, metrics))
    }
}
/// One-shot form of [`SweepRunner::run`].
pub fn run_sweep(
    currents: &[f64],
    axis: &TimeAxis,
    model: &ResponseModel,
    bounds: &CurrentRange,
    config: &MetricConfig,
) -> Result<SweepResult> {
    SweepRunner::new(model, *bounds, *config).run(currents, axis)
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::axis::TimeRange;
    use crate::analysis::model::SimulationBackend;
    use std::cell::Cell;
    fn axis() -> TimeAxis {
        TimeAxis::from_range(&TimeRange {
            start_ms: 0.0,
            end_ms: 20.0,
            step_ms: 1.0,
        })
        .unwrap()
    }
    /// Refuses every other call, starting with the second.
    struct FlakyBackend {
        calls: Cell<usize>,
    }
    impl SimulationBackend for FlakyBackend {
        fn name(&self) -> &str {
            "flaky"
        }
        fn simulate(&self, current_ma: f64, times_ms: &[f64]) -> Result<Vec<f64>> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            if call % 2 == 1 {
                return Err(SweepError::BackendUnavailable("connection refused".into()));
            }
            Ok(times_ms.iter().map(|t| -60.0 - current_ma * t).collect())
        }
    }
    #[test]
    fn simple_sweep_scenario() {
        let model = ResponseModel::default();
        let result = run_sweep(
            &[0.1, 0.5, 1.0],
            &axis(),
            &model,
            &CurrentRange::default(),
            &MetricConfig::default(),
        )
        .unwrap();
        assert_eq!(result.currents(), vec![0.1, 0.5, 1.0]);
        assert_eq!(result.traces.len(), 3);
        let peaks: Vec<f64> = result.records.iter().filter_map(|r| r.peak_mv()).collect();
        assert!(peaks.windows(2).all(|w| w[1] > w[0]));
        let latencies: Vec<f64> = result
            .records
            .iter()
            .map(|r| r.latency_ms().expect("every trial crosses -64 mV"))
            .collect();
        assert!(latencies[0] > latencies[1] && latencies[1] > latencies[2]);
        assert!(result
            .records
            .iter()
            .all(|r| r.persistence_ms().unwrap() >= 0.0));
        assert_eq!(
            result.summary(),
            SweepSummary {
                trials: 3,
                measured: 3,
                failed: 0,
                without_crossing: 0
            }
        );
    }
    #[test]
    fn failed_trials_are_recorded_in_place() {
        let model = ResponseModel::realistic(FlakyBackend {
            calls: Cell::new(0),
        });
        let currents = [0.2, 0.4, 0.6, 0.8];
        let result = run_sweep(
            &currents,
            &axis(),
            &model,
            &CurrentRange::default(),
            &MetricConfig::default(),
        )
        .unwrap();
        assert_eq!(result.currents(), currents.to_vec());
        let valid: Vec<bool> = result.records.iter().map(|r| r.is_valid()).collect();
        assert_eq!(valid, vec![true, false, true, false]);
        assert_eq!(result.traces.len(), 2);
        assert!(result.records[1]
            .error
            .as_deref()
            .unwrap()
            .contains("connection refused"));
        assert_eq!(result.failures().count(), 2);
    }
    #[test]
    fn invalid_currents_and_duplicates_keep_their_slot() {
        let model = ResponseModel::default();
        let currents = [0.5, f64::NAN, 0.5, 3.0];
        let result = run_sweep(
            &currents,
            &axis(),
            &model,
            &CurrentRange::default(),
            &MetricConfig::default(),
        )
        .unwrap();
        assert_eq!(result.len(), 4);
        assert!(result.records[0].is_valid());
        assert!(!result.records[1].is_valid());
        assert_eq!(result.records[0], result.records[2]);
        assert!(!result.records[3].is_valid());
    }
    #[test]
    fn configuration_errors_abort_the_sweep() {
        let model = ResponseModel::default();
        let bad_config = MetricConfig {
            persistence_tolerance_pct: f64::NAN,
            ..MetricConfig::default()
        };
        assert!(matches!(
            run_sweep(&[0.5], &axis(), &model, &CurrentRange::default(), &bad_config),
            Err(SweepError::InvalidMetricConfig(_))
        ));
        let bad_bounds = CurrentRange {
            min_ma: 2.0,
            max_ma: 1.0,
            step_ma: 0.1,
        };
        assert!(run_sweep(&[0.5], &axis(), &model, &bad_bounds, &MetricConfig::default()).is_err());
    }
    #[test]
    fn empty_current_list_gives_empty_result() {
        let model = ResponseModel::default();
        let result = run_sweep(
            &[],
            &axis(),
            &model,
            &CurrentRange::default(),
            &MetricConfig::default(),
        )
        .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.summary().trials, 0);
    }
}
