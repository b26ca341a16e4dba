use serde::{Deserialize, Serialize};
use crate::analysis::error::{Result, SweepError};
/// Upper bound on generated grid sizes; anything larger is almost certainly a unit mistake.
const MAX_GRID_POINTS: usize = 1_000_000;
/// Slack used when comparing computed grid points against the configured end.
fn grid_slack(step: f64) -> f64 {
    step.abs() * 1e-9
}
fn grid_len(what: &'static str, start: f64, end: f64, step: f64) -> Result<usize> {
    if !start.is_finite() || !end.is_finite() || !step.is_finite() {
        return Err(SweepError::InvalidRange {
            what,
            reason: format!("bounds must be finite (start {start}, end {end}, step {step})"),
        });
    }
    if step <= 0.0 {
        return Err(SweepError::InvalidRange {
            what,
            reason: format!("step must be positive, got {step}"),
        });
    }
    if end < start {
        return Err(SweepError::InvalidRange {
            what,
            reason: format!("end {end} is below start {start}"),
        });
    }
    let span = (end - start) / step;
    let count = (span + 1e-9).floor() + 1.0;
    if count > MAX_GRID_POINTS as f64 {
        return Err(SweepError::InvalidRange {
            what,
            reason: format!("{count} points exceeds the limit of {MAX_GRID_POINTS}"),
        });
    }
    Ok(count as usize)
}
/// Inclusive current sweep bounds in mA.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrentRange {
    pub min_ma: f64,
    pub max_ma: f64,
    pub step_ma: f64,
}
impl Default for CurrentRange {
    fn default() -> Self {
        Self {
            min_ma: 0.1,
            max_ma: 1.0,
            step_ma: 0.1,
        }
    }
}
impl CurrentRange {
    pub fn validate(&self) -> Result<()> {
        grid_len("current", self.min_ma, self.max_ma, self.step_ma)?;
        if self.min_ma <= 0.0 {
            return Err(SweepError::InvalidRange {
                what: "current",
                reason: format!("minimum must be positive, got {}", self.min_ma),
            });
        }
        Ok(())
    }
    /// Ascending grid `min, min + step, ...` up to and including `max`.
    pub fn grid(&self) -> Result<Vec<f64>> {
        self.validate()?;
        let count = grid_len("current", self.min_ma, self.max_ma, self.step_ma)?;
        Ok((0..count)
            .map(|i| (self.min_ma + i as f64 * self.step_ma).min(self.max_ma))
            .collect())
    }
    pub fn contains(&self, current_ma: f64) -> bool {
        let slack = grid_slack(self.step_ma);
        current_ma >= self.min_ma - slack && current_ma <= self.max_ma + slack
    }
    /// Checks a raw current against these bounds and wraps it.
    pub fn admit(&self, current_ma: f64) -> Result<StimulationCurrent> {
        let current = StimulationCurrent::new(current_ma)?;
        if !self.contains(current_ma) {
            return Err(SweepError::InvalidCurrent {
                value: current_ma,
                reason: format!(
                    "outside configured bounds [{}, {}] mA",
                    self.min_ma, self.max_ma
                ),
            });
        }
        Ok(current)
    }
}
/// A validated stimulation amplitude in mA.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize)]
pub struct StimulationCurrent(f64);
impl StimulationCurrent {
    pub fn new(milliamps: f64) -> Result<Self> {
        if !milliamps.is_finite() {
            return Err(SweepError::InvalidCurrent {
                value: milliamps,
                reason: "not a finite number".into(),
            });
        }
        if milliamps <= 0.0 {
            return Err(SweepError::InvalidCurrent {
                value: milliamps,
                reason: "must be positive".into(),
            });
        }
        Ok(Self(milliamps))
    }
    pub fn milliamps(&self) -> f64 {
        self.0
    }
}
/// Inclusive time bounds in ms used to build a [`TimeAxis`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_ms: f64,
    pub end_ms: f64,
    pub step_ms: f64,
}
impl Default for TimeRange {
    fn default() -> Self {
        Self {
            start_ms: 0.0,
            end_ms: 20.0,
            step_ms: 0.1,
        }
    }
}
/// Strictly increasing sample times (ms) shared by every trial in a sweep.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeAxis {
    times_ms: Vec<f64>,
}
impl TimeAxis {
    pub fn new(times_ms: Vec<f64>) -> Result<Self> {
        if times_ms.is_empty() {
            return Err(SweepError::InvalidTimeAxis("axis has no samples".into()));
        }
        if let Some((index, t)) = times_ms.iter().enumerate().find(|(_, t)| !t.is_finite()) {
            return Err(SweepError::InvalidTimeAxis(format!(
                "non-finite time {t} at index {index}"
            )));
        }
        if let Some(index) = times_ms.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SweepError::InvalidTimeAxis(format!(
                "time {} at index {} does not increase on {}",
                times_ms[index + 1],
                index + 1,
                times_ms[index]
            )));
        }
        Ok(Self { times_ms })
    }
    pub fn from_range(range: &TimeRange) -> Result<Self> {
        let count = grid_len("time", range.start_ms, range.end_ms, range.step_ms)
            .map_err(|e| SweepError::InvalidTimeAxis(e.to_string()))?;
        let times = (0..count)
            .map(|i| range.start_ms + i as f64 * range.step_ms)
            .collect();
        Self::new(times)
    }
    pub fn len(&self) -> usize {
        self.times_ms.len()
    }
    pub fn is_empty(&self) -> bool {
        self.times_ms.is_empty()
    }
    pub fn times_ms(&self) -> &[f64] {
        &self.times_ms
    }
    pub fn at(&self, index: usize) -> Option<f64> {
        self.times_ms.get(index).copied()
    }
    pub fn start_ms(&self) -> f64 {
        self.times_ms[0]
    }
    pub fn end_ms(&self) -> f64 {
        self.times_ms[self.times_ms.len() - 1]
    }
    pub fn duration_ms(&self) -> f64 {
        self.end_ms() - self.start_ms()
    }
}
