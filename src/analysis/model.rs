use std::fmt;
use log::warn;
use serde::{Deserialize, Serialize};
use crate::analysis::axis::{CurrentRange, StimulationCurrent, TimeAxis};
use crate::analysis::error::{Result, SweepError};
/// Membrane potential samples (mV), one per time-axis point.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResponseTrace {
    pub current_ma: f64,
    pub samples_mv: Vec<f64>,
}
impl ResponseTrace {
    pub fn len(&self) -> usize {
        self.samples_mv.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples_mv.is_empty()
    }
    /// Rejects traces that do not line up with `axis` or contain NaN/Inf.
    pub fn validate(&self, axis: &TimeAxis) -> Result<()> {
        if self.samples_mv.len() != axis.len() {
            return Err(SweepError::TraceLengthMismatch {
                expected: axis.len(),
                actual: self.samples_mv.len(),
            });
        }
        if let Some((index, &value)) = self
            .samples_mv
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
        {
            return Err(SweepError::NonFiniteSample { index, value });
        }
        Ok(())
    }
}
/// Closed-form response: an onset transient followed by current-scaled hyperpolarisation.
///
/// `V(t) = rest + I * (g_t * e^(-dt/tau_t) - g_i * (1 - e^(-dt/tau_i)))`, with `dt` measured
/// from the first sample of the axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleModelParams {
    pub resting_mv: f64,
    pub transient_gain_mv_per_ma: f64,
    pub transient_tau_ms: f64,
    pub inhibition_gain_mv_per_ma: f64,
    pub inhibition_tau_ms: f64,
}
impl Default for SimpleModelParams {
    fn default() -> Self {
        Self {
            resting_mv: -62.0,
            transient_gain_mv_per_ma: 20.0,
            transient_tau_ms: 3.0,
            inhibition_gain_mv_per_ma: 40.0,
            inhibition_tau_ms: 5.0,
        }
    }
}
impl SimpleModelParams {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            self.resting_mv,
            self.transient_gain_mv_per_ma,
            self.transient_tau_ms,
            self.inhibition_gain_mv_per_ma,
            self.inhibition_tau_ms,
        ];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(SweepError::InvalidModelConfig(
                "simple model parameters must be finite".into(),
            ));
        }
        if self.transient_tau_ms <= 0.0 || self.inhibition_tau_ms <= 0.0 {
            return Err(SweepError::InvalidModelConfig(
                "simple model time constants must be positive".into(),
            ));
        }
        Ok(())
    }
    pub fn potential_at(&self, current_ma: f64, elapsed_ms: f64) -> f64 {
        let transient =
            self.transient_gain_mv_per_ma * (-elapsed_ms / self.transient_tau_ms).exp();
        let inhibition =
            self.inhibition_gain_mv_per_ma * (1.0 - (-elapsed_ms / self.inhibition_tau_ms).exp());
        self.resting_mv + current_ma * (transient - inhibition)
    }
}
/// External biophysical simulator. Implementations must be treated as black boxes:
/// the returned samples are validated before anything reads them.
pub trait SimulationBackend {
    fn name(&self) -> &str;
    fn simulate(&self, current_ma: f64, times_ms: &[f64]) -> Result<Vec<f64>>;
}
/// The two response models a sweep can run under.
pub enum ResponseModel {
    Simple(SimpleModelParams),
    Realistic(Box<dyn SimulationBackend>),
}
impl fmt::Debug for ResponseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseModel::Simple(params) => f.debug_tuple("Simple").field(params).finish(),
            ResponseModel::Realistic(backend) => {
                f.debug_tuple("Realistic").field(&backend.name()).finish()
            }
        }
    }
}
impl Default for ResponseModel {
    fn default() -> Self {
        ResponseModel::Simple(SimpleModelParams::default())
    }
}
impl ResponseModel {
    pub fn realistic(backend: impl SimulationBackend + 'static) -> Self {
        ResponseModel::Realistic(Box::new(backend))
    }
    /// Uses the backend produced by `connect`, or the simple model when it cannot be reached.
    pub fn realistic_or_simple<B, F>(connect: F, fallback: SimpleModelParams) -> Self
    where
        B: SimulationBackend + 'static,
        F: FnOnce() -> Result<B>,
    {
        match connect() {
            Ok(backend) => ResponseModel::realistic(backend),
            Err(err) => {
                warn!("realistic backend unavailable ({err}); falling back to the simple model");
                ResponseModel::Simple(fallback)
            }
        }
    }
    pub fn label(&self) -> String {
        match self {
            ResponseModel::Simple(_) => "simple".into(),
            ResponseModel::Realistic(backend) => format!("realistic:{}", backend.name()),
        }
    }
    pub fn is_realistic(&self) -> bool {
        matches!(self, ResponseModel::Realistic(_))
    }
    /// Produces a validated trace for an already-admitted current.
    pub fn respond(&self, current: StimulationCurrent, axis: &TimeAxis) -> Result<ResponseTrace> {
        let current_ma = current.milliamps();
        let samples_mv = match self {
            ResponseModel::Simple(params) => {
                let t0 = axis.start_ms();
                axis.times_ms()
                    .iter()
                    .map(|&t| params.potential_at(current_ma, t - t0))
                    .collect()
            }
            ResponseModel::Realistic(backend) => backend.simulate(current_ma, axis.times_ms())?,
        };
        let trace = ResponseTrace {
            current_ma,
            samples_mv,
        };
        trace.validate(axis)?;
        Ok(trace)
    }
}
/// Checks the current against the sweep bounds, then asks `model` for a trace.
pub fn generate(
    current_ma: f64,
    axis: &TimeAxis,
    model: &ResponseModel,
    bounds: &CurrentRange,
) -> Result<ResponseTrace> {
    let current = bounds.admit(current_ma)?;
    model.respond(current, axis)
}
/// Backend that is never reachable; stands in when no simulator is installed.
#[derive(Clone, Debug, Default)]
pub struct OfflineBackend {
    pub reason: String,
}
impl SimulationBackend for OfflineBackend {
    fn name(&self) -> &str {
        "offline"
    }
    fn simulate(&self, _current_ma: f64, _times_ms: &[f64]) -> Result<Vec<f64>> {
        let reason = if self.reason.is_empty() {
            "no simulator configured"
        } else {
            self.reason.as_str()
        };
        Err(SweepError::BackendUnavailable(reason.to_string()))
    }
}
