use thiserror::Error;
pub type Result<T> = std::result::Result<T, SweepError>;
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("invalid stimulation current {value} mA: {reason}")]
    InvalidCurrent { value: f64, reason: String },
    #[error("invalid time axis: {0}")]
    InvalidTimeAxis(String),
    #[error("invalid {what} range: {reason}")]
    InvalidRange { what: &'static str, reason: String },
    #[error("invalid metric configuration: {0}")]
    InvalidMetricConfig(String),
    #[error("invalid model configuration: {0}")]
    InvalidModelConfig(String),
    #[error("simulation backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("backend returned {actual} samples for a {expected}-point time axis")]
    TraceLengthMismatch { expected: usize, actual: usize },
    #[error("non-finite sample {value} at index {index}")]
    NonFiniteSample { index: usize, value: f64 },
    #[error("response trace has no samples")]
    EmptyTrace,
    #[error("failed to render plot: {0}")]
    Plot(String),
    #[error("export failed: {0}")]
    Export(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
impl SweepError {
    /// Errors that only affect a single trial; the sweep records them and moves on.
    pub fn is_trial_level(&self) -> bool {
        matches!(
            self,
            SweepError::InvalidCurrent { .. }
                | SweepError::BackendUnavailable(_)
                | SweepError::TraceLengthMismatch { .. }
                | SweepError::NonFiniteSample { .. }
                | SweepError::EmptyTrace
        )
    }
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for SweepError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        SweepError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for SweepError {
    fn from(value: image::ImageError) -> Self {
        SweepError::Plot(value.to_string())
    }
}
