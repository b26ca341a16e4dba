// src/analysis/mod.rs
pub mod axis;
pub mod error;
pub mod metrics;
pub mod model;
pub mod plot;
pub mod sweep;
pub use axis::{CurrentRange, StimulationCurrent, TimeAxis, TimeRange};
pub use error::{Result, SweepError};
pub use metrics::{extract, Crossing, Latency, MetricConfig, TraceMetrics};
pub use model::{
    generate, OfflineBackend, ResponseModel, ResponseTrace, SimpleModelParams, SimulationBackend,
};
pub use plot::{render_traces_png, save_traces_png, PlotStyle};
pub use sweep::{run_sweep, MetricsRecord, SweepResult, SweepRunner, SweepSummary};
