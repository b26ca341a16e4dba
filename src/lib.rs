//! Stimulation-current sweeps over synthetic membrane responses.
//!
//! A sweep runs one [`analysis::ResponseModel`] over a list of currents, extracts peak,
//! persistence and latency from each trace, and hands back a [`analysis::SweepResult`]
//! with one record per current in input order. [`recorder`] and [`analysis::plot`]
//! turn that result into tables, CSV/JSON files and an overlay PNG.
pub mod analysis;
pub mod backend;
pub mod config;
pub mod recorder;
pub use analysis::{
    extract, generate, run_sweep, CurrentRange, Latency, MetricConfig, MetricsRecord,
    ResponseModel, ResponseTrace, SweepError, SweepResult, TimeAxis, TimeRange,
};
pub use config::{load_config, SweepConfig};
