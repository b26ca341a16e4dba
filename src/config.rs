use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::analysis::{
    run_sweep, CurrentRange, MetricConfig, OfflineBackend, ResponseModel, Result,
    SimpleModelParams, SweepError, SweepResult, TimeAxis, TimeRange,
};
use crate::backend::SharedLibraryBackend;
/// Which response model a run should use.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelConfig {
    Simple {
        #[serde(default)]
        params: SimpleModelParams,
    },
    Realistic(RealisticConfig),
}
impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig::Simple {
            params: SimpleModelParams::default(),
        }
    }
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RealisticConfig {
    /// Path to the simulator shared library.
    pub library: PathBuf,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Passed through to the simulator untouched.
    #[serde(default)]
    pub settings: serde_json::Value,
    /// Run the simple model instead when the library cannot be loaded.
    #[serde(default)]
    pub fallback_to_simple: bool,
    #[serde(default)]
    pub fallback_params: SimpleModelParams,
}
fn default_model_name() -> String {
    "scp".to_string()
}
impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        match self {
            ModelConfig::Simple { params } => params.validate(),
            ModelConfig::Realistic(realistic) => {
                if realistic.library.as_os_str().is_empty() {
                    return Err(SweepError::InvalidModelConfig(
                        "realistic model needs a simulator library path".into(),
                    ));
                }
                realistic.fallback_params.validate()
            }
        }
    }
    /// Builds the model. A realistic model whose library is missing either falls back to
    /// the simple model or becomes an offline backend whose trials all fail.
    pub fn build(&self) -> ResponseModel {
        match self {
            ModelConfig::Simple { params } => ResponseModel::Simple(*params),
            ModelConfig::Realistic(realistic) => {
                let connect = || {
                    SharedLibraryBackend::open(
                        &realistic.library,
                        &realistic.model_name,
                        &realistic.settings,
                    )
                };
                if realistic.fallback_to_simple {
                    return ResponseModel::realistic_or_simple(connect, realistic.fallback_params);
                }
                match connect() {
                    Ok(backend) => ResponseModel::realistic(backend),
                    Err(SweepError::BackendUnavailable(reason)) => {
                        ResponseModel::realistic(OfflineBackend { reason })
                    }
                    Err(err) => ResponseModel::realistic(OfflineBackend {
                        reason: err.to_string(),
                    }),
                }
            }
        }
    }
}
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub csv: Option<PathBuf>,
    pub traces_csv: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub plot: Option<PathBuf>,
}
/// Everything a sweep run needs, passed in explicitly.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub currents: CurrentRange,
    /// Explicit current list; when set it replaces the `currents` grid but is still
    /// checked against its bounds.
    pub current_list: Option<Vec<f64>>,
    pub time: TimeRange,
    pub metrics: MetricConfig,
    pub model: ModelConfig,
    pub output: OutputConfig,
}
impl SweepConfig {
    /// Configuration-level checks; any failure here means no trial is run.
    pub fn validate(&self) -> Result<()> {
        self.currents.validate()?;
        TimeAxis::from_range(&self.time)?;
        self.metrics.validate()?;
        self.model.validate()
    }
    pub fn currents(&self) -> Result<Vec<f64>> {
        match &self.current_list {
            Some(list) => Ok(list.clone()),
            None => self.currents.grid(),
        }
    }
    pub fn time_axis(&self) -> Result<TimeAxis> {
        TimeAxis::from_range(&self.time)
    }
    /// Validates, builds the model and runs the sweep.
    pub fn run(&self) -> Result<SweepResult> {
        self.validate()?;
        let model = self.model.build();
        self.run_with(&model)
    }
    /// Runs the configured sweep with a caller-supplied model.
    pub fn run_with(&self, model: &ResponseModel) -> Result<SweepResult> {
        let currents = self.currents()?;
        let axis = self.time_axis()?;
        run_sweep(&currents, &axis, model, &self.currents, &self.metrics)
    }
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
/// Reads a JSON config file, or returns the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<SweepConfig> {
    let config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p)?;
            serde_json::from_str(&content)?
        }
        None => SweepConfig::default(),
    };
    Ok(config)
}
