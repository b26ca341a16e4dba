use anyhow::{anyhow, Context};
use libloading::Library;
use serde::Serialize;
use std::ffi::CString;
use std::os::raw::{c_char, c_double, c_int};
use std::path::{Path, PathBuf};
use crate::analysis::{Result, SimulationBackend, SweepError};
const SIMULATE_SYMBOL: &[u8] = b"simulate_response\0";
/// Parameters handed to the simulator as a JSON C string on every call.
#[derive(Serialize)]
struct SimulatorParams<'a> {
    model: &'a str,
    settings: &'a serde_json::Value,
}
type SimulateFn = unsafe extern "C" fn(
    *const c_char, // params json
    c_double,      // current (mA)
    *const c_double,
    c_int,
    *mut c_double,
) -> c_int;
struct SimulatorApi {
    #[allow(dead_code)]
    lib: Library,
    simulate_response: SimulateFn,
}
impl SimulatorApi {
    fn load(path: &Path) -> anyhow::Result<Self> {
        let lib = unsafe { Library::new(path) }
            .with_context(|| format!("simulator library {} could not be loaded", path.display()))?;
        // Safety: the export must match `SimulateFn`; see `SharedLibraryBackend`.
        let simulate_response = unsafe {
            *lib.get::<SimulateFn>(SIMULATE_SYMBOL)
                .context("simulate_response symbol missing")?
        };
        Ok(Self {
            lib,
            simulate_response,
        })
    }
    fn check(code: c_int, ctx: &str) -> anyhow::Result<()> {
        if code == 0 {
            Ok(())
        } else {
            Err(anyhow!("{ctx} failed (simulator code {code})"))
        }
    }
    fn simulate(
        &self,
        params: &CString,
        current_ma: f64,
        times_ms: &[f64],
    ) -> anyhow::Result<Vec<f64>> {
        let len = c_int::try_from(times_ms.len())
            .map_err(|_| anyhow!("time axis of {} samples is too long", times_ms.len()))?;
        let mut out = vec![f64::NAN; times_ms.len()];
        Self::check(
            unsafe {
                (self.simulate_response)(
                    params.as_ptr(),
                    current_ma,
                    times_ms.as_ptr(),
                    len,
                    out.as_mut_ptr(),
                )
            },
            "simulate_response",
        )?;
        Ok(out)
    }
}
/// Realistic-model backend living in a native simulator library.
///
/// The library must export
/// `int simulate_response(const char *params_json, double current_ma,
/// const double *times_ms, int len, double *out_mv)`, fill `out_mv[0..len]` and
/// return 0 on success. Any load or call failure surfaces as
/// [`SweepError::BackendUnavailable`].
pub struct SharedLibraryBackend {
    path: PathBuf,
    model: String,
    api: SimulatorApi,
    params_json: CString,
}
impl SharedLibraryBackend {
    pub fn open(
        path: impl AsRef<Path>,
        model: &str,
        settings: &serde_json::Value,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let api = SimulatorApi::load(&path).map_err(unavailable)?;
        let json = serde_json::to_string(&SimulatorParams { model, settings })?;
        let params_json = CString::new(json)
            .map_err(|e| SweepError::BackendUnavailable(format!("bad simulator params: {e}")))?;
        Ok(Self {
            path,
            model: model.to_string(),
            api,
            params_json,
        })
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
}
impl SimulationBackend for SharedLibraryBackend {
    fn name(&self) -> &str {
        &self.model
    }
    fn simulate(&self, current_ma: f64, times_ms: &[f64]) -> Result<Vec<f64>> {
        self.api
            .simulate(&self.params_json, current_ma, times_ms)
            .map_err(unavailable)
    }
}
fn unavailable(err: anyhow::Error) -> SweepError {
    SweepError::BackendUnavailable(format!("{err:#}"))
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ResponseModel, SimpleModelParams};
    #[test]
    fn missing_library_is_unavailable() {
        let err = SharedLibraryBackend::open(
            "/nonexistent/libscp_simulator.so",
            "scp",
            &serde_json::Value::Null,
        )
        .err()
        .unwrap();
        match err {
            SweepError::BackendUnavailable(msg) => assert!(msg.contains("could not be loaded")),
            other => panic!("unexpected error {other:?}"),
        }
    }
    #[test]
    fn missing_library_falls_back_to_simple_model() {
        let model = ResponseModel::realistic_or_simple(
            || SharedLibraryBackend::open("/nonexistent/libscp.so", "scp", &serde_json::json!({})),
            SimpleModelParams::default(),
        );
        assert!(!model.is_realistic());
    }
}
