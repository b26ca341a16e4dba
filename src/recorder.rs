use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use serde::Serialize;
use crate::analysis::{MetricsRecord, Result, SweepError, SweepResult};
/// One exported table row. Missing values are NaN so downstream tools see a gap, not a zero.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportRow {
    pub current_ma: f64,
    pub peak_mv: f64,
    pub persistence_ms: f64,
    pub latency_ms: f64,
    pub status: &'static str,
    pub error: String,
}
impl From<&MetricsRecord> for ReportRow {
    fn from(record: &MetricsRecord) -> Self {
        Self {
            current_ma: record.current_ma,
            peak_mv: record.peak_mv().unwrap_or(f64::NAN),
            persistence_ms: record.persistence_ms().unwrap_or(f64::NAN),
            latency_ms: record.latency_ms().unwrap_or(f64::NAN),
            status: if record.is_valid() { "ok" } else { "failed" },
            error: record.error.clone().unwrap_or_default(),
        }
    }
}
/// Streams metric rows into a CSV sink.
pub struct CsvRecorder<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}
impl CsvRecorder<File> {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}
impl<W: Write> CsvRecorder<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
            rows: 0,
        }
    }
    pub fn write_record(&mut self, record: &MetricsRecord) -> Result<()> {
        self.writer.serialize(ReportRow::from(record))?;
        self.rows += 1;
        Ok(())
    }
    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| SweepError::Export(e.to_string()))
    }
}
pub fn write_records_csv<W: Write>(result: &SweepResult, sink: W) -> Result<W> {
    let mut recorder = CsvRecorder::new(sink);
    for record in &result.records {
        recorder.write_record(record)?;
    }
    recorder.finish()
}
pub fn export_records_csv(result: &SweepResult, path: &Path) -> Result<()> {
    write_records_csv(result, File::create(path)?)?;
    Ok(())
}
/// Column names for the trace CSV; a repeated current gets a `_2`, `_3`, ... suffix.
fn trace_columns(result: &SweepResult) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    result
        .traces
        .iter()
        .map(|t| {
            let name = format!("{}mA", t.current_ma);
            let count = seen.entry(name.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                name
            } else {
                format!("{name}_{count}")
            }
        })
        .collect()
}
/// One `time_ms` column followed by one column per accepted trace.
pub fn write_traces_csv<W: Write>(result: &SweepResult, sink: W) -> Result<W> {
    let mut writer = csv::Writer::from_writer(sink);
    let mut header = vec!["time_ms".to_string()];
    header.extend(trace_columns(result));
    writer.write_record(&header)?;
    for (i, t) in result.time_axis.times_ms().iter().enumerate() {
        let mut row = Vec::with_capacity(result.traces.len() + 1);
        row.push(t.to_string());
        row.extend(result.traces.iter().map(|trace| trace.samples_mv[i].to_string()));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| SweepError::Export(e.to_string()))
}
pub fn export_traces_csv(result: &SweepResult, path: &Path) -> Result<()> {
    write_traces_csv(result, File::create(path)?)?;
    Ok(())
}
pub fn export_json(result: &SweepResult, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, result)?;
    Ok(())
}
fn cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.3}"),
        None => "NaN".to_string(),
    }
}
/// Fixed-width text table of the records, in sweep order.
pub fn render_table(result: &SweepResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>12} {:>12} {:>16} {:>12}  status",
        "current_mA", "peak_mV", "persistence_ms", "latency_ms"
    );
    for record in &result.records {
        let status = match &record.error {
            None => "ok".to_string(),
            Some(err) => format!("failed: {err}"),
        };
        let _ = writeln!(
            out,
            "{:>12.3} {:>12} {:>16} {:>12}  {}",
            record.current_ma,
            cell(record.peak_mv()),
            cell(record.persistence_ms()),
            cell(record.latency_ms()),
            status
        );
    }
    out
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{run_sweep, CurrentRange, MetricConfig, ResponseModel, TimeAxis};
    fn sweep() -> SweepResult {
        let axis = TimeAxis::new((0..=20).map(f64::from).collect()).unwrap();
        let config = MetricConfig {
            latency_threshold_mv: -100.0,
            ..MetricConfig::default()
        };
        run_sweep(
            &[0.5, 9.0, 1.0],
            &axis,
            &ResponseModel::default(),
            &CurrentRange::default(),
            &config,
        )
        .unwrap()
    }
    #[test]
    fn csv_rows_follow_sweep_order_with_nan_gaps() {
        let bytes = write_records_csv(&sweep(), Vec::new()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "current_ma,peak_mv,persistence_ms,latency_ms,status,error"
        );
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("0.5,-52.0,0.0,NaN,ok,"));
        assert!(lines[2].starts_with("9.0,NaN,NaN,NaN,failed,"));
        assert!(lines[3].starts_with("1.0,"));
    }
    #[test]
    fn traces_csv_has_one_column_per_valid_trace() {
        let bytes = write_traces_csv(&sweep(), Vec::new()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("time_ms,0.5mA,1mA"));
        assert_eq!(lines.count(), 21);
    }
    #[test]
    fn traces_csv_names_repeated_currents_apart() {
        let axis = TimeAxis::new(vec![0.0, 1.0]).unwrap();
        let result = run_sweep(
            &[0.5, 0.5, 1.0, 0.5],
            &axis,
            &ResponseModel::default(),
            &CurrentRange::default(),
            &MetricConfig::default(),
        )
        .unwrap();
        let bytes = write_traces_csv(&result, Vec::new()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text.lines().next(),
            Some("time_ms,0.5mA,0.5mA_2,1mA,0.5mA_3")
        );
    }
    #[test]
    fn table_marks_missing_and_failed_values() {
        let table = render_table(&sweep());
        assert_eq!(table.lines().count(), 4);
        assert!(table.contains("NaN"));
        assert!(table.contains("failed: invalid stimulation current 9"));
    }
}
