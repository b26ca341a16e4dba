// src/main.rs
use std::path::PathBuf;
use anyhow::Context;
use clap::Parser;
use log::info;
use stimsweep::analysis::{save_traces_png, PlotStyle};
use stimsweep::config::{load_config, ModelConfig, RealisticConfig};
use stimsweep::recorder::{export_json, export_records_csv, export_traces_csv, render_table};
#[derive(Parser)]
#[command(name = "stimsweep")]
#[command(version)]
#[command(about = "Sweep stimulation currents and measure membrane responses", long_about = None)]
struct Cli {
    /// JSON sweep configuration; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Write the metrics table as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Write every trace as CSV columns
    #[arg(long)]
    traces_csv: Option<PathBuf>,
    /// Write the whole sweep result as JSON
    #[arg(long)]
    json: Option<PathBuf>,
    /// Write an overlay plot of all traces as PNG
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Draw the plot without text (for hosts without fonts)
    #[arg(long)]
    plain_plot: bool,
    /// Use the realistic model backed by this simulator library
    #[arg(long)]
    library: Option<PathBuf>,
    /// Fall back to the simple model if the simulator library cannot be loaded
    #[arg(long)]
    fallback: bool,
    /// Log per-trial details
    #[arg(short, long)]
    verbose: bool,
}
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    let mut config = load_config(cli.config.as_deref()).with_context(|| {
        format!(
            "failed to load config {}",
            cli.config.as_deref().map(|p| p.display().to_string()).unwrap_or_default()
        )
    })?;
    if let Some(library) = cli.library {
        config.model = ModelConfig::Realistic(RealisticConfig {
            library,
            model_name: "scp".to_string(),
            settings: serde_json::Value::Null,
            fallback_to_simple: cli.fallback,
            fallback_params: Default::default(),
        });
    }
    // command-line paths win over the config file
    let output = &mut config.output;
    output.csv = cli.csv.or(output.csv.take());
    output.traces_csv = cli.traces_csv.or(output.traces_csv.take());
    output.json = cli.json.or(output.json.take());
    output.plot = cli.plot.or(output.plot.take());
    let result = config.run().context("sweep could not start")?;
    print!("{}", render_table(&result));
    let output = &config.output;
    if let Some(path) = &output.csv {
        export_records_csv(&result, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("metrics written to {}", path.display());
    }
    if let Some(path) = &output.traces_csv {
        export_traces_csv(&result, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("traces written to {}", path.display());
    }
    if let Some(path) = &output.json {
        export_json(&result, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("result written to {}", path.display());
    }
    if let Some(path) = &output.plot {
        let style = PlotStyle {
            labels: !cli.plain_plot,
            ..PlotStyle::default()
        };
        save_traces_png(&result, &style, path)
            .with_context(|| format!("failed to plot {}", path.display()))?;
        info!("plot written to {}", path.display());
    }
    Ok(())
}
