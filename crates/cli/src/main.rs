//! hydrocheck CLI - hydrographic network consistency checks
//!
//! Checks the correct direction of the flow, the existence of endorheic
//! basins and that surfaces at rest have no flow direction. One CSV
//! report is written per checked layer.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use hydrocheck_checks::Runner;
use hydrocheck_core::{ControlConfig, CsvSink, Dataset};

#[derive(Parser)]
#[command(name = "hydrocheck")]
#[command(author, version, about = "Hydrographic network consistency checker", long_about = None)]
struct Cli {
    /// JSON file with the configuration of the control
    config: PathBuf,

    /// JSON file with the survey layers
    dataset: PathBuf,

    /// JSON file with the boundary of the survey extent (one feature)
    boundary: PathBuf,

    /// Output folder for the CSV reports
    output: PathBuf,

    /// Override the elevation tolerance for line flow comparisons
    #[arg(long)]
    line_tolerance: Option<f64>,

    /// Override the elevation tolerance for polygon comparisons
    #[arg(long)]
    surface_tolerance: Option<f64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let start = Instant::now();

    let mut config = ControlConfig::from_json_file(&cli.config)
        .with_context(|| format!("loading configuration {}", cli.config.display()))?;
    if let Some(t) = cli.line_tolerance {
        config.line_tolerance = t;
    }
    if let Some(t) = cli.surface_tolerance {
        config.surface_tolerance = t;
    }

    let dataset = Dataset::from_json_file(&cli.dataset)
        .with_context(|| format!("loading dataset {}", cli.dataset.display()))?;
    let boundary = Dataset::from_json_file(&cli.boundary)
        .with_context(|| format!("loading boundary {}", cli.boundary.display()))?
        .boundary_geometry()?;

    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating output folder {}", cli.output.display()))?;

    let runner = Runner::new(&dataset, &config, &boundary)?;

    let stamp = Local::now().format("%Y%m%d_%H%M%S");

    let total = (config.flow_layers.len() + config.surface_layers.len()) as u64;
    let progress = ProgressBar::new(total);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut findings = 0usize;
    let mut failed = 0usize;

    for layer in &config.flow_layers {
        progress.set_message(format!("flow: {layer}"));
        let path = cli
            .output
            .join(format!("{stamp}_Control_Vertex_Height_{layer}.csv"));
        let mut sink =
            CsvSink::from_path(&path).with_context(|| format!("creating {}", path.display()))?;
        match runner.run_flow_layer(layer, &mut sink) {
            Ok(count) => {
                info!(layer = %layer, findings = count, "flow layer checked");
                findings += count;
            }
            Err(e) => {
                error!(layer = %layer, "flow layer failed: {e}");
                failed += 1;
            }
        }
        progress.inc(1);
    }

    for layer in &config.surface_layers {
        progress.set_message(format!("surface: {layer}"));
        let path = cli
            .output
            .join(format!("{stamp}_Control_Polygon_Height_{layer}.csv"));
        let mut sink =
            CsvSink::from_path(&path).with_context(|| format!("creating {}", path.display()))?;
        match runner.run_surface_layer(layer, &mut sink) {
            Ok(count) => {
                info!(layer = %layer, findings = count, "surface layer checked");
                findings += count;
            }
            Err(e) => {
                error!(layer = %layer, "surface layer failed: {e}");
                failed += 1;
            }
        }
        progress.inc(1);
    }

    progress.finish_and_clear();
    info!(
        findings,
        failed,
        elapsed = ?start.elapsed(),
        "validation finished"
    );

    if failed > 0 {
        anyhow::bail!("{failed} layer(s) could not be checked");
    }
    Ok(())
}
