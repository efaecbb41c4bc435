//! Pipeline run command implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cartera::{DataSection, Pipeline, PipelineConfig, columns};
use tracing::info;

use crate::data;

/// Run the full pipeline and write its artifacts under
/// `<results_path>/<run_name>/`.
pub(crate) fn run_pipeline(
    config_path: &Path,
    data_path: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut config = PipelineConfig::load(config_path)
        .with_context(|| format!("invalid configuration {}", config_path.display()))?;
    if let Some(path) = data_path {
        config.data = Some(match config.data.take() {
            Some(section) => DataSection { path, ..section },
            None => DataSection {
                path,
                asset_key: columns::ASSET.to_string(),
                date_key: columns::DATE.to_string(),
                convert_returns_to_decimal: false,
                replace_zero_volume: false,
            },
        });
    }
    if let Some(dir) = output {
        config.output.results_path = dir;
    }
    let section = config
        .data
        .clone()
        .context("no input data: set [data].path in the configuration or pass --data")?;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                      Running Pipeline                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Run:         {}", config.run_name);
    println!("Signal:      {} ({})", config.signal_name, config.signal_type);
    println!("Constraints: {}", config.backtest.constraints);
    println!("Data:        {}", section.path.display());
    println!();

    let panel = data::load_panel(&section)?;
    let pipeline = Pipeline::new(config);
    let output = pipeline.run(&panel)?;
    let config = pipeline.config();

    let dir = config.output_dir();
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let run = &config.run_name;

    let weights_path = dir.join(format!("{run}_weights.parquet"));
    data::write_parquet(&mut output.weights.to_dataframe()?, &weights_path)?;

    let signals_path = dir.join(format!("{run}_signals.parquet"));
    data::write_parquet(&mut output.signals.to_dataframe()?, &signals_path)?;

    let alphas_path = dir.join(format!("{run}_alphas.parquet"));
    data::write_parquet(&mut output.alpha.diagnostics()?, &alphas_path)?;

    let summary_path = dir.join(format!("{run}_summary.json"));
    fs::write(&summary_path, serde_json::to_string_pretty(&output.summary)?)
        .with_context(|| format!("writing {}", summary_path.display()))?;
    info!(dir = %dir.display(), "Wrote results");

    let summary = &output.summary;
    println!("Results");
    println!("{}", "-".repeat(60));
    println!(
        "  Signal:       {} of {} values present",
        output.signals.non_null_count(),
        output.signals.len()
    );
    println!("  Dates:        {}", summary.n_dates);
    println!(
        "  Solved:       {} ({:.1}%)",
        summary.solved,
        summary.solve_rate() * 100.0
    );
    println!("  Skipped:      {}", summary.skipped);
    println!("  Weight rows:  {}", summary.n_weights);
    for skipped in summary.skipped_dates.iter().take(5) {
        println!("    {}  {}", skipped.date, skipped.reason);
    }
    if summary.skipped_dates.len() > 5 {
        println!("    ... and {} more", summary.skipped_dates.len() - 5);
    }
    println!();
    println!("Saved to: {}", dir.display());
    println!();

    Ok(())
}
