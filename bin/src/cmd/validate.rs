//! Configuration validation command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use cartera::PipelineConfig;

/// Validate a configuration file and print the resolved settings.
pub(crate) fn validate_config(path: &Path) -> Result<()> {
    let config = PipelineConfig::load(path)
        .with_context(|| format!("invalid configuration {}", path.display()))?;

    println!("Configuration OK: {}", path.display());
    println!();
    println!("Run:          {}", config.run_name);
    println!("Signal:       {} ({})", config.signal_name, config.signal_type);
    println!(
        "Window:       {} rows, min periods {}",
        config.transform.window_size, config.transform.min_periods
    );
    println!(
        "Direction:    {:+}, shift {}",
        config.transform.direction.sign(),
        config.transform.shift
    );
    println!("Constraints:  {}", config.backtest.constraints);
    println!("Gamma:        {}", config.backtest.gamma);
    println!("Workers:      {}", config.backtest.n_cpus);
    if let Some(limit) = config.backtest.time_limit {
        println!("Time limit:   {:.3}s per date", limit.as_secs_f64());
    }
    match &config.data {
        Some(data) => println!("Data:         {}", data.path.display()),
        None => println!("Data:         (none, pass --data)"),
    }
    println!("Output:       {}", config.output_dir().display());
    println!();

    Ok(())
}
