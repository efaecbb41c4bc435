//! Cartera CLI binary.
//!
//! Provides a command-line interface for the Cartera backtest engine.

mod cmd;
mod data;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "cartera")]
#[command(about = "Signal transform and constrained backtest engine", long_about = None)]
#[command(version)]
struct Cli {
    /// Show detailed output and debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered signal types
    Signals {
        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// List constraint tags
    Constraints,

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file (TOML or JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Run the full pipeline: data, signal, alpha, backtest
    Run {
        /// Path to the configuration file (TOML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Panel file, overriding `[data].path`
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Results directory, overriding `[output].results_path`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Signals { category } => {
            cmd::signals::list_signals(category.as_deref(), cli.verbose)?;
        }
        Commands::Constraints => {
            cmd::constraints::list_constraints();
        }
        Commands::Validate { config } => {
            cmd::validate::validate_config(&config)?;
        }
        Commands::Run {
            config,
            data,
            output,
        } => {
            cmd::run::run_pipeline(&config, data, output)?;
        }
    }

    Ok(())
}
