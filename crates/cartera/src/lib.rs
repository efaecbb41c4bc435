#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cartera/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # cartera
//!
//! Signal transform and constrained backtest engine.
//!
//! cartera turns a raw asset panel into a risk-scaled forecast and simulates,
//! date by date, how a constrained mean-variance portfolio would have traded on
//! it. This umbrella crate re-exports the sub-crates and adds the validated
//! run configuration and the end-to-end [`Pipeline`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use cartera::{Panel, Pipeline, PipelineConfig, Result};
//!
//! # fn main() -> Result<()> {
//! let config = PipelineConfig::load("configs/idio_vol_22.toml")?;
//! let panel = Panel::new(load_panel()?);
//!
//! let output = Pipeline::new(config).run(&panel)?;
//! println!("{} weights over {} dates", output.weights.len(), output.summary.solved);
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`traits`] - Panel, error types and the [`WindowedSignal`] trait
//! - [`signals`] - Signal registry and rolling transform engine
//! - [`alpha`] - Cross-sectional standardization
//! - [`optimizer`] - Constraint sets and the mean-variance optimizer
//! - [`backtest`] - Parallel per-date scheduling
//!
//! ## Architecture
//!
//! 1. **TransformEngine** computes a rolling statistic per asset
//! 2. **Standardizer** z-scores each date and scales by specific risk
//! 3. **BacktestScheduler** solves one constrained problem per date on a
//!    bounded worker pool, skipping dates that fail

/// Version information for the cartera crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod config;
mod pipeline;

pub use config::{
    BacktestSection, DataSection, OutputSection, PipelineConfig, RawConfig, SignalSection,
};
pub use pipeline::{Pipeline, PipelineOutput};

// ============================================================================
// Core Types
// ============================================================================

/// Core types and traits.
pub mod traits {
    pub use cartera_traits::*;
}

pub use cartera_traits::{
    CarteraError, Date, ErrorKind, OptimizationError, Panel, Result, WindowedSignal, columns,
};

// ============================================================================
// Stages
// ============================================================================

/// Signal registry and rolling transforms.
pub mod signals {
    pub use cartera_signals::*;
}

/// Cross-sectional standardization.
pub mod alpha {
    pub use cartera_alpha::*;
}

/// Constraints and optimization.
pub mod optimizer {
    pub use cartera_optimizer::*;
}

/// Backtest scheduling.
pub mod backtest {
    pub use cartera_backtest::*;
}

pub use cartera_alpha::{AlphaFrame, Standardizer};
pub use cartera_backtest::{BacktestConfig, BacktestScheduler, BacktestSummary, WeightSeries};
pub use cartera_optimizer::{Constraint, ConstraintSet, MeanVarianceOptimizer};
pub use cartera_signals::{Direction, SignalFrame, SignalType, TransformEngine, TransformParams};
