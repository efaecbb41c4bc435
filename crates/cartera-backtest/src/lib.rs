//! Backtest scheduling for cartera.
//!
//! The [`BacktestScheduler`] walks the distinct dates of an
//! [`AlphaFrame`](cartera_alpha::AlphaFrame), builds one optimization problem
//! per date, and solves the dates on a bounded worker pool. Dates whose
//! optimization fails are skipped and reported in the [`BacktestSummary`];
//! only input errors abort a run.

mod scheduler;
mod summary;
mod weights;

// Re-export main types
pub use scheduler::{BacktestConfig, BacktestResult, BacktestScheduler, DateOutcome};
pub use summary::{BacktestSummary, SkippedDate};
pub use weights::{Weight, WeightSeries};
