#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cartera/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core trait definitions for the Cartera backtest engine.
//!
//! This crate provides the foundational abstractions shared by every stage of
//! a signal backtest: the input panel, the windowed-signal trait implemented by
//! each registered signal type, and the error taxonomy that separates fatal
//! configuration and data failures from recoverable per-date failures.

/// The version of the cartera-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod signal;
pub mod types;

// Re-exports
pub use error::{CarteraError, ErrorKind, OptimizationError, Result};
pub use signal::{RollingStat, Row, WindowSpec, WindowedSignal};
pub use types::{AssetId, CE_TO_UNIX_EPOCH_DAYS, Date, Panel, RiskInputs, RiskTable, columns};
