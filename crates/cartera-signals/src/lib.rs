//! Signal implementations and the windowed transform engine for cartera.
//!
//! This crate turns a raw observation panel into a raw signal per
//! (date, asset):
//! - [`registry`]: the closed set of signal types and their metadata
//! - [`transform`]: grouping, rolling windows, direction and publication lag
//! - Volatility, liquidity and reversal signal implementations
//!
//! Cross-sectional standardization happens downstream, in `cartera-alpha`.
//!
//! # Example
//!
//! ```ignore
//! use cartera_signals::{SignalType, TransformEngine, TransformParams};
//!
//! let signal_type: SignalType = "idio_vol".parse()?;
//! let params = TransformParams::new(252).with_min_periods(200).with_direction(-1);
//! let frame = TransformEngine::new(params).compute(&panel, signal_type.signal())?;
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod liquidity;
pub mod registry;
pub mod reversal;
mod rolling;
pub mod transform;
pub mod volatility;

// Re-export key types
pub use registry::{
    SignalCategory, SignalInfo, SignalType, available_signals, signals_by_category,
};
pub use transform::{Direction, SignalFrame, SignalValue, TransformEngine, TransformParams};
