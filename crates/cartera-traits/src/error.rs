//! Error types for the Cartera engine.
//!
//! Two families of errors exist. [`CarteraError`] covers configuration and
//! data failures, which are fatal to a run and surface before (or instead of)
//! any optimization. [`OptimizationError`] covers failures confined to a
//! single rebalancing date; the backtest scheduler records them and moves on.

use crate::Date;
use thiserror::Error;

/// Broad classification of a [`CarteraError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid configuration: unknown identifiers or out-of-range parameters.
    Config,
    /// Invalid or insufficient input data.
    Data,
    /// Filesystem failure while reading configuration or data.
    Io,
    /// The process could not acquire an execution resource.
    Runtime,
}

/// The main error type for Cartera operations.
///
/// Every variant is fatal to a run. Per-date solver failures use
/// [`OptimizationError`] instead.
#[derive(Debug, Error)]
pub enum CarteraError {
    /// A signal type identifier that is not in the registry.
    #[error("Unknown signal type: {0}")]
    UnknownSignal(String),

    /// A constraint tag that is not in the constraint registry.
    #[error("Unknown constraint: {0}")]
    UnknownConstraint(String),

    /// A numeric or structural configuration parameter is out of range.
    #[error("Invalid parameter `{field}`: {reason}")]
    InvalidParameter {
        /// Name of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// A required column is missing from the input panel.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// The panel holds more than one row for the same (date, asset) key.
    #[error("Duplicate observation for asset {asset} on {date}")]
    DuplicateKey {
        /// Date of the duplicated row.
        date: Date,
        /// Asset of the duplicated row.
        asset: String,
    },

    /// The alpha table has no usable rows after null filtering.
    #[error("Alpha table for signal `{0}` is empty after null filtering")]
    EmptyAlpha(String),

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The worker pool for a backtest could not be created.
    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),
}

impl CarteraError {
    /// Shorthand for [`CarteraError::InvalidParameter`].
    pub fn invalid_parameter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownSignal(_)
            | Self::UnknownConstraint(_)
            | Self::InvalidParameter { .. }
            | Self::ConfigParse(_) => ErrorKind::Config,
            Self::MissingColumn(_)
            | Self::DuplicateKey { .. }
            | Self::EmptyAlpha(_)
            | Self::InvalidData(_)
            | Self::Polars(_) => ErrorKind::Data,
            Self::Io(_) => ErrorKind::Io,
            Self::WorkerPool(_) => ErrorKind::Runtime,
        }
    }
}

/// A failure confined to a single rebalancing date.
///
/// The scheduler turns these into a `Skipped` outcome for the date; they never
/// abort a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizationError {
    /// No asset had a usable alpha on this date.
    #[error("universe is empty")]
    EmptyUniverse,

    /// The constraint set admits no feasible portfolio.
    #[error("problem is infeasible ({0})")]
    Infeasible(String),

    /// The objective is unbounded over the feasible set.
    #[error("problem is unbounded ({0})")]
    Unbounded(String),

    /// The solver exceeded its time limit.
    #[error("solver exceeded time limit of {limit_secs}s")]
    Timeout {
        /// Configured limit in seconds.
        limit_secs: f64,
    },

    /// The solver returned weights that violate a constraint.
    #[error("constraint {constraint} violated by {residual:.3e}")]
    ConstraintViolation {
        /// Name of the violated constraint.
        constraint: String,
        /// Size of the violation.
        residual: f64,
    },

    /// Any other solver failure.
    #[error("solver failed: {0}")]
    Solver(String),
}

impl OptimizationError {
    /// Whether this failure came from exhausting a resource bound rather than
    /// from the problem itself.
    pub const fn is_resource(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// A specialized Result type for Cartera operations.
///
/// This is a convenience type that uses [`CarteraError`] as the error type.
pub type Result<T> = std::result::Result<T, CarteraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CarteraError::UnknownSignal("momo".to_string());
        assert_eq!(err.to_string(), "Unknown signal type: momo");

        let err = CarteraError::MissingColumn("return".to_string());
        assert_eq!(err.to_string(), "Missing required column: return");

        let err = CarteraError::invalid_parameter("signal.window_size", "must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid parameter `signal.window_size`: must be positive"
        );
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(
            CarteraError::UnknownConstraint("Foo".into()).kind(),
            ErrorKind::Config
        );
        assert_eq!(
            CarteraError::EmptyAlpha("idio_vol".into()).kind(),
            ErrorKind::Data
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(CarteraError::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_optimization_error_resource() {
        assert!(OptimizationError::Timeout { limit_secs: 1.0 }.is_resource());
        assert!(!OptimizationError::EmptyUniverse.is_resource());
        assert_eq!(OptimizationError::EmptyUniverse.to_string(), "universe is empty");
    }

    #[test]
    fn test_result_type() {
        let ok_result: Result<i32> = Ok(42);
        assert!(ok_result.is_ok());

        let err_result: Result<i32> = Err(CarteraError::InvalidData("fail".to_string()));
        assert!(err_result.is_err());
    }
}
