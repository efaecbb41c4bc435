//! Per-date portfolio optimization for cartera.
//!
//! This crate provides:
//! - [`Constraint`] / [`ConstraintSet`]: composable linear constraints on
//!   portfolio weights, validated from configuration tags
//! - [`OptimizationProblem`]: the immutable inputs of one rebalancing step
//! - [`MeanVarianceOptimizer`]: maximizes `w'a - gamma * w'Sw` subject to the
//!   active constraints, with `S` the diagonal of squared specific risk
//!
//! # Examples
//!
//! ```rust,no_run
//! use cartera_optimizer::{
//!     ConstraintSet, MeanVarianceOptimizer, OptimizationProblem, PortfolioOptimizer,
//!     UniverseMember,
//! };
//! use chrono::NaiveDate;
//!
//! let constraints = ConstraintSet::from_tags(["FullInvestment", "LongOnly"]).unwrap();
//! let members = vec![
//!     UniverseMember::new("US1", 0.02, 0.05),
//!     UniverseMember::new("US2", -0.01, 0.10),
//! ];
//! let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
//! let problem = OptimizationProblem::new(date, members, 400.0, &constraints).unwrap();
//! let weights = MeanVarianceOptimizer::default().solve(&problem).unwrap();
//! ```

mod constraint;
mod optimizer;
mod problem;

// Re-export main types
pub use constraint::{
    BOUND_TOLERANCE, Constraint, ConstraintSet, EQUALITY_TOLERANCE, LinearRows, SparseRow,
};
pub use optimizer::{MeanVarianceOptimizer, PortfolioOptimizer, SolverSettings};
pub use problem::{OptimizationProblem, UniverseMember};
