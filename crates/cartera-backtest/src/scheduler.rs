//! Per-date backtest scheduling on a bounded worker pool.

use std::num::NonZeroUsize;
use std::time::Duration;

use cartera_alpha::{AlphaFrame, AlphaValue};
use cartera_optimizer::{
    ConstraintSet, MeanVarianceOptimizer, OptimizationProblem, PortfolioOptimizer, UniverseMember,
};
use cartera_traits::{CarteraError, Date, OptimizationError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::{BacktestSummary, SkippedDate, Weight, WeightSeries};

/// Backtest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Constraints applied on every date.
    pub constraints: ConstraintSet,
    /// Risk aversion.
    pub gamma: f64,
    /// Worker pool size.
    pub n_cpus: usize,
    /// Optional solver time limit per date.
    pub time_limit: Option<Duration>,
}

impl BacktestConfig {
    /// Create a configuration sized to the machine's available parallelism.
    pub fn new(constraints: ConstraintSet, gamma: f64) -> Self {
        let n_cpus = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Self {
            constraints,
            gamma,
            n_cpus,
            time_limit: None,
        }
    }

    /// Set the worker pool size.
    #[must_use]
    pub const fn with_n_cpus(mut self, n_cpus: usize) -> Self {
        self.n_cpus = n_cpus;
        self
    }

    /// Set the per-date solver time limit.
    #[must_use]
    pub const fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Check numeric ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.gamma.is_finite() || self.gamma <= 0.0 {
            return Err(CarteraError::invalid_parameter(
                "backtest.gamma",
                format!("must be positive and finite, got {}", self.gamma),
            ));
        }
        if self.n_cpus == 0 {
            return Err(CarteraError::invalid_parameter(
                "backtest.n_cpus",
                "must be at least 1",
            ));
        }
        if self.time_limit.is_some_and(|d| d.is_zero()) {
            return Err(CarteraError::invalid_parameter(
                "backtest.time_limit_secs",
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// Final state of one rebalancing date.
#[derive(Debug, Clone, PartialEq)]
pub enum DateOutcome {
    /// Weights for every asset in the date's universe.
    Solved(Vec<Weight>),
    /// No weights; the date is reported in the summary.
    Skipped(OptimizationError),
}

/// Output of a backtest run.
#[derive(Debug, Clone)]
pub struct BacktestResult {
    /// Weights of all solved dates, sorted by `(date, asset_id)`.
    pub weights: WeightSeries,
    /// Counts and skip reasons.
    pub summary: BacktestSummary,
}

/// Per-date lifecycle: `Pending -> Building -> Solved | Skipped`.
#[derive(Debug)]
enum DateState<'a> {
    Pending { date: Date, rows: &'a [AlphaValue] },
    Building(OptimizationProblem<'a>),
    Done(DateOutcome),
}

impl<'a> DateState<'a> {
    fn advance<O: PortfolioOptimizer>(self, scheduler: &'a BacktestScheduler<O>) -> Result<Self> {
        match self {
            Self::Pending { date, rows } => {
                let members = scheduler.universe(rows);
                if members.is_empty() {
                    return Ok(Self::Done(DateOutcome::Skipped(
                        OptimizationError::EmptyUniverse,
                    )));
                }
                let problem = OptimizationProblem::new(
                    date,
                    members,
                    scheduler.config.gamma,
                    &scheduler.config.constraints,
                )?;
                Ok(Self::Building(problem))
            }
            Self::Building(problem) => {
                let outcome = match scheduler.optimizer.solve(&problem) {
                    Ok(weights) => {
                        trace!(
                            date = %problem.date(),
                            utility = problem.utility(&weights),
                            "Solved date"
                        );
                        DateOutcome::Solved(
                            problem
                                .assets()
                                .iter()
                                .zip(weights.iter())
                                .map(|(asset_id, &weight)| Weight {
                                    date: problem.date(),
                                    asset_id: asset_id.clone(),
                                    weight,
                                })
                                .collect(),
                        )
                    }
                    Err(e) => DateOutcome::Skipped(e),
                };
                Ok(Self::Done(outcome))
            }
            done @ Self::Done(_) => Ok(done),
        }
    }

    const fn label(&self) -> &'static str {
        match self {
            Self::Pending { .. } => "pending",
            Self::Building(_) => "building",
            Self::Done(DateOutcome::Solved(_)) => "solved",
            Self::Done(DateOutcome::Skipped(_)) => "skipped",
        }
    }
}

/// Runs one optimization per rebalancing date.
///
/// Dates are independent: each task reads the shared alpha table and
/// constraint set and produces its own outcome, collected in date order after
/// the pool joins.
///
/// # Example
///
/// ```rust,ignore
/// use cartera_backtest::{BacktestConfig, BacktestScheduler};
///
/// let config = BacktestConfig::new(constraints, 400.0).with_n_cpus(4);
/// let result = BacktestScheduler::new(config).run(&alpha)?;
/// println!("solved {} of {} dates", result.summary.solved, result.summary.n_dates);
/// ```
#[derive(Debug)]
pub struct BacktestScheduler<O = MeanVarianceOptimizer> {
    config: BacktestConfig,
    optimizer: O,
}

impl BacktestScheduler<MeanVarianceOptimizer> {
    /// Create a scheduler backed by [`MeanVarianceOptimizer`].
    pub fn new(config: BacktestConfig) -> Self {
        let optimizer = match config.time_limit {
            Some(limit) => MeanVarianceOptimizer::default().with_time_limit(limit),
            None => MeanVarianceOptimizer::default(),
        };
        Self { config, optimizer }
    }
}

impl<O: PortfolioOptimizer> BacktestScheduler<O> {
    /// Create a scheduler with a custom optimizer.
    pub const fn with_optimizer(config: BacktestConfig, optimizer: O) -> Self {
        Self { config, optimizer }
    }

    /// Configuration.
    pub const fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Eligible assets among one date's rows.
    ///
    /// Rows without alpha are excluded. When the constraints read betas, rows
    /// without a predicted beta are excluded as well.
    fn universe(&self, rows: &[AlphaValue]) -> Vec<UniverseMember> {
        let needs_beta = self.config.constraints.uses_beta();
        rows.iter()
            .filter_map(|row| {
                let alpha = row.alpha?;
                let specific_risk = row.specific_risk?;
                if needs_beta && row.predicted_beta.is_none() {
                    return None;
                }
                Some(UniverseMember {
                    asset_id: row.asset_id.clone(),
                    alpha,
                    specific_risk,
                    predicted_beta: row.predicted_beta,
                })
            })
            .collect()
    }

    /// Drive one date through its lifecycle.
    ///
    /// Optimization failures become [`DateOutcome::Skipped`]; only malformed
    /// inputs return an error.
    pub fn run_date(&self, date: Date, rows: &[AlphaValue]) -> Result<DateOutcome> {
        let mut state = DateState::Pending { date, rows };
        loop {
            trace!(%date, state = state.label(), "Advancing date");
            state = state.advance(self)?;
            if let DateState::Done(outcome) = state {
                if let DateOutcome::Skipped(reason) = &outcome {
                    warn!(%date, %reason, "Skipping date");
                }
                return Ok(outcome);
            }
        }
    }

    /// Run the backtest over every date of `alpha`.
    ///
    /// # Errors
    ///
    /// - [`CarteraError::EmptyAlpha`] if no row has a usable alpha
    /// - [`CarteraError::InvalidData`] if any universe holds non-positive or
    ///   non-finite specific risk; remaining dates are not dispatched
    /// - [`CarteraError::InvalidParameter`] for an invalid configuration
    pub fn run(&self, alpha: &AlphaFrame) -> Result<BacktestResult> {
        self.config.validate()?;
        if alpha.usable_count() == 0 {
            return Err(CarteraError::EmptyAlpha(alpha.signal_name().to_string()));
        }

        let dates: Vec<(Date, &[AlphaValue])> = alpha.by_date().collect();
        info!(
            signal = alpha.signal_name(),
            dates = dates.len(),
            n_cpus = self.config.n_cpus,
            gamma = self.config.gamma,
            constraints = %self.config.constraints,
            optimizer = self.optimizer.name(),
            "Starting backtest"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.n_cpus)
            .thread_name(|i| format!("cartera-backtest-{i}"))
            .build()
            .map_err(|e| CarteraError::WorkerPool(e.to_string()))?;

        let outcomes: Vec<DateOutcome> = pool.install(|| {
            dates
                .par_iter()
                .map(|(date, rows)| self.run_date(*date, rows))
                .collect::<Result<Vec<_>>>()
        })?;

        let mut summary = BacktestSummary {
            signal: alpha.signal_name().to_string(),
            n_dates: dates.len(),
            ..BacktestSummary::default()
        };
        let mut rows = Vec::new();
        for ((date, _), outcome) in dates.iter().zip(outcomes) {
            match outcome {
                DateOutcome::Solved(weights) => {
                    summary.solved += 1;
                    rows.extend(weights);
                }
                DateOutcome::Skipped(reason) => {
                    summary.skipped += 1;
                    summary.skipped_dates.push(SkippedDate::new(*date, &reason));
                }
            }
        }
        let weights = WeightSeries::new(rows);
        summary.n_weights = weights.len();
        debug!(rows = weights.len(), "Merged weights");
        summary.log();

        Ok(BacktestResult { weights, summary })
    }
}
