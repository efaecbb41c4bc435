//! End-of-run accounting.

use cartera_traits::{Date, OptimizationError};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A date that produced no weights, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDate {
    /// Rebalancing date.
    pub date: Date,
    /// Rendered [`OptimizationError`].
    pub reason: String,
    /// Whether the date ran out of solver time.
    pub timed_out: bool,
}

impl SkippedDate {
    /// Record a skipped date.
    pub fn new(date: Date, error: &OptimizationError) -> Self {
        Self {
            date,
            reason: error.to_string(),
            timed_out: error.is_resource(),
        }
    }
}

/// Solved and skipped counts for one backtest run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    /// Signal the run was driven by.
    pub signal: String,
    /// Number of distinct dates in the alpha table.
    pub n_dates: usize,
    /// Dates that produced weights.
    pub solved: usize,
    /// Dates that produced no weights.
    pub skipped: usize,
    /// Total weight rows.
    pub n_weights: usize,
    /// Every skipped date with its reason, in date order.
    pub skipped_dates: Vec<SkippedDate>,
}

impl BacktestSummary {
    /// Fraction of dates that were solved; zero for an empty run.
    pub fn solve_rate(&self) -> f64 {
        if self.n_dates == 0 {
            0.0
        } else {
            self.solved as f64 / self.n_dates as f64
        }
    }

    /// Number of skipped dates caused by the solver time limit.
    pub fn timeouts(&self) -> usize {
        self.skipped_dates.iter().filter(|s| s.timed_out).count()
    }

    /// Emit the summary at `info`.
    pub fn log(&self) {
        info!(
            signal = %self.signal,
            dates = self.n_dates,
            solved = self.solved,
            skipped = self.skipped,
            timeouts = self.timeouts(),
            weights = self.n_weights,
            "Backtest complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solve_rate() {
        let summary = BacktestSummary {
            n_dates: 4,
            solved: 3,
            skipped: 1,
            ..Default::default()
        };
        assert_relative_eq!(summary.solve_rate(), 0.75);
        assert_relative_eq!(BacktestSummary::default().solve_rate(), 0.0);
    }

    #[test]
    fn test_skipped_date_records_timeouts() {
        let date = Date::from_ymd_opt(2024, 5, 1).unwrap();
        let summary = BacktestSummary {
            skipped_dates: vec![
                SkippedDate::new(date, &OptimizationError::Timeout { limit_secs: 2.0 }),
                SkippedDate::new(date, &OptimizationError::EmptyUniverse),
            ],
            ..Default::default()
        };
        assert_eq!(summary.timeouts(), 1);
        assert_eq!(summary.skipped_dates[1].reason, "universe is empty");
    }

    #[test]
    fn test_serializes_to_json() {
        let date = Date::from_ymd_opt(2024, 5, 1).unwrap();
        let summary = BacktestSummary {
            signal: "idio_vol".to_string(),
            n_dates: 1,
            skipped: 1,
            skipped_dates: vec![SkippedDate::new(date, &OptimizationError::EmptyUniverse)],
            ..Default::default()
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["skipped_dates"][0]["date"], "2024-05-01");
        assert_eq!(json["signal"], "idio_vol");
    }
}
