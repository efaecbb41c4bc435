//! Panel in, weights out.

use cartera_alpha::{AlphaFrame, Standardizer};
use cartera_backtest::{BacktestScheduler, BacktestSummary, WeightSeries};
use cartera_signals::{SignalFrame, TransformEngine};
use cartera_traits::{Panel, Result};
use tracing::info;

use crate::PipelineConfig;

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Raw signal values.
    pub signals: SignalFrame,
    /// Standardized, risk-scaled alpha.
    pub alpha: AlphaFrame,
    /// Target weights of every solved date.
    pub weights: WeightSeries,
    /// Solved and skipped dates.
    pub summary: BacktestSummary,
}

/// Transform, standardize and backtest one signal.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline from a validated configuration.
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Configuration.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Compute raw signal values for every (date, asset) of the panel.
    pub fn signals(&self, panel: &Panel) -> Result<SignalFrame> {
        let engine = TransformEngine::new(self.config.transform.clone());
        let frame = engine.compute(panel, self.config.signal_type.signal())?;
        Ok(frame.with_name(&self.config.signal_name))
    }

    fn standardize(&self, panel: &Panel, signals: &SignalFrame) -> Result<AlphaFrame> {
        let params = &self.config.transform;
        let risk = panel.risk_table(&params.date_key, &params.asset_key)?;
        Ok(Standardizer::new().standardize(signals, &risk))
    }

    /// Run every stage.
    pub fn run(&self, panel: &Panel) -> Result<PipelineOutput> {
        info!(
            run = %self.config.run_name,
            signal = %self.config.signal_name,
            signal_type = %self.config.signal_type,
            rows = panel.len(),
            "Running pipeline"
        );

        let signals = self.signals(panel)?;
        let alpha = self.standardize(panel, &signals)?;
        info!(
            signal_values = signals.non_null_count(),
            alpha_values = alpha.usable_count(),
            "Computed alpha"
        );

        let result = BacktestScheduler::new(self.config.backtest.clone()).run(&alpha)?;

        Ok(PipelineOutput {
            signals,
            alpha,
            weights: result.weights,
            summary: result.summary,
        })
    }
}
