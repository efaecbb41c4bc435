//! Per-date optimization inputs.

use cartera_traits::{AssetId, CarteraError, Date, Result};
use ndarray::Array1;

use crate::ConstraintSet;

/// One asset eligible for optimization on a given date.
#[derive(Debug, Clone, PartialEq)]
pub struct UniverseMember {
    /// Asset identifier.
    pub asset_id: AssetId,
    /// Risk-scaled alpha.
    pub alpha: f64,
    /// Specific (idiosyncratic) risk.
    pub specific_risk: f64,
    /// Predicted beta, when known.
    pub predicted_beta: Option<f64>,
}

impl UniverseMember {
    /// Create a member without a predicted beta.
    pub fn new(asset_id: impl Into<AssetId>, alpha: f64, specific_risk: f64) -> Self {
        Self {
            asset_id: asset_id.into(),
            alpha,
            specific_risk,
            predicted_beta: None,
        }
    }

    /// Attach a predicted beta.
    #[must_use]
    pub const fn with_beta(mut self, beta: f64) -> Self {
        self.predicted_beta = Some(beta);
        self
    }
}

/// Inputs of one rebalancing step.
///
/// Built fresh for each date and never mutated. Construction rejects data that
/// no solver could use: non-positive or non-finite specific risk, non-finite
/// alpha, and missing betas when the constraints need them. Those are data
/// errors, not per-date optimization failures.
#[derive(Debug, Clone)]
pub struct OptimizationProblem<'a> {
    date: Date,
    assets: Vec<AssetId>,
    alpha: Array1<f64>,
    specific_risk: Array1<f64>,
    beta: Array1<f64>,
    gamma: f64,
    constraints: &'a ConstraintSet,
}

impl<'a> OptimizationProblem<'a> {
    /// Validate and assemble a problem.
    pub fn new(
        date: Date,
        members: Vec<UniverseMember>,
        gamma: f64,
        constraints: &'a ConstraintSet,
    ) -> Result<Self> {
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(CarteraError::invalid_parameter(
                "backtest.gamma",
                format!("must be positive and finite, got {gamma}"),
            ));
        }

        let needs_beta = constraints.uses_beta();
        let n = members.len();
        let mut assets = Vec::with_capacity(n);
        let mut alpha = Vec::with_capacity(n);
        let mut risk = Vec::with_capacity(n);
        let mut beta = Vec::with_capacity(n);

        for member in members {
            if !member.specific_risk.is_finite() || member.specific_risk <= 0.0 {
                return Err(CarteraError::InvalidData(format!(
                    "specific risk for {} on {date} must be positive and finite, got {}",
                    member.asset_id, member.specific_risk
                )));
            }
            if !member.alpha.is_finite() {
                return Err(CarteraError::InvalidData(format!(
                    "alpha for {} on {date} is not finite",
                    member.asset_id
                )));
            }
            let b = match member.predicted_beta {
                Some(b) if b.is_finite() => b,
                Some(_) | None if needs_beta => {
                    return Err(CarteraError::InvalidData(format!(
                        "predicted beta for {} on {date} is required by {constraints}",
                        member.asset_id
                    )));
                }
                _ => 0.0,
            };
            assets.push(member.asset_id);
            alpha.push(member.alpha);
            risk.push(member.specific_risk);
            beta.push(b);
        }

        Ok(Self {
            date,
            assets,
            alpha: Array1::from(alpha),
            specific_risk: Array1::from(risk),
            beta: Array1::from(beta),
            gamma,
            constraints,
        })
    }

    /// Rebalancing date.
    pub const fn date(&self) -> Date {
        self.date
    }

    /// Asset identifiers, aligned with every vector below.
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// Number of assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the universe is empty.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Alpha vector.
    pub const fn alpha(&self) -> &Array1<f64> {
        &self.alpha
    }

    /// Specific risk vector.
    pub const fn specific_risk(&self) -> &Array1<f64> {
        &self.specific_risk
    }

    /// Predicted betas; zero where unknown and unused.
    pub const fn beta(&self) -> &Array1<f64> {
        &self.beta
    }

    /// Risk aversion.
    pub const fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Active constraints.
    pub const fn constraints(&self) -> &ConstraintSet {
        self.constraints
    }

    /// Diagonal of the covariance matrix, `specific_risk^2`.
    pub fn variances(&self) -> Array1<f64> {
        self.specific_risk.mapv(|s| s * s)
    }

    /// Objective `w'a - gamma * w'Sw` at `weights`.
    pub fn utility(&self, weights: &Array1<f64>) -> f64 {
        let variance: f64 = weights
            .iter()
            .zip(self.specific_risk.iter())
            .map(|(w, s)| w * w * s * s)
            .sum();
        weights.dot(&self.alpha) - self.gamma * variance
    }
}
