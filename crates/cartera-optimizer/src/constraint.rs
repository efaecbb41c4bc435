//! Linear portfolio constraints.
//!
//! Every constraint is expressed as rows of the solver's constraint matrix,
//! either equalities (`a'x = b`) or inequalities (`a'x <= b`). The variable
//! vector `x` holds the `n` portfolio weights, followed by `n` auxiliary
//! absolute-value variables when [`Constraint::NoLeverage`] is active.

use std::fmt;
use std::str::FromStr;

use cartera_traits::{CarteraError, OptimizationError, Result};
use serde::{Deserialize, Serialize};

/// Absolute tolerance for equality constraints and budget-style inequalities.
pub const EQUALITY_TOLERANCE: f64 = 1e-6;

/// Absolute tolerance for per-asset bounds, including non-negativity.
pub const BOUND_TOLERANCE: f64 = 1e-9;

/// One sparse constraint row: `(column, coefficient)` pairs and a right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseRow {
    /// Non-zero coefficients, by variable index.
    pub coefficients: Vec<(usize, f64)>,
    /// Right-hand side.
    pub rhs: f64,
}

impl SparseRow {
    fn new(coefficients: Vec<(usize, f64)>, rhs: f64) -> Self {
        Self { coefficients, rhs }
    }
}

/// Constraint rows accumulated for one problem.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearRows {
    /// Rows of the form `a'x = b`.
    pub equalities: Vec<SparseRow>,
    /// Rows of the form `a'x <= b`.
    pub inequalities: Vec<SparseRow>,
}

/// A linear constraint on portfolio weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Constraint {
    /// Weights sum to one.
    FullInvestment,
    /// Every weight is non-negative.
    LongOnly,
    /// Gross exposure `sum |w|` is at most one.
    NoLeverage,
    /// Portfolio predicted beta is zero.
    ZeroBeta,
    /// Portfolio predicted beta is one.
    UnitBeta,
    /// Every weight lies in `[lower, upper]`.
    Bounds {
        /// Lower bound applied to every asset.
        lower: f64,
        /// Upper bound applied to every asset.
        upper: f64,
    },
}

impl Constraint {
    /// Tags accepted by [`Constraint::from_str`], in canonical order.
    pub const TAGS: [&'static str; 5] =
        ["FullInvestment", "LongOnly", "NoLeverage", "ZeroBeta", "UnitBeta"];

    /// Canonical tag name.
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::FullInvestment => "FullInvestment",
            Self::LongOnly => "LongOnly",
            Self::NoLeverage => "NoLeverage",
            Self::ZeroBeta => "ZeroBeta",
            Self::UnitBeta => "UnitBeta",
            Self::Bounds { .. } => "Bounds",
        }
    }

    /// Short human-readable description.
    pub const fn description(&self) -> &'static str {
        match self {
            Self::FullInvestment => "weights sum to 1",
            Self::LongOnly => "all weights >= 0",
            Self::NoLeverage => "sum of |w| <= 1",
            Self::ZeroBeta => "portfolio beta = 0",
            Self::UnitBeta => "portfolio beta = 1",
            Self::Bounds { .. } => "lower <= w <= upper per asset",
        }
    }

    /// Position of the constraint in the canonical ordering.
    const fn rank(&self) -> u8 {
        match self {
            Self::FullInvestment => 0,
            Self::LongOnly => 1,
            Self::NoLeverage => 2,
            Self::ZeroBeta => 3,
            Self::UnitBeta => 4,
            Self::Bounds { .. } => 5,
        }
    }

    /// Whether the constraint reads predicted betas.
    pub const fn uses_beta(&self) -> bool {
        matches!(self, Self::ZeroBeta | Self::UnitBeta)
    }

    /// Whether the constraint needs the auxiliary absolute-value variables.
    pub const fn uses_auxiliary(&self) -> bool {
        matches!(self, Self::NoLeverage)
    }

    /// Build a bounds constraint, validating `lower <= upper` and finiteness.
    pub fn bounds(lower: f64, upper: f64) -> Result<Self> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(CarteraError::invalid_parameter(
                "backtest.weight_bounds",
                "bounds must be finite",
            ));
        }
        if lower > upper {
            return Err(CarteraError::invalid_parameter(
                "backtest.weight_bounds",
                format!("lower bound {lower} exceeds upper bound {upper}"),
            ));
        }
        Ok(Self::Bounds { lower, upper })
    }

    /// Append this constraint's rows for a universe of `n` assets.
    ///
    /// `aux_offset` is the index of the first auxiliary variable, present
    /// only when the set contains [`Constraint::NoLeverage`].
    pub fn append_rows(
        &self,
        n: usize,
        betas: &[f64],
        aux_offset: Option<usize>,
        rows: &mut LinearRows,
    ) {
        match *self {
            Self::FullInvestment => {
                rows.equalities
                    .push(SparseRow::new((0..n).map(|i| (i, 1.0)).collect(), 1.0));
            }
            Self::LongOnly => {
                rows.inequalities
                    .extend((0..n).map(|i| SparseRow::new(vec![(i, -1.0)], 0.0)));
            }
            Self::NoLeverage => {
                let Some(offset) = aux_offset else {
                    return;
                };
                // w - t <= 0 and -w - t <= 0 make t an upper bound on |w|.
                for i in 0..n {
                    rows.inequalities
                        .push(SparseRow::new(vec![(i, 1.0), (offset + i, -1.0)], 0.0));
                    rows.inequalities
                        .push(SparseRow::new(vec![(i, -1.0), (offset + i, -1.0)], 0.0));
                }
                rows.inequalities.push(SparseRow::new(
                    (0..n).map(|i| (offset + i, 1.0)).collect(),
                    1.0,
                ));
            }
            Self::ZeroBeta | Self::UnitBeta => {
                let target = if matches!(self, Self::UnitBeta) { 1.0 } else { 0.0 };
                let coefficients = betas
                    .iter()
                    .take(n)
                    .enumerate()
                    .filter(|(_, b)| **b != 0.0)
                    .map(|(i, b)| (i, *b))
                    .collect();
                rows.equalities.push(SparseRow::new(coefficients, target));
            }
            Self::Bounds { lower, upper } => {
                for i in 0..n {
                    rows.inequalities.push(SparseRow::new(vec![(i, 1.0)], upper));
                    rows.inequalities.push(SparseRow::new(vec![(i, -1.0)], -lower));
                }
            }
        }
    }

    /// Amount by which `weights` violate the constraint; zero when satisfied exactly.
    pub fn residual(&self, weights: &[f64], betas: &[f64]) -> f64 {
        match *self {
            Self::FullInvestment => (weights.iter().sum::<f64>() - 1.0).abs(),
            Self::LongOnly => weights.iter().fold(0.0_f64, |acc, w| acc.max(-w)),
            Self::NoLeverage => (weights.iter().map(|w| w.abs()).sum::<f64>() - 1.0).max(0.0),
            Self::ZeroBeta | Self::UnitBeta => {
                let target = if matches!(self, Self::UnitBeta) { 1.0 } else { 0.0 };
                let exposure: f64 = weights.iter().zip(betas).map(|(w, b)| w * b).sum();
                (exposure - target).abs()
            }
            Self::Bounds { lower, upper } => weights
                .iter()
                .fold(0.0_f64, |acc, w| acc.max(lower - w).max(w - upper)),
        }
    }

    /// Tolerance applied to [`Constraint::residual`].
    pub const fn tolerance(&self) -> f64 {
        match self {
            Self::LongOnly | Self::Bounds { .. } => BOUND_TOLERANCE,
            _ => EQUALITY_TOLERANCE,
        }
    }

    /// Whether `weights` satisfy the constraint within its tolerance.
    pub fn is_satisfied(&self, weights: &[f64], betas: &[f64]) -> bool {
        self.residual(weights, betas) <= self.tolerance()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounds { lower, upper } => write!(f, "Bounds[{lower}, {upper}]"),
            other => f.write_str(other.tag()),
        }
    }
}

impl FromStr for Constraint {
    type Err = CarteraError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "FullInvestment" | "full_investment" => Ok(Self::FullInvestment),
            "LongOnly" | "long_only" => Ok(Self::LongOnly),
            "NoLeverage" | "NoBuyingOnMargin" | "no_leverage" | "no_buying_on_margin" => {
                Ok(Self::NoLeverage)
            }
            "ZeroBeta" | "zero_beta" => Ok(Self::ZeroBeta),
            "UnitBeta" | "unit_beta" => Ok(Self::UnitBeta),
            other => Err(CarteraError::UnknownConstraint(other.to_string())),
        }
    }
}

/// A validated, duplicate-free set of constraints in canonical order.
///
/// Iteration order is fixed, so two sets built from the same tags in any
/// order produce identical solver matrices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    /// An empty set (unconstrained optimization).
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate constraint tags. Unknown tags are an error; duplicates collapse.
    pub fn from_tags<I, S>(tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for tag in tags {
            set.insert(tag.as_ref().parse()?);
        }
        Ok(set)
    }

    /// Add per-asset bounds, replacing any bounds already present.
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Result<Self> {
        let bounds = Constraint::bounds(lower, upper)?;
        self.constraints
            .retain(|c| !matches!(c, Constraint::Bounds { .. }));
        self.insert(bounds);
        Ok(self)
    }

    /// Insert a constraint, ignoring exact duplicates.
    pub fn insert(&mut self, constraint: Constraint) {
        if self.constraints.contains(&constraint) {
            return;
        }
        let at = self
            .constraints
            .partition_point(|c| c.rank() <= constraint.rank());
        self.constraints.insert(at, constraint);
    }

    /// Whether the set contains `constraint`.
    pub fn contains(&self, constraint: &Constraint) -> bool {
        self.constraints.contains(constraint)
    }

    /// Constraints in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    /// Number of constraints.
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Whether any constraint reads predicted betas.
    pub fn uses_beta(&self) -> bool {
        self.constraints.iter().any(Constraint::uses_beta)
    }

    /// Whether auxiliary absolute-value variables are required.
    pub fn uses_auxiliary(&self) -> bool {
        self.constraints.iter().any(Constraint::uses_auxiliary)
    }

    /// Assemble all rows for a universe of `n` assets.
    pub fn rows(&self, n: usize, betas: &[f64]) -> LinearRows {
        let aux_offset = self.uses_auxiliary().then_some(n);
        let mut rows = LinearRows::default();
        for constraint in &self.constraints {
            constraint.append_rows(n, betas, aux_offset, &mut rows);
        }
        rows
    }

    /// Per-asset box implied by `LongOnly` and `Bounds`, as `(lower, upper)`.
    pub fn weight_box(&self) -> (f64, f64) {
        self.constraints
            .iter()
            .fold((f64::NEG_INFINITY, f64::INFINITY), |(lo, hi), c| match *c {
                Constraint::LongOnly => (lo.max(0.0), hi),
                Constraint::Bounds { lower, upper } => (lo.max(lower), hi.min(upper)),
                _ => (lo, hi),
            })
    }

    /// Check every constraint, reporting the first violation.
    pub fn verify(
        &self,
        weights: &[f64],
        betas: &[f64],
    ) -> std::result::Result<(), OptimizationError> {
        match self.constraints.iter().find(|c| !c.is_satisfied(weights, betas)) {
            Some(constraint) => Err(OptimizationError::ConstraintViolation {
                constraint: constraint.to_string(),
                residual: constraint.residual(weights, betas),
            }),
            None => Ok(()),
        }
    }
}

impl<'a> IntoIterator for &'a ConstraintSet {
    type Item = &'a Constraint;
    type IntoIter = std::slice::Iter<'a, Constraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.constraints.iter()
    }
}

impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.constraints.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
