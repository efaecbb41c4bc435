//! Mean-variance optimization backed by the Clarabel interior-point solver.

use std::time::Duration;

use cartera_traits::OptimizationError;
use clarabel::algebra::CscMatrix;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::constraint::{Constraint, SparseRow};
use crate::OptimizationProblem;

/// Solves one [`OptimizationProblem`].
///
/// Implementations must be deterministic: the same problem yields the same
/// weights on every call.
pub trait PortfolioOptimizer: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Optimal weights aligned with [`OptimizationProblem::assets`].
    fn solve(
        &self,
        problem: &OptimizationProblem<'_>,
    ) -> Result<Array1<f64>, OptimizationError>;
}

/// Solver tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Wall-clock limit per date; `None` means unbounded.
    pub time_limit: Option<Duration>,
    /// Maximum interior-point iterations.
    pub max_iter: u32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            time_limit: None,
            max_iter: 200,
        }
    }
}

/// Maximizes `w'a - gamma * w'Sw` where `S = diag(specific_risk^2)`.
///
/// Written as the minimization `0.5 x'Px + q'x` with `P = 2 gamma S` and
/// `q = -a`. Without constraints the optimum has the closed form
/// `w = a / (2 gamma s^2)` and the solver is skipped.
#[derive(Debug, Clone, Default)]
pub struct MeanVarianceOptimizer {
    settings: SolverSettings,
}

impl MeanVarianceOptimizer {
    /// Create an optimizer with explicit settings.
    pub const fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    /// Limit the wall-clock time spent on each date.
    #[must_use]
    pub const fn with_time_limit(mut self, limit: Duration) -> Self {
        self.settings.time_limit = Some(limit);
        self
    }

    /// Current settings.
    pub const fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    fn closed_form(problem: &OptimizationProblem<'_>) -> Array1<f64> {
        let two_gamma = 2.0 * problem.gamma();
        problem
            .alpha()
            .iter()
            .zip(problem.variances().iter())
            .map(|(a, v)| a / (two_gamma * v))
            .collect()
    }

    fn solve_qp(
        &self,
        problem: &OptimizationProblem<'_>,
    ) -> Result<Array1<f64>, OptimizationError> {
        use clarabel::solver::*;

        let n = problem.len();
        let constraints = problem.constraints();
        let n_vars = if constraints.uses_auxiliary() { 2 * n } else { n };
        let betas = problem.beta().to_vec();

        // P: diagonal, zero on the auxiliary block
        let two_gamma = 2.0 * problem.gamma();
        let mut p_colptr = Vec::with_capacity(n_vars + 1);
        let mut p_rowval = Vec::with_capacity(n);
        let mut p_nzval = Vec::with_capacity(n);
        p_colptr.push(0);
        for (j, variance) in problem.variances().iter().enumerate() {
            p_rowval.push(j);
            p_nzval.push(two_gamma * variance);
            p_colptr.push(p_nzval.len());
        }
        p_colptr.resize(n_vars + 1, p_nzval.len());
        let p = CscMatrix::new(n_vars, n_vars, p_colptr, p_rowval, p_nzval);

        let mut q: Vec<f64> = problem.alpha().iter().map(|a| -a).collect();
        q.resize(n_vars, 0.0);

        let rows = constraints.rows(n, &betas);
        let n_eq = rows.equalities.len();
        let n_ineq = rows.inequalities.len();
        let all_rows: Vec<&SparseRow> = rows
            .equalities
            .iter()
            .chain(rows.inequalities.iter())
            .collect();
        let a = csc_from_rows(&all_rows, n_vars);
        let b: Vec<f64> = all_rows.iter().map(|r| r.rhs).collect();

        let mut cones: Vec<SupportedConeT<f64>> = Vec::with_capacity(2);
        if n_eq > 0 {
            cones.push(ZeroConeT(n_eq));
        }
        if n_ineq > 0 {
            cones.push(NonnegativeConeT(n_ineq));
        }

        let time_limit = self
            .settings
            .time_limit
            .map_or(f64::INFINITY, |d| d.as_secs_f64());
        let settings = DefaultSettingsBuilder::default()
            .verbose(false)
            .max_iter(self.settings.max_iter)
            .time_limit(time_limit)
            .build()
            .map_err(|e| OptimizationError::Solver(format!("invalid settings: {e}")))?;

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings)
            .map_err(|e| OptimizationError::Solver(format!("failed to create solver: {e:?}")))?;
        solver.solve();

        let status = solver.solution.status;
        trace!(
            date = %problem.date(),
            ?status,
            "Solver finished"
        );
        match status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => {}
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                return Err(OptimizationError::Infeasible(format!(
                    "constraints {constraints} admit no portfolio"
                )));
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                return Err(OptimizationError::Unbounded(format!("{status:?}")));
            }
            SolverStatus::MaxTime => {
                return Err(OptimizationError::Timeout {
                    limit_secs: time_limit,
                });
            }
            other => return Err(OptimizationError::Solver(format!("{other:?}"))),
        }

        let mut weights: Vec<f64> = solver.solution.x.iter().take(n).copied().collect();
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(OptimizationError::Solver(
                "solution contains non-finite weights".to_string(),
            ));
        }
        polish(&mut weights, problem);
        constraints.verify(&weights, &betas)?;

        Ok(Array1::from(weights))
    }
}

impl PortfolioOptimizer for MeanVarianceOptimizer {
    fn name(&self) -> &'static str {
        "mean_variance"
    }

    fn solve(
        &self,
        problem: &OptimizationProblem<'_>,
    ) -> Result<Array1<f64>, OptimizationError> {
        if problem.is_empty() {
            return Err(OptimizationError::EmptyUniverse);
        }
        debug!(
            date = %problem.date(),
            n_assets = problem.len(),
            constraints = %problem.constraints(),
            "Solving mean-variance problem"
        );
        if problem.constraints().is_empty() {
            return Ok(Self::closed_form(problem));
        }
        self.solve_qp(problem)
    }
}

/// Remove interior-point slack from an accepted solution.
///
/// Weights are clamped into the per-asset box. When the only equality is the
/// budget, the clamped weights are rescaled back onto it as long as that
/// keeps them inside the box.
fn polish(weights: &mut [f64], problem: &OptimizationProblem<'_>) {
    let constraints = problem.constraints();
    let (lower, upper) = constraints.weight_box();
    if lower > upper {
        return;
    }
    for w in weights.iter_mut() {
        *w = w.clamp(lower, upper);
    }

    if !constraints.contains(&Constraint::FullInvestment) || constraints.uses_beta() {
        return;
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || total == 1.0 {
        return;
    }
    let scale = total.recip();
    let fits = weights.iter().all(|w| {
        let scaled = w * scale;
        scaled >= lower && scaled <= upper
    });
    if fits {
        for w in weights.iter_mut() {
            *w *= scale;
        }
    }
}

/// Convert row-major sparse rows to a CSC matrix with `n_cols` columns.
fn csc_from_rows(rows: &[&SparseRow], n_cols: usize) -> CscMatrix<f64> {
    let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n_cols];
    for (i, row) in rows.iter().enumerate() {
        for &(j, value) in &row.coefficients {
            columns[j].push((i, value));
        }
    }

    let mut colptr = Vec::with_capacity(n_cols + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    colptr.push(0);
    for column in columns {
        for (i, value) in column {
            rowval.push(i);
            nzval.push(value);
        }
        colptr.push(nzval.len());
    }
    CscMatrix::new(rows.len(), n_cols, colptr, rowval, nzval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConstraintSet, UniverseMember};
    use approx::assert_relative_eq;
    use cartera_traits::Date;

    fn date() -> Date {
        Date::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn members() -> Vec<UniverseMember> {
        vec![
            UniverseMember::new("A", 0.04, 0.20).with_beta(0.8),
            UniverseMember::new("B", 0.01, 0.10).with_beta(1.0),
            UniverseMember::new("C", -0.02, 0.30).with_beta(1.4),
            UniverseMember::new("D", 0.03, 0.25).with_beta(1.1),
        ]
    }

    fn solve(tags: &[&str], gamma: f64) -> Result<Array1<f64>, OptimizationError> {
        let set = ConstraintSet::from_tags(tags).unwrap();
        let problem = OptimizationProblem::new(date(), members(), gamma, &set).unwrap();
        MeanVarianceOptimizer::default().solve(&problem)
    }

    #[test]
    fn test_closed_form_without_constraints() {
        let w = solve(&[], 2.0).unwrap();
        // 0.04 / (2 * 2 * 0.04)
        assert_relative_eq!(w[0], 0.25, epsilon = 1e-12);
        assert_relative_eq!(w[2], -0.02 / (4.0 * 0.09), epsilon = 1e-12);
    }

    #[test]
    fn test_full_investment_long_only() {
        let w = solve(&["FullInvestment", "LongOnly"], 5.0).unwrap();
        assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-6);
        assert!(w.iter().all(|x| *x >= -1e-9));
        // The low-risk asset carries the largest position
        assert!(w.iter().all(|x| *x <= w[1]));
    }

    #[test]
    fn test_full_investment_matches_lagrangian() {
        // Equality-only problem: w_i = (a_i - lambda) / (2 gamma s_i^2)
        let gamma = 5.0;
        let w = solve(&["FullInvestment"], gamma).unwrap();
        let m = members();
        let inv: Vec<f64> = m
            .iter()
            .map(|x| 1.0 / (2.0 * gamma * x.specific_risk.powi(2)))
            .collect();
        let lambda = (m.iter().zip(&inv).map(|(x, k)| x.alpha * k).sum::<f64>() - 1.0)
            / inv.iter().sum::<f64>();
        for (i, member) in m.iter().enumerate() {
            assert_relative_eq!(w[i], (member.alpha - lambda) * inv[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_no_feasible_shift_improves_utility() {
        let set = ConstraintSet::from_tags(["FullInvestment", "LongOnly"]).unwrap();
        let problem = OptimizationProblem::new(date(), members(), 5.0, &set).unwrap();
        let w = MeanVarianceOptimizer::default().solve(&problem).unwrap();
        let best = problem.utility(&w);

        assert!(best > problem.utility(&Array1::from_elem(4, 0.25)));
        let step = 1e-3;
        for from in 0..4 {
            if w[from] < step {
                continue;
            }
            for to in (0..4).filter(|&to| to != from) {
                let mut shifted = w.clone();
                shifted[from] -= step;
                shifted[to] += step;
                assert!(problem.utility(&shifted) <= best + 1e-9);
            }
        }
    }

    #[test]
    fn test_no_leverage_caps_gross_exposure() {
        let w = solve(&["NoLeverage"], 0.01).unwrap();
        let gross: f64 = w.iter().map(|x| x.abs()).sum();
        assert!(gross <= 1.0 + 1e-6);
        // Unconstrained weights at this gamma are far larger than 1
        assert!(gross > 0.99);
    }

    #[test]
    fn test_beta_constraints() {
        let betas = [0.8, 1.0, 1.4, 1.1];
        let w = solve(&["FullInvestment", "UnitBeta"], 5.0).unwrap();
        let exposure: f64 = w.iter().zip(betas).map(|(x, b)| x * b).sum();
        assert_relative_eq!(exposure, 1.0, epsilon = 1e-6);

        let w = solve(&["ZeroBeta"], 5.0).unwrap();
        let exposure: f64 = w.iter().zip(betas).map(|(x, b)| x * b).sum();
        assert_relative_eq!(exposure, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_infeasible_bounds() {
        let set = ConstraintSet::from_tags(["FullInvestment"])
            .unwrap()
            .with_bounds(0.0, 0.1)
            .unwrap();
        let problem = OptimizationProblem::new(date(), members(), 5.0, &set).unwrap();
        let err = MeanVarianceOptimizer::default().solve(&problem).unwrap_err();
        assert!(matches!(err, OptimizationError::Infeasible(_)));
    }

    #[test]
    fn test_empty_universe() {
        let set = ConstraintSet::from_tags(["FullInvestment"]).unwrap();
        let problem = OptimizationProblem::new(date(), vec![], 5.0, &set).unwrap();
        let err = MeanVarianceOptimizer::default().solve(&problem).unwrap_err();
        assert_eq!(err, OptimizationError::EmptyUniverse);
    }

    #[test]
    fn test_deterministic() {
        let a = solve(&["FullInvestment", "LongOnly"], 5.0).unwrap();
        let b = solve(&["LongOnly", "FullInvestment"], 5.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_csc_from_rows() {
        let r0 = SparseRow {
            coefficients: vec![(0, 1.0), (2, 2.0)],
            rhs: 0.0,
        };
        let r1 = SparseRow {
            coefficients: vec![(1, 3.0)],
            rhs: 0.0,
        };
        let m = csc_from_rows(&[&r0, &r1], 3);
        assert_eq!(m.colptr, vec![0, 1, 2, 3]);
        assert_eq!(m.rowval, vec![0, 1, 0]);
        assert_eq!(m.nzval, vec![1.0, 3.0, 2.0]);
    }
}
