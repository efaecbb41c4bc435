//! Smoothed specific-risk signal.

use cartera_traits::{RollingStat, Row, WindowedSignal, columns};

/// Idiosyncratic risk signal.
///
/// Rolling mean of the risk model's specific risk forecast. Where
/// [`IdioVol`](super::IdioVol) measures realized volatility, this smooths the
/// model's ex-ante estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdioRisk;

impl WindowedSignal for IdioRisk {
    fn name(&self) -> &'static str {
        "idio_risk"
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[columns::SPECIFIC_RISK]
    }

    fn input(&self, row: &Row<'_>) -> Option<f64> {
        row.get(columns::SPECIFIC_RISK)
    }

    fn statistic(&self) -> RollingStat {
        RollingStat::Mean
    }
}
