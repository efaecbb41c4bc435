//! Idiosyncratic volatility signal.

use cartera_traits::{RollingStat, Row, WindowedSignal, columns};

/// Idiosyncratic volatility signal.
///
/// Rolling sample standard deviation of daily returns over the configured
/// window.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdioVol;

impl WindowedSignal for IdioVol {
    fn name(&self) -> &'static str {
        "idio_vol"
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[columns::RETURN]
    }

    fn input(&self, row: &Row<'_>) -> Option<f64> {
        row.get(columns::RETURN)
    }

    fn statistic(&self) -> RollingStat {
        RollingStat::Std
    }
}
