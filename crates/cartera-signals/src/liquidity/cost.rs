//! Trading cost signal.

use cartera_traits::{RollingStat, Row, WindowSpec, WindowedSignal, columns};

/// Window, in rows, of the return volatility that scales the spread.
pub const COST_VOL_WINDOW: usize = 44;

/// Trading cost signal.
///
/// Ratio of the rolling mean relative spread (`bid_ask_spread / price`, over
/// the configured window) to the rolling sample std of returns over
/// [`COST_VOL_WINDOW`] rows. High values flag names whose spread is expensive
/// relative to how much they move.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cost;

impl WindowedSignal for Cost {
    fn name(&self) -> &'static str {
        "cost"
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[columns::BID_ASK_SPREAD, columns::PRICE, columns::RETURN]
    }

    fn input(&self, row: &Row<'_>) -> Option<f64> {
        let price = row.get(columns::PRICE)?;
        if price == 0.0 {
            return None;
        }
        Some(row.get(columns::BID_ASK_SPREAD)? / price)
    }

    fn statistic(&self) -> RollingStat {
        RollingStat::Mean
    }

    fn denominator(&self) -> Option<(RollingStat, WindowSpec)> {
        Some((RollingStat::Std, WindowSpec::Fixed(COST_VOL_WINDOW)))
    }

    fn denominator_input(&self, row: &Row<'_>) -> Option<f64> {
        row.get(columns::RETURN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    #[test]
    fn test_legs() {
        let cols = HashMap::from([
            ("bid_ask_spread".to_string(), vec![Some(0.05)]),
            ("price".to_string(), vec![Some(25.0)]),
            ("return".to_string(), vec![Some(0.003)]),
        ]);
        let row = Row::new(&cols, 0);
        assert_relative_eq!(Cost.input(&row).unwrap(), 0.002);
        assert_eq!(Cost.denominator_input(&row), Some(0.003));
        assert_eq!(
            Cost.denominator(),
            Some((RollingStat::Std, WindowSpec::Fixed(44)))
        );
    }
}
