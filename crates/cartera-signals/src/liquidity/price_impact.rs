//! Price impact (illiquidity) signal.

use cartera_traits::{RollingStat, Row, WindowedSignal, columns};

/// Price impact signal.
///
/// Rolling mean of `|return| / (daily_volume * price)`, the return move per
/// dollar of volume. Rows with zero or missing dollar volume are missing
/// samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceImpact;

impl WindowedSignal for PriceImpact {
    fn name(&self) -> &'static str {
        "price_impact"
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[columns::RETURN, columns::DAILY_VOLUME, columns::PRICE]
    }

    fn input(&self, row: &Row<'_>) -> Option<f64> {
        let dollar_volume = row.get(columns::DAILY_VOLUME)? * row.get(columns::PRICE)?;
        if dollar_volume == 0.0 {
            return None;
        }
        Some(row.get(columns::RETURN)?.abs() / dollar_volume)
    }

    fn statistic(&self) -> RollingStat {
        RollingStat::Mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn cols() -> HashMap<String, Vec<Option<f64>>> {
        HashMap::from([
            ("return".to_string(), vec![Some(-0.02), Some(0.01)]),
            ("daily_volume".to_string(), vec![Some(1000.0), Some(0.0)]),
            ("price".to_string(), vec![Some(10.0), Some(10.0)]),
        ])
    }

    #[test]
    fn test_abs_return_per_dollar() {
        let cols = cols();
        let value = PriceImpact.input(&Row::new(&cols, 0)).unwrap();
        assert_relative_eq!(value, 0.02 / 10_000.0);
    }

    #[test]
    fn test_zero_volume_is_missing() {
        let cols = cols();
        assert!(PriceImpact.input(&Row::new(&cols, 1)).is_none());
    }
}
