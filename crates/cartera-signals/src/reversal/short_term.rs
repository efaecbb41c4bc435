//! Short-term reversal signal based on cumulative log returns.

use cartera_traits::{RollingStat, Row, WindowedSignal, columns};

/// Short-term reversal signal.
///
/// Rolling sum of `ln(1 + return)` over the configured window, i.e. the
/// cumulative log return (typically 22 trading days). Run with
/// `direction = -1` to favour recent losers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortTermReversal;

impl WindowedSignal for ShortTermReversal {
    fn name(&self) -> &'static str {
        "short_term_reversal"
    }

    fn required_columns(&self) -> &'static [&'static str] {
        &[columns::RETURN]
    }

    fn input(&self, row: &Row<'_>) -> Option<f64> {
        let ret = row.get(columns::RETURN)?;
        // ln(1 + r) is undefined for a total loss
        (ret > -1.0).then(|| ret.ln_1p())
    }

    fn statistic(&self) -> RollingStat {
        RollingStat::Sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    #[test]
    fn test_log_return_input() {
        let cols = HashMap::from([("return".to_string(), vec![Some(0.1), Some(-1.0)])]);
        assert_relative_eq!(
            ShortTermReversal.input(&Row::new(&cols, 0)).unwrap(),
            1.1_f64.ln()
        );
        assert!(ShortTermReversal.input(&Row::new(&cols, 1)).is_none());
    }

    #[test]
    fn test_statistic() {
        assert_eq!(ShortTermReversal.statistic(), RollingStat::Sum);
    }
}
