//! Windowed-signal trait.
//!
//! A windowed signal describes *what* to roll over: which columns it needs,
//! how a row becomes an input value, and which rolling statistic to apply.
//! The transform engine in `cartera-signals` owns *how*: grouping by asset,
//! windowing, direction and publication lag are applied uniformly to every
//! implementation.

use std::collections::HashMap;
use std::fmt::Debug;

/// Rolling statistic applied over a trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RollingStat {
    /// Arithmetic mean of the valid samples.
    Mean,
    /// Sample standard deviation (ddof = 1); needs at least two samples.
    Std,
    /// Sum of the valid samples.
    Sum,
}

/// Where a rolling leg takes its window length from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowSpec {
    /// Use the configured `window_size` and `min_periods`.
    Configured,
    /// A fixed window; every sample in it is required.
    Fixed(usize),
}

/// Read-only view of one panel row, restricted to a signal's input columns.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a HashMap<String, Vec<Option<f64>>>,
    index: usize,
}

impl<'a> Row<'a> {
    /// Creates a view on row `index` of `columns`.
    pub const fn new(columns: &'a HashMap<String, Vec<Option<f64>>>, index: usize) -> Self {
        Self { columns, index }
    }

    /// Value of `name` on this row; `None` if null or not loaded.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.columns
            .get(name)
            .and_then(|values| values.get(self.index).copied().flatten())
    }
}

/// A raw time-series signal computed by rolling a statistic over each asset's
/// history.
///
/// Implementations must be stateless and thread-safe; a single static instance
/// per signal type is shared by the registry.
///
/// # Example
///
/// ```no_run
/// use cartera_traits::{Row, RollingStat, WindowedSignal};
///
/// #[derive(Debug)]
/// struct PriceLevel;
///
/// impl WindowedSignal for PriceLevel {
///     fn name(&self) -> &'static str {
///         "price_level"
///     }
///
///     fn required_columns(&self) -> &'static [&'static str] {
///         &["price"]
///     }
///
///     fn input(&self, row: &Row<'_>) -> Option<f64> {
///         row.get("price")
///     }
///
///     fn statistic(&self) -> RollingStat {
///         RollingStat::Mean
///     }
/// }
/// ```
pub trait WindowedSignal: Send + Sync + Debug {
    /// Registry identifier of this signal type.
    fn name(&self) -> &'static str;

    /// Panel columns the signal reads, excluding the date and asset keys.
    fn required_columns(&self) -> &'static [&'static str];

    /// Per-row input to the rolling statistic. `None` marks a missing sample.
    fn input(&self, row: &Row<'_>) -> Option<f64>;

    /// Statistic rolled over [`WindowedSignal::input`] with the configured window.
    fn statistic(&self) -> RollingStat;

    /// Denominator leg for ratio signals.
    ///
    /// When present the raw value is `numerator / denominator`, where the
    /// denominator rolls [`WindowedSignal::denominator_input`].
    fn denominator(&self) -> Option<(RollingStat, WindowSpec)> {
        None
    }

    /// Per-row input to the denominator leg.
    fn denominator_input(&self, _row: &Row<'_>) -> Option<f64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Spread;

    impl WindowedSignal for Spread {
        fn name(&self) -> &'static str {
            "spread"
        }

        fn required_columns(&self) -> &'static [&'static str] {
            &["ask", "bid"]
        }

        fn input(&self, row: &Row<'_>) -> Option<f64> {
            Some(row.get("ask")? - row.get("bid")?)
        }

        fn statistic(&self) -> RollingStat {
            RollingStat::Mean
        }
    }

    fn columns() -> HashMap<String, Vec<Option<f64>>> {
        HashMap::from([
            ("ask".to_string(), vec![Some(10.5), None]),
            ("bid".to_string(), vec![Some(10.0), Some(9.0)]),
        ])
    }

    #[test]
    fn test_row_get() {
        let cols = columns();
        let row = Row::new(&cols, 0);
        assert_eq!(row.get("ask"), Some(10.5));
        assert_eq!(row.get("missing"), None);
        assert_eq!(Row::new(&cols, 7).get("ask"), None);
    }

    #[test]
    fn test_signal_input_propagates_nulls() {
        let cols = columns();
        assert_eq!(Spread.input(&Row::new(&cols, 0)), Some(0.5));
        assert_eq!(Spread.input(&Row::new(&cols, 1)), None);
    }

    #[test]
    fn test_default_denominator() {
        assert!(Spread.denominator().is_none());
        assert_eq!(Spread.denominator_input(&Row::new(&columns(), 0)), None);
    }

    #[test]
    fn test_signal_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn WindowedSignal>();
    }
}
