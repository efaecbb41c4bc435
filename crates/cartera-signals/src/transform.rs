//! Windowed transform engine.
//!
//! Turns a raw observation panel into one raw signal value per
//! (date, asset): rows are grouped by asset, ordered by date, rolled with the
//! signal's statistic, signed by the configured direction and lagged by the
//! publication shift, all within each asset's own history.

use std::collections::{BTreeMap, HashMap};

use cartera_traits::{
    AssetId, CarteraError, Date, Panel, Result, RollingStat, Row, WindowSpec, WindowedSignal,
    columns,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rolling::{lag, rolling};

/// Multiplicative sign applied to the raw statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// High raw values are attractive.
    Long,
    /// Low raw values are attractive; the statistic is negated.
    Short,
}

impl Direction {
    /// Parse a `+1` / `-1` configuration value.
    pub fn from_sign(sign: i64) -> Result<Self> {
        match sign {
            1 => Ok(Self::Long),
            -1 => Ok(Self::Short),
            other => Err(CarteraError::invalid_parameter(
                "signal.direction",
                format!("must be 1 or -1, got {other}"),
            )),
        }
    }

    /// The sign as a float multiplier.
    pub const fn sign(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }
}

/// Parameters of a windowed transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformParams {
    /// Column identifying the asset.
    pub asset_key: String,
    /// Column identifying the date.
    pub date_key: String,
    /// Trailing window length, in rows.
    pub window_size: usize,
    /// Minimum non-null samples in the window for a non-null result.
    pub min_periods: usize,
    /// Sign applied to the statistic.
    pub direction: Direction,
    /// Publication lag, in rows.
    pub shift: usize,
}

impl TransformParams {
    /// Parameters with the given window and the defaults used by the research
    /// pipeline: `min_periods = window_size`, long direction, no lag.
    pub fn new(window_size: usize) -> Self {
        Self {
            asset_key: columns::ASSET.to_string(),
            date_key: columns::DATE.to_string(),
            window_size,
            min_periods: window_size,
            direction: Direction::Long,
            shift: 0,
        }
    }

    /// Set the minimum number of samples.
    #[must_use]
    pub const fn with_min_periods(mut self, min_periods: usize) -> Self {
        self.min_periods = min_periods;
        self
    }

    /// Set the direction.
    #[must_use]
    pub const fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set the publication lag.
    #[must_use]
    pub const fn with_shift(mut self, shift: usize) -> Self {
        self.shift = shift;
        self
    }

    /// Set the asset and date key columns.
    #[must_use]
    pub fn with_keys(mut self, asset_key: impl Into<String>, date_key: impl Into<String>) -> Self {
        self.asset_key = asset_key.into();
        self.date_key = date_key.into();
        self
    }

    /// Check the numeric ranges.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(CarteraError::invalid_parameter(
                "signal.window_size",
                "must be greater than 0",
            ));
        }
        if self.min_periods == 0 {
            return Err(CarteraError::invalid_parameter(
                "signal.min_periods",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Raw signal value for one (date, asset).
#[derive(Debug, Clone, PartialEq)]
pub struct SignalValue {
    /// Observation date the value is attributed to.
    pub date: Date,
    /// Asset identifier.
    pub asset_id: AssetId,
    /// Raw value, `None` when the window was too sparse.
    pub value: Option<f64>,
}

/// Raw signal values for a whole panel, ordered by (date, asset).
#[derive(Debug, Clone, PartialEq)]
pub struct SignalFrame {
    name: String,
    values: Vec<SignalValue>,
}

impl SignalFrame {
    /// Build a frame, sorting the values by (date, asset).
    pub fn new(name: impl Into<String>, mut values: Vec<SignalValue>) -> Self {
        values.sort_by(|a, b| (a.date, &a.asset_id).cmp(&(b.date, &b.asset_id)));
        Self {
            name: name.into(),
            values,
        }
    }

    /// Rename the signal (the configured run name usually differs from the
    /// signal type).
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Signal name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All values, ordered by (date, asset).
    pub fn values(&self) -> &[SignalValue] {
        &self.values
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of rows with a non-null value.
    pub fn non_null_count(&self) -> usize {
        self.values.iter().filter(|v| v.value.is_some()).count()
    }

    /// Value for one (date, asset), if the row exists.
    pub fn get(&self, date: Date, asset_id: &str) -> Option<&SignalValue> {
        self.values
            .binary_search_by(|v| (v.date, v.asset_id.as_str()).cmp(&(date, asset_id)))
            .ok()
            .map(|i| &self.values[i])
    }

    /// Columns `date`, `barrid`, `<name>`.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let dates: Vec<Date> = self.values.iter().map(|v| v.date).collect();
        let assets: Vec<&str> = self.values.iter().map(|v| v.asset_id.as_str()).collect();
        let raw: Vec<Option<f64>> = self.values.iter().map(|v| v.value).collect();
        Ok(DataFrame::new(vec![
            Column::new(columns::DATE.into(), dates),
            Column::new(columns::ASSET.into(), assets),
            Column::new(self.name.as_str().into(), raw),
        ])?)
    }
}

/// Applies windowed signals to a panel.
///
/// # Example
///
/// ```ignore
/// use cartera_signals::{TransformEngine, TransformParams, volatility::IdioVol};
///
/// let engine = TransformEngine::new(TransformParams::new(3).with_min_periods(2));
/// let frame = engine.compute(&panel, &IdioVol)?;
/// ```
#[derive(Debug, Clone)]
pub struct TransformEngine {
    params: TransformParams,
}

impl TransformEngine {
    /// Create an engine with the given parameters.
    pub const fn new(params: TransformParams) -> Self {
        Self { params }
    }

    /// The engine's parameters.
    pub const fn params(&self) -> &TransformParams {
        &self.params
    }

    /// Compute `signal` for every row of `panel`.
    ///
    /// Fails without partial output if a key or input column is missing,
    /// a key is null or unparseable, or a (date, asset) appears twice.
    pub fn compute(&self, panel: &Panel, signal: &dyn WindowedSignal) -> Result<SignalFrame> {
        self.params.validate()?;
        let p = &self.params;
        panel.require(&[p.date_key.as_str(), p.asset_key.as_str()])?;
        panel.require(signal.required_columns())?;

        let dates = panel.date_column(&p.date_key)?;
        let assets = panel.key_column(&p.asset_key)?;
        let inputs: HashMap<String, Vec<Option<f64>>> = signal
            .required_columns()
            .iter()
            .map(|name| Ok((name.to_string(), panel.float_column(name)?)))
            .collect::<Result<_>>()?;

        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, asset) in assets.iter().enumerate() {
            groups.entry(asset.as_str()).or_default().push(i);
        }

        let mut values = Vec::with_capacity(dates.len());
        for (asset, mut rows) in groups {
            rows.sort_by_key(|&i| dates[i]);
            if let Some(pair) = rows.windows(2).find(|w| dates[w[0]] == dates[w[1]]) {
                return Err(CarteraError::DuplicateKey {
                    date: dates[pair[0]],
                    asset: asset.to_string(),
                });
            }

            let raw = self.roll_group(signal, &inputs, &rows);
            values.extend(rows.iter().zip(raw).map(|(&i, value)| SignalValue {
                date: dates[i],
                asset_id: asset.to_string(),
                value,
            }));
        }

        let frame = SignalFrame::new(signal.name(), values);
        debug!(
            signal = signal.name(),
            rows = frame.len(),
            non_null = frame.non_null_count(),
            "computed raw signal"
        );
        Ok(frame)
    }

    /// Rolled, signed and lagged values for one asset's rows (date order).
    fn roll_group(
        &self,
        signal: &dyn WindowedSignal,
        inputs: &HashMap<String, Vec<Option<f64>>>,
        rows: &[usize],
    ) -> Vec<Option<f64>> {
        let p = &self.params;
        let numerator_inputs: Vec<Option<f64>> = rows
            .iter()
            .map(|&i| signal.input(&Row::new(inputs, i)))
            .collect();
        let mut raw = rolling(
            &numerator_inputs,
            signal.statistic(),
            p.window_size,
            p.min_periods,
        );

        if let Some((stat, spec)) = signal.denominator() {
            let denominator_inputs: Vec<Option<f64>> = rows
                .iter()
                .map(|&i| signal.denominator_input(&Row::new(inputs, i)))
                .collect();
            let denominator = self.roll_leg(&denominator_inputs, stat, spec);
            raw = raw
                .into_iter()
                .zip(denominator)
                .map(|(n, d)| match (n, d) {
                    (Some(n), Some(d)) if d != 0.0 => Some(n / d),
                    _ => None,
                })
                .collect();
        }

        let sign = p.direction.sign();
        lag(
            raw.into_iter().map(|v| v.map(|x| x * sign)).collect(),
            p.shift,
        )
    }

    fn roll_leg(&self, inputs: &[Option<f64>], stat: RollingStat, spec: WindowSpec) -> Vec<Option<f64>> {
        match spec {
            WindowSpec::Configured => {
                rolling(inputs, stat, self.params.window_size, self.params.min_periods)
            }
            WindowSpec::Fixed(window) => rolling(inputs, stat, window, window),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liquidity::Cost;
    use crate::volatility::IdioVol;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn d(day: u32) -> Date {
        NaiveDate::from_ymd_opt(2023, 1, day).unwrap()
    }

    fn two_asset_panel() -> Panel {
        // Rows deliberately out of order to exercise grouping and sorting
        Panel::new(
            df! {
                "date" => &["2023-01-03", "2023-01-01", "2023-01-02", "2023-01-01", "2023-01-02", "2023-01-03"],
                "barrid" => &["A", "A", "A", "B", "B", "B"],
                "return" => &[0.015, 0.01, -0.02, -0.01, 0.02, -0.015],
            }
            .unwrap(),
        )
    }

    #[test]
    fn test_rolling_std_per_asset() {
        let engine = TransformEngine::new(TransformParams::new(3).with_min_periods(2));
        let frame = engine.compute(&two_asset_panel(), &IdioVol).unwrap();

        assert_eq!(frame.len(), 6);
        assert_eq!(frame.name(), "idio_vol");
        assert!(frame.get(d(1), "A").unwrap().value.is_none());
        let value = frame.get(d(3), "A").unwrap().value.unwrap();
        assert_relative_eq!(value, 0.018_929_694_486_000_914, max_relative = 1e-10);
    }

    #[test]
    fn test_halted_asset_has_zero_vol() {
        let n = 2_000;
        let dates: Vec<String> = (0..n)
            .map(|i| (d(1) + chrono::Duration::days(i)).format("%Y-%m-%d").to_string())
            .collect();
        // Trades for most of the history, then returns go flat
        let returns: Vec<f64> = (0..n)
            .map(|i| if i < n - 10 { 0.01 * ((i * 7 % 13) as f64 - 6.0) } else { 0.0 })
            .collect();
        let panel = Panel::new(
            df! {
                "date" => dates,
                "barrid" => vec!["A"; n as usize],
                "return" => returns,
            }
            .unwrap(),
        );

        let frame = TransformEngine::new(TransformParams::new(5))
            .compute(&panel, &IdioVol)
            .unwrap();
        let last = frame.values().last().unwrap();
        assert_eq!(last.value, Some(0.0));
    }

    #[test]
    fn test_output_is_ordered_by_date_then_asset() {
        let engine = TransformEngine::new(TransformParams::new(2));
        let frame = engine.compute(&two_asset_panel(), &IdioVol).unwrap();
        let keys: Vec<(Date, &str)> = frame
            .values()
            .iter()
            .map(|v| (v.date, v.asset_id.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![(d(1), "A"), (d(1), "B"), (d(2), "A"), (d(2), "B"), (d(3), "A"), (d(3), "B")]
        );
    }

    #[test]
    fn test_direction_negates() {
        let params = TransformParams::new(3).with_min_periods(2);
        let long = TransformEngine::new(params.clone())
            .compute(&two_asset_panel(), &IdioVol)
            .unwrap();
        let short = TransformEngine::new(params.with_direction(Direction::Short))
            .compute(&two_asset_panel(), &IdioVol)
            .unwrap();

        for (l, s) in long.values().iter().zip(short.values()) {
            assert_eq!(l.value.map(|x| -x), s.value);
        }
    }

    #[test]
    fn test_shift_lags_within_each_asset() {
        let params = TransformParams::new(2).with_min_periods(2);
        let unshifted = TransformEngine::new(params.clone())
            .compute(&two_asset_panel(), &IdioVol)
            .unwrap();
        let shifted = TransformEngine::new(params.with_shift(1))
            .compute(&two_asset_panel(), &IdioVol)
            .unwrap();

        for asset in ["A", "B"] {
            assert!(shifted.get(d(1), asset).unwrap().value.is_none());
            assert!(shifted.get(d(2), asset).unwrap().value.is_none());
            assert_eq!(
                shifted.get(d(3), asset).unwrap().value,
                unshifted.get(d(2), asset).unwrap().value
            );
        }
    }

    #[test]
    fn test_missing_input_column_fails_closed() {
        let panel = Panel::new(df! { "date" => &["2023-01-01"], "barrid" => &["A"] }.unwrap());
        let err = TransformEngine::new(TransformParams::new(20))
            .compute(&panel, &IdioVol)
            .unwrap_err();
        assert!(matches!(err, CarteraError::MissingColumn(c) if c == "return"));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let panel = Panel::new(
            df! {
                "date" => &["2023-01-01", "2023-01-01"],
                "barrid" => &["A", "A"],
                "return" => &[0.01, 0.02],
            }
            .unwrap(),
        );
        let err = TransformEngine::new(TransformParams::new(2))
            .compute(&panel, &IdioVol)
            .unwrap_err();
        assert!(matches!(err, CarteraError::DuplicateKey { .. }));
    }

    #[test]
    fn test_invalid_params() {
        let err = TransformEngine::new(TransformParams::new(0))
            .compute(&two_asset_panel(), &IdioVol)
            .unwrap_err();
        assert!(matches!(err, CarteraError::InvalidParameter { .. }));
        assert!(Direction::from_sign(0).is_err());
        assert_eq!(Direction::from_sign(-1).unwrap(), Direction::Short);
    }

    #[test]
    fn test_ratio_signal_needs_full_denominator_window() {
        let n = 50;
        let dates: Vec<String> = (0..n)
            .map(|i| (d(1) + chrono::Duration::days(i)).format("%Y-%m-%d").to_string())
            .collect();
        let returns: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 0.01 } else { -0.01 }).collect();
        let panel = Panel::new(
            df! {
                "date" => dates,
                "barrid" => vec!["A"; n as usize],
                "return" => returns,
                "price" => vec![10.0; n as usize],
                "bid_ask_spread" => vec![0.02; n as usize],
            }
            .unwrap(),
        );

        let frame = TransformEngine::new(TransformParams::new(5))
            .compute(&panel, &Cost)
            .unwrap();
        let values = frame.values();
        assert!(values[42].value.is_none());
        let first = values[43].value.unwrap();
        // spread / price = 0.002; alternating +/-1% returns have std ~0.0101156
        assert_relative_eq!(first, 0.002 / 0.010_115_610_777_177_464, max_relative = 1e-6);
    }

    #[test]
    fn test_to_dataframe() {
        let frame = TransformEngine::new(TransformParams::new(2))
            .compute(&two_asset_panel(), &IdioVol)
            .unwrap()
            .with_name("my_vol");
        let df = frame.to_dataframe().unwrap();
        assert_eq!(df.height(), 6);
        assert!(df.column("my_vol").is_ok());
        assert!(df.column("barrid").is_ok());
    }
}
