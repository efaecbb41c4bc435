//! Common types used throughout the Cartera engine.
//!
//! This module defines the input panel and the identifiers used to key it.

use crate::{CarteraError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashMap;

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// An asset identifier (a Barra id in the reference data set).
pub type AssetId = String;

/// Days between 0001-01-01 (CE) and the Unix epoch.
///
/// Polars stores `Date` values as days since the Unix epoch.
pub const CE_TO_UNIX_EPOCH_DAYS: i32 = 719_163;

/// Well-known column names of the input panel.
pub mod columns {
    /// Observation date.
    pub const DATE: &str = "date";
    /// Asset identifier.
    pub const ASSET: &str = "barrid";
    /// Total daily return, as a decimal.
    pub const RETURN: &str = "return";
    /// Specific (idiosyncratic) return, as a decimal.
    pub const SPECIFIC_RETURN: &str = "specific_return";
    /// Specific (idiosyncratic) risk, as a decimal.
    pub const SPECIFIC_RISK: &str = "specific_risk";
    /// Closing price.
    pub const PRICE: &str = "price";
    /// Shares traded.
    pub const DAILY_VOLUME: &str = "daily_volume";
    /// Predicted beta from the risk model.
    pub const PREDICTED_BETA: &str = "predicted_beta";
    /// Quoted bid/ask spread.
    pub const BID_ASK_SPREAD: &str = "bid_ask_spread";
}

/// Risk-model inputs for one (date, asset).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RiskInputs {
    /// Specific risk, if known.
    pub specific_risk: Option<f64>,
    /// Predicted beta, if known.
    pub predicted_beta: Option<f64>,
}

/// Risk-model inputs keyed by (date, asset).
pub type RiskTable = HashMap<(Date, AssetId), RiskInputs>;

/// Container for the observation panel.
///
/// `Panel` wraps a Polars DataFrame with one row per (date, asset) and
/// exposes typed, null-aware column extraction. The panel is read-only for
/// the lifetime of a run.
///
/// # Expected Schema
///
/// - `date`: polars `Date` or `YYYY-MM-DD` strings
/// - `barrid`: asset identifier (configurable)
/// - `return`, `specific_risk`, `price`, `daily_volume`, `predicted_beta`
/// - any additional columns a signal requires (e.g. `bid_ask_spread`)
///
/// # Example
///
/// ```no_run
/// use cartera_traits::Panel;
/// use polars::prelude::*;
///
/// let df = df! {
///     "date" => &["2024-01-02", "2024-01-02"],
///     "barrid" => &["USA0001", "USA0002"],
///     "return" => &[0.01, -0.02],
/// }.unwrap();
///
/// let panel = Panel::new(df);
/// ```
#[derive(Debug, Clone)]
pub struct Panel {
    data: DataFrame,
}

impl Panel {
    /// Creates a new `Panel` from a DataFrame.
    pub const fn new(data: DataFrame) -> Self {
        Self { data }
    }

    /// Returns a reference to the underlying DataFrame.
    pub const fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Consumes self and returns the underlying DataFrame.
    pub fn into_inner(self) -> DataFrame {
        self.data
    }

    /// Returns the number of rows in the panel.
    pub fn len(&self) -> usize {
        self.data.height()
    }

    /// Returns whether the panel is empty.
    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }

    /// Returns the column names in the panel.
    pub fn columns(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Checks if a column exists in the panel.
    pub fn has_column(&self, name: &str) -> bool {
        self.data
            .get_column_names()
            .iter()
            .any(|s| s.as_str() == name)
    }

    /// Fails with [`CarteraError::MissingColumn`] naming the first absent column.
    pub fn require(&self, names: &[&str]) -> Result<()> {
        match names.iter().find(|name| !self.has_column(name)) {
            Some(missing) => Err(CarteraError::MissingColumn((*missing).to_string())),
            None => Ok(()),
        }
    }

    fn series(&self, name: &str) -> Result<&Series> {
        self.data
            .column(name)
            .map(|c| c.as_materialized_series())
            .map_err(|_| CarteraError::MissingColumn(name.to_string()))
    }

    /// Extracts a numeric column as `f64`.
    ///
    /// Integer columns are cast. Nulls and non-finite values become `None`.
    pub fn float_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let cast = self.series(name)?.cast(&DataType::Float64)?;
        Ok(cast
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect())
    }

    /// Like [`Panel::float_column`], but `None` when the column is absent.
    pub fn optional_float_column(&self, name: &str) -> Result<Option<Vec<Option<f64>>>> {
        if self.has_column(name) {
            self.float_column(name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Extracts a string key column. Nulls are rejected.
    pub fn key_column(&self, name: &str) -> Result<Vec<AssetId>> {
        let cast = self.series(name)?.cast(&DataType::String)?;
        cast.str()?
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                v.map(str::to_string).ok_or_else(|| {
                    CarteraError::InvalidData(format!("null in key column `{name}` at row {i}"))
                })
            })
            .collect()
    }

    /// Extracts a date column.
    ///
    /// Accepts polars `Date` columns and `YYYY-MM-DD` strings. Nulls and
    /// unparseable values are rejected.
    pub fn date_column(&self, name: &str) -> Result<Vec<Date>> {
        let series = self.series(name)?;
        match series.dtype() {
            DataType::Date => {
                let days = series.cast(&DataType::Int32)?;
                days.i32()?
                    .into_iter()
                    .enumerate()
                    .map(|(i, d)| {
                        d.and_then(|d| NaiveDate::from_num_days_from_ce_opt(d + CE_TO_UNIX_EPOCH_DAYS))
                            .ok_or_else(|| {
                                CarteraError::InvalidData(format!(
                                    "null or out-of-range date in `{name}` at row {i}"
                                ))
                            })
                    })
                    .collect()
            }
            DataType::String => series
                .str()?
                .into_iter()
                .enumerate()
                .map(|(i, s)| {
                    s.and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                        .ok_or_else(|| {
                            CarteraError::InvalidData(format!(
                                "unparseable date in `{name}` at row {i}"
                            ))
                        })
                })
                .collect(),
            other => Err(CarteraError::InvalidData(format!(
                "date column `{name}` has unsupported type {other}"
            ))),
        }
    }

    /// Builds the (date, asset) → risk inputs lookup.
    ///
    /// `specific_risk` is required; `predicted_beta` is optional.
    pub fn risk_table(&self, date_key: &str, asset_key: &str) -> Result<RiskTable> {
        self.require(&[date_key, asset_key, columns::SPECIFIC_RISK])?;
        let dates = self.date_column(date_key)?;
        let assets = self.key_column(asset_key)?;
        let risk = self.float_column(columns::SPECIFIC_RISK)?;
        let beta = self.optional_float_column(columns::PREDICTED_BETA)?;

        let mut table = RiskTable::with_capacity(dates.len());
        for (i, (date, asset)) in dates.into_iter().zip(assets).enumerate() {
            let inputs = RiskInputs {
                specific_risk: risk[i],
                predicted_beta: beta.as_ref().and_then(|b| b[i]),
            };
            if table.insert((date, asset.clone()), inputs).is_some() {
                return Err(CarteraError::DuplicateKey { date, asset });
            }
        }
        Ok(table)
    }
}

impl From<DataFrame> for Panel {
    fn from(data: DataFrame) -> Self {
        Self::new(data)
    }
}

impl AsRef<DataFrame> for Panel {
    fn as_ref(&self) -> &DataFrame {
        &self.data
    }
}
