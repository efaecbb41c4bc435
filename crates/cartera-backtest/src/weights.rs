//! Portfolio weight rows.

use cartera_traits::{AssetId, Date, Result, columns};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Target weight of one asset on one rebalancing date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    /// Rebalancing date.
    pub date: Date,
    /// Asset identifier.
    pub asset_id: AssetId,
    /// Portfolio weight.
    pub weight: f64,
}

/// Weights of all solved dates, sorted by `(date, asset_id)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightSeries {
    rows: Vec<Weight>,
}

impl WeightSeries {
    /// Create a series, sorting rows by `(date, asset_id)`.
    pub fn new(mut rows: Vec<Weight>) -> Self {
        rows.sort_by(|a, b| (a.date, &a.asset_id).cmp(&(b.date, &b.asset_id)));
        Self { rows }
    }

    /// All rows.
    pub fn rows(&self) -> &[Weight] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows for a single date.
    pub fn on(&self, date: Date) -> &[Weight] {
        let start = self.rows.partition_point(|w| w.date < date);
        let end = self.rows.partition_point(|w| w.date <= date);
        &self.rows[start..end]
    }

    /// Distinct dates with at least one weight.
    pub fn dates(&self) -> Vec<Date> {
        let mut dates: Vec<Date> = self.rows.iter().map(|w| w.date).collect();
        dates.dedup();
        dates
    }

    /// Sum of weights on a date.
    pub fn net_exposure(&self, date: Date) -> f64 {
        self.on(date).iter().map(|w| w.weight).sum()
    }

    /// Convert to a `(date, barrid, weight)` DataFrame.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let dates: Vec<Date> = self.rows.iter().map(|w| w.date).collect();
        let assets: Vec<&str> = self.rows.iter().map(|w| w.asset_id.as_str()).collect();
        let weights: Vec<f64> = self.rows.iter().map(|w| w.weight).collect();

        let df = DataFrame::new(vec![
            Column::new(columns::DATE.into(), dates),
            Column::new(columns::ASSET.into(), assets),
            Column::new("weight".into(), weights),
        ])?;
        Ok(df)
    }
}

impl FromIterator<Weight> for WeightSeries {
    fn from_iter<I: IntoIterator<Item = Weight>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn w(day: u32, asset: &str, weight: f64) -> Weight {
        Weight {
            date: d(day),
            asset_id: asset.to_string(),
            weight,
        }
    }

    #[test]
    fn test_sorted_by_date_then_asset() {
        let series: WeightSeries = vec![w(3, "B", 0.5), w(2, "B", 0.4), w(2, "A", 0.6)]
            .into_iter()
            .collect();
        let keys: Vec<(Date, &str)> = series
            .rows()
            .iter()
            .map(|x| (x.date, x.asset_id.as_str()))
            .collect();
        assert_eq!(keys, vec![(d(2), "A"), (d(2), "B"), (d(3), "B")]);
        assert_eq!(series.dates(), vec![d(2), d(3)]);
    }

    #[test]
    fn test_on_date() {
        let series = WeightSeries::new(vec![w(2, "A", 0.6), w(2, "B", 0.4), w(3, "A", 1.0)]);
        assert_eq!(series.on(d(2)).len(), 2);
        assert!(series.on(d(4)).is_empty());
        assert_relative_eq!(series.net_exposure(d(2)), 1.0);
    }

    #[test]
    fn test_to_dataframe() {
        let series = WeightSeries::new(vec![w(2, "A", 0.6), w(2, "B", 0.4)]);
        let df = series.to_dataframe().unwrap();
        assert_eq!(df.shape(), (2, 3));
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);
        let weights = df.column("weight").unwrap().f64().unwrap();
        assert_relative_eq!(weights.get(0).unwrap(), 0.6);
    }
}
