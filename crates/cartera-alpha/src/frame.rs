//! The alpha table.

use cartera_traits::{AssetId, Date, Result, columns};
use polars::prelude::*;

/// Alpha for one (date, asset), with the risk inputs the optimizer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaValue {
    /// Observation date.
    pub date: Date,
    /// Asset identifier.
    pub asset_id: AssetId,
    /// Raw signal value.
    pub raw: Option<f64>,
    /// Cross-sectional z-score of `raw`.
    pub score: Option<f64>,
    /// `score * specific_risk`.
    pub alpha: Option<f64>,
    /// Specific risk used for scaling and for the risk penalty.
    pub specific_risk: Option<f64>,
    /// Predicted beta, for beta constraints.
    pub predicted_beta: Option<f64>,
}

/// Alpha values for a whole run, ordered by (date, asset).
///
/// Rows with a null alpha are kept for diagnostics; [`AlphaFrame::universe`]
/// filters them out.
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaFrame {
    signal_name: String,
    values: Vec<AlphaValue>,
}

impl AlphaFrame {
    /// Build a frame, sorting the values by (date, asset).
    pub fn new(signal_name: impl Into<String>, mut values: Vec<AlphaValue>) -> Self {
        values.sort_by(|a, b| (a.date, &a.asset_id).cmp(&(b.date, &b.asset_id)));
        Self {
            signal_name: signal_name.into(),
            values,
        }
    }

    /// Name of the signal the alpha was derived from.
    pub fn signal_name(&self) -> &str {
        &self.signal_name
    }

    /// All rows, ordered by (date, asset).
    pub fn values(&self) -> &[AlphaValue] {
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

    /// Number of rows with a non-null alpha.
    pub fn usable_count(&self) -> usize {
        self.values.iter().filter(|v| v.alpha.is_some()).count()
    }

    /// Rows grouped by date, in date order.
    pub fn by_date(&self) -> impl Iterator<Item = (Date, &[AlphaValue])> + '_ {
        self.values
            .chunk_by(|a, b| a.date == b.date)
            .map(|rows| (rows[0].date, rows))
    }

    /// Distinct dates, ascending.
    pub fn dates(&self) -> Vec<Date> {
        self.by_date().map(|(date, _)| date).collect()
    }

    /// Rows of `date` with a non-null alpha, ordered by asset.
    pub fn universe(&self, date: Date) -> Vec<&AlphaValue> {
        let start = self.values.partition_point(|v| v.date < date);
        self.values[start..]
            .iter()
            .take_while(|v| v.date == date)
            .filter(|v| v.alpha.is_some())
            .collect()
    }

    fn column_name(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            self.signal_name.clone()
        } else {
            format!("{}_{suffix}", self.signal_name)
        }
    }

    /// Full table: `date`, `barrid`, `<signal>`, `<signal>_score`,
    /// `<signal>_alpha`, `specific_risk`, `predicted_beta`.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut df = self.diagnostics()?;
        df.with_column(Column::new(
            self.column_name("").into(),
            self.values.iter().map(|v| v.raw).collect::<Vec<_>>(),
        ))?;
        df.with_column(Column::new(
            self.column_name("score").into(),
            self.values.iter().map(|v| v.score).collect::<Vec<_>>(),
        ))?;
        df.with_column(Column::new(
            columns::PREDICTED_BETA.into(),
            self.values.iter().map(|v| v.predicted_beta).collect::<Vec<_>>(),
        ))?;
        Ok(df)
    }

    /// Diagnostics projection: `date`, `barrid`, `<signal>_alpha`,
    /// `specific_risk`.
    pub fn diagnostics(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            Column::new(
                columns::DATE.into(),
                self.values.iter().map(|v| v.date).collect::<Vec<_>>(),
            ),
            Column::new(
                columns::ASSET.into(),
                self.values
                    .iter()
                    .map(|v| v.asset_id.as_str())
                    .collect::<Vec<_>>(),
            ),
            Column::new(
                self.column_name("alpha").into(),
                self.values.iter().map(|v| v.alpha).collect::<Vec<_>>(),
            ),
            Column::new(
                columns::SPECIFIC_RISK.into(),
                self.values.iter().map(|v| v.specific_risk).collect::<Vec<_>>(),
            ),
        ])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(day: u32, asset: &str, alpha: Option<f64>) -> AlphaValue {
        AlphaValue {
            date: NaiveDate::from_ymd_opt(2023, 1, day).unwrap(),
            asset_id: asset.to_string(),
            raw: alpha,
            score: alpha,
            alpha,
            specific_risk: Some(0.1),
            predicted_beta: Some(1.0),
        }
    }

    fn sample() -> AlphaFrame {
        AlphaFrame::new(
            "sig",
            vec![
                row(2, "B", Some(0.5)),
                row(1, "A", None),
                row(2, "A", Some(-0.5)),
                row(3, "A", None),
                row(1, "B", Some(1.0)),
            ],
        )
    }

    #[test]
    fn test_dates_and_grouping() {
        let frame = sample();
        let dates = frame.dates();
        assert_eq!(dates.len(), 3);
        assert!(dates.windows(2).all(|w| w[0] < w[1]));

        let sizes: Vec<usize> = frame.by_date().map(|(_, rows)| rows.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_universe_drops_null_alpha() {
        let frame = sample();
        let dates = frame.dates();

        let day1: Vec<&str> = frame.universe(dates[0]).iter().map(|v| v.asset_id.as_str()).collect();
        assert_eq!(day1, vec!["B"]);
        assert_eq!(frame.universe(dates[1]).len(), 2);
        assert!(frame.universe(dates[2]).is_empty());
        assert_eq!(frame.usable_count(), 3);
    }

    #[test]
    fn test_dataframes() {
        let frame = sample();
        let diag = frame.diagnostics().unwrap();
        assert_eq!(diag.width(), 4);
        assert_eq!(diag.height(), 5);
        assert!(diag.column("sig_alpha").is_ok());

        let full = frame.to_dataframe().unwrap();
        assert_eq!(full.width(), 7);
        assert!(full.column("sig_score").is_ok());
        assert!(full.column("sig").is_ok());
    }
}
