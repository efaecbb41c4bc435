//! Per-date cross-sectional standardization.

use cartera_signals::SignalFrame;
use cartera_traits::RiskTable;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frame::{AlphaFrame, AlphaValue};

/// Z-score `values` across the cross-section (sample std, N-1 denominator).
///
/// `None` inputs stay `None`. If fewer than two values are present, or they
/// have no dispersion, every output is `None`. Dispersion is judged relative to
/// the values' magnitude, so tiny-scale signals still standardize.
///
/// # Examples
///
/// ```
/// use cartera_alpha::cross_sectional_zscore;
///
/// let scores = cross_sectional_zscore(&[Some(1.0), Some(2.0), None, Some(3.0)]);
/// assert_eq!(scores, vec![Some(-1.0), Some(0.0), None, Some(1.0)]);
/// ```
pub fn cross_sectional_zscore(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let n = present.len();
    if n < 2 {
        return vec![None; values.len()];
    }

    let pivot = present[0];
    let mean = pivot + present.iter().map(|x| x - pivot).sum::<f64>() / n as f64;
    // Sample variance with N-1 denominator (Bessel's correction)
    let variance = present.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = variance.sqrt();
    let scale = present.iter().map(|x| x.abs()).sum::<f64>() / n as f64;
    if !std.is_finite() || std == 0.0 || std <= f64::EPSILON * scale {
        return vec![None; values.len()];
    }

    values.iter().map(|v| v.map(|x| (x - mean) / std)).collect()
}

/// Converts raw signal values into alpha.
///
/// `score` is the per-date z-score of the raw value and
/// `alpha = score * specific_risk`. Rows whose score or risk is missing keep a
/// null alpha; they stay in the table for diagnostics but never enter an
/// optimization universe.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Standardizer;

impl Standardizer {
    /// Create a standardizer.
    pub const fn new() -> Self {
        Self
    }

    /// Standardize every date of `signals`, scaling by the risk in `risk`.
    pub fn standardize(&self, signals: &SignalFrame, risk: &RiskTable) -> AlphaFrame {
        let mut values = Vec::with_capacity(signals.len());

        for day in signals.values().chunk_by(|a, b| a.date == b.date) {
            let raw: Vec<Option<f64>> = day.iter().map(|v| v.value).collect();
            let scores = cross_sectional_zscore(&raw);

            values.extend(day.iter().zip(scores).map(|(v, score)| {
                let inputs = risk
                    .get(&(v.date, v.asset_id.clone()))
                    .copied()
                    .unwrap_or_default();
                AlphaValue {
                    date: v.date,
                    asset_id: v.asset_id.clone(),
                    raw: v.value,
                    score,
                    alpha: score.zip(inputs.specific_risk).map(|(s, r)| s * r),
                    specific_risk: inputs.specific_risk,
                    predicted_beta: inputs.predicted_beta,
                }
            }));
        }

        let frame = AlphaFrame::new(signals.name(), values);
        debug!(
            signal = signals.name(),
            rows = frame.len(),
            usable = frame.usable_count(),
            "standardized signal"
        );
        frame
    }
}
