//! Trailing-window statistics over a single asset's history.

use cartera_traits::RollingStat;

/// Rolls `stat` over `values` with a trailing window of `window` rows.
///
/// Output `i` covers rows `i + 1 - window ..= i`. It is `None` when fewer than
/// `min_periods` samples in the window are present, and for `Std` also when
/// fewer than two are. Each window is evaluated from its own samples, so a
/// constant window has a std of exactly zero however long the history.
pub(crate) fn rolling(
    values: &[Option<f64>],
    stat: RollingStat,
    window: usize,
    min_periods: usize,
) -> Vec<Option<f64>> {
    let mut samples: Vec<f64> = Vec::with_capacity(window);
    (0..values.len())
        .map(|i| {
            samples.clear();
            samples.extend(values[(i + 1).saturating_sub(window)..=i].iter().flatten());
            if samples.is_empty() || samples.len() < min_periods {
                return None;
            }
            match stat {
                RollingStat::Sum => Some(samples.iter().sum::<f64>()),
                RollingStat::Mean => Some(mean(&samples)),
                RollingStat::Std => sample_std(&samples),
            }
        })
        .collect()
}

/// Mean taken relative to the first sample.
fn mean(samples: &[f64]) -> f64 {
    let pivot = samples[0];
    pivot + samples.iter().map(|x| x - pivot).sum::<f64>() / samples.len() as f64
}

/// Two-pass sample std (N-1 denominator); `None` below two samples.
fn sample_std(samples: &[f64]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }
    let mean = mean(samples);
    let ss = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>();
    Some((ss / (samples.len() - 1) as f64).sqrt())
}

/// Delays `values` by `periods` rows, filling the head with `None`.
pub(crate) fn lag(values: Vec<Option<f64>>, periods: usize) -> Vec<Option<f64>> {
    if periods == 0 {
        return values;
    }
    let n = values.len();
    let mut out = vec![None; n.min(periods)];
    out.extend(values.into_iter().take(n.saturating_sub(periods)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rolling_std_matches_sample_std() {
        let values = [Some(0.01), Some(-0.02), Some(0.015)];
        let out = rolling(&values, RollingStat::Std, 3, 2);
        assert!(out[0].is_none());
        assert_relative_eq!(out[1].unwrap(), 0.021_213_203_435_596_427, max_relative = 1e-12);
        assert_relative_eq!(out[2].unwrap(), 0.018_929_694_486_000_914, max_relative = 1e-12);
    }

    #[test]
    fn test_std_needs_two_samples() {
        let out = rolling(&[Some(1.0), Some(2.0)], RollingStat::Std, 2, 1);
        assert_eq!(out[0], None);
        assert_relative_eq!(out[1].unwrap(), std::f64::consts::FRAC_1_SQRT_2);
    }

    #[test]
    fn test_rolling_mean_and_sum_drop_old_rows() {
        let values = [Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        let mean = rolling(&values, RollingStat::Mean, 2, 2);
        assert_eq!(mean, vec![None, Some(1.5), Some(2.5), Some(3.5)]);

        let sum = rolling(&values, RollingStat::Sum, 3, 1);
        assert_eq!(sum, vec![Some(1.0), Some(3.0), Some(6.0), Some(9.0)]);
    }

    #[test]
    fn test_nulls_do_not_count_towards_min_periods() {
        let values = [Some(1.0), None, Some(3.0), None];
        let mean = rolling(&values, RollingStat::Mean, 3, 2);
        assert_eq!(mean, vec![None, None, Some(2.0), None]);
    }

    #[test]
    fn test_constant_window_has_zero_std() {
        let values = [0.013, -0.027, 0.031, 0.0, 0.0, 0.0, 0.0, 0.0].map(Some);
        let out = rolling(&values, RollingStat::Std, 3, 3);
        assert_eq!(&out[5..], &[Some(0.0); 3]);

        let flat = [Some(0.013); 10];
        let out = rolling(&flat, RollingStat::Std, 4, 2);
        assert!(out[1..].iter().all(|v| *v == Some(0.0)));
    }

    #[test]
    fn test_long_history_matches_direct_std() {
        let values: Vec<Option<f64>> = (0..2_500)
            .map(|i| Some(0.02 * (i as f64 * 0.37).sin() + 1e-4 * (i % 7) as f64))
            .collect();
        let window = 22;
        let out = rolling(&values, RollingStat::Std, window, window);

        for i in [window - 1, 1_000, 2_499] {
            let slice: Vec<f64> = values[i + 1 - window..=i].iter().flatten().copied().collect();
            let m = slice.iter().sum::<f64>() / window as f64;
            let expected =
                (slice.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (window - 1) as f64).sqrt();
            assert_relative_eq!(out[i].unwrap(), expected, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_lag() {
        let values = vec![Some(1.0), Some(2.0), Some(3.0)];
        assert_eq!(lag(values.clone(), 0), values);
        assert_eq!(lag(values.clone(), 1), vec![None, Some(1.0), Some(2.0)]);
        assert_eq!(lag(values, 5), vec![None, None, None]);
    }
}
