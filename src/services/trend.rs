//! Least-squares trend helpers over per-run series.

use crate::domain::models::{TestRunRecord, TrendSnapshot};

/// Slope of the least-squares line through `(index, value)`.
///
/// Fewer than two points yield 0. No smoothing is applied, so a short
/// window of noisy values can produce a steep slope.
pub fn slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let n_f = n as f64;
    let (mut x_sum, mut y_sum, mut xy_sum, mut x_sq_sum) = (0.0, 0.0, 0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let x = i as f64;
        x_sum += x;
        y_sum += y;
        xy_sum += x * y;
        x_sq_sum += x * x;
    }

    let denominator = n_f * x_sq_sum - x_sum * x_sum;
    if denominator == 0.0 {
        return 0.0;
    }
    (n_f * xy_sum - x_sum * y_sum) / denominator
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Pass rate per run as a fraction in `[0, 1]`.
pub fn pass_rates(runs: &[TestRunRecord]) -> Vec<f64> {
    runs.iter().map(TestRunRecord::pass_rate).collect()
}

/// Mean per-test duration per run.
pub fn mean_durations(runs: &[TestRunRecord]) -> Vec<f64> {
    runs.iter().map(TestRunRecord::mean_test_duration).collect()
}

/// Series and slopes handed to the insight collaborator.
pub fn snapshot(runs: &[TestRunRecord]) -> TrendSnapshot {
    let pass_rates = pass_rates(runs);
    let mean_durations = mean_durations(runs);
    TrendSnapshot {
        pass_rate_slope: slope(&pass_rates),
        duration_slope: slope(&mean_durations),
        pass_rates,
        mean_durations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slope_of_line() {
        assert!((slope(&[1.0, 3.0, 5.0, 7.0]) - 2.0).abs() < 1e-9);
        assert!((slope(&[0.9, 0.8, 0.7]) + 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_slope_degenerate() {
        assert!(slope(&[]).abs() < f64::EPSILON);
        assert!(slope(&[4.0]).abs() < f64::EPSILON);
        assert!(slope(&[2.0, 2.0, 2.0]).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mean() {
        assert!(mean(&[]).abs() < f64::EPSILON);
        assert!((mean(&[0.4, 0.45, 0.42]) - 0.423_333_333).abs() < 1e-6);
    }
}
