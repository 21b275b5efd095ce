//! Small numeric helpers shared by the analytics stages.

use kopi_core::{AppError, AppResult};
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::function::erf::erf;

/// Probit results for percentiles outside the open unit interval.
pub const PROBIT_CLAMP: f64 = 2.5;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample (n - 1) standard deviation; 0 for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Population (n) standard deviation; 0 for an empty slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / values.len() as f64).sqrt()
}

pub fn first_differences(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Inverse standard-normal CDF, clamped to ±2.5 at or beyond (0, 1).
pub fn probit_clamped(p: f64) -> AppResult<f64> {
    if p <= 0.0 {
        return Ok(-PROBIT_CLAMP);
    }
    if p >= 1.0 {
        return Ok(PROBIT_CLAMP);
    }
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::internal(format!("standard normal init error: {e}")))?;
    Ok(normal.inverse_cdf(p))
}

/// Percentile of `z` under the standard normal, in 0..=100.
pub fn z_to_percentile(z: f64) -> f64 {
    50.0 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Ordinary least squares of `values` against their index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// R² is floored at 0 and is exactly 1 for a flat series.
pub fn linear_fit(values: &[f64]) -> LinearFit {
    let n = values.len();
    if n == 0 {
        return LinearFit {
            slope: 0.0,
            intercept: 0.0,
            r_squared: 0.0,
        };
    }
    let x_mean = (n as f64 - 1.0) / 2.0;
    let y_mean = mean(values);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = y_mean - slope * x_mean;

    let ss_tot: f64 = values.iter().map(|y| (y - y_mean).powi(2)).sum();
    let r_squared = if ss_tot == 0.0 {
        1.0
    } else {
        let ss_res: f64 = values
            .iter()
            .enumerate()
            .map(|(i, y)| (y - (slope * i as f64 + intercept)).powi(2))
            .sum();
        (1.0 - ss_res / ss_tot).max(0.0)
    };

    LinearFit {
        slope,
        intercept,
        r_squared,
    }
}
