use crate::model::{CategoryMomentum, MomentumReport, TimeSeries, TrendDirection, TrendStrength};
use crate::stats::first_differences;
use kopi_core::config::TrendConfig;
use kopi_core::{AnalyticsConfig, AppError, AppResult};
use kopi_periods::{ByCategory, Category};
use tracing::debug;

/// Percent change between the last value and the one `lookback` positions
/// from the end. A lookback past the start uses the first value.
pub fn rate_of_change(values: &[f64], lookback: usize) -> f64 {
    let Some(&current) = values.last() else {
        return 0.0;
    };
    let lookback = lookback.clamp(1, values.len());
    let past = values[values.len() - lookback];
    if past == 0.0 {
        return if current == 0.0 { 0.0 } else { 100.0 };
    }
    (current - past) / past.abs() * 100.0
}

/// EMA of period-over-period changes, seeded with the first change.
pub fn ema_of_deltas(values: &[f64], span: usize) -> f64 {
    let deltas = first_differences(values);
    let Some((&first, rest)) = deltas.split_first() else {
        return 0.0;
    };
    let alpha = 2.0 / (span.min(deltas.len()) as f64 + 1.0);
    rest.iter()
        .fold(first, |ema, delta| alpha * delta + (1.0 - alpha) * ema)
}

pub fn classify_roc(roc: f64, trend: &TrendConfig) -> (TrendDirection, TrendStrength) {
    if roc.abs() < trend.roc_weak_threshold {
        return (TrendDirection::Stable, TrendStrength::Weak);
    }
    let direction = if roc > 0.0 {
        TrendDirection::Rising
    } else {
        TrendDirection::Falling
    };
    let strength = if roc.abs() > trend.roc_strong_threshold {
        TrendStrength::Strong
    } else {
        TrendStrength::Moderate
    };
    (direction, strength)
}

pub struct MomentumCalculator<'a> {
    config: &'a AnalyticsConfig,
}

impl<'a> MomentumCalculator<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn calculate(&self, series: &TimeSeries) -> AppResult<MomentumReport> {
        let latest = series
            .latest()
            .ok_or_else(|| AppError::insufficient_periods(0, 1))?;

        let categories = ByCategory::from_fn(|category| {
            self.category_momentum(series, category, *latest.counts.get(category))
        });

        // Strict comparisons keep the earliest category on ties.
        let mut fastest_rising = Category::Fears;
        let mut fastest_falling = Category::Fears;
        for (category, momentum) in categories.iter() {
            if momentum.roc_7d > categories.get(fastest_rising).roc_7d {
                fastest_rising = category;
            }
            if momentum.roc_7d < categories.get(fastest_falling).roc_7d {
                fastest_falling = category;
            }
        }
        debug!(
            rising = fastest_rising.as_str(),
            falling = fastest_falling.as_str(),
            "momentum leaders"
        );

        Ok(MomentumReport {
            report_date: latest.date,
            lookback_days: series.len().min(7),
            categories,
            fastest_rising,
            fastest_falling,
        })
    }

    fn category_momentum(
        &self,
        series: &TimeSeries,
        category: Category,
        current_count: usize,
    ) -> CategoryMomentum {
        let values = series.category_values(category);
        let lookbacks = &self.config.momentum;
        let roc_7d = rate_of_change(&values, lookbacks.roc_7d_lookback);
        let (trend, trend_strength) = classify_roc(roc_7d, &self.config.trend);

        CategoryMomentum {
            category,
            current_count,
            current_zscore_sum: values.last().copied().unwrap_or_default(),
            roc_1d: rate_of_change(&values, lookbacks.roc_1d_lookback),
            roc_3d: rate_of_change(&values, lookbacks.roc_3d_lookback),
            roc_7d,
            ema_momentum: ema_of_deltas(&values, self.config.ema.span),
            trend,
            trend_strength,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roc_uses_offset_from_end() {
        let values = [5.0, 10.0, 20.0];
        assert_eq!(rate_of_change(&values, 2), 100.0);
        assert_eq!(rate_of_change(&values, 3), 300.0);
    }

    #[test]
    fn roc_lookback_degrades_to_full_length() {
        let values = [4.0, 1.0, 2.0];
        assert_eq!(rate_of_change(&values, 8), rate_of_change(&values, 3));
        assert_eq!(rate_of_change(&values, 8), -50.0);
    }

    #[test]
    fn roc_from_zero_base() {
        assert_eq!(rate_of_change(&[0.0, 0.0], 2), 0.0);
        assert_eq!(rate_of_change(&[0.0, -3.0], 2), 100.0);
    }

    #[test]
    fn roc_divides_by_absolute_past() {
        assert_eq!(rate_of_change(&[-2.0, -1.0], 2), 50.0);
    }

    #[test]
    fn ema_of_deltas_seeds_with_first_change() {
        assert_eq!(ema_of_deltas(&[1.0], 7), 0.0);
        assert_eq!(ema_of_deltas(&[1.0, 4.0], 7), 3.0);
        // Two deltas: span shrinks to 2, alpha = 2/3.
        let ema = ema_of_deltas(&[0.0, 3.0, 9.0], 7);
        assert!((ema - (2.0 / 3.0 * 6.0 + 1.0 / 3.0 * 3.0)).abs() < 1e-12);
    }

    #[test]
    fn roc_classification_bands() {
        let trend = TrendConfig::default();
        assert_eq!(classify_roc(9.9, &trend), (TrendDirection::Stable, TrendStrength::Weak));
        assert_eq!(classify_roc(-10.0, &trend), (TrendDirection::Falling, TrendStrength::Moderate));
        assert_eq!(classify_roc(25.0, &trend), (TrendDirection::Rising, TrendStrength::Moderate));
        assert_eq!(classify_roc(25.1, &trend), (TrendDirection::Rising, TrendStrength::Strong));
    }
}
