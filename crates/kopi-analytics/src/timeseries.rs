use crate::model::{PeriodScore, TimeSeries, TrendDirection, TrendFit};
use crate::score::ScoreBuilder;
use crate::stats::{linear_fit, mean, population_std, sample_std};
use kopi_core::{AnalyticsConfig, AppError, AppResult};
use kopi_periods::{PeriodKind, PeriodRecord};
use tracing::{debug, info};

/// EMA that stays empty until `min_periods` values exist, starts from their
/// simple mean, then recurses with `alpha = 2 / (span + 1)`.
pub fn exponential_smoothing(values: &[f64], span: usize, min_periods: usize) -> Vec<Option<f64>> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let seed_index = min_periods.max(1) - 1;
    let mut out: Vec<Option<f64>> = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        let ema = if i < seed_index {
            None
        } else if i == seed_index {
            Some(mean(&values[..=i]))
        } else {
            out[i - 1].map(|prev| alpha * value + (1.0 - alpha) * prev)
        };
        out.push(ema);
    }
    out
}

pub fn classify_slope(slope: f64, stable_threshold: f64) -> TrendDirection {
    if slope.abs() < stable_threshold {
        TrendDirection::Stable
    } else if slope > 0.0 {
        TrendDirection::Rising
    } else {
        TrendDirection::Falling
    }
}

pub struct TimeSeriesBuilder<'a> {
    config: &'a AnalyticsConfig,
}

impl<'a> TimeSeriesBuilder<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn min_periods_required(&self, kind: PeriodKind) -> usize {
        match kind {
            PeriodKind::Daily => self.config.pipeline.min_days_required,
            PeriodKind::Weekly => self.config.pipeline.min_weeks_required,
        }
    }

    /// Scores `records` in ascending date order and fits the series.
    pub fn build(&self, records: &[PeriodRecord], kind: PeriodKind) -> AppResult<TimeSeries> {
        let required = self.min_periods_required(kind).max(1);
        if records.len() < required {
            return Err(AppError::insufficient_periods(records.len(), required));
        }

        let mut ordered: Vec<PeriodRecord> = records.to_vec();
        ordered.sort_by(|a, b| a.date.cmp(&b.date));

        let scores = ScoreBuilder::new(self.config).score_all(&ordered);
        let series = self.summarize(scores)?;
        info!(
            mode = kind.as_str(),
            periods = series.len(),
            slope = series.trend.slope,
            direction = series.trend.direction.as_str(),
            "time series built"
        );
        Ok(series)
    }

    /// Smooths and summarizes already-scored periods.
    pub fn summarize(&self, mut points: Vec<PeriodScore>) -> AppResult<TimeSeries> {
        let (first, last) = match (points.first(), points.last()) {
            (Some(first), Some(last)) => (first.date, last.date),
            _ => return Err(AppError::insufficient_periods(0, 1)),
        };
        self.apply_ema(&mut points);

        let composite: Vec<f64> = points.iter().map(|p| p.composite_score).collect();
        let fit = linear_fit(&composite);
        let direction = classify_slope(fit.slope, self.config.trend.slope_stable_threshold);
        debug!(slope = fit.slope, r_squared = fit.r_squared, "composite trend fit");

        Ok(TimeSeries {
            start_date: first,
            end_date: last,
            mean_score: mean(&composite),
            std_dev: sample_std(&composite),
            population_std_dev: population_std(&composite),
            min_score: composite.iter().copied().fold(f64::INFINITY, f64::min),
            max_score: composite.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            trend: TrendFit {
                direction,
                slope: fit.slope,
                r_squared: fit.r_squared,
            },
            data_points: points,
        })
    }

    fn apply_ema(&self, points: &mut [PeriodScore]) {
        let span = self.config.ema.span;
        let min_periods = self.config.ema.min_periods;
        let smooth = |raw: Vec<f64>| exponential_smoothing(&raw, span, min_periods);
        let composite = smooth(points.iter().map(|p| p.composite_score).collect());
        let negativity = smooth(points.iter().map(|p| p.negativity_score).collect());
        let positivity = smooth(points.iter().map(|p| p.positivity_score).collect());
        for (i, point) in points.iter_mut().enumerate() {
            point.ema_score = composite[i];
            point.ema_negativity = negativity[i];
            point.ema_positivity = positivity[i];
        }
    }
}
