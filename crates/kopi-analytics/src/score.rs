use crate::model::PeriodScore;
use crate::stats::{mean, population_std, sample_std};
use kopi_core::config::{EngagementBaseline, IntensityZScores};
use kopi_core::AnalyticsConfig;
use kopi_periods::{ByCategory, Intensity, PeriodRecord, Quote};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Location and scale used to normalize quote engagement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementStats {
    pub mean: f64,
    pub std: f64,
}

impl EngagementStats {
    /// Mean and sample std over every quote in `records`.
    ///
    /// Fewer than two quotes give mean 0 and std 1.
    pub fn pooled(records: &[PeriodRecord]) -> Self {
        let values: Vec<f64> = records
            .iter()
            .flat_map(|r| r.all_quotes())
            .map(|q| q.engagement as f64)
            .collect();
        if values.len() < 2 {
            return Self {
                mean: 0.0,
                std: 1.0,
            };
        }
        Self {
            mean: mean(&values),
            std: sample_std(&values),
        }
    }

    /// Population mean and std within a single period.
    pub fn population(record: &PeriodRecord) -> Self {
        let values: Vec<f64> = record.all_quotes().map(|q| q.engagement as f64).collect();
        Self {
            mean: mean(&values),
            std: population_std(&values),
        }
    }

    /// Engagement z-score, 0 when std is 0, never below `floor`.
    pub fn z(&self, engagement: i64, floor: f64) -> f64 {
        let z = if self.std > 0.0 {
            (engagement as f64 - self.mean) / self.std
        } else {
            0.0
        };
        z.max(floor)
    }
}

pub fn intensity_z(z_scores: &IntensityZScores, intensity: Intensity) -> f64 {
    match intensity {
        Intensity::Mild => z_scores.mild,
        Intensity::Moderate => z_scores.moderate,
        Intensity::Strong => z_scores.strong,
    }
}

/// Turns period records into per-period scores.
pub struct ScoreBuilder<'a> {
    config: &'a AnalyticsConfig,
}

impl<'a> ScoreBuilder<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Scores each record with the configured engagement baseline.
    /// EMA fields are left empty.
    pub fn score_all(&self, records: &[PeriodRecord]) -> Vec<PeriodScore> {
        match self.config.engagement.baseline {
            EngagementBaseline::Pooled => {
                let stats = EngagementStats::pooled(records);
                debug!(mean = stats.mean, std = stats.std, "pooled engagement stats");
                records
                    .iter()
                    .map(|record| self.score_period(record, &stats))
                    .collect()
            }
            EngagementBaseline::PerPeriod => records
                .iter()
                .map(|record| self.score_period(record, &EngagementStats::population(record)))
                .collect(),
        }
    }

    pub fn quote_score(&self, quote: &Quote, stats: &EngagementStats) -> f64 {
        stats.z(quote.engagement, self.config.engagement.z_floor)
            + intensity_z(&self.config.intensity_z_scores, quote.intensity)
    }

    pub fn score_period(&self, record: &PeriodRecord, stats: &EngagementStats) -> PeriodScore {
        let zscore_sums = record.quotes.map(|_, quotes| {
            quotes
                .iter()
                .map(|quote| self.quote_score(quote, stats))
                .sum::<f64>()
        });
        let counts: ByCategory<usize> = record.quotes.map(|_, quotes| quotes.len());
        let total_quotes = record.total_quotes();
        let total_engagement: i64 = record.all_quotes().map(|q| q.engagement).sum();

        let negativity = zscore_sums.fears + zscore_sums.frustrations;
        let positivity = zscore_sums.optimism;

        PeriodScore {
            period_id: record.period_id.clone(),
            date: record.date,
            counts,
            total_quotes,
            zscore_sums,
            negativity_score: negativity,
            positivity_score: positivity,
            composite_score: positivity - negativity,
            ema_score: None,
            ema_negativity: None,
            ema_positivity: None,
            total_engagement,
            avg_engagement: if total_quotes > 0 {
                total_engagement as f64 / total_quotes as f64
            } else {
                0.0
            },
        }
    }
}
