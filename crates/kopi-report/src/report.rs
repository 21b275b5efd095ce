use crate::commentary::{generate_commentary, CommentaryInputs, CommentaryProvider};
use crate::insights::{headline, key_insights};
use kopi_analytics::{
    EntityTrendCalculator, EntityTrendsReport, MomentumCalculator, MomentumReport, TimeSeries,
    TimeSeriesBuilder, VelocityDetector, VelocityReport,
};
use kopi_core::json::determinism_hash_for_json_value;
use kopi_core::{AnalyticsConfig, AppError, AppResult};
use kopi_periods::{ByCategory, PeriodKind, PeriodRecord};
use serde::{Deserialize, Serialize};
use time::Date;
use tracing::info;

pub const SCHEMA_VERSION: &str = "analytics_v1";

/// Fields left out of the determinism hash.
const VOLATILE_FIELDS: [&str; 2] = ["generated_at", "determinism_hash"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDelta {
    pub current: f64,
    pub previous: f64,
    pub delta: f64,
}

/// Latest period against the one before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub period_id: String,
    pub previous_period_id: String,
    pub categories: ByCategory<CategoryDelta>,
    pub composite_delta: f64,
}

impl PeriodComparison {
    pub fn from_series(series: &TimeSeries) -> Option<Self> {
        let [.., previous, current] = series.data_points.as_slice() else {
            return None;
        };
        Some(Self {
            period_id: current.period_id.clone(),
            previous_period_id: previous.period_id.clone(),
            categories: ByCategory::from_fn(|category| {
                let now = *current.zscore_sums.get(category);
                let before = *previous.zscore_sums.get(category);
                CategoryDelta {
                    current: now,
                    previous: before,
                    delta: now - before,
                }
            }),
            composite_delta: current.composite_score - previous.composite_score,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub schema_version: String,
    #[serde(with = "kopi_core::date::iso")]
    pub generated_at: Date,
    pub period_kind: PeriodKind,
    #[serde(with = "kopi_core::date::iso")]
    pub data_range_start: Date,
    #[serde(with = "kopi_core::date::iso")]
    pub data_range_end: Date,
    pub periods_analyzed: usize,
    pub sentiment_timeseries: TimeSeries,
    pub momentum: MomentumReport,
    pub velocity: VelocityReport,
    pub previous_period: Option<PeriodComparison>,
    pub headline: String,
    pub key_insights: Vec<String>,
    pub sentiment_commentary: String,
    pub entity_trends: Option<EntityTrendsReport>,
    pub methodology: String,
    pub config_hash: String,
    pub determinism_hash: String,
}

impl AnalyticsReport {
    /// Recomputes the hash over everything except the volatile fields.
    pub fn compute_determinism_hash(&self) -> AppResult<String> {
        let value = serde_json::to_value(self)
            .map_err(|e| AppError::internal(format!("report encode error: {e}")))?;
        determinism_hash_for_json_value(value, &VOLATILE_FIELDS)
    }
}

pub struct ReportAssembler<'a> {
    config: &'a AnalyticsConfig,
    commentary: &'a dyn CommentaryProvider,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(config: &'a AnalyticsConfig, commentary: &'a dyn CommentaryProvider) -> Self {
        Self { config, commentary }
    }

    /// Runs every stage over `records`. Either the whole report is built or
    /// an error is returned.
    pub fn assemble(
        &self,
        records: &[PeriodRecord],
        kind: PeriodKind,
        generated_at: Date,
    ) -> AppResult<AnalyticsReport> {
        let series = TimeSeriesBuilder::new(self.config).build(records, kind)?;
        let momentum = MomentumCalculator::new(self.config).calculate(&series)?;
        let velocity = VelocityDetector::new(self.config).detect(&series)?;

        let latest_record = records.iter().max_by_key(|r| r.date);
        let entity_records: &[PeriodRecord] = match kind {
            PeriodKind::Daily => records,
            PeriodKind::Weekly => latest_record.map(std::slice::from_ref).unwrap_or_default(),
        };
        let entity_trends = EntityTrendCalculator::for_kind(kind).calculate(entity_records);

        let inputs = CommentaryInputs::from_series(&series, latest_record, &self.config.commentary);
        let sentiment_commentary = generate_commentary(self.commentary, inputs.as_ref());

        let mut report = AnalyticsReport {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at,
            period_kind: kind,
            data_range_start: series.start_date,
            data_range_end: series.end_date,
            periods_analyzed: series.len(),
            previous_period: PeriodComparison::from_series(&series),
            headline: headline(&series, &momentum, kind),
            key_insights: key_insights(&series, &momentum, &velocity, kind),
            sentiment_commentary,
            entity_trends: (!entity_trends.top_entities.is_empty()).then_some(entity_trends),
            methodology: methodology(self.config),
            config_hash: self.config.config_hash()?,
            determinism_hash: String::new(),
            sentiment_timeseries: series,
            momentum,
            velocity,
        };
        report.determinism_hash = report.compute_determinism_hash()?;

        info!(
            mode = kind.as_str(),
            periods = report.periods_analyzed,
            alerts = report.velocity.total_alerts,
            "analytics report assembled"
        );
        Ok(report)
    }
}

fn methodology(config: &AnalyticsConfig) -> String {
    format!(
        "Scores use z-score normalization of engagement plus calibrated intensity weights \
         (mild {:+.2}, moderate {:+.2}, strong {:+.2}). Alerts at |z| >= {:.1}, warnings at \
         |z| >= {:.1}.",
        config.intensity_z_scores.mild,
        config.intensity_z_scores.moderate,
        config.intensity_z_scores.strong,
        config.alert_thresholds.alert,
        config.alert_thresholds.warning,
    )
}
