use kopi_periods::{ByCategory, Category};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

impl TrendDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendDirection::Rising => "rising",
            TrendDirection::Falling => "falling",
            TrendDirection::Stable => "stable",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStrength {
    Weak,
    Moderate,
    Strong,
}

impl TrendStrength {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendStrength::Weak => "weak",
            TrendStrength::Moderate => "moderate",
            TrendStrength::Strong => "strong",
        }
    }
}

/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    None,
    Notable,
    Warning,
    Alert,
}

impl AlertSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertSeverity::None => "none",
            AlertSeverity::Notable => "notable",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Alert => "alert",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores for a single period (day or week).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodScore {
    pub period_id: String,
    #[serde(with = "kopi_core::date::iso")]
    pub date: Date,
    pub counts: ByCategory<usize>,
    pub total_quotes: usize,
    /// Sum of `engagement_z + intensity_z` over each category's quotes.
    pub zscore_sums: ByCategory<f64>,
    pub negativity_score: f64,
    pub positivity_score: f64,
    pub composite_score: f64,
    pub ema_score: Option<f64>,
    pub ema_negativity: Option<f64>,
    pub ema_positivity: Option<f64>,
    pub total_engagement: i64,
    pub avg_engagement: f64,
}

impl PeriodScore {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::CompositeScore => self.composite_score,
            Metric::FearsZscoreSum => self.zscore_sums.fears,
            Metric::FrustrationsZscoreSum => self.zscore_sums.frustrations,
            Metric::OptimismZscoreSum => self.zscore_sums.optimism,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendFit {
    pub direction: TrendDirection,
    /// Composite points per period.
    pub slope: f64,
    pub r_squared: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    #[serde(with = "kopi_core::date::iso")]
    pub start_date: Date,
    #[serde(with = "kopi_core::date::iso")]
    pub end_date: Date,
    pub data_points: Vec<PeriodScore>,
    pub mean_score: f64,
    pub std_dev: f64,
    pub population_std_dev: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub trend: TrendFit,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.data_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_points.is_empty()
    }

    pub fn latest(&self) -> Option<&PeriodScore> {
        self.data_points.last()
    }

    pub fn values(&self, metric: Metric) -> Vec<f64> {
        self.data_points.iter().map(|p| p.value(metric)).collect()
    }

    pub fn category_values(&self, category: Category) -> Vec<f64> {
        self.values(Metric::for_category(category))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMomentum {
    pub category: Category,
    pub current_count: usize,
    pub current_zscore_sum: f64,
    pub roc_1d: f64,
    pub roc_3d: f64,
    pub roc_7d: f64,
    pub ema_momentum: f64,
    pub trend: TrendDirection,
    pub trend_strength: TrendStrength,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumReport {
    #[serde(with = "kopi_core::date::iso")]
    pub report_date: Date,
    pub lookback_days: usize,
    pub categories: ByCategory<CategoryMomentum>,
    pub fastest_rising: Category,
    pub fastest_falling: Category,
}

impl MomentumReport {
    pub fn category(&self, category: Category) -> &CategoryMomentum {
        self.categories.get(category)
    }
}

/// Series tracked by the velocity detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    CompositeScore,
    FearsZscoreSum,
    FrustrationsZscoreSum,
    OptimismZscoreSum,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::CompositeScore,
        Metric::FearsZscoreSum,
        Metric::FrustrationsZscoreSum,
        Metric::OptimismZscoreSum,
    ];

    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Fears => Metric::FearsZscoreSum,
            Category::Frustrations => Metric::FrustrationsZscoreSum,
            Category::Optimism => Metric::OptimismZscoreSum,
        }
    }

    pub fn category(self) -> Option<Category> {
        match self {
            Metric::CompositeScore => None,
            Metric::FearsZscoreSum => Some(Category::Fears),
            Metric::FrustrationsZscoreSum => Some(Category::Frustrations),
            Metric::OptimismZscoreSum => Some(Category::Optimism),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::CompositeScore => "composite_score",
            Metric::FearsZscoreSum => "fears_zscore_sum",
            Metric::FrustrationsZscoreSum => "frustrations_zscore_sum",
            Metric::OptimismZscoreSum => "optimism_zscore_sum",
        }
    }

    /// Subject used in alert text.
    pub fn label(self) -> &'static str {
        match self.category() {
            Some(category) => category.title(),
            None => "Overall sentiment",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityMetric {
    pub metric: Metric,
    pub current_value: f64,
    pub velocity: f64,
    pub velocity_zscore: f64,
    pub acceleration: f64,
    pub historical_mean: f64,
    pub historical_std: f64,
    pub alert_level: AlertSeverity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityAlert {
    pub alert_id: String,
    #[serde(with = "kopi_core::date::iso")]
    pub triggered_at: Date,
    pub severity: AlertSeverity,
    pub metric: Metric,
    pub category: Option<Category>,
    /// The velocity that triggered the alert.
    pub current_value: f64,
    /// Historical mean velocity.
    pub expected_value: f64,
    pub z_score: f64,
    pub percentile: f64,
    pub direction: TrendDirection,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityReport {
    #[serde(with = "kopi_core::date::iso")]
    pub report_date: Date,
    pub lookback_days: usize,
    pub metrics: Vec<VelocityMetric>,
    /// Most severe first.
    pub alerts: Vec<VelocityAlert>,
    pub total_alerts: usize,
    pub alert_count: usize,
    pub warning_count: usize,
}

impl VelocityReport {
    pub fn metric(&self, metric: Metric) -> Option<&VelocityMetric> {
        self.metrics.iter().find(|m| m.metric == metric)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPeriodData {
    #[serde(with = "kopi_core::date::iso")]
    pub date: Date,
    pub engagement: i64,
    pub mention_count: usize,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTrend {
    pub entity: String,
    pub total_engagement: i64,
    pub total_mentions: usize,
    pub periods_present: usize,
    pub period_data: Vec<EntityPeriodData>,
    pub dominant_category: String,
    pub trend_direction: TrendDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTrendsReport {
    pub periods_analyzed: usize,
    pub top_entities: Vec<EntityTrend>,
}
