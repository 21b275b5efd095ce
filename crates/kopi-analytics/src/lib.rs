pub mod calibrate;
pub mod entities;
pub mod model;
pub mod momentum;
pub mod score;
pub mod stats;
pub mod timeseries;
pub mod velocity;

pub use calibrate::{calibrate, compute_z_scores, Calibration, IntensityCounts};
pub use entities::EntityTrendCalculator;
pub use model::{
    AlertSeverity, CategoryMomentum, EntityPeriodData, EntityTrend, EntityTrendsReport, Metric,
    MomentumReport, PeriodScore, TimeSeries, TrendDirection, TrendFit, TrendStrength,
    VelocityAlert, VelocityMetric, VelocityReport,
};
pub use momentum::MomentumCalculator;
pub use score::{EngagementStats, ScoreBuilder};
pub use timeseries::TimeSeriesBuilder;
pub use velocity::VelocityDetector;
