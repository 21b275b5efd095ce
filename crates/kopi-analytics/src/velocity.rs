//! Velocity (first difference) of each tracked series, its z-score against
//! earlier velocities, and the alerts raised for unusual moves.

use crate::model::{
    AlertSeverity, Metric, TimeSeries, TrendDirection, VelocityAlert, VelocityMetric,
    VelocityReport,
};
use crate::stats::{first_differences, mean, sample_std, z_to_percentile};
use kopi_core::config::AlertThresholds;
use kopi_core::date::format_iso_date;
use kopi_core::json::short_id;
use kopi_core::{AnalyticsConfig, AppError, AppResult};
use time::Date;
use tracing::{debug, info};

/// Highest severity whose threshold `|z|` reaches.
pub fn severity_for(z: f64, thresholds: &AlertThresholds) -> AlertSeverity {
    let magnitude = z.abs();
    if magnitude >= thresholds.alert {
        AlertSeverity::Alert
    } else if magnitude >= thresholds.warning {
        AlertSeverity::Warning
    } else if magnitude >= thresholds.notable {
        AlertSeverity::Notable
    } else {
        AlertSeverity::None
    }
}

/// Velocity statistics for one series.
///
/// Series shorter than two points yield zero velocity and no severity.
pub fn velocity_metric(metric: Metric, values: &[f64], thresholds: &AlertThresholds) -> VelocityMetric {
    let current_value = values.last().copied().unwrap_or_default();
    let velocities = first_differences(values);
    let Some(&velocity) = velocities.last() else {
        return VelocityMetric {
            metric,
            current_value,
            velocity: 0.0,
            velocity_zscore: 0.0,
            acceleration: 0.0,
            historical_mean: 0.0,
            historical_std: 0.0,
            alert_level: AlertSeverity::None,
        };
    };

    let history = if velocities.len() > 1 {
        &velocities[..velocities.len() - 1]
    } else {
        &velocities[..]
    };
    let historical_mean = mean(history);
    let historical_std = if history.len() > 1 {
        sample_std(history)
    } else {
        1.0
    };
    let velocity_zscore = if historical_std > 0.0 {
        (velocity - historical_mean) / historical_std
    } else {
        0.0
    };
    let acceleration = match velocities.as_slice() {
        [.., prev, last] => last - prev,
        _ => 0.0,
    };

    VelocityMetric {
        metric,
        current_value,
        velocity,
        velocity_zscore,
        acceleration,
        historical_mean,
        historical_std,
        alert_level: severity_for(velocity_zscore, thresholds),
    }
}

pub fn alert_description(metric: Metric, z: f64, thresholds: &AlertThresholds) -> String {
    let magnitude = if z.abs() >= thresholds.significant_z {
        "significantly"
    } else {
        "notably"
    };
    let change = if z > 0.0 { "increased" } else { "decreased" };
    format!("{} has {magnitude} {change} (z={z:.2})", metric.label())
}

pub struct VelocityDetector<'a> {
    config: &'a AnalyticsConfig,
}

impl<'a> VelocityDetector<'a> {
    pub fn new(config: &'a AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, series: &TimeSeries) -> AppResult<VelocityReport> {
        let report_date = series
            .latest()
            .map(|p| p.date)
            .ok_or_else(|| AppError::insufficient_periods(0, 1))?;
        let thresholds = &self.config.alert_thresholds;

        let metrics: Vec<VelocityMetric> = Metric::ALL
            .into_iter()
            .map(|metric| velocity_metric(metric, &series.values(metric), thresholds))
            .collect();
        for m in &metrics {
            debug!(
                metric = m.metric.as_str(),
                velocity = m.velocity,
                z = m.velocity_zscore,
                severity = m.alert_level.as_str(),
                "velocity metric"
            );
        }

        let mut alerts: Vec<VelocityAlert> = metrics
            .iter()
            .filter(|m| m.alert_level >= AlertSeverity::Warning)
            .map(|m| self.alert_for(m, report_date))
            .collect();
        // Stable sort keeps metric order within a severity.
        alerts.sort_by(|a, b| b.severity.cmp(&a.severity));

        let alert_count = alerts
            .iter()
            .filter(|a| a.severity == AlertSeverity::Alert)
            .count();
        let warning_count = alerts
            .iter()
            .filter(|a| a.severity == AlertSeverity::Warning)
            .count();
        info!(
            alerts = alert_count,
            warnings = warning_count,
            "velocity detection finished"
        );

        Ok(VelocityReport {
            report_date,
            lookback_days: self.config.velocity.lookback_days.min(series.len()),
            metrics,
            total_alerts: alerts.len(),
            alerts,
            alert_count,
            warning_count,
        })
    }

    fn alert_for(&self, metric: &VelocityMetric, report_date: Date) -> VelocityAlert {
        let z = metric.velocity_zscore;
        let thresholds = &self.config.alert_thresholds;
        VelocityAlert {
            alert_id: short_id(&format!(
                "{}:{}",
                metric.metric.as_str(),
                format_iso_date(report_date)
            )),
            triggered_at: report_date,
            severity: metric.alert_level,
            metric: metric.metric,
            category: metric.metric.category(),
            current_value: metric.velocity,
            expected_value: metric.historical_mean,
            z_score: z,
            percentile: z_to_percentile(z),
            direction: if z > 0.0 {
                TrendDirection::Rising
            } else {
                TrendDirection::Falling
            },
            description: alert_description(metric.metric, z, thresholds),
        }
    }
}
