use kopi_analytics::{
    AlertSeverity, Metric, MomentumCalculator, PeriodScore, TimeSeriesBuilder, TrendDirection,
    VelocityDetector,
};
use kopi_core::{AnalyticsConfig, ErrorKind};
use kopi_periods::{ByCategory, Category, Intensity, PeriodKind, PeriodRecord, Quote};
use time::macros::date;
use time::{Date, Duration};

const START: Date = date!(2024 - 01 - 01);

fn score(day: usize, fears: f64, frustrations: f64, optimism: f64) -> PeriodScore {
    let negativity = fears + frustrations;
    PeriodScore {
        period_id: format!("d{day}"),
        date: START + Duration::days(day as i64),
        counts: ByCategory {
            fears: 1,
            frustrations: 1,
            optimism: 1,
        },
        total_quotes: 3,
        zscore_sums: ByCategory {
            fears,
            frustrations,
            optimism,
        },
        negativity_score: negativity,
        positivity_score: optimism,
        composite_score: optimism - negativity,
        ema_score: None,
        ema_negativity: None,
        ema_positivity: None,
        total_engagement: 30,
        avg_engagement: 10.0,
    }
}

fn moderate_record(day: usize, fears: usize, optimism: usize) -> PeriodRecord {
    let date = START + Duration::days(day as i64);
    PeriodRecord::new(
        date.to_string(),
        date,
        ByCategory {
            fears: vec![Quote::new(5, Intensity::Moderate); fears],
            frustrations: Vec::new(),
            optimism: vec![Quote::new(5, Intensity::Moderate); optimism],
        },
    )
}

#[test]
fn fears_spike_raises_a_single_fears_alert() {
    let config = AnalyticsConfig::default();
    let series = TimeSeriesBuilder::new(&config)
        .summarize(vec![
            score(0, 0.0, 0.0, 0.0),
            score(1, 0.0, 0.0, 0.0),
            score(2, 10.0, 0.0, 0.0),
        ])
        .unwrap();
    let report = VelocityDetector::new(&config).detect(&series).unwrap();

    let fears = report.metric(Metric::FearsZscoreSum).unwrap();
    assert_eq!(fears.velocity, 10.0);
    assert_eq!(fears.velocity_zscore, 10.0);
    assert_eq!(fears.alert_level, AlertSeverity::Alert);

    let fears_alerts: Vec<_> = report
        .alerts
        .iter()
        .filter(|a| a.category == Some(Category::Fears))
        .collect();
    assert_eq!(fears_alerts.len(), 1);
    let alert = fears_alerts[0];
    assert_eq!(alert.direction, TrendDirection::Rising);
    assert_eq!(alert.severity, AlertSeverity::Alert);
    assert_eq!(alert.description, "Fears has significantly increased (z=10.00)");
    assert!(alert.percentile > 99.99);
    assert_eq!(alert.alert_id.len(), 8);

    let frustrations = report.metric(Metric::FrustrationsZscoreSum).unwrap();
    assert_eq!(frustrations.alert_level, AlertSeverity::None);
    assert_eq!(report.report_date, date!(2024 - 01 - 03));
    assert_eq!(report.lookback_days, 3);
}

#[test]
fn alerts_are_sorted_most_severe_first() {
    let config = AnalyticsConfig::default();
    let series = TimeSeriesBuilder::new(&config)
        .summarize(vec![
            score(0, 0.0, 0.0, 0.0),
            score(1, 0.0, 0.0, 0.0),
            score(2, 0.0, 1.7, 0.0),
        ])
        .unwrap();
    let report = VelocityDetector::new(&config).detect(&series).unwrap();

    // Frustrations z=1.7 is a warning; composite z=-1.7 as well.
    assert_eq!(report.warning_count, 2);
    assert_eq!(report.alert_count, 0);

    let series = TimeSeriesBuilder::new(&config)
        .summarize(vec![
            score(0, 0.0, 0.0, 0.0),
            score(1, 0.0, 0.0, 0.0),
            score(2, 0.0, 1.7, 0.0),
            score(3, 0.0, 1.7, 5.0),
        ])
        .unwrap();
    let report = VelocityDetector::new(&config).detect(&series).unwrap();
    let severities: Vec<AlertSeverity> = report.alerts.iter().map(|a| a.severity).collect();
    assert!(severities.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(report.total_alerts, report.alerts.len());
    assert!(report
        .alerts
        .iter()
        .all(|a| a.severity >= AlertSeverity::Warning));
}

#[test]
fn composite_and_ema_follow_their_definitions() {
    let config = AnalyticsConfig::default();
    let records: Vec<PeriodRecord> = (0..5).map(|d| moderate_record(d, 1, 2 * d + 1)).collect();
    let series = TimeSeriesBuilder::new(&config)
        .build(&records, PeriodKind::Daily)
        .unwrap();

    for point in &series.data_points {
        let sums = point.zscore_sums;
        assert!((point.negativity_score - (sums.fears + sums.frustrations)).abs() < 1e-9);
        assert!((point.composite_score - (point.positivity_score - point.negativity_score)).abs() < 1e-9);
    }
    assert_eq!(series.data_points[0].ema_score, None);
    assert_eq!(series.data_points[1].ema_score, None);
    let seed: f64 = series.data_points[..3]
        .iter()
        .map(|p| p.composite_score)
        .sum::<f64>()
        / 3.0;
    assert!((series.data_points[2].ema_score.unwrap() - seed).abs() < 1e-9);

    // Optimism grows every day, so the composite rises.
    assert!(series.trend.slope > 0.0);
    assert!((0.0..=1.0).contains(&series.trend.r_squared));
    assert_eq!(series.trend.direction, TrendDirection::Rising);
}

#[test]
fn constant_composite_has_flat_trend() {
    let config = AnalyticsConfig::default();
    let records: Vec<PeriodRecord> = (0..4).map(|d| moderate_record(d, 2, 2)).collect();
    let series = TimeSeriesBuilder::new(&config)
        .build(&records, PeriodKind::Daily)
        .unwrap();
    assert_eq!(series.trend.slope, 0.0);
    assert_eq!(series.trend.r_squared, 1.0);
    assert_eq!(series.trend.direction, TrendDirection::Stable);
    assert_eq!(series.std_dev, 0.0);
}

#[test]
fn too_few_periods_names_found_and_required() {
    let config = AnalyticsConfig::default();
    let records = vec![moderate_record(0, 1, 1), moderate_record(1, 1, 1)];
    let err = TimeSeriesBuilder::new(&config)
        .build(&records, PeriodKind::Daily)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientData);
    assert!(err.message().contains("found 2"));
    assert!(err.message().contains("at least 3"));
}

#[test]
fn unsorted_records_are_ordered_by_date() {
    let config = AnalyticsConfig::default();
    let records = vec![
        moderate_record(2, 1, 1),
        moderate_record(0, 1, 1),
        moderate_record(1, 1, 1),
    ];
    let series = TimeSeriesBuilder::new(&config)
        .build(&records, PeriodKind::Daily)
        .unwrap();
    assert_eq!(series.start_date, START);
    assert_eq!(series.end_date, date!(2024 - 01 - 03));
}

#[test]
fn momentum_ties_resolve_in_category_order() {
    let config = AnalyticsConfig::default();
    let series = TimeSeriesBuilder::new(&config)
        .summarize(vec![
            score(0, 1.0, 1.0, 1.0),
            score(1, 1.0, 1.0, 1.0),
            score(2, 1.0, 1.0, 1.0),
        ])
        .unwrap();
    let report = MomentumCalculator::new(&config).calculate(&series).unwrap();
    assert_eq!(report.fastest_rising, Category::Fears);
    assert_eq!(report.fastest_falling, Category::Fears);
    assert_eq!(report.category(Category::Optimism).trend, TrendDirection::Stable);

    let series = TimeSeriesBuilder::new(&config)
        .summarize(vec![
            score(0, 2.0, 1.0, 4.0),
            score(1, 2.0, 1.0, 4.0),
            score(2, 1.0, 3.0, 2.0),
        ])
        .unwrap();
    let report = MomentumCalculator::new(&config).calculate(&series).unwrap();
    assert_eq!(report.fastest_rising, Category::Frustrations);
    // Fears and optimism both fell 50%; fears comes first.
    assert_eq!(report.fastest_falling, Category::Fears);
    let frustrations = report.category(Category::Frustrations);
    assert_eq!(frustrations.roc_7d, 200.0);
    assert_eq!(frustrations.trend, TrendDirection::Rising);
    assert_eq!(report.lookback_days, 3);
}
