use kopi_analytics::{MomentumReport, TimeSeries, TrendDirection, VelocityReport};
use kopi_periods::{ByCategory, Category, PeriodKind};

/// Points back used for the daily week-over-week headline change.
const WEEK_OFFSET: usize = 7;
/// Minimum |change| in percent before the headline quotes a number.
const HEADLINE_CHANGE_PCT: f64 = 5.0;

/// Category with the largest absolute z-score sum; earlier categories win ties.
pub fn dominant_category(sums: &ByCategory<f64>) -> Category {
    let mut best = Category::Fears;
    for (category, value) in sums.iter() {
        if value.abs() > sums.get(best).abs() {
            best = category;
        }
    }
    best
}

pub fn headline(series: &TimeSeries, momentum: &MomentumReport, kind: PeriodKind) -> String {
    let Some(latest) = series.latest() else {
        return String::new();
    };
    let rising = momentum.fastest_rising;
    let falling = momentum.fastest_falling;
    let score = latest.composite_score;

    match kind {
        PeriodKind::Daily => {
            let change = week_over_week_pct(series);
            match series.trend.direction {
                TrendDirection::Rising if change.abs() > HEADLINE_CHANGE_PCT => {
                    format!("Sentiment up {:.0}% this week, driven by {rising}", change.abs())
                }
                TrendDirection::Rising => format!("Positive momentum building, led by {rising}"),
                TrendDirection::Falling if change.abs() > HEADLINE_CHANGE_PCT => {
                    format!("Sentiment down {:.0}% this week, {falling} declining", change.abs())
                }
                TrendDirection::Falling => format!("Negative trend emerging in {falling}"),
                TrendDirection::Stable if score > 0.0 => {
                    format!("Stable positive sentiment (score: {score:+.1})")
                }
                TrendDirection::Stable if score < 0.0 => {
                    format!("Stable negative sentiment (score: {score:+.1})")
                }
                TrendDirection::Stable => {
                    "Neutral sentiment: positive and negative balanced".to_string()
                }
            }
        }
        PeriodKind::Weekly => match series.trend.direction {
            TrendDirection::Rising => format!("Weekly sentiment trending up, driven by {rising}"),
            TrendDirection::Falling => format!("Weekly sentiment declining, {falling} falling"),
            TrendDirection::Stable if score > 0.0 => {
                format!("Stable positive sentiment this week (score: {score:+.1})")
            }
            TrendDirection::Stable if score < 0.0 => {
                format!("Stable negative sentiment this week (score: {score:+.1})")
            }
            TrendDirection::Stable => {
                "Neutral weekly sentiment: positive and negative balanced".to_string()
            }
        },
    }
}

/// Percent change of the composite against the seventh-from-last point,
/// or 0 when the series is shorter or that point is exactly 0.
fn week_over_week_pct(series: &TimeSeries) -> f64 {
    let points = &series.data_points;
    if points.len() < WEEK_OFFSET {
        return 0.0;
    }
    let past = points[points.len() - WEEK_OFFSET].composite_score;
    let current = points[points.len() - 1].composite_score;
    if past == 0.0 {
        0.0
    } else {
        (current - past) / past.abs() * 100.0
    }
}

pub fn key_insights(
    series: &TimeSeries,
    momentum: &MomentumReport,
    velocity: &VelocityReport,
    kind: PeriodKind,
) -> Vec<String> {
    let Some(latest) = series.latest() else {
        return Vec::new();
    };
    let mut insights = Vec::new();

    let dominant = dominant_category(&latest.zscore_sums);
    let scope = match kind {
        PeriodKind::Daily => "",
        PeriodKind::Weekly => " this week",
    };
    insights.push(format!(
        "{} dominates{scope} with {} quotes (score: {:+.1})",
        dominant.title(),
        latest.counts.get(dominant),
        latest.zscore_sums.get(dominant)
    ));

    if kind == PeriodKind::Weekly {
        if let [.., previous, current] = series.data_points.as_slice() {
            let change = current.composite_score - previous.composite_score;
            let direction = if change > 0.0 { "up" } else { "down" };
            insights.push(format!(
                "Overall sentiment {direction} {:.1} points from last week",
                change.abs()
            ));
        }
    }

    let fastest = momentum.category(momentum.fastest_rising);
    let direction = if fastest.roc_7d > 0.0 { "up" } else { "down" };
    insights.push(match kind {
        PeriodKind::Daily => format!(
            "{} trending {direction} {:.0}% over 7 days ({} momentum)",
            fastest.category.title(),
            fastest.roc_7d.abs(),
            fastest.trend_strength.as_str()
        ),
        PeriodKind::Weekly => format!(
            "{} momentum {direction} {:.0}% ({} trend)",
            fastest.category.title(),
            fastest.roc_7d.abs(),
            fastest.trend_strength.as_str()
        ),
    });

    if velocity.alert_count > 0 {
        if let Some(alert) = velocity.alerts.first() {
            insights.push(format!("Alert: {}", alert.description));
        }
    } else if velocity.warning_count > 0 && kind == PeriodKind::Daily {
        insights.push(format!(
            "{} warning(s) detected in velocity metrics",
            velocity.warning_count
        ));
    }

    if kind == PeriodKind::Daily {
        let engagement: Vec<f64> = series.data_points.iter().map(|p| p.avg_engagement).collect();
        let average = engagement.iter().sum::<f64>() / engagement.len() as f64;
        let last = latest.avg_engagement;
        let diff_pct = if average > 0.0 {
            (last - average) / average * 100.0
        } else {
            0.0
        };
        let side = if diff_pct > 0.0 { "above" } else { "below" };
        insights.push(format!(
            "Engagement {:.0}% {side} average ({last:.1} vs {average:.1})",
            diff_pct.abs()
        ));
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_uses_absolute_value_and_category_order() {
        let sums = ByCategory {
            fears: 2.0,
            frustrations: -3.0,
            optimism: 1.0,
        };
        assert_eq!(dominant_category(&sums), Category::Frustrations);
        let tied = ByCategory {
            fears: -2.0,
            frustrations: 2.0,
            optimism: 0.0,
        };
        assert_eq!(dominant_category(&tied), Category::Fears);
    }
}
