use crate::report::AnalyticsReport;
use kopi_analytics::AlertSeverity;
use kopi_core::date::format_iso_date;
use kopi_periods::Category;

const MAX_ENTITIES: usize = 10;

pub fn render_markdown(report: &AnalyticsReport) -> String {
    let mut out = String::new();
    let series = &report.sentiment_timeseries;

    out.push_str("# FFO Sentiment Analytics\n\n");
    out.push_str(&format!("**{}**\n\n", report.headline));
    out.push_str(&format!(
        "- range: {} to {} ({} {} periods)\n",
        format_iso_date(report.data_range_start),
        format_iso_date(report.data_range_end),
        report.periods_analyzed,
        report.period_kind.as_str()
    ));
    out.push_str(&format!(
        "- trend: {} (slope {:+.2}, r² {:.2})\n",
        series.trend.direction, series.trend.slope, series.trend.r_squared
    ));
    out.push_str(&format!("- config_hash: `{}`\n\n", report.config_hash));

    if !report.key_insights.is_empty() {
        out.push_str("## Key Insights\n\n");
        for insight in &report.key_insights {
            out.push_str(&format!("- {insight}\n"));
        }
        out.push('\n');
    }

    if !report.sentiment_commentary.is_empty() {
        out.push_str("## Commentary\n\n");
        out.push_str(&format!("{}\n\n", report.sentiment_commentary.trim()));
    }

    out.push_str("## Momentum\n\n");
    out.push_str("| category | z-sum | roc 1 | roc 3 | roc 7 | trend |\n");
    out.push_str("|---|---|---|---|---|---|\n");
    for (category, m) in report.momentum.categories.iter() {
        out.push_str(&format!(
            "| {} | {:+.2} | {:+.1}% | {:+.1}% | {:+.1}% | {} ({}) |\n",
            category.title(),
            m.current_zscore_sum,
            m.roc_1d,
            m.roc_3d,
            m.roc_7d,
            m.trend,
            m.trend_strength.as_str()
        ));
    }
    out.push_str(&format!(
        "\nFastest rising: {}. Fastest falling: {}.\n\n",
        report.momentum.fastest_rising.title(),
        report.momentum.fastest_falling.title()
    ));

    out.push_str("## Velocity Alerts\n\n");
    if report.velocity.alerts.is_empty() {
        out.push_str("No alerts.\n\n");
    } else {
        for alert in &report.velocity.alerts {
            out.push_str(&format!(
                "- [{}] {} (percentile {:.1}, id `{}`)\n",
                severity_label(alert.severity),
                alert.description,
                alert.percentile,
                alert.alert_id
            ));
        }
        out.push('\n');
    }

    if let Some(previous) = &report.previous_period {
        out.push_str(&format!(
            "## Change Since {}\n\n",
            previous.previous_period_id
        ));
        for category in Category::ALL {
            let delta = previous.categories.get(category);
            out.push_str(&format!(
                "- {}: {:+.2} ({:+.2} -> {:+.2})\n",
                category.title(),
                delta.delta,
                delta.previous,
                delta.current
            ));
        }
        out.push_str(&format!("- Composite: {:+.2}\n\n", previous.composite_delta));
    }

    if let Some(entities) = &report.entity_trends {
        out.push_str("## Trending Entities\n\n");
        for (idx, entity) in entities.top_entities.iter().take(MAX_ENTITIES).enumerate() {
            out.push_str(&format!(
                "{}. **{}** ({} engagement, {} mentions, {}, {})\n",
                idx + 1,
                entity.entity,
                entity.total_engagement,
                entity.total_mentions,
                entity.dominant_category,
                entity.trend_direction
            ));
        }
        out.push('\n');
    }

    out.push_str("## Methodology\n\n");
    out.push_str(&format!("{}\n", report.methodology));
    out
}

fn severity_label(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Alert => "ALERT",
        AlertSeverity::Warning => "WARNING",
        AlertSeverity::Notable => "notable",
        AlertSeverity::None => "none",
    }
}
