use crate::model::{EntityPeriodData, EntityTrend, EntityTrendsReport, TrendDirection};
use kopi_periods::{PeriodKind, PeriodRecord};
use std::collections::BTreeMap;
use tracing::debug;

const RISING_RATIO: f64 = 1.2;
const FALLING_RATIO: f64 = 0.8;

/// Aggregates thematic-cluster entities across periods.
#[derive(Debug, Clone, Copy)]
pub struct EntityTrendCalculator {
    pub top_n: usize,
    /// Periods an entity must appear in before its direction can move off
    /// `stable`.
    pub min_periods_for_trend: usize,
}

impl EntityTrendCalculator {
    pub fn for_kind(kind: PeriodKind) -> Self {
        match kind {
            PeriodKind::Daily => Self {
                top_n: 10,
                min_periods_for_trend: 4,
            },
            PeriodKind::Weekly => Self {
                top_n: 15,
                min_periods_for_trend: 2,
            },
        }
    }

    pub fn calculate(&self, records: &[PeriodRecord]) -> EntityTrendsReport {
        let mut by_entity: BTreeMap<String, Vec<EntityPeriodData>> = BTreeMap::new();
        for record in records {
            for (entity, data) in period_entities(record) {
                by_entity.entry(entity).or_default().push(data);
            }
        }

        let mut trends: Vec<EntityTrend> = by_entity
            .into_iter()
            .map(|(entity, mut periods)| {
                periods.sort_by(|a, b| a.date.cmp(&b.date));
                self.trend_for(entity, periods)
            })
            .collect();
        trends.sort_by(|a, b| {
            b.total_engagement
                .cmp(&a.total_engagement)
                .then_with(|| a.entity.cmp(&b.entity))
        });
        debug!(entities = trends.len(), top_n = self.top_n, "entity trends aggregated");
        trends.truncate(self.top_n);

        EntityTrendsReport {
            periods_analyzed: records.len(),
            top_entities: trends,
        }
    }

    fn trend_for(&self, entity: String, periods: Vec<EntityPeriodData>) -> EntityTrend {
        let mut category_counts: Vec<(String, usize)> = Vec::new();
        for category in periods.iter().flat_map(|p| p.categories.iter()) {
            match category_counts.iter_mut().find(|(name, _)| name == category) {
                Some((_, count)) => *count += 1,
                None => category_counts.push((category.clone(), 1)),
            }
        }
        let mut dominant: Option<&(String, usize)> = None;
        for entry in &category_counts {
            if dominant.map_or(true, |best| entry.1 > best.1) {
                dominant = Some(entry);
            }
        }

        let trend_direction = if periods.len() >= self.min_periods_for_trend {
            let mid = periods.len() / 2;
            let first: i64 = periods[..mid].iter().map(|p| p.engagement).sum();
            let second: i64 = periods[mid..].iter().map(|p| p.engagement).sum();
            half_trend(first, second)
        } else {
            TrendDirection::Stable
        };

        EntityTrend {
            total_engagement: periods.iter().map(|p| p.engagement).sum(),
            total_mentions: periods.iter().map(|p| p.mention_count).sum(),
            periods_present: periods.len(),
            dominant_category: dominant
                .map(|(name, _)| name.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            trend_direction,
            entity,
            period_data: periods,
        }
    }
}

fn half_trend(first: i64, second: i64) -> TrendDirection {
    let (first, second) = (first as f64, second as f64);
    if second > first * RISING_RATIO {
        TrendDirection::Rising
    } else if second < first * FALLING_RATIO {
        TrendDirection::Falling
    } else {
        TrendDirection::Stable
    }
}

fn normalize_entity(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Per-entity totals for one period; an entity named by several clusters
/// is counted once per cluster.
fn period_entities(record: &PeriodRecord) -> BTreeMap<String, EntityPeriodData> {
    let mut entities: BTreeMap<String, EntityPeriodData> = BTreeMap::new();
    for cluster in &record.clusters {
        for raw in &cluster.entities {
            let name = normalize_entity(raw);
            if name.is_empty() {
                continue;
            }
            let entry = entities.entry(name).or_insert_with(|| EntityPeriodData {
                date: record.date,
                engagement: 0,
                mention_count: 0,
                categories: Vec::new(),
            });
            entry.engagement += cluster.engagement_score;
            entry.mention_count += 1;
            if let Some(category) = &cluster.dominant_emotion {
                if !entry.categories.contains(category) {
                    entry.categories.push(category.clone());
                }
            }
        }
    }
    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use kopi_periods::{ByCategory, ThematicCluster};
    use time::{Date, Duration};
    use time::macros::date;

    fn record(day: Date, clusters: Vec<ThematicCluster>) -> PeriodRecord {
        let mut record = PeriodRecord::new(day.to_string(), day, ByCategory::default());
        record.clusters = clusters;
        record
    }

    fn cluster(entities: &[&str], engagement: i64, emotion: &str) -> ThematicCluster {
        ThematicCluster {
            entities: entities.iter().map(|e| e.to_string()).collect(),
            engagement_score: engagement,
            dominant_emotion: Some(emotion.to_string()),
        }
    }

    #[test]
    fn names_are_normalized_and_merged() {
        let day = date!(2024 - 05 - 01);
        let records = vec![record(
            day,
            vec![
                cluster(&[" hdb ", "COE"], 10, "fears"),
                cluster(&["HDB"], 5, "frustrations"),
            ],
        )];
        let report = EntityTrendCalculator::for_kind(PeriodKind::Daily).calculate(&records);
        let hdb = &report.top_entities[0];
        assert_eq!(hdb.entity, "HDB");
        assert_eq!(hdb.total_engagement, 15);
        assert_eq!(hdb.total_mentions, 2);
        assert_eq!(hdb.period_data[0].categories, vec!["fears", "frustrations"]);
        assert_eq!(hdb.dominant_category, "fears");
        assert_eq!(hdb.trend_direction, TrendDirection::Stable);
    }

    #[test]
    fn rising_when_second_half_outweighs_first() {
        let start = date!(2024 - 05 - 01);
        let records: Vec<PeriodRecord> = [10, 10, 30, 30]
            .iter()
            .enumerate()
            .map(|(i, eng)| {
                record(
                    start + Duration::days(i as i64),
                    vec![cluster(&["MRT"], *eng, "frustrations")],
                )
            })
            .collect();
        let report = EntityTrendCalculator::for_kind(PeriodKind::Daily).calculate(&records);
        assert_eq!(report.periods_analyzed, 4);
        assert_eq!(report.top_entities[0].trend_direction, TrendDirection::Rising);
        assert_eq!(report.top_entities[0].periods_present, 4);
    }

    #[test]
    fn ranking_breaks_ties_by_name_and_truncates() {
        let day = date!(2024 - 05 - 01);
        let names: Vec<String> = (0..12).map(|i| format!("E{i:02}")).collect();
        let clusters = names
            .iter()
            .map(|n| cluster(&[n.as_str()], 5, "optimism"))
            .collect();
        let report =
            EntityTrendCalculator::for_kind(PeriodKind::Daily).calculate(&[record(day, clusters)]);
        assert_eq!(report.top_entities.len(), 10);
        assert_eq!(report.top_entities[0].entity, "E00");
        assert_eq!(report.top_entities[9].entity, "E09");
    }

    #[test]
    fn half_trend_bands() {
        assert_eq!(half_trend(100, 121), TrendDirection::Rising);
        assert_eq!(half_trend(100, 120), TrendDirection::Stable);
        assert_eq!(half_trend(100, 79), TrendDirection::Falling);
    }
}
