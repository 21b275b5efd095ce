use crate::record::{ByCategory, Intensity, PeriodKind, PeriodRecord, Quote, ThematicCluster};
use kopi_core::date::parse_iso_date;
use kopi_core::{AppError, AppResult};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DAILY_STEM: &str = r"^\d{4}-\d{2}-\d{2}$";
const WEEKLY_STEM: &str = r"^\d{4}-W\d{2}$";

pub fn load_period_dir(dir: &Path, kind: PeriodKind) -> AppResult<Vec<PeriodRecord>> {
    match kind {
        PeriodKind::Daily => load_daily_dir(dir),
        PeriodKind::Weekly => load_weekly_dir(dir),
    }
}

/// Loads every `YYYY-MM-DD.json` report in `dir`, ascending by date.
pub fn load_daily_dir(dir: &Path) -> AppResult<Vec<PeriodRecord>> {
    let mut records = Vec::new();
    for path in report_files(dir, DAILY_STEM)? {
        let raw: RawDailyReport = read_report(&path)?;
        let stem = file_stem(&path);
        let period_id = raw.date_id.clone().unwrap_or_else(|| stem.clone());
        let date = parse_iso_date(&period_id).map_err(|e| {
            AppError::validation(format!("{}: {}", path.display(), e.message()))
        })?;
        let quotes = raw.all_quotes.into_quotes(&path)?;
        records.push(PeriodRecord {
            period_id,
            date,
            quotes,
            clusters: raw.thematic_clusters.into_iter().map(Into::into).collect(),
        });
    }

    records.sort_by(|a, b| a.date.cmp(&b.date));
    reject_duplicate_dates(&records)?;
    info!(dir = %dir.display(), periods = records.len(), "loaded daily reports");
    Ok(records)
}

/// Loads every `YYYY-Www.json` report in `dir`, skipping empty weeks.
///
/// Weeks are ordered by `week_start` and dated by `week_end`.
pub fn load_weekly_dir(dir: &Path) -> AppResult<Vec<PeriodRecord>> {
    let mut weeks = Vec::new();
    for path in report_files(dir, WEEKLY_STEM)? {
        let raw: RawWeeklyReport = read_report(&path)?;
        let period_id = raw.week_id.clone().unwrap_or_else(|| file_stem(&path));
        let quotes = raw.all_quotes.into_quotes(&path)?;
        let total: usize = quotes.iter().map(|(_, q)| q.len()).sum();
        if total == 0 {
            warn!(week = %period_id, "skipping empty weekly report");
            continue;
        }

        let parse = |text: &str| {
            parse_iso_date(text).map_err(|e| {
                AppError::validation(format!("{}: {}", path.display(), e.message()))
            })
        };
        let start = raw.week_start.as_deref().map(parse).transpose()?;
        let end = raw.week_end.as_deref().map(parse).transpose()?;
        let date = end.or(start).ok_or_else(|| {
            AppError::validation(format!(
                "{}: weekly report needs week_end or week_start",
                path.display()
            ))
        })?;
        let record = PeriodRecord {
            period_id,
            date,
            quotes,
            clusters: raw.thematic_clusters.into_iter().map(Into::into).collect(),
        };
        weeks.push((start.unwrap_or(date), record));
    }

    weeks.sort_by(|a, b| a.0.cmp(&b.0));
    let records: Vec<PeriodRecord> = weeks.into_iter().map(|(_, record)| record).collect();
    reject_duplicate_dates(&records)?;
    info!(dir = %dir.display(), periods = records.len(), "loaded weekly reports");
    Ok(records)
}

fn report_files(dir: &Path, stem_pattern: &str) -> AppResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AppError::validation(format!(
            "data dir {} is not a directory",
            dir.display()
        )));
    }
    let stem_re = Regex::new(stem_pattern)
        .map_err(|e| AppError::internal(format!("report name pattern error: {e}")))?;
    let entries = fs::read_dir(dir)
        .map_err(|e| AppError::validation(format!("failed to list {}: {e}", dir.display())))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| AppError::validation(format!("failed to list {}: {e}", dir.display())))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        if !stem_re.is_match(&file_stem(&path)) {
            debug!(path = %path.display(), "ignoring file with non-period name");
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

fn read_report<T: for<'de> Deserialize<'de>>(path: &Path) -> AppResult<T> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::validation(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| AppError::validation(format!("{} parse error: {e}", path.display())))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

fn reject_duplicate_dates(records: &[PeriodRecord]) -> AppResult<()> {
    for pair in records.windows(2) {
        if pair[0].date == pair[1].date {
            return Err(AppError::validation(format!(
                "periods {} and {} share the same date",
                pair[0].period_id, pair[1].period_id
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RawDailyReport {
    date_id: Option<String>,
    #[serde(default)]
    all_quotes: RawAllQuotes,
    #[serde(default)]
    thematic_clusters: Vec<RawCluster>,
}

#[derive(Debug, Deserialize)]
struct RawWeeklyReport {
    week_id: Option<String>,
    week_start: Option<String>,
    week_end: Option<String>,
    #[serde(default)]
    all_quotes: RawAllQuotes,
    #[serde(default)]
    thematic_clusters: Vec<RawCluster>,
}

#[derive(Debug, Deserialize, Default)]
struct RawAllQuotes {
    #[serde(default)]
    fears: Vec<RawQuote>,
    #[serde(default)]
    frustrations: Vec<RawQuote>,
    #[serde(default)]
    optimism: Vec<RawQuote>,
}

impl RawAllQuotes {
    fn into_quotes(self, path: &Path) -> AppResult<ByCategory<Vec<Quote>>> {
        Ok(ByCategory {
            fears: convert_quotes(self.fears, path)?,
            frustrations: convert_quotes(self.frustrations, path)?,
            optimism: convert_quotes(self.optimism, path)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawQuote {
    #[serde(default, alias = "engagement")]
    comment_score: i64,
    intensity: Option<String>,
}

fn convert_quotes(raw: Vec<RawQuote>, path: &Path) -> AppResult<Vec<Quote>> {
    raw.into_iter()
        .map(|quote| {
            let intensity = match quote.intensity.as_deref() {
                Some(label) => label.parse::<Intensity>().map_err(|e| {
                    AppError::validation(format!("{}: {}", path.display(), e.message()))
                })?,
                None => Intensity::default(),
            };
            Ok(Quote::new(quote.comment_score, intensity))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawCluster {
    #[serde(default)]
    entities: Vec<String>,
    #[serde(default)]
    engagement_score: i64,
    dominant_emotion: Option<String>,
}

impl From<RawCluster> for ThematicCluster {
    fn from(raw: RawCluster) -> Self {
        ThematicCluster {
            entities: raw.entities,
            engagement_score: raw.engagement_score,
            dominant_emotion: raw.dominant_emotion.filter(|e| !e.is_empty()),
        }
    }
}
