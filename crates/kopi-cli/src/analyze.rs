use kopi_core::date::today_utc;
use kopi_core::json::to_pretty_json_bytes;
use kopi_core::{AnalyticsConfig, AppError, AppResult};
use kopi_periods::{load_period_dir, PeriodKind};
use kopi_report::{DisabledCommentaryProvider, ReportAssembler};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn analyze_command(
    config: &AnalyticsConfig,
    mode: &str,
    data_dir: &Path,
    out: Option<PathBuf>,
    overwrite: bool,
) -> AppResult<()> {
    let kind: PeriodKind = mode.parse()?;
    if !data_dir.is_dir() {
        return Err(AppError::validation("data_dir is not a directory"));
    }
    let out_path = out.unwrap_or_else(|| data_dir.join("analytics.json"));
    if out_path.exists() && !overwrite {
        return Err(AppError::usage(format!(
            "{} already exists; use --overwrite to replace",
            out_path.display()
        )));
    }
    if out_path.exists() && out_path.is_dir() {
        return Err(AppError::validation("analytics output path is a directory"));
    }

    let records = load_period_dir(data_dir, kind)?;
    let provider = DisabledCommentaryProvider::new();
    let report = ReportAssembler::new(config, &provider).assemble(&records, kind, today_utc())?;

    let bytes = to_pretty_json_bytes(&report)?;
    fs::write(&out_path, bytes)
        .map_err(|e| AppError::internal(format!("failed to write {}: {e}", out_path.display())))?;
    info!(path = %out_path.display(), headline = %report.headline, "analytics written");
    Ok(())
}
