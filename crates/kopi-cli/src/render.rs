use kopi_core::{AppError, AppResult};
use kopi_report::{render_markdown, AnalyticsReport};
use std::fs;
use std::path::{Path, PathBuf};

pub fn render_command(report_path: &Path, out: Option<PathBuf>, overwrite: bool) -> AppResult<()> {
    if !report_path.is_file() {
        return Err(AppError::validation(format!(
            "report {} is missing",
            report_path.display()
        )));
    }
    let text = fs::read_to_string(report_path)
        .map_err(|e| AppError::validation(format!("failed to read report: {e}")))?;
    let report: AnalyticsReport = serde_json::from_str(&text)
        .map_err(|e| AppError::validation(format!("report parse error: {e}")))?;

    let out_path = out.unwrap_or_else(|| report_path.with_extension("md"));
    if out_path.exists() && !overwrite {
        return Err(AppError::usage(format!(
            "{} already exists; use --overwrite to replace",
            out_path.display()
        )));
    }
    if out_path.exists() && out_path.is_dir() {
        return Err(AppError::validation("render output path is a directory"));
    }

    fs::write(&out_path, render_markdown(&report))
        .map_err(|e| AppError::internal(format!("failed to write {}: {e}", out_path.display())))?;
    Ok(())
}
