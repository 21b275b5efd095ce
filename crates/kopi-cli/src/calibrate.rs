use kopi_analytics::calibrate;
use kopi_core::config::write_calibration;
use kopi_core::date::today_utc;
use kopi_core::{AppError, AppResult};
use kopi_periods::load_daily_dir;
use std::path::Path;
use tracing::info;

pub fn calibrate_command(data_dir: &Path, config_path: &Path, dry_run: bool) -> AppResult<()> {
    let records = load_daily_dir(data_dir)?;
    if records.is_empty() {
        return Err(AppError::insufficient_data(format!(
            "no daily reports found in {}",
            data_dir.display()
        )));
    }
    let result = calibrate(&records, today_utc())?;

    let dist = &result.metadata.distribution;
    println!(
        "quotes: {} (mild {:.1}%, moderate {:.1}%, strong {:.1}%)",
        result.counts.total(),
        dist.mild,
        dist.moderate,
        dist.strong
    );
    println!(
        "z-scores: mild {:+.2}, moderate {:+.2}, strong {:+.2}",
        result.z_scores.mild, result.z_scores.moderate, result.z_scores.strong
    );

    if dry_run {
        info!("dry run; config not updated");
        return Ok(());
    }
    write_calibration(config_path, &result.z_scores, &result.metadata)
}
