use crate::stats::{probit_clamped, round_to, PROBIT_CLAMP};
use kopi_core::config::{CalibrationMetadata, IntensityDistribution, IntensityZScores};
use kopi_core::date::format_iso_date;
use kopi_core::{AppError, AppResult};
use kopi_periods::{Intensity, PeriodRecord};
use serde::{Deserialize, Serialize};
use time::Date;
use tracing::{debug, info};

/// How many quotes carry each intensity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntensityCounts {
    pub mild: u64,
    pub moderate: u64,
    pub strong: u64,
}

impl IntensityCounts {
    pub fn from_records(records: &[PeriodRecord]) -> Self {
        let mut counts = Self::default();
        for quote in records.iter().flat_map(|r| r.all_quotes()) {
            counts.add(quote.intensity);
        }
        counts
    }

    pub fn add(&mut self, intensity: Intensity) {
        match intensity {
            Intensity::Mild => self.mild += 1,
            Intensity::Moderate => self.moderate += 1,
            Intensity::Strong => self.strong += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.mild + self.moderate + self.strong
    }

    /// Percent share of each label, rounded to one decimal.
    pub fn distribution(&self) -> IntensityDistribution {
        let total = self.total();
        if total == 0 {
            return IntensityDistribution::default();
        }
        let pct = |count: u64| round_to(count as f64 / total as f64 * 100.0, 1);
        IntensityDistribution {
            mild: pct(self.mild),
            moderate: pct(self.moderate),
            strong: pct(self.strong),
        }
    }
}

/// Maps the observed label shares onto z-scores at each label's midpoint
/// cumulative percentile.
///
/// Midpoints at or beyond the open unit interval clamp to ∓2.5 for mild and
/// strong; moderate falls back to 0 there.
pub fn compute_z_scores(counts: &IntensityCounts) -> AppResult<IntensityZScores> {
    let total = counts.total();
    if total == 0 {
        return Err(AppError::insufficient_data(
            "no quotes found; calibration needs at least one quote",
        ));
    }
    let total = total as f64;
    let mild = counts.mild as f64 / total;
    let moderate = counts.moderate as f64 / total;
    let strong = counts.strong as f64 / total;

    let mid_mild = mild / 2.0;
    let mid_moderate = mild + moderate / 2.0;
    let mid_strong = mild + moderate + strong / 2.0;
    debug!(mid_mild, mid_moderate, mid_strong, "intensity midpoint percentiles");

    let z_mild = if mid_mild > 0.0 {
        probit_clamped(mid_mild)?
    } else {
        -PROBIT_CLAMP
    };
    let z_moderate = if mid_moderate > 0.0 && mid_moderate < 1.0 {
        probit_clamped(mid_moderate)?
    } else {
        0.0
    };
    let z_strong = if mid_strong < 1.0 {
        probit_clamped(mid_strong)?
    } else {
        PROBIT_CLAMP
    };

    Ok(IntensityZScores {
        mild: round_to(z_mild, 2),
        moderate: round_to(z_moderate, 2),
        strong: round_to(z_strong, 2),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    pub counts: IntensityCounts,
    pub z_scores: IntensityZScores,
    pub metadata: CalibrationMetadata,
}

/// Calibrates intensity z-scores against every quote in `records`.
pub fn calibrate(records: &[PeriodRecord], calibrated_at: Date) -> AppResult<Calibration> {
    let counts = IntensityCounts::from_records(records);
    let z_scores = compute_z_scores(&counts)?;

    let (start, end) = match (
        records.iter().map(|r| r.date).min(),
        records.iter().map(|r| r.date).max(),
    ) {
        (Some(start), Some(end)) => (format_iso_date(start), format_iso_date(end)),
        _ => ("unknown".to_string(), "unknown".to_string()),
    };

    let metadata = CalibrationMetadata {
        calibrated_at: format_iso_date(calibrated_at),
        data_range_start: start,
        data_range_end: end,
        total_quotes_analyzed: counts.total(),
        distribution: counts.distribution(),
    };
    info!(
        quotes = counts.total(),
        mild = z_scores.mild,
        moderate = z_scores.moderate,
        strong = z_scores.strong,
        "intensity calibration computed"
    );
    Ok(Calibration {
        counts,
        z_scores,
        metadata,
    })
}
