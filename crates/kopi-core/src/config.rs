use crate::error::{AppError, AppResult};
use crate::json::{determinism_hash_hex, to_canonical_json_bytes};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_FILE: &str = "analytics_config.json";
pub const CONFIG_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub version: String,
    pub intensity_z_scores: IntensityZScores,
    pub calibration: CalibrationMetadata,
    pub alert_thresholds: AlertThresholds,
    pub engagement: EngagementConfig,
    pub ema: EmaConfig,
    pub trend: TrendConfig,
    pub momentum: MomentumConfig,
    pub velocity: VelocityConfig,
    pub pipeline: PipelineConfig,
    pub commentary: CommentaryConfig,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            intensity_z_scores: IntensityZScores::default(),
            calibration: CalibrationMetadata::default(),
            alert_thresholds: AlertThresholds::default(),
            engagement: EngagementConfig::default(),
            ema: EmaConfig::default(),
            trend: TrendConfig::default(),
            momentum: MomentumConfig::default(),
            velocity: VelocityConfig::default(),
            pipeline: PipelineConfig::default(),
            commentary: CommentaryConfig::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Loads and validates the config; `None` yields the defaults.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let config = match path {
            Some(path) => {
                let value = read_config_value(path)?;
                serde_json::from_value::<AnalyticsConfig>(value).map_err(|e| {
                    AppError::usage(format!("failed to parse config {}: {e}", path.display()))
                })?
            }
            None => AnalyticsConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.intensity_z_scores.validate()?;
        self.alert_thresholds.validate()?;
        self.engagement.validate()?;
        self.ema.validate()?;
        self.trend.validate()?;
        self.momentum.validate()?;
        self.pipeline.validate()?;
        if !self.intensity_z_scores.is_monotonic() {
            warn!(
                mild = self.intensity_z_scores.mild,
                moderate = self.intensity_z_scores.moderate,
                strong = self.intensity_z_scores.strong,
                "intensity z-scores are not non-decreasing from mild to strong"
            );
        }
        Ok(())
    }

    pub fn config_hash(&self) -> AppResult<String> {
        let bytes = to_canonical_json_bytes(self)?;
        Ok(determinism_hash_hex(&bytes))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityZScores {
    pub mild: f64,
    pub moderate: f64,
    pub strong: f64,
}

impl Default for IntensityZScores {
    // Probit midpoints of a 50/30/20 mild/moderate/strong split.
    fn default() -> Self {
        Self {
            mild: -0.67,
            moderate: 0.39,
            strong: 1.28,
        }
    }
}

impl IntensityZScores {
    pub fn is_monotonic(&self) -> bool {
        self.mild <= self.moderate && self.moderate <= self.strong
    }

    fn validate(&self) -> AppResult<()> {
        for (name, value) in [
            ("mild", self.mild),
            ("moderate", self.moderate),
            ("strong", self.strong),
        ] {
            if !value.is_finite() {
                return Err(AppError::validation(format!(
                    "intensity_z_scores.{name} must be finite"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationMetadata {
    pub calibrated_at: String,
    pub data_range_start: String,
    pub data_range_end: String,
    pub total_quotes_analyzed: u64,
    pub distribution: IntensityDistribution,
}

impl Default for CalibrationMetadata {
    fn default() -> Self {
        Self {
            calibrated_at: "uncalibrated".to_string(),
            data_range_start: "unknown".to_string(),
            data_range_end: "unknown".to_string(),
            total_quotes_analyzed: 0,
            distribution: IntensityDistribution::default(),
        }
    }
}

/// Observed share of each intensity label, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IntensityDistribution {
    pub mild: f64,
    pub moderate: f64,
    pub strong: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub notable: f64,
    pub warning: f64,
    pub alert: f64,
    /// |z| at which alert text says "significantly" rather than "notably".
    pub significant_z: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            notable: 1.0,
            warning: 1.5,
            alert: 2.0,
            significant_z: 2.0,
        }
    }
}

impl AlertThresholds {
    fn validate(&self) -> AppResult<()> {
        let values = [self.notable, self.warning, self.alert, self.significant_z];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(AppError::validation(
                "alert_thresholds must be finite and non-negative",
            ));
        }
        if !(self.notable <= self.warning && self.warning <= self.alert) {
            return Err(AppError::validation(
                "alert_thresholds must satisfy notable <= warning <= alert",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EngagementBaseline {
    /// Population mean and std within each period.
    #[default]
    PerPeriod,
    /// Mean and sample std over every quote in the input snapshot.
    Pooled,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    pub z_floor: f64,
    pub baseline: EngagementBaseline,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            z_floor: -2.0,
            baseline: EngagementBaseline::PerPeriod,
        }
    }
}

impl EngagementConfig {
    fn validate(&self) -> AppResult<()> {
        if !self.z_floor.is_finite() || self.z_floor > 0.0 {
            return Err(AppError::validation(
                "engagement.z_floor must be finite and <= 0",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmaConfig {
    pub span: usize,
    pub min_periods: usize,
}

impl Default for EmaConfig {
    fn default() -> Self {
        Self {
            span: 7,
            min_periods: 3,
        }
    }
}

impl EmaConfig {
    fn validate(&self) -> AppResult<()> {
        if self.span == 0 {
            return Err(AppError::validation("ema.span must be > 0"));
        }
        if self.min_periods == 0 {
            return Err(AppError::validation("ema.min_periods must be > 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub slope_stable_threshold: f64,
    pub roc_weak_threshold: f64,
    pub roc_strong_threshold: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            slope_stable_threshold: 0.5,
            roc_weak_threshold: 10.0,
            roc_strong_threshold: 25.0,
        }
    }
}

impl TrendConfig {
    fn validate(&self) -> AppResult<()> {
        let values = [
            self.slope_stable_threshold,
            self.roc_weak_threshold,
            self.roc_strong_threshold,
        ];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(AppError::validation(
                "trend thresholds must be finite and non-negative",
            ));
        }
        if self.roc_weak_threshold > self.roc_strong_threshold {
            return Err(AppError::validation(
                "trend.roc_weak_threshold must be <= trend.roc_strong_threshold",
            ));
        }
        Ok(())
    }
}

/// ROC lookbacks are index offsets into the series, not calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    pub roc_1d_lookback: usize,
    pub roc_3d_lookback: usize,
    pub roc_7d_lookback: usize,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            roc_1d_lookback: 2,
            roc_3d_lookback: 4,
            roc_7d_lookback: 8,
        }
    }
}

impl MomentumConfig {
    fn validate(&self) -> AppResult<()> {
        for (name, value) in [
            ("roc_1d_lookback", self.roc_1d_lookback),
            ("roc_3d_lookback", self.roc_3d_lookback),
            ("roc_7d_lookback", self.roc_7d_lookback),
        ] {
            if value == 0 {
                return Err(AppError::validation(format!("momentum.{name} must be > 0")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    pub lookback_days: usize,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self { lookback_days: 7 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub min_days_required: usize,
    pub min_weeks_required: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_days_required: 3,
            min_weeks_required: 3,
        }
    }
}

impl PipelineConfig {
    fn validate(&self) -> AppResult<()> {
        if self.min_days_required == 0 {
            return Err(AppError::validation("pipeline.min_days_required must be > 0"));
        }
        if self.min_weeks_required == 0 {
            return Err(AppError::validation("pipeline.min_weeks_required must be > 0"));
        }
        Ok(())
    }
}

/// Settings for the downstream commentary writer; carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentaryConfig {
    pub model: String,
    pub max_tokens: u32,
}

impl Default for CommentaryConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Json,
        }
    }
}

fn read_config_value(path: &Path) -> AppResult<Value> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| AppError::usage(format!("failed to read config {}: {e}", path.display())))?;
    let value = match ConfigFormat::from_path(path) {
        ConfigFormat::Json => serde_json::from_str::<Value>(&data).map_err(|e| e.to_string()),
        ConfigFormat::Yaml => serde_yaml::from_str::<Value>(&data).map_err(|e| e.to_string()),
    };
    value.map_err(|e| AppError::usage(format!("failed to parse config {}: {e}", path.display())))
}

/// Writes calibrated z-scores and metadata into the config file at `path`.
///
/// Only `intensity_z_scores` and `calibration` are touched; every other key
/// keeps its value and position. A missing file is created from defaults.
pub fn write_calibration(
    path: &Path,
    z_scores: &IntensityZScores,
    metadata: &CalibrationMetadata,
) -> AppResult<()> {
    let mut root = if path.exists() {
        read_config_value(path)?
    } else {
        serde_json::to_value(AnalyticsConfig::default())
            .map_err(|e| AppError::internal(format!("config encode error: {e}")))?
    };
    let obj = root
        .as_object_mut()
        .ok_or_else(|| AppError::validation("config root must be an object"))?;
    merge_section(obj, "intensity_z_scores", encode(z_scores)?);
    merge_section(obj, "calibration", encode(metadata)?);

    let updated: AnalyticsConfig = serde_json::from_value(root.clone())
        .map_err(|e| AppError::validation(format!("calibrated config is invalid: {e}")))?;
    updated.validate()?;

    let text = match ConfigFormat::from_path(path) {
        ConfigFormat::Json => serde_json::to_string_pretty(&root)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| AppError::internal(format!("config encode error: {e}")))?,
        ConfigFormat::Yaml => serde_yaml::to_string(&root)
            .map_err(|e| AppError::internal(format!("config encode error: {e}")))?,
    };

    replace_file(path, text.as_bytes())?;
    info!(path = %path.display(), "calibration written");
    Ok(())
}

/// Writes a sibling temp file and renames it over `path`. The temp file is
/// removed if the rename fails.
fn replace_file(path: &Path, bytes: &[u8]) -> AppResult<()> {
    let tmp_path = path.with_extension("calibrating");
    std::fs::write(&tmp_path, bytes)
        .map_err(|e| AppError::internal(format!("failed to write config: {e}")))?;
    if let Err(err) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(AppError::internal(format!("failed to replace config: {err}")));
    }
    Ok(())
}

fn encode<T: Serialize>(value: &T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::internal(format!("config encode error: {e}")))
}

fn merge_section(obj: &mut serde_json::Map<String, Value>, key: &str, update: Value) {
    match (obj.get_mut(key), update) {
        (Some(Value::Object(existing)), Value::Object(fields)) => {
            for (field, value) in fields {
                existing.insert(field, value);
            }
        }
        (_, update) => {
            obj.insert(key.to_string(), update);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    #[test]
    fn default_config_is_valid() {
        let config = AnalyticsConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.intensity_z_scores.is_monotonic());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("analytics_config.json");
        std::fs::write(
            &path,
            r#"{"version":"1.0","intensity_z_scores":{"mild":-1.0,"moderate":0.0,"strong":1.0}}"#,
        )
        .unwrap();
        let config = AnalyticsConfig::load(Some(&path)).unwrap();
        assert_eq!(config.intensity_z_scores.mild, -1.0);
        assert_eq!(config.ema.span, 7);
        assert_eq!(config.alert_thresholds.alert, 2.0);
        assert_eq!(config.momentum.roc_7d_lookback, 8);
    }

    #[test]
    fn loads_yaml_by_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("analytics_config.yaml");
        std::fs::write(&path, "ema:\n  span: 5\n  min_periods: 2\n").unwrap();
        let config = AnalyticsConfig::load(Some(&path)).unwrap();
        assert_eq!(config.ema.span, 5);
        assert_eq!(config.ema.min_periods, 2);
    }

    #[test]
    fn rejects_unordered_thresholds() {
        let mut config = AnalyticsConfig::default();
        config.alert_thresholds.warning = 3.0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn rejects_zero_span() {
        let mut config = AnalyticsConfig::default();
        config.ema.span = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_hash_tracks_content() {
        let a = AnalyticsConfig::default();
        let mut b = AnalyticsConfig::default();
        assert_eq!(a.config_hash().unwrap(), b.config_hash().unwrap());
        b.trend.slope_stable_threshold = 0.25;
        assert_ne!(a.config_hash().unwrap(), b.config_hash().unwrap());
    }

    #[test]
    fn calibration_write_preserves_other_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("analytics_config.json");
        std::fs::write(
            &path,
            r#"{
  "version": "1.0",
  "intensity_z_scores": {"mild": -0.5, "moderate": 0.1, "strong": 1.0},
  "calibration": {"calibrated_at": "2025-01-01"},
  "alert_thresholds": {"notable": 0.8, "warning": 1.2, "alert": 1.9, "significant_z": 2.5},
  "ema": {"span": 5, "min_periods": 2},
  "custom_key": {"keep": true}
}"#,
        )
        .unwrap();

        let z = IntensityZScores {
            mild: -0.67,
            moderate: 0.39,
            strong: 1.28,
        };
        let meta = CalibrationMetadata {
            calibrated_at: "2026-10-16".to_string(),
            data_range_start: "2026-01-01".to_string(),
            data_range_end: "2026-01-31".to_string(),
            total_quotes_analyzed: 100,
            distribution: IntensityDistribution {
                mild: 50.0,
                moderate: 30.0,
                strong: 20.0,
            },
        };
        write_calibration(&path, &z, &meta).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["custom_key"]["keep"], Value::Bool(true));
        assert_eq!(value["alert_thresholds"]["notable"], serde_json::json!(0.8));
        assert_eq!(value["ema"]["span"], serde_json::json!(5));
        assert_eq!(value["intensity_z_scores"]["strong"], serde_json::json!(1.28));
        assert_eq!(value["calibration"]["total_quotes_analyzed"], serde_json::json!(100));

        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.first().map(|k| k.as_str()), Some("version"));
        assert_eq!(keys.last().map(|k| k.as_str()), Some("custom_key"));
    }

    #[test]
    fn calibration_write_creates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fresh.json");
        write_calibration(
            &path,
            &IntensityZScores::default(),
            &CalibrationMetadata::default(),
        )
        .unwrap();
        let config = AnalyticsConfig::load(Some(&path)).unwrap();
        assert_eq!(config.ema.span, 7);
    }

    #[test]
    fn failed_replace_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("occupied.json");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("inner"), "x").unwrap();

        let err = replace_file(&target, b"{}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!dir.path().join("occupied.calibrating").exists());
        assert!(target.join("inner").exists());
    }
}
