//! Engine configuration.
//!
//! Every threshold the learner, scorer and detector use lives here with its
//! default. Configs deserialize from JSON with missing fields defaulted, and
//! builder methods clamp out-of-range values with a warning.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{EngineError, Result};

/// Validation errors for engine configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("{field} must be between 0.0 and 1.0, got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be at least {min}, got {value}")]
    TooSmall {
        field: &'static str,
        min: usize,
        value: usize,
    },
    #[error("{low_field} ({low}) must not exceed {high_field} ({high})")]
    Inverted {
        low_field: &'static str,
        low: f64,
        high_field: &'static str,
        high: f64,
    },
}

fn clamp_unit(field: &str, value: f64) -> f64 {
    if !(0.0..=1.0).contains(&value) {
        tracing::warn!("{} {} clamped to valid range [0.0, 1.0]", field, value);
    }
    value.clamp(0.0, 1.0)
}

fn check_unit(field: &'static str, value: f64) -> std::result::Result<(), ConfigValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigValidationError::OutOfUnitRange { field, value })
    }
}

fn check_positive(field: &'static str, value: f64) -> std::result::Result<(), ConfigValidationError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigValidationError::NotPositive { field, value })
    }
}

/// Schema learner settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    /// Non-null values sampled per column.
    pub sample_size: usize,
    /// Minimum detector match rate for a type to win.
    pub match_threshold: f64,
    /// Below this distinct/row ratio unmatched text is categorical.
    pub categorical_ratio: f64,
    /// Lines of raw text scored for delimiter detection.
    pub structure_sample_lines: usize,
    /// Line consistency a delimiter needs to count as tabular.
    pub structure_consistency: f64,
    /// |r| above which numeric columns are reported as correlated.
    pub correlation_threshold: f64,
    /// Sampled values kept on each profile for display.
    pub display_samples: usize,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            sample_size: 200,
            match_threshold: 0.8,
            categorical_ratio: 0.5,
            structure_sample_lines: 50,
            structure_consistency: 0.9,
            correlation_threshold: 0.7,
            display_samples: 5,
        }
    }
}

impl LearnerConfig {
    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size.max(1);
        self
    }

    pub fn with_match_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = clamp_unit("match_threshold", threshold);
        self
    }

    pub fn with_correlation_threshold(mut self, threshold: f64) -> Self {
        self.correlation_threshold = clamp_unit("correlation_threshold", threshold);
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.sample_size == 0 {
            return Err(ConfigValidationError::TooSmall {
                field: "sample_size",
                min: 1,
                value: 0,
            });
        }
        check_unit("match_threshold", self.match_threshold)?;
        check_unit("categorical_ratio", self.categorical_ratio)?;
        check_unit("structure_consistency", self.structure_consistency)?;
        check_unit("correlation_threshold", self.correlation_threshold)?;
        Ok(())
    }
}

/// Quality scorer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Ratios below this are low risk.
    pub medium_risk_ratio: f64,
    /// Ratios above this are high risk.
    pub high_risk_ratio: f64,
    /// Earliest plausible date.
    pub min_plausible_date: NaiveDate,
    /// Latest plausible date.
    pub max_plausible_date: NaiveDate,
    /// Completeness below this triggers a recommendation.
    pub completeness_target: f64,
    /// Consistency below this triggers a recommendation.
    pub consistency_target: f64,
    /// Validity below this triggers a recommendation.
    pub validity_target: f64,
    /// IQR fence multiplier for per-column outlier counts.
    pub outlier_fence: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            medium_risk_ratio: 0.01,
            high_risk_ratio: 0.05,
            min_plausible_date: NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN),
            max_plausible_date: NaiveDate::from_ymd_opt(2100, 12, 31).unwrap_or(NaiveDate::MAX),
            completeness_target: 0.9,
            consistency_target: 0.85,
            validity_target: 0.9,
            outlier_fence: 1.5,
        }
    }
}

impl QualityConfig {
    pub fn with_risk_ratios(mut self, medium: f64, high: f64) -> Self {
        self.medium_risk_ratio = clamp_unit("medium_risk_ratio", medium);
        self.high_risk_ratio = clamp_unit("high_risk_ratio", high);
        self
    }

    pub fn with_plausible_dates(mut self, min: NaiveDate, max: NaiveDate) -> Self {
        self.min_plausible_date = min;
        self.max_plausible_date = max;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        check_unit("medium_risk_ratio", self.medium_risk_ratio)?;
        check_unit("high_risk_ratio", self.high_risk_ratio)?;
        if self.medium_risk_ratio > self.high_risk_ratio {
            return Err(ConfigValidationError::Inverted {
                low_field: "medium_risk_ratio",
                low: self.medium_risk_ratio,
                high_field: "high_risk_ratio",
                high: self.high_risk_ratio,
            });
        }
        check_unit("completeness_target", self.completeness_target)?;
        check_unit("consistency_target", self.consistency_target)?;
        check_unit("validity_target", self.validity_target)?;
        check_positive("outlier_fence", self.outlier_fence)?;
        Ok(())
    }
}

/// Bucket width for spike detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpikePeriod {
    Day,
    Week,
    #[default]
    Month,
}

/// Anomaly detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// |z| above which a value is an outlier.
    pub z_score_threshold: f64,
    /// |z| above which an outlier is high severity.
    pub z_score_high: f64,
    /// IQR fence multiplier for outliers.
    pub iqr_multiplier: f64,
    /// IQR fence multiplier for high-severity outliers.
    pub iqr_extreme_multiplier: f64,
    /// Fewer non-null values than this and a detector skips the column.
    pub min_sample: usize,
    /// Period-over-period growth above this ratio is a spike (2.0 = 200%).
    pub spike_ratio: f64,
    pub spike_period: SpikePeriod,
    /// Processing date for future-date rules (None = today, UTC).
    pub as_of: Option<NaiveDate>,
    /// Oldest plausible age.
    pub max_age: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            z_score_threshold: 3.0,
            z_score_high: 4.0,
            iqr_multiplier: 1.5,
            iqr_extreme_multiplier: 3.0,
            min_sample: 3,
            spike_ratio: 2.0,
            spike_period: SpikePeriod::Month,
            as_of: None,
            max_age: 120.0,
        }
    }
}

impl DetectionConfig {
    /// Fix the processing date, making future-date checks reproducible.
    pub fn with_as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    pub fn with_spike_period(mut self, period: SpikePeriod) -> Self {
        self.spike_period = period;
        self
    }

    pub fn with_spike_ratio(mut self, ratio: f64) -> Self {
        if ratio <= 0.0 {
            tracing::warn!("spike_ratio {} raised to minimum 0.01", ratio);
        }
        self.spike_ratio = ratio.max(0.01);
        self
    }

    pub fn with_z_score_threshold(mut self, threshold: f64) -> Self {
        self.z_score_threshold = threshold;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        check_positive("z_score_threshold", self.z_score_threshold)?;
        check_positive("iqr_multiplier", self.iqr_multiplier)?;
        check_positive("spike_ratio", self.spike_ratio)?;
        check_positive("max_age", self.max_age)?;
        if self.z_score_threshold > self.z_score_high {
            return Err(ConfigValidationError::Inverted {
                low_field: "z_score_threshold",
                low: self.z_score_threshold,
                high_field: "z_score_high",
                high: self.z_score_high,
            });
        }
        if self.iqr_multiplier > self.iqr_extreme_multiplier {
            return Err(ConfigValidationError::Inverted {
                low_field: "iqr_multiplier",
                low: self.iqr_multiplier,
                high_field: "iqr_extreme_multiplier",
                high: self.iqr_extreme_multiplier,
            });
        }
        if self.min_sample < 2 {
            return Err(ConfigValidationError::TooSmall {
                field: "min_sample",
                min: 2,
                value: self.min_sample,
            });
        }
        Ok(())
    }
}

/// Configuration for a full analysis pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub learner: LearnerConfig,
    pub quality: QualityConfig,
    pub detection: DetectionConfig,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_learner(mut self, learner: LearnerConfig) -> Self {
        self.learner = learner;
        self
    }

    pub fn with_quality(mut self, quality: QualityConfig) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_detection(mut self, detection: DetectionConfig) -> Self {
        self.detection = detection;
        self
    }

    /// Validate every section.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        self.learner.validate()?;
        self.quality.validate()?;
        self.detection.validate()
    }

    /// Load and validate a JSON config file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| EngineError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        config
            .validate()
            .map_err(|e| EngineError::Config(e.to_string()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"detection": {"spike_period": "week"}}"#).unwrap();
        assert_eq!(config.detection.spike_period, SpikePeriod::Week);
        assert_eq!(config.detection.z_score_threshold, 3.0);
        assert_eq!(config.learner.sample_size, 200);
    }

    #[test]
    fn test_builder_clamps() {
        let learner = LearnerConfig::default().with_match_threshold(1.5);
        assert_eq!(learner.match_threshold, 1.0);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let quality = QualityConfig::default().with_risk_ratios(0.2, 0.1);
        assert!(matches!(
            quality.validate(),
            Err(ConfigValidationError::Inverted { .. })
        ));

        let detection = DetectionConfig::default().with_z_score_threshold(5.0);
        assert!(detection.validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"learner": {"sample_size": 50}}"#).unwrap();
        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.learner.sample_size, 50);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        bad.write_all(br#"{"learner": {"match_threshold": 4.0}}"#).unwrap();
        let err = EngineConfig::from_json_file(bad.path()).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
