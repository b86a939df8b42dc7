//! Quality report types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stats::NumericSummary;

/// Risk tier for duplicate and anomaly ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Tier a ratio: below `medium` is low, above `high` is high.
    pub fn from_ratio(ratio: f64, medium: f64, high: f64) -> Self {
        if ratio < medium {
            RiskLevel::Low
        } else if ratio <= high {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sub-scores for one column, each in [0, 1].
///
/// Consistency and validity are shares of all rows, so a null cell counts
/// against them as well as against completeness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnQuality {
    pub name: String,
    pub completeness: f64,
    pub consistency: f64,
    pub validity: f64,
    /// Distinct share of non-null values.
    pub uniqueness: f64,
    /// Summary of the parsed values of a numeric column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
    /// Values outside the IQR fences; zero for non-numeric columns.
    #[serde(default)]
    pub outlier_count: usize,
}

/// Priority of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// A suggested remediation derived from the sub-scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub issue: String,
    pub action: String,
}

/// Composite quality assessment of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Mean per-column non-null share.
    pub completeness: f64,
    /// Mean per-column share of rows matching the detected format.
    pub consistency: f64,
    /// Mean per-column share of rows passing type validation.
    pub validity: f64,
    /// Exact duplicate rows beyond the first, over row count.
    pub duplicate_ratio: f64,
    pub duplicate_risk: RiskLevel,
    /// High-severity anomalies over row count, at most 1.
    pub anomaly_ratio: f64,
    pub anomaly_risk: RiskLevel,
    /// 0-100.
    pub composite_score: u8,
    pub columns: Vec<ColumnQuality>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<Recommendation>,
}

impl QualityReport {
    /// Get a column's sub-scores by name.
    pub fn column(&self, name: &str) -> Option<&ColumnQuality> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_tiers() {
        assert_eq!(RiskLevel::from_ratio(0.0, 0.01, 0.05), RiskLevel::Low);
        assert_eq!(RiskLevel::from_ratio(0.009, 0.01, 0.05), RiskLevel::Low);
        assert_eq!(RiskLevel::from_ratio(0.01, 0.01, 0.05), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_ratio(0.05, 0.01, 0.05), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_ratio(0.2, 0.01, 0.05), RiskLevel::High);
    }
}
