//! Anomaly finding types.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Category of an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Value far from the column's distribution.
    StatisticalOutlier,
    /// Value outside what the domain allows (e.g. age 250).
    ImpossibleValue,
    /// Historical event dated after the processing date.
    FutureDate,
    /// Negative value in a non-negative measure.
    NegativeValue,
    /// Exact repeat of an earlier row.
    DuplicateRow,
    /// Period volume jumped against the previous period.
    SuddenSpike,
}

impl AnomalyKind {
    pub fn label(&self) -> &'static str {
        match self {
            AnomalyKind::StatisticalOutlier => "statistical_outlier",
            AnomalyKind::ImpossibleValue => "impossible_value",
            AnomalyKind::FutureDate => "future_date",
            AnomalyKind::NegativeValue => "negative_value",
            AnomalyKind::DuplicateRow => "duplicate_row",
            AnomalyKind::SuddenSpike => "sudden_spike",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity level of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One anomaly finding.
///
/// Refers back to the dataset by row index only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    /// Zero-based row the finding is attached to.
    pub row_index: usize,
    /// Offending column; None for whole-row findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub kind: AnomalyKind,
    pub severity: Severity,
    /// Human-readable explanation.
    pub detail: String,
    /// Detector that produced the finding.
    pub detector_id: String,
    /// Offending cell as text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Aggregate bucket, for spikes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

impl AnomalyRecord {
    pub fn new(
        row_index: usize,
        kind: AnomalyKind,
        severity: Severity,
        detail: impl Into<String>,
        detector_id: impl Into<String>,
    ) -> Self {
        Self {
            row_index,
            column: None,
            kind,
            severity,
            detail: detail.into(),
            detector_id: detector_id.into(),
            value: None,
            period: None,
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = Some(period.into());
        self
    }

    /// Identity used for deduplication.
    pub fn key(&self) -> (usize, Option<&str>, AnomalyKind) {
        (self.row_index, self.column.as_deref(), self.kind)
    }
}

/// Counts of findings by severity and kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnomalySummary {
    pub total: usize,
    pub by_severity: IndexMap<Severity, usize>,
    pub by_kind: IndexMap<AnomalyKind, usize>,
}

impl AnomalySummary {
    pub fn from_records(records: &[AnomalyRecord]) -> Self {
        let mut by_severity = IndexMap::new();
        for severity in [Severity::High, Severity::Medium, Severity::Low] {
            by_severity.insert(severity, 0);
        }
        let mut by_kind = IndexMap::new();
        for record in records {
            *by_severity.entry(record.severity).or_insert(0) += 1;
            *by_kind.entry(record.kind).or_insert(0) += 1;
        }
        Self {
            total: records.len(),
            by_severity,
            by_kind,
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_record_serializes_snake_case() {
        let record = AnomalyRecord::new(3, AnomalyKind::FutureDate, Severity::High, "x", "business_rules")
            .with_column("hire_date");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "future_date");
        assert_eq!(json["severity"], "high");
        assert!(json.get("period").is_none());
    }

    #[test]
    fn test_summary_counts() {
        let records = vec![
            AnomalyRecord::new(0, AnomalyKind::DuplicateRow, Severity::Low, "", "duplicate_rows"),
            AnomalyRecord::new(1, AnomalyKind::DuplicateRow, Severity::Low, "", "duplicate_rows"),
            AnomalyRecord::new(2, AnomalyKind::FutureDate, Severity::High, "", "business_rules"),
        ];
        let summary = AnomalySummary::from_records(&records);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.count(Severity::Low), 2);
        assert_eq!(summary.count(Severity::Medium), 0);
        assert_eq!(summary.by_kind[&AnomalyKind::DuplicateRow], 2);
    }
}
