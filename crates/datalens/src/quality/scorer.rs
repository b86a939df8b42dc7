//! Composite data-quality scoring.

use std::collections::{HashMap, HashSet};

use crate::config::QualityConfig;
use crate::detection::{AnomalyRecord, Severity};
use crate::error::{EngineError, Result};
use crate::inference::detectors::{conforms, parse_numeric};
use crate::input::Dataset;
use crate::schema::{ColumnProfile, InferredType, SchemaProfile};
use crate::stats::NumericSummary;

use super::report::{ColumnQuality, Priority, QualityReport, Recommendation, RiskLevel};
use super::validators::validity_check;

/// Scores a dataset against its schema profile and anomaly findings.
///
/// A pure function of its inputs: nothing is cached between calls.
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: QualityConfig,
}

impl QualityScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: QualityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Score completeness, consistency, validity, duplicates and anomaly risk.
    ///
    /// Fails with [`EngineError::SchemaMismatch`] when the schema describes a
    /// different column set than the dataset carries.
    pub fn score(
        &self,
        dataset: &Dataset,
        schema: &SchemaProfile,
        anomalies: &[AnomalyRecord],
    ) -> Result<QualityReport> {
        check_columns(dataset, schema)?;

        let rows = dataset.row_count();
        let columns: Vec<ColumnQuality> = schema
            .columns
            .iter()
            .map(|profile| self.score_column(dataset, profile))
            .collect();

        let completeness = mean(columns.iter().map(|c| c.completeness));
        let consistency = mean(columns.iter().map(|c| c.consistency));
        let validity = mean(columns.iter().map(|c| c.validity));

        let duplicate_ratio = ratio(duplicate_rows(dataset), rows);
        let high_anomalies = anomalies
            .iter()
            .filter(|a| a.severity == Severity::High)
            .count();
        let anomaly_ratio = ratio(high_anomalies, rows).min(1.0);

        let duplicate_risk = self.risk(duplicate_ratio);
        let anomaly_risk = self.risk(anomaly_ratio);

        let parts = [
            completeness,
            consistency,
            validity,
            1.0 - duplicate_ratio,
            1.0 - anomaly_ratio,
        ];
        let composite = (100.0 * parts.iter().sum::<f64>() / parts.len() as f64).round();
        let composite_score = composite.clamp(0.0, 100.0) as u8;

        let mut report = QualityReport {
            completeness,
            consistency,
            validity,
            duplicate_ratio,
            duplicate_risk,
            anomaly_ratio,
            anomaly_risk,
            composite_score,
            columns,
            recommendations: Vec::new(),
        };
        report.recommendations = self.recommend(&report);

        tracing::info!(
            composite = report.composite_score,
            duplicate_risk = %report.duplicate_risk,
            anomaly_risk = %report.anomaly_risk,
            "Quality scored"
        );

        Ok(report)
    }

    fn risk(&self, ratio: f64) -> RiskLevel {
        RiskLevel::from_ratio(ratio, self.config.medium_risk_ratio, self.config.high_risk_ratio)
    }

    fn score_column(&self, dataset: &Dataset, profile: &ColumnProfile) -> ColumnQuality {
        let rows = dataset.row_count();
        let values: Vec<String> = dataset
            .column_index(&profile.name)
            .map(|idx| {
                dataset
                    .column_values(idx)
                    .filter(|v| !v.is_null())
                    .map(|v| v.as_text().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        let completeness = share(values.len(), rows);

        let format = profile.detected_format.as_deref();
        let mut conforming = values
            .iter()
            .filter(|v| conforms(profile.inferred_type, format, v))
            .count();
        if profile.inferred_type == InferredType::CategoricalText {
            conforming = conforming.saturating_sub(case_variants(&values));
        }

        let validity = match validity_check(profile, &self.config) {
            Some(check) => share(values.iter().filter(|v| check.is_valid(v)).count(), rows),
            None => 1.0,
        };

        let distinct: HashSet<&str> = values.iter().map(String::as_str).collect();

        let (numeric, outlier_count) = if profile.inferred_type.is_numeric() {
            let numbers: Vec<f64> = values
                .iter()
                .filter_map(|v| parse_numeric(profile.inferred_type, v))
                .collect();
            match NumericSummary::from_values(&numbers) {
                Some(summary) => {
                    let outliers = numbers
                        .iter()
                        .filter(|v| summary.is_outlier_iqr(**v, self.config.outlier_fence))
                        .count();
                    (Some(summary), outliers)
                }
                None => (None, 0),
            }
        } else {
            (None, 0)
        };

        ColumnQuality {
            name: profile.name.clone(),
            completeness,
            consistency: share(conforming, rows),
            validity,
            uniqueness: share(distinct.len(), values.len()),
            numeric,
            outlier_count,
        }
    }

    fn recommend(&self, report: &QualityReport) -> Vec<Recommendation> {
        let mut recs = Vec::new();

        if report.completeness < self.config.completeness_target {
            let incomplete: Vec<&str> = report
                .columns
                .iter()
                .filter(|c| c.completeness < self.config.completeness_target)
                .map(|c| c.name.as_str())
                .collect();
            recs.push(Recommendation {
                priority: Priority::High,
                issue: format!(
                    "Completeness is {:.0}%; incomplete columns: {}",
                    report.completeness * 100.0,
                    incomplete.join(", ")
                ),
                action: "Fill or impute missing values, or confirm the gaps are expected."
                    .to_string(),
            });
        }
        if report.validity < self.config.validity_target {
            recs.push(Recommendation {
                priority: Priority::High,
                issue: format!("Validity is {:.0}%", report.validity * 100.0),
                action: "Review values that fail type validation (emails, dates, identifiers)."
                    .to_string(),
            });
        }
        if report.duplicate_risk != RiskLevel::Low {
            recs.push(Recommendation {
                priority: Priority::High,
                issue: format!(
                    "{:.1}% of rows are exact duplicates",
                    report.duplicate_ratio * 100.0
                ),
                action: "Remove duplicate rows before analysis.".to_string(),
            });
        }
        if report.consistency < self.config.consistency_target {
            recs.push(Recommendation {
                priority: Priority::Medium,
                issue: format!("Consistency is {:.0}%", report.consistency * 100.0),
                action: "Standardize formats within each column.".to_string(),
            });
        }
        if report.anomaly_risk != RiskLevel::Low {
            recs.push(Recommendation {
                priority: Priority::Medium,
                issue: format!(
                    "{:.1}% of rows carry high-severity anomalies",
                    report.anomaly_ratio * 100.0
                ),
                action: "Investigate the flagged rows before relying on aggregates.".to_string(),
            });
        }

        recs
    }
}

/// Compare schema and dataset column sets.
fn check_columns(dataset: &Dataset, schema: &SchemaProfile) -> Result<()> {
    let headers: HashSet<&str> = dataset.headers().iter().map(String::as_str).collect();
    let described: HashSet<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();

    let missing: Vec<String> = schema
        .columns
        .iter()
        .filter(|c| !headers.contains(c.name.as_str()))
        .map(|c| c.name.clone())
        .collect();
    let unexpected: Vec<String> = dataset
        .headers()
        .iter()
        .filter(|h| !described.contains(h.as_str()))
        .cloned()
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        Ok(())
    } else {
        Err(EngineError::SchemaMismatch { missing, unexpected })
    }
}

/// Rows that exactly repeat an earlier row.
fn duplicate_rows(dataset: &Dataset) -> usize {
    let mut seen = HashSet::new();
    (0..dataset.row_count())
        .filter(|&row| !seen.insert(dataset.row_key(row)))
        .count()
}

/// Values spelled differently from the most common casing of the same word,
/// e.g. "sales" in a column that mostly says "Sales".
fn case_variants(values: &[String]) -> usize {
    let mut groups: HashMap<String, HashMap<&str, usize>> = HashMap::new();
    for value in values {
        *groups
            .entry(value.to_lowercase())
            .or_default()
            .entry(value.as_str())
            .or_insert(0) += 1;
    }
    groups
        .values()
        .map(|spellings| {
            let total: usize = spellings.values().sum();
            total - spellings.values().copied().max().unwrap_or(0)
        })
        .sum()
}

/// Share of `part` in `whole`; an empty whole scores 1.0.
fn share(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        1.0
    } else {
        part as f64 / whole as f64
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 { 1.0 } else { sum / count as f64 }
}
