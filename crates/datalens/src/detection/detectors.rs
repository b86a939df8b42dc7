//! Anomaly detectors and the pipeline that runs them.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate, Utc};
use indexmap::IndexMap;

use crate::config::{DetectionConfig, SpikePeriod};
use crate::error::{DetectorSkipped, EngineError, Result};
use crate::inference::detectors::{parse_date, parse_date_with, parse_numeric};
use crate::input::Dataset;
use crate::schema::{ColumnProfile, InferredType, SchemaProfile};
use crate::stats::NumericSummary;

use super::record::{AnomalyKind, AnomalyRecord, Severity};
use super::rules::{rules_for, Rule};

/// Read-only view a detector works on.
pub struct DetectionContext<'a> {
    pub dataset: &'a Dataset,
    pub schema: &'a SchemaProfile,
    pub config: &'a DetectionConfig,
    /// Processing date for future-date checks.
    pub as_of: NaiveDate,
}

impl<'a> DetectionContext<'a> {
    fn cells(&self, column: &ColumnProfile) -> Vec<(usize, String)> {
        let Some(idx) = self.dataset.column_index(&column.name) else {
            return Vec::new();
        };
        self.dataset
            .column_values(idx)
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(row, v)| (row, v.as_text().into_owned()))
            .collect()
    }

    /// Non-null numeric values of a column with their rows.
    pub fn numeric_values(&self, column: &ColumnProfile) -> Vec<(usize, f64, String)> {
        self.cells(column)
            .into_iter()
            .filter_map(|(row, text)| {
                parse_numeric(column.inferred_type, &text).map(|n| (row, n, text))
            })
            .collect()
    }

    /// Non-null date values of a column with their rows.
    pub fn date_values(&self, column: &ColumnProfile) -> Vec<(usize, NaiveDate, String)> {
        let format = column.detected_format.as_deref();
        self.cells(column)
            .into_iter()
            .filter_map(|(row, text)| {
                let date = match format {
                    Some(fmt) => parse_date_with(&text, fmt).or_else(|| parse_date(&text)),
                    None => parse_date(&text),
                };
                date.map(|d| (row, d, text))
            })
            .collect()
    }
}

/// A single anomaly detector.
pub trait Detector {
    /// Stable identifier recorded on each finding.
    fn id(&self) -> &'static str;

    /// Run over the whole dataset and return findings.
    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<AnomalyRecord>;
}

fn log_skip(detector: &str, column: &str, reason: DetectorSkipped) {
    tracing::debug!(detector, column, %reason, "Detector skipped column");
}

/// Numeric values of a column, or the reason the column is unusable.
fn usable_numeric(
    ctx: &DetectionContext<'_>,
    column: &ColumnProfile,
) -> std::result::Result<(Vec<(usize, f64, String)>, NumericSummary), DetectorSkipped> {
    if !column.inferred_type.is_numeric() {
        return Err(DetectorSkipped::WrongType(column.inferred_type));
    }
    let values = ctx.numeric_values(column);
    if values.len() < ctx.config.min_sample {
        return Err(DetectorSkipped::InsufficientSample {
            needed: ctx.config.min_sample,
            found: values.len(),
        });
    }
    let numbers: Vec<f64> = values.iter().map(|(_, n, _)| *n).collect();
    let summary = NumericSummary::from_values(&numbers).ok_or(DetectorSkipped::InsufficientSample {
        needed: ctx.config.min_sample,
        found: 0,
    })?;
    Ok((values, summary))
}

// =============================================================================
// Z-SCORE
// =============================================================================

/// Flags values more than `z_score_threshold` population standard deviations
/// from the mean.
pub struct ZScoreDetector;

impl Detector for ZScoreDetector {
    fn id(&self) -> &'static str {
        "zscore"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<AnomalyRecord> {
        let mut records = Vec::new();
        for column in ctx.schema.columns.iter().filter(|c| c.inferred_type.is_numeric()) {
            let (values, summary) = match usable_numeric(ctx, column) {
                Ok(v) => v,
                Err(reason) => {
                    log_skip(self.id(), &column.name, reason);
                    continue;
                }
            };
            if summary.z_score(summary.mean).is_none() {
                log_skip(self.id(), &column.name, DetectorSkipped::ZeroSpread);
                continue;
            }

            for (row, value, text) in values {
                let Some(z) = summary.z_score(value) else { continue };
                if z.abs() <= ctx.config.z_score_threshold {
                    continue;
                }
                let severity = if z.abs() > ctx.config.z_score_high {
                    Severity::High
                } else {
                    Severity::Medium
                };
                records.push(
                    AnomalyRecord::new(
                        row,
                        AnomalyKind::StatisticalOutlier,
                        severity,
                        format!(
                            "{} is {:.1} standard deviations from the mean {:.2}",
                            text, z, summary.mean
                        ),
                        self.id(),
                    )
                    .with_column(&column.name)
                    .with_value(text),
                );
            }
        }
        records
    }
}

// =============================================================================
// IQR
// =============================================================================

/// Flags values outside Tukey fences built from interpolated quartiles.
pub struct IqrDetector;

impl Detector for IqrDetector {
    fn id(&self) -> &'static str {
        "iqr"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<AnomalyRecord> {
        let mut records = Vec::new();
        for column in ctx.schema.columns.iter().filter(|c| c.inferred_type.is_numeric()) {
            let (values, summary) = match usable_numeric(ctx, column) {
                Ok(v) => v,
                Err(reason) => {
                    log_skip(self.id(), &column.name, reason);
                    continue;
                }
            };
            if summary.min == summary.max {
                log_skip(self.id(), &column.name, DetectorSkipped::ZeroSpread);
                continue;
            }

            let (lower, upper) = summary.fences(ctx.config.iqr_multiplier);
            for (row, value, text) in values {
                if !summary.is_outlier_iqr(value, ctx.config.iqr_multiplier) {
                    continue;
                }
                let severity = if summary.is_outlier_iqr(value, ctx.config.iqr_extreme_multiplier) {
                    Severity::High
                } else {
                    Severity::Medium
                };
                records.push(
                    AnomalyRecord::new(
                        row,
                        AnomalyKind::StatisticalOutlier,
                        severity,
                        format!("{} is outside the expected range [{}, {}]", text, lower, upper),
                        self.id(),
                    )
                    .with_column(&column.name)
                    .with_value(text),
                );
            }
        }
        records
    }
}

// =============================================================================
// BUSINESS RULES
// =============================================================================

/// Applies the name/type rule table: non-negative measures, historical dates,
/// plausible ages.
pub struct BusinessRuleDetector;

impl BusinessRuleDetector {
    fn check_numeric(
        &self,
        ctx: &DetectionContext<'_>,
        column: &ColumnProfile,
        rules: &[Rule],
        records: &mut Vec<AnomalyRecord>,
    ) {
        for (row, value, text) in ctx.numeric_values(column) {
            if rules.contains(&Rule::NonNegative) && value < 0.0 {
                records.push(
                    AnomalyRecord::new(
                        row,
                        AnomalyKind::NegativeValue,
                        Severity::Medium,
                        format!("{} cannot be negative, found {}", column.display_name, text),
                        self.id(),
                    )
                    .with_column(&column.name)
                    .with_value(text.clone()),
                );
            }
            if rules.contains(&Rule::PlausibleAge) && !(0.0..=ctx.config.max_age).contains(&value) {
                records.push(
                    AnomalyRecord::new(
                        row,
                        AnomalyKind::ImpossibleValue,
                        Severity::High,
                        format!(
                            "age {} is outside the plausible range 0-{}",
                            text, ctx.config.max_age
                        ),
                        self.id(),
                    )
                    .with_column(&column.name)
                    .with_value(text),
                );
            }
        }
    }

    fn check_dates(
        &self,
        ctx: &DetectionContext<'_>,
        column: &ColumnProfile,
        records: &mut Vec<AnomalyRecord>,
    ) {
        for (row, date, text) in ctx.date_values(column) {
            if date > ctx.as_of {
                records.push(
                    AnomalyRecord::new(
                        row,
                        AnomalyKind::FutureDate,
                        Severity::High,
                        format!(
                            "{} {} is after the processing date {}",
                            column.display_name, text, ctx.as_of
                        ),
                        self.id(),
                    )
                    .with_column(&column.name)
                    .with_value(text),
                );
            }
        }
    }
}

impl Detector for BusinessRuleDetector {
    fn id(&self) -> &'static str {
        "business_rules"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<AnomalyRecord> {
        let mut records = Vec::new();
        for column in &ctx.schema.columns {
            let rules = rules_for(column);
            if rules.is_empty() {
                continue;
            }
            if column.inferred_type.is_numeric() {
                self.check_numeric(ctx, column, &rules, &mut records);
            }
            if rules.contains(&Rule::Historical) {
                self.check_dates(ctx, column, &mut records);
            }
        }
        records
    }
}

// =============================================================================
// DUPLICATE ROWS
// =============================================================================

/// Flags every exact repeat of an earlier row.
pub struct DuplicateRowDetector;

impl Detector for DuplicateRowDetector {
    fn id(&self) -> &'static str {
        "duplicate_rows"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<AnomalyRecord> {
        let mut first_seen: HashMap<String, usize> = HashMap::new();
        let mut records = Vec::new();
        for row in 0..ctx.dataset.row_count() {
            let key = ctx.dataset.row_key(row);
            match first_seen.get(&key) {
                Some(&first) => records.push(AnomalyRecord::new(
                    row,
                    AnomalyKind::DuplicateRow,
                    Severity::Low,
                    format!("duplicate of row {}", first),
                    self.id(),
                )),
                None => {
                    first_seen.insert(key, row);
                }
            }
        }
        records
    }
}

// =============================================================================
// SPIKES
// =============================================================================

/// Flags periods whose record count jumps against the previous populated
/// period, bucketed on the first date column.
pub struct SpikeDetector;

impl SpikeDetector {
    fn bucket(date: NaiveDate, period: SpikePeriod) -> NaiveDate {
        match period {
            SpikePeriod::Day => date,
            SpikePeriod::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
            SpikePeriod::Month => date.with_day(1).unwrap_or(date),
        }
    }

    fn label(start: NaiveDate, period: SpikePeriod) -> String {
        match period {
            SpikePeriod::Day => start.format("%Y-%m-%d").to_string(),
            SpikePeriod::Week => start.format("%G-W%V").to_string(),
            SpikePeriod::Month => start.format("%Y-%m").to_string(),
        }
    }
}

impl Detector for SpikeDetector {
    fn id(&self) -> &'static str {
        "spike"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<AnomalyRecord> {
        let Some(column) = ctx.schema.columns_of_type(InferredType::Date).next() else {
            return Vec::new();
        };
        let dates = ctx.date_values(column);
        if dates.len() < ctx.config.min_sample {
            log_skip(
                self.id(),
                &column.name,
                DetectorSkipped::InsufficientSample {
                    needed: ctx.config.min_sample,
                    found: dates.len(),
                },
            );
            return Vec::new();
        }

        let period = ctx.config.spike_period;
        // bucket start -> (count, first row)
        let mut buckets: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
        for (row, date, _) in &dates {
            let entry = buckets.entry(Self::bucket(*date, period)).or_insert((0, *row));
            entry.0 += 1;
            entry.1 = entry.1.min(*row);
        }

        let mut records = Vec::new();
        let mut previous: Option<usize> = None;
        for (start, (count, first_row)) in buckets {
            if let Some(prev) = previous.filter(|&p| p > 0) {
                let growth = (count as f64 - prev as f64) / prev as f64;
                if growth > ctx.config.spike_ratio {
                    let label = Self::label(start, period);
                    records.push(
                        AnomalyRecord::new(
                            first_row,
                            AnomalyKind::SuddenSpike,
                            Severity::Medium,
                            format!(
                                "{} records in {} against {} in the previous period (+{:.0}%)",
                                count,
                                label,
                                prev,
                                growth * 100.0
                            ),
                            self.id(),
                        )
                        .with_column(&column.name)
                        .with_period(label),
                    );
                }
            }
            previous = Some(count);
        }
        records
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Runs the detector battery and merges the findings.
///
/// Findings are deduplicated on (row, column, kind), keeping the higher
/// severity and, on ties, the earlier detector. The result is ordered by
/// severity, then row, then evaluation order.
pub struct AnomalyDetector {
    config: DetectionConfig,
    detectors: Vec<Box<dyn Detector>>,
}

impl AnomalyDetector {
    /// Create a detector with all default detectors.
    pub fn new() -> Self {
        Self::with_config(DetectionConfig::default())
    }

    pub fn with_config(config: DetectionConfig) -> Self {
        Self {
            config,
            detectors: vec![
                Box::new(ZScoreDetector),
                Box::new(IqrDetector),
                Box::new(BusinessRuleDetector),
                Box::new(DuplicateRowDetector),
                Box::new(SpikeDetector),
            ],
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Identifiers of the detectors, in evaluation order.
    pub fn detector_ids(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.id()).collect()
    }

    pub fn detect(&self, dataset: &Dataset, schema: &SchemaProfile) -> Result<Vec<AnomalyRecord>> {
        if dataset.is_empty() {
            return Err(EngineError::EmptyDataset(
                "cannot detect anomalies without records".to_string(),
            ));
        }

        let ctx = DetectionContext {
            dataset,
            schema,
            config: &self.config,
            as_of: self.config.as_of.unwrap_or_else(|| Utc::now().date_naive()),
        };
        tracing::debug!(detectors = ?self.detector_ids(), as_of = %ctx.as_of, "Running anomaly detectors");

        let mut merged: IndexMap<(usize, Option<String>, AnomalyKind), AnomalyRecord> =
            IndexMap::new();
        let mut raw_count = 0;
        for detector in &self.detectors {
            for record in detector.detect(&ctx) {
                raw_count += 1;
                let key = (record.row_index, record.column.clone(), record.kind);
                match merged.get_mut(&key) {
                    Some(existing) if record.severity > existing.severity => *existing = record,
                    Some(_) => {}
                    None => {
                        merged.insert(key, record);
                    }
                }
            }
        }

        let mut records: Vec<AnomalyRecord> = merged.into_values().collect();
        records.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(a.row_index.cmp(&b.row_index))
        });

        tracing::info!(
            findings = records.len(),
            merged = raw_count - records.len(),
            high = records.iter().filter(|r| r.severity == Severity::High).count(),
            "Anomaly detection complete"
        );

        Ok(records)
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new()
    }
}
