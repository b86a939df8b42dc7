//! Schema learner: per-column type inference plus dataset-level hints.

use indexmap::IndexSet;

use crate::config::LearnerConfig;
use crate::error::{DetectorSkipped, EngineError, Result};
use crate::input::Dataset;
use crate::schema::{ColumnProfile, InferredType, SchemaProfile, Structure};

use super::detectors::TYPE_BATTERY;
use super::relationships::{find_primary_key, find_relationships};
use super::structure::detect_structure;

/// Infers a [`SchemaProfile`] from a dataset.
///
/// Stateless between calls: the same dataset always yields the same profile.
#[derive(Debug, Clone, Default)]
pub struct SchemaLearner {
    config: LearnerConfig,
}

impl SchemaLearner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LearnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    /// Profile every column and derive structure, relationships and key.
    ///
    /// Fails only on an empty dataset. A column that cannot be typed falls
    /// back to free text and never aborts the profile.
    pub fn infer(&self, dataset: &Dataset) -> Result<SchemaProfile> {
        if dataset.is_empty() {
            return Err(EngineError::EmptyDataset(
                "cannot infer a schema without records".to_string(),
            ));
        }

        let columns: Vec<ColumnProfile> = dataset
            .headers()
            .iter()
            .enumerate()
            .map(|(idx, name)| self.profile_column(dataset, idx, name))
            .collect();

        let (detected_delimiter, detected_structure) = match dataset.raw_text() {
            Some(text) => {
                let detection = detect_structure(
                    text,
                    self.config.structure_sample_lines,
                    self.config.structure_consistency,
                );
                (detection.delimiter, detection.structure)
            }
            None => (None, Structure::Tabular),
        };

        let relationships =
            find_relationships(dataset, &columns, self.config.correlation_threshold);
        let primary_key = find_primary_key(dataset, &columns);

        tracing::info!(
            rows = dataset.row_count(),
            columns = columns.len(),
            relationships = relationships.len(),
            primary_key = ?primary_key,
            "Schema inferred"
        );

        Ok(SchemaProfile {
            columns,
            detected_delimiter,
            detected_structure,
            relationships,
            primary_key,
        })
    }

    fn profile_column(&self, dataset: &Dataset, idx: usize, name: &str) -> ColumnProfile {
        let mut profile = ColumnProfile::new(name, idx);

        let values: Vec<String> = dataset
            .column_values(idx)
            .filter(|v| !v.is_null())
            .map(|v| v.as_text().into_owned())
            .collect();

        profile.null_count = dataset.row_count() - values.len();

        let distinct: IndexSet<&str> = values.iter().map(String::as_str).collect();
        profile.distinct_count = distinct.len();
        profile.sample_values = distinct
            .iter()
            .take(self.config.display_samples)
            .map(|s| s.to_string())
            .collect();

        let sample: Vec<&str> = values
            .iter()
            .take(self.config.sample_size)
            .map(String::as_str)
            .collect();

        if let Some(reason) = unusable_sample(&sample) {
            tracing::debug!(column = name, %reason, "Column falls back to free text");
            profile.inferred_type = InferredType::FreeText;
            profile.confidence = 0.0;
            return profile;
        }

        let mut best_rate: f64 = 0.0;
        for detector in TYPE_BATTERY.iter() {
            let rate = detector.match_rate(&sample);
            best_rate = best_rate.max(rate);
            if rate < self.config.match_threshold {
                continue;
            }

            let (ty, confidence) = if detector.inferred_type == InferredType::Integer {
                promote_integer(&sample, rate)
            } else {
                (detector.inferred_type, rate)
            };
            profile.inferred_type = ty;
            profile.confidence = confidence;
            profile.detected_format = (detector.format)(&sample);
            return profile;
        }

        let ratio = profile.distinct_count as f64 / dataset.row_count() as f64;
        profile.inferred_type = if ratio < self.config.categorical_ratio {
            InferredType::CategoricalText
        } else {
            InferredType::FreeText
        };
        profile.confidence = 1.0 - best_rate;
        profile
    }
}

/// Integer winners become floats when the float detector sees strictly more.
fn promote_integer(sample: &[&str], integer_rate: f64) -> (InferredType, f64) {
    let float_rate = TYPE_BATTERY
        .iter()
        .find(|d| d.inferred_type == InferredType::Float)
        .map(|d| d.match_rate(sample))
        .unwrap_or(0.0);
    if float_rate > integer_rate {
        (InferredType::Float, float_rate)
    } else {
        (InferredType::Integer, integer_rate)
    }
}

fn is_malformed(value: &str) -> bool {
    value
        .chars()
        .any(|c| c == '\u{fffd}' || (c.is_control() && c != '\t'))
}

/// Why a sample cannot be typed at all, if it cannot.
fn unusable_sample(sample: &[&str]) -> Option<DetectorSkipped> {
    if sample.is_empty() {
        return Some(DetectorSkipped::InsufficientSample {
            needed: 1,
            found: 0,
        });
    }
    let malformed = sample.iter().filter(|v| is_malformed(v)).count();
    if malformed * 2 > sample.len() {
        return Some(DetectorSkipped::Malformed(format!(
            "{} of {} sampled values",
            malformed,
            sample.len()
        )));
    }
    None
}
