//! Column profile definition.

use serde::{Deserialize, Serialize};

use super::types::InferredType;

/// Inferred profile for a single column.
///
/// Immutable once the learner hands it out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// Column name.
    pub name: String,
    /// Cleaned, human-friendly rendering of the name.
    pub display_name: String,
    /// Zero-based position in the dataset header.
    pub position: usize,
    /// Inferred semantic type.
    pub inferred_type: InferredType,
    /// Number of null/missing values.
    pub null_count: usize,
    /// Number of distinct non-null values.
    pub distinct_count: usize,
    /// A few distinct values for display.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sample_values: Vec<String>,
    /// Dominant format within the type: date pattern, phone digit count,
    /// currency symbol, id scheme, boolean vocabulary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_format: Option<String>,
    /// Match rate of the winning detector (0.0-1.0).
    pub confidence: f64,
}

impl ColumnProfile {
    /// Create a new column profile with basic information.
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        let name = name.into();
        Self {
            display_name: suggest_display_name(&name),
            name,
            position,
            inferred_type: InferredType::FreeText,
            null_count: 0,
            distinct_count: 0,
            sample_values: Vec::new(),
            detected_format: None,
            confidence: 0.0,
        }
    }

    /// Share of nulls over `row_count` rows.
    pub fn null_ratio(&self, row_count: usize) -> f64 {
        if row_count == 0 {
            0.0
        } else {
            self.null_count as f64 / row_count as f64
        }
    }
}

/// Turn a raw extracted header into a title-cased display name.
///
/// `"  hire_date (yyyy)"` becomes `"Hire Date Yyyy"`.
pub fn suggest_display_name(raw: &str) -> String {
    raw.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
