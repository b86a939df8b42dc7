//! Core type definitions for schema representation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic type inferred for a column.
///
/// Shared by the learner, the scorer and the detector so all three agree on
/// what a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferredType {
    /// Whole numbers (no decimal point).
    Integer,
    /// Floating-point numbers.
    Float,
    /// Amounts carrying a currency symbol or code.
    Currency,
    /// Numbers with a `%` suffix.
    Percentage,
    /// Calendar dates, optionally with a time component.
    Date,
    Email,
    Phone,
    /// Government identifiers (SSN, NINO, Aadhaar, PAN).
    NationalId,
    /// Boolean literals (true/false, yes/no).
    Boolean,
    /// Low-cardinality text.
    CategoricalText,
    /// Anything else.
    FreeText,
}

impl InferredType {
    /// Returns true if values of this type carry a numeric magnitude.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            InferredType::Integer
                | InferredType::Float
                | InferredType::Currency
                | InferredType::Percentage
        )
    }

    /// Returns true if this type is temporal.
    pub fn is_temporal(&self) -> bool {
        matches!(self, InferredType::Date)
    }

    /// Returns true if this type is unstructured text.
    pub fn is_text(&self) -> bool {
        matches!(self, InferredType::CategoricalText | InferredType::FreeText)
    }

    /// Snake-case label, matching the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            InferredType::Integer => "integer",
            InferredType::Float => "float",
            InferredType::Currency => "currency",
            InferredType::Percentage => "percentage",
            InferredType::Date => "date",
            InferredType::Email => "email",
            InferredType::Phone => "phone",
            InferredType::NationalId => "national_id",
            InferredType::Boolean => "boolean",
            InferredType::CategoricalText => "categorical_text",
            InferredType::FreeText => "free_text",
        }
    }
}

impl Default for InferredType {
    fn default() -> Self {
        InferredType::FreeText
    }
}

impl fmt::Display for InferredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Layout of the pre-tabulation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Structure {
    /// One delimiter splits every line into the same number of fields.
    Tabular,
    /// `key: value` lines.
    KeyValue,
    /// No delimiter is consistent enough; downstream needs regex extraction.
    Mixed,
}

impl Default for Structure {
    fn default() -> Self {
        Structure::Tabular
    }
}

/// Kind of inter-column relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// `column_a` is a concatenation involving `column_b`.
    DerivedFrom,
    /// Numeric columns move together.
    CorrelatedWith,
}
