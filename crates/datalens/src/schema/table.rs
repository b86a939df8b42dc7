//! Dataset-level schema profile.

use serde::{Deserialize, Serialize};

use super::column::ColumnProfile;
use super::types::{InferredType, RelationshipKind, Structure};

/// A hint that two columns are related.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub column_a: String,
    pub column_b: String,
    pub kind: RelationshipKind,
    /// Pearson coefficient for `correlated_with` hints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coefficient: Option<f64>,
}

/// Inferred structural description of a dataset.
///
/// Built once per dataset; a replaced dataset gets a fresh profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaProfile {
    /// Profiles in dataset column order.
    pub columns: Vec<ColumnProfile>,
    /// Delimiter of the raw text, when one was consistent enough.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_delimiter: Option<char>,
    pub detected_structure: Structure,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
    /// Best primary-key candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
}

impl SchemaProfile {
    /// Create a profile with the given columns and default structure hints.
    pub fn with_columns(columns: Vec<ColumnProfile>) -> Self {
        Self {
            columns,
            detected_delimiter: None,
            detected_structure: Structure::Tabular,
            relationships: Vec::new(),
            primary_key: None,
        }
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get all column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Columns of the given inferred type, in order.
    pub fn columns_of_type(&self, ty: InferredType) -> impl Iterator<Item = &ColumnProfile> {
        self.columns.iter().filter(move |c| c.inferred_type == ty)
    }

    /// Relationships of one kind.
    pub fn relationships_of(&self, kind: RelationshipKind) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter().filter(move |r| r.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relationship(a: &str, b: &str, kind: RelationshipKind) -> Relationship {
        Relationship {
            column_a: a.to_string(),
            column_b: b.to_string(),
            kind,
            coefficient: None,
        }
    }

    #[test]
    fn test_relationships_of_filters_by_kind() {
        let mut schema = SchemaProfile::with_columns(vec![
            ColumnProfile::new("full", 0),
            ColumnProfile::new("first", 1),
            ColumnProfile::new("height", 2),
            ColumnProfile::new("weight", 3),
        ]);
        schema.relationships = vec![
            relationship("full", "first", RelationshipKind::DerivedFrom),
            relationship("height", "weight", RelationshipKind::CorrelatedWith),
        ];

        let derived: Vec<_> = schema.relationships_of(RelationshipKind::DerivedFrom).collect();
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].column_b, "first");
        assert_eq!(schema.relationships_of(RelationshipKind::CorrelatedWith).count(), 1);
        assert_eq!(schema.column_names(), vec!["full", "first", "height", "weight"]);
    }
}
