//! Business-rule lookup table keyed on column name and type class.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::{ColumnProfile, InferredType};

/// A rule applied to every value of a matching column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Measures that cannot go below zero.
    NonNegative,
    /// Dates of past events, which cannot lie after the processing date.
    Historical,
    /// Ages must fall within a human lifespan.
    PlausibleAge,
}

/// Broad type family a rule entry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    Numeric,
    Temporal,
}

impl TypeClass {
    pub fn admits(&self, ty: InferredType) -> bool {
        match self {
            TypeClass::Numeric => ty.is_numeric(),
            TypeClass::Temporal => ty.is_temporal(),
        }
    }
}

struct RuleEntry {
    pattern: Regex,
    class: TypeClass,
    rules: &'static [Rule],
}

static RULE_TABLE: Lazy<Vec<RuleEntry>> = Lazy::new(|| {
    vec![
        RuleEntry {
            pattern: Regex::new(r"(?i)(^|[_\s-])age($|[_\s-])").unwrap(),
            class: TypeClass::Numeric,
            rules: &[Rule::NonNegative, Rule::PlausibleAge],
        },
        RuleEntry {
            pattern: Regex::new(
                r"(?i)salary|wage|pay|price|cost|amount|revenue|headcount|count|quantity|qty",
            )
            .unwrap(),
            class: TypeClass::Numeric,
            rules: &[Rule::NonNegative],
        },
        RuleEntry {
            pattern: Regex::new(
                r"(?i)hire|join|birth|dob|start|created|signup|registered|onboard",
            )
            .unwrap(),
            class: TypeClass::Temporal,
            rules: &[Rule::Historical],
        },
    ]
});

/// Rules that apply to a column, in table order without repeats.
pub fn rules_for(column: &ColumnProfile) -> Vec<Rule> {
    let mut rules = Vec::new();
    for entry in RULE_TABLE.iter() {
        if entry.class.admits(column.inferred_type) && entry.pattern.is_match(&column.name) {
            for rule in entry.rules {
                if !rules.contains(rule) {
                    rules.push(*rule);
                }
            }
        }
    }
    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, ty: InferredType) -> ColumnProfile {
        let mut c = ColumnProfile::new(name, 0);
        c.inferred_type = ty;
        c
    }

    #[test]
    fn test_age_rules() {
        assert_eq!(
            rules_for(&column("age", InferredType::Integer)),
            vec![Rule::NonNegative, Rule::PlausibleAge]
        );
        assert_eq!(
            rules_for(&column("Patient Age", InferredType::Integer)),
            vec![Rule::NonNegative, Rule::PlausibleAge]
        );
        assert!(rules_for(&column("page_views", InferredType::Integer)).is_empty());
    }

    #[test]
    fn test_type_class_gates_rules() {
        assert_eq!(rules_for(&column("salary", InferredType::Currency)), vec![Rule::NonNegative]);
        assert!(rules_for(&column("salary", InferredType::FreeText)).is_empty());
        assert_eq!(rules_for(&column("hire_date", InferredType::Date)), vec![Rule::Historical]);
        assert!(rules_for(&column("hire_date", InferredType::Integer)).is_empty());
    }
}
