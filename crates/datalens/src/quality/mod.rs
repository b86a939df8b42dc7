//! Data quality scoring.

mod report;
mod scorer;
mod validators;

pub use report::{ColumnQuality, Priority, QualityReport, Recommendation, RiskLevel};
pub use scorer::QualityScorer;
pub use validators::{luhn_valid, validity_check, verhoeff_valid, ValidityCheck};
