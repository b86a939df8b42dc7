//! Anomaly detection: statistical outliers, business rules, duplicates and
//! volume spikes.

mod detectors;
mod record;
mod rules;

pub use detectors::{
    AnomalyDetector, BusinessRuleDetector, DetectionContext, Detector, DuplicateRowDetector,
    IqrDetector, SpikeDetector, ZScoreDetector,
};
pub use record::{AnomalyKind, AnomalyRecord, AnomalySummary, Severity};
pub use rules::{rules_for, Rule, TypeClass};
