//! datalens: data intelligence engine for tabular data recovered from documents.
//!
//! Three components share one notion of column type:
//!
//! - **Schema learner**: infers per-column semantic types, the delimiter and
//!   layout of the raw text, and hints about related columns.
//! - **Anomaly detector**: statistical outliers, business-rule violations,
//!   duplicate rows and volume spikes, deduplicated and ranked by severity.
//! - **Quality scorer**: completeness, consistency, validity, duplicate and
//!   anomaly risk, folded into a 0-100 composite score.
//!
//! Detection runs before scoring because the anomaly risk depends on it.
//! No component mutates the dataset.
//!
//! # Example
//!
//! ```no_run
//! use datalens::Engine;
//!
//! let result = Engine::new().analyze_file("employees.csv").unwrap();
//!
//! println!("Quality: {}/100", result.quality.composite_score);
//! for anomaly in &result.anomalies {
//!     println!("row {}: {} ({})", anomaly.row_index, anomaly.detail, anomaly.severity);
//! }
//! ```

pub mod config;
pub mod detection;
pub mod error;
pub mod inference;
pub mod input;
pub mod quality;
pub mod schema;
pub mod stats;

mod engine;

pub use crate::engine::{detect, infer, score, AnalysisResult, Engine};
pub use config::{DetectionConfig, EngineConfig, LearnerConfig, QualityConfig, SpikePeriod};
pub use detection::{AnomalyDetector, AnomalyKind, AnomalyRecord, AnomalySummary, Severity};
pub use error::{EngineError, Result};
pub use inference::SchemaLearner;
pub use input::{Dataset, Parser, Record, SourceMetadata, Value};
pub use quality::{QualityReport, QualityScorer, RiskLevel};
pub use schema::{ColumnProfile, InferredType, RelationshipKind, SchemaProfile, Structure};
