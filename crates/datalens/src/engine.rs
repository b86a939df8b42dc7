//! Main engine struct and public API.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::detection::{AnomalyDetector, AnomalyRecord, AnomalySummary};
use crate::error::Result;
use crate::inference::SchemaLearner;
use crate::input::{Dataset, Parser, ParserConfig, SourceMetadata};
use crate::quality::{QualityReport, QualityScorer};
use crate::schema::SchemaProfile;

/// Result of a full analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Metadata about the source file, when analyzed from disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMetadata>,
    /// SHA-256 of the analyzed dataset snapshot.
    pub fingerprint: String,
    pub schema: SchemaProfile,
    /// Findings, most severe first.
    pub anomalies: Vec<AnomalyRecord>,
    pub quality: QualityReport,
    pub summary: AnomalySummary,
}

/// Runs schema inference, anomaly detection and quality scoring in order.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
    parser: ParserConfig,
}

impl Engine {
    /// Create an engine with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            parser: ParserConfig::default(),
        }
    }

    /// Override how files are tabulated by [`Engine::analyze_file`].
    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn learner(&self) -> SchemaLearner {
        SchemaLearner::with_config(self.config.learner.clone())
    }

    pub fn detector(&self) -> AnomalyDetector {
        AnomalyDetector::with_config(self.config.detection.clone())
    }

    pub fn scorer(&self) -> QualityScorer {
        QualityScorer::with_config(self.config.quality.clone())
    }

    /// Analyze an in-memory dataset.
    pub fn analyze(&self, dataset: &Dataset) -> Result<AnalysisResult> {
        let schema = self.learner().infer(dataset)?;
        let anomalies = self.detector().detect(dataset, &schema)?;
        let quality = self.scorer().score(dataset, &schema, &anomalies)?;
        let summary = AnomalySummary::from_records(&anomalies);

        Ok(AnalysisResult {
            source: None,
            fingerprint: dataset.fingerprint(),
            schema,
            anomalies,
            quality,
            summary,
        })
    }

    /// Load a delimited text file and analyze it.
    pub fn analyze_file(&self, path: impl AsRef<Path>) -> Result<AnalysisResult> {
        let path = path.as_ref();
        let (dataset, source) = Parser::with_config(self.parser.clone()).parse_file(path)?;
        tracing::info!(
            file = %source.file,
            format = %source.format,
            rows = source.row_count,
            "Loaded data file"
        );

        let mut result = self.analyze(&dataset)?;
        result.source = Some(source);
        Ok(result)
    }
}

/// Infer a schema with default settings.
pub fn infer(dataset: &Dataset) -> Result<SchemaProfile> {
    SchemaLearner::new().infer(dataset)
}

/// Detect anomalies with default settings.
pub fn detect(dataset: &Dataset, schema: &SchemaProfile) -> Result<Vec<AnomalyRecord>> {
    AnomalyDetector::new().detect(dataset, schema)
}

/// Score quality with default settings.
pub fn score(
    dataset: &Dataset,
    schema: &SchemaProfile,
    anomalies: &[AnomalyRecord],
) -> Result<QualityReport> {
    QualityScorer::new().score(dataset, schema, anomalies)
}
