//! Integration tests for datalens.

use std::io::Write;

use chrono::NaiveDate;
use tempfile::NamedTempFile;

use datalens::{
    detect, infer, score, AnomalyDetector, AnomalyKind, DetectionConfig, Dataset, Engine,
    EngineConfig, EngineError, InferredType, RiskLevel, Severity, Structure, Value,
};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn text_dataset(headers: &[&str], rows: &[Vec<&str>]) -> Dataset {
    Dataset::new(
        headers.iter().map(|h| h.to_string()).collect(),
        rows.iter()
            .map(|r| r.iter().map(|v| Value::from(*v)).collect())
            .collect(),
    )
    .expect("valid dataset")
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn fixed_detector() -> AnomalyDetector {
    AnomalyDetector::with_config(DetectionConfig::default().with_as_of(as_of()))
}

// =============================================================================
// Reference Scenarios
// =============================================================================

#[test]
fn test_salary_outlier_reported_once() {
    let mut rows: Vec<Vec<String>> = (0..9).map(|i| vec![(i + 1).to_string(), "50000".to_string()]).collect();
    rows.push(vec!["10".to_string(), "5000000".to_string()]);
    let rows: Vec<Vec<&str>> = rows.iter().map(|r| r.iter().map(String::as_str).collect()).collect();
    let dataset = text_dataset(&["id", "salary"], &rows);

    let schema = infer(&dataset).unwrap();
    assert_eq!(schema.get_column("salary").unwrap().inferred_type, InferredType::Integer);

    let anomalies = fixed_detector().detect(&dataset, &schema).unwrap();
    let salary: Vec<_> = anomalies
        .iter()
        .filter(|a| a.column.as_deref() == Some("salary"))
        .collect();

    assert_eq!(salary.len(), 1);
    assert_eq!(salary[0].row_index, 9);
    assert_eq!(salary[0].kind, AnomalyKind::StatisticalOutlier);
    assert_eq!(salary[0].severity, Severity::High);
    assert_eq!(salary[0].value.as_deref(), Some("5000000"));
}

#[test]
fn test_future_hire_date_flagged() {
    let dataset = text_dataset(
        &["name", "hire_date"],
        &[
            vec!["Ann", "2019-03-01"],
            vec!["Bo", "2020-07-15"],
            vec!["Cy", "2021-11-30"],
            vec!["Di", "2022-02-14"],
            vec!["Ed", "2025-06-01"],
        ],
    );

    let schema = infer(&dataset).unwrap();
    let column = schema.get_column("hire_date").unwrap();
    assert_eq!(column.inferred_type, InferredType::Date);
    assert_eq!(column.detected_format.as_deref(), Some("%Y-%m-%d"));

    let anomalies = fixed_detector().detect(&dataset, &schema).unwrap();
    let future: Vec<_> = anomalies
        .iter()
        .filter(|a| a.kind == AnomalyKind::FutureDate)
        .collect();
    assert_eq!(future.len(), 1);
    assert_eq!(future[0].row_index, 4);
    assert_eq!(future[0].severity, Severity::High);
    assert_eq!(future[0].column.as_deref(), Some("hire_date"));
}

#[test]
fn test_mostly_email_column_falls_back_to_free_text() {
    let dataset = text_dataset(&["contact"], &[vec!["a@b.com"], vec!["c@d.com"], vec!["not-an-email"]]);
    let schema = infer(&dataset).unwrap();
    let column = &schema.columns[0];
    assert_eq!(column.inferred_type, InferredType::FreeText);
    assert_eq!(column.distinct_count, 3);
}

#[test]
fn test_duplicate_pair_is_high_risk() {
    let dataset = text_dataset(
        &["id", "city"],
        &[
            vec!["1", "Leeds"],
            vec!["2", "York"],
            vec!["2", "York"],
            vec!["3", "Hull"],
            vec!["4", "Bath"],
        ],
    );
    let schema = infer(&dataset).unwrap();
    let anomalies = fixed_detector().detect(&dataset, &schema).unwrap();
    let report = score(&dataset, &schema, &anomalies).unwrap();

    assert!((report.duplicate_ratio - 0.2).abs() < 1e-12);
    assert_eq!(report.duplicate_risk, RiskLevel::High);

    let duplicates: Vec<_> = anomalies
        .iter()
        .filter(|a| a.kind == AnomalyKind::DuplicateRow)
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].row_index, 2);
    assert_eq!(duplicates[0].severity, Severity::Low);
}

// =============================================================================
// Error Handling
// =============================================================================

#[test]
fn test_empty_dataset_errors() {
    let dataset = text_dataset(&["a"], &[]);
    let err = infer(&dataset).unwrap_err();
    assert!(matches!(err, EngineError::EmptyDataset(_)));
    assert_eq!(err.user_message(), "Upload data before running analysis.");

    let schema = infer(&text_dataset(&["a"], &[vec!["1"]])).unwrap();
    assert!(matches!(detect(&dataset, &schema), Err(EngineError::EmptyDataset(_))));
}

#[test]
fn test_score_detects_schema_drift() {
    let original = text_dataset(&["id", "name"], &[vec!["1", "Ann"], vec!["2", "Bo"]]);
    let schema = infer(&original).unwrap();

    let replaced = text_dataset(&["id", "full_name"], &[vec!["1", "Ann Lee"]]);
    let err = score(&replaced, &schema, &[]).unwrap_err();
    match &err {
        EngineError::SchemaMismatch { missing, unexpected } => {
            assert_eq!(missing, &vec!["name".to_string()]);
            assert_eq!(unexpected, &vec!["full_name".to_string()]);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err.user_message().contains("re-run detection"));
}

#[test]
fn test_malformed_column_does_not_abort() {
    let dataset = text_dataset(
        &["garbled", "qty"],
        &[
            vec!["\u{fffd}\u{fffd}", "1"],
            vec!["\u{fffd}x", "2"],
            vec!["ok", "3"],
        ],
    );
    let schema = infer(&dataset).unwrap();
    assert_eq!(schema.columns[0].inferred_type, InferredType::FreeText);
    assert_eq!(schema.columns[0].confidence, 0.0);
    assert_eq!(schema.columns[1].inferred_type, InferredType::Integer);
}

// =============================================================================
// File Loading
// =============================================================================

#[test]
fn test_analyze_csv_file() {
    let content = "emp_id,name,email,hire_date,salary\n\
                   1,Ann Lee,ann@corp.com,2019-03-01,52000\n\
                   2,Bo Kim,bo@corp.com,2020-07-15,48000\n\
                   3,Cy Park,cy@corp.com,2021-11-30,51000\n\
                   4,Di Chen,di@corp.com,2022-02-14,-500\n";
    let file = create_test_file(content);

    let config = EngineConfig::default().with_detection(DetectionConfig::default().with_as_of(as_of()));
    let result = Engine::with_config(config)
        .analyze_file(file.path())
        .expect("Analysis failed");

    let source = result.source.as_ref().unwrap();
    assert_eq!(source.format, "csv");
    assert_eq!(source.row_count, 4);
    assert_eq!(source.column_count, 5);

    assert_eq!(result.schema.detected_delimiter, Some(','));
    assert_eq!(result.schema.detected_structure, Structure::Tabular);
    assert_eq!(result.schema.primary_key.as_deref(), Some("emp_id"));
    assert_eq!(result.schema.get_column("email").unwrap().inferred_type, InferredType::Email);
    assert_eq!(result.schema.get_column("hire_date").unwrap().display_name, "Hire Date");

    assert!(result
        .anomalies
        .iter()
        .any(|a| a.kind == AnomalyKind::NegativeValue && a.row_index == 3));
    assert_eq!(result.summary.total, result.anomalies.len());
}

#[test]
fn test_semicolon_file() {
    let content = "id;amount\n1;10\n2;12\n3;11\n";
    let file = create_test_file(content);
    let result = Engine::new().analyze_file(file.path()).unwrap();
    assert_eq!(result.source.unwrap().format, "csv-semicolon");
    assert_eq!(result.schema.detected_delimiter, Some(';'));
}

#[test]
fn test_key_value_file() {
    let content = "Name: Ann\nAge: 31\n\nName: Bo\nAge: 40\n\nName: Cy\nAge: 27\n";
    let file = create_test_file(content);
    let result = Engine::new().analyze_file(file.path()).unwrap();
    assert_eq!(result.schema.detected_structure, Structure::KeyValue);
    assert_eq!(result.schema.column_names(), vec!["Name", "Age"]);
    assert_eq!(result.schema.get_column("Age").unwrap().inferred_type, InferredType::Integer);
}

#[test]
fn test_missing_file() {
    let err = Engine::new().analyze_file("/nonexistent/data.csv").unwrap_err();
    assert!(matches!(err, EngineError::Io { .. }));
}

#[test]
fn test_config_file_applies() {
    let config_file = create_test_file(r#"{"detection": {"as_of": "2024-06-01", "spike_ratio": 0.5}}"#);
    let config = EngineConfig::from_json_file(config_file.path()).unwrap();
    assert_eq!(config.detection.as_of, Some(as_of()));
    assert_eq!(config.detection.spike_ratio, 0.5);
    assert_eq!(config.learner.match_threshold, 0.8);
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_analyze_is_repeatable() {
    let dataset = text_dataset(
        &["id", "score", "joined"],
        &[
            vec!["1", "10", "2024-01-03"],
            vec!["2", "11", "2024-01-09"],
            vec!["3", "9", "2024-02-11"],
            vec!["4", "250", "2024-02-12"],
            vec!["5", "10", "2024-02-13"],
            vec!["6", "12", "2024-02-20"],
            vec!["7", "-3", "2024-02-21"],
        ],
    );
    let engine = Engine::with_config(
        EngineConfig::default().with_detection(DetectionConfig::default().with_as_of(as_of())),
    );
    let first = engine.analyze(&dataset).unwrap();
    let second = engine.analyze(&dataset).unwrap();
    assert_eq!(first, second);

    let severities: Vec<Severity> = first.anomalies.iter().map(|a| a.severity).collect();
    let mut sorted = severities.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(severities, sorted);
}
