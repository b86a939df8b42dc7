//! Example: analyze records handed over by an extraction step.
//!
//! Usage:
//!   cargo run --example analyze
//!   cargo run --example analyze -- <file_path>

use std::env;

use datalens::{Dataset, Engine, Record, Value};

fn sample_records() -> Vec<Record> {
    let rows: [(&str, &str, f64, &str); 6] = [
        ("Ann Lee", "ann@corp.com", 52000.0, "2019-03-01"),
        ("Bo Kim", "bo@corp.com", 48000.0, "2020-07-15"),
        ("Cy Park", "cy@corp", 51000.0, "2021-11-30"),
        ("Di Chen", "di@corp.com", -500.0, "2022-02-14"),
        ("Ed Wu", "ed@corp.com", 50000.0, "2099-01-01"),
        ("Bo Kim", "bo@corp.com", 48000.0, "2020-07-15"),
    ];

    rows.iter()
        .map(|(name, email, salary, hired)| {
            let mut record = Record::new();
            record.insert("name".to_string(), Value::from(*name));
            record.insert("email".to_string(), Value::from(*email));
            record.insert("salary".to_string(), Value::from(*salary));
            record.insert("hire_date".to_string(), Value::from(*hired));
            record
        })
        .collect()
}

fn main() -> datalens::Result<()> {
    let engine = Engine::new();

    let result = match env::args().nth(1) {
        Some(path) => engine.analyze_file(path)?,
        None => engine.analyze(&Dataset::from_records(sample_records())?)?,
    };

    let separator = "=".repeat(60);
    println!("{}", separator);
    println!("Snapshot {}", result.fingerprint);
    println!("{}", separator);

    println!("\n## Schema ({} columns)", result.schema.columns.len());
    for col in &result.schema.columns {
        println!(
            "  {:16} {:16} confidence={:.2} nulls={}",
            col.display_name, col.inferred_type, col.confidence, col.null_count
        );
    }

    println!("\n## Anomalies ({})", result.anomalies.len());
    for a in &result.anomalies {
        println!(
            "  [{}] row {} {}: {}",
            a.severity,
            a.row_index,
            a.column.as_deref().unwrap_or("-"),
            a.detail
        );
    }

    println!("\n## Quality {}/100", result.quality.composite_score);
    for rec in &result.quality.recommendations {
        println!("  - {} -> {}", rec.issue, rec.action);
    }

    Ok(())
}
