//! Schema command - print the inferred schema.

use std::path::PathBuf;

use colored::Colorize;
use datalens::{RelationshipKind, SchemaLearner};

use super::{explain, load};

pub fn run(file: PathBuf, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (dataset, source) = load(&file)?;
    let schema = SchemaLearner::new().infer(&dataset).map_err(explain)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    println!(
        "{} {} ({:?}, delimiter {})",
        "Schema for".cyan().bold(),
        source.file.white(),
        schema.detected_structure,
        schema
            .detected_delimiter
            .map(|d| format!("{:?}", d))
            .unwrap_or_else(|| "none".to_string())
    );
    println!();

    for col in &schema.columns {
        println!(
            "  {:24} {:18} {:>5.0}%  nulls {:>5.1}% distinct {:<5} {}",
            col.display_name,
            col.inferred_type.label(),
            col.confidence * 100.0,
            col.null_ratio(dataset.row_count()) * 100.0,
            col.distinct_count,
            col.detected_format.as_deref().unwrap_or("").dimmed()
        );
    }

    if let Some(key) = &schema.primary_key {
        println!();
        println!("{} {}", "Primary key:".yellow().bold(), key);
    }
    let derived: Vec<_> = schema.relationships_of(RelationshipKind::DerivedFrom).collect();
    if !derived.is_empty() {
        println!();
        println!("{}", "Derived columns:".yellow().bold());
        for rel in derived {
            println!("  {} <- {}", rel.column_a, rel.column_b);
        }
    }
    let correlated: Vec<_> = schema.relationships_of(RelationshipKind::CorrelatedWith).collect();
    if !correlated.is_empty() {
        println!();
        println!("{}", "Correlated columns:".yellow().bold());
        for rel in correlated {
            let coefficient = rel.coefficient.map(|r| format!("{:.2}", r)).unwrap_or_default();
            println!("  {} ~ {} (r = {})", rel.column_a, rel.column_b, coefficient);
        }
    }

    Ok(())
}
