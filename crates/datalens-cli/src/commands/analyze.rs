//! Analyze command - run the full pipeline over a data file.

use std::path::PathBuf;

use chrono::NaiveDate;
use colored::{ColoredString, Colorize};
use datalens::input::ParserConfig;
use datalens::{AnalysisResult, Engine, EngineConfig, RiskLevel, Severity};

use super::explain;

pub struct AnalyzeArgs {
    pub file: PathBuf,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub top: usize,
    pub as_of: Option<NaiveDate>,
    pub delimiter: Option<char>,
    pub max_rows: Option<usize>,
}

impl AnalyzeArgs {
    pub fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.file.exists() {
            return Err(format!("File not found: {}", self.file.display()).into());
        }

        let mut config = match &self.config {
            Some(path) => EngineConfig::from_json_file(path).map_err(explain)?,
            None => EngineConfig::default(),
        };
        if let Some(date) = self.as_of {
            config.detection = config.detection.with_as_of(date);
        }
        let parser = self.parser_config()?;
        tracing::debug!(as_of = ?config.detection.as_of, delimiter = ?parser.delimiter, "Engine configured");

        let result = Engine::with_config(config)
            .with_parser(parser)
            .analyze_file(&self.file)
            .map_err(explain)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            return Ok(());
        }

        print_report(&result, self.top);
        Ok(())
    }

    fn parser_config(&self) -> Result<ParserConfig, Box<dyn std::error::Error>> {
        let delimiter = match self.delimiter {
            Some(c) if c.is_ascii() => Some(c as u8),
            Some(c) => return Err(format!("Delimiter must be a single ASCII character, got {:?}", c).into()),
            None => None,
        };
        Ok(ParserConfig {
            delimiter,
            max_rows: self.max_rows,
            ..ParserConfig::default()
        })
    }
}

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::High => "HIGH".red().bold(),
        Severity::Medium => "MED ".yellow(),
        Severity::Low => "LOW ".blue(),
    }
}

fn risk_label(risk: RiskLevel) -> ColoredString {
    match risk {
        RiskLevel::High => risk.label().red(),
        RiskLevel::Medium => risk.label().yellow(),
        RiskLevel::Low => risk.label().green(),
    }
}

fn print_report(result: &AnalysisResult, top: usize) {
    if let Some(source) = &result.source {
        println!(
            "{} {} ({}, {} rows x {} columns)",
            "Analyzed".cyan().bold(),
            source.file.white(),
            source.format,
            source.row_count,
            source.column_count
        );
    }
    println!();

    let quality = &result.quality;
    let score = quality.composite_score.to_string();
    let score = if quality.composite_score >= 80 {
        score.green().bold()
    } else if quality.composite_score >= 60 {
        score.yellow().bold()
    } else {
        score.red().bold()
    };
    println!("{} {}/100", "Quality score:".yellow().bold(), score);
    println!("  Completeness: {:.1}%", quality.completeness * 100.0);
    println!("  Consistency:  {:.1}%", quality.consistency * 100.0);
    println!("  Validity:     {:.1}%", quality.validity * 100.0);
    println!(
        "  Duplicates:   {:.1}% ({} risk)",
        quality.duplicate_ratio * 100.0,
        risk_label(quality.duplicate_risk)
    );
    println!(
        "  Anomalies:    {:.1}% ({} risk)",
        quality.anomaly_ratio * 100.0,
        risk_label(quality.anomaly_risk)
    );
    println!();

    let summary = &result.summary;
    println!(
        "Found {} anomalies ({} high, {} medium, {} low)",
        summary.total.to_string().white().bold(),
        summary.count(Severity::High).to_string().red(),
        summary.count(Severity::Medium).to_string().yellow(),
        summary.count(Severity::Low).to_string().blue()
    );
    for anomaly in result.anomalies.iter().take(top) {
        println!(
            "  {} row {:<6} {:20} {}",
            severity_label(anomaly.severity),
            anomaly.row_index,
            anomaly.column.as_deref().unwrap_or("-"),
            anomaly.detail
        );
    }
    if result.anomalies.len() > top {
        println!("  ... {} more", result.anomalies.len() - top);
    }

    if !quality.recommendations.is_empty() {
        println!();
        println!("{}", "Recommendations:".yellow().bold());
        for rec in &quality.recommendations {
            println!("  [{:?}] {}", rec.priority, rec.issue);
            println!("         {}", rec.action.dimmed());
        }
    }
}
