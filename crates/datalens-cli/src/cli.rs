//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// datalens: schema inference, anomaly detection and quality scoring for
/// extracted tables
#[derive(Parser)]
#[command(name = "datalens")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Infer the schema, detect anomalies and score quality
    Analyze {
        /// Path to the data file (CSV/TSV/semicolon/pipe or key-value text)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// JSON engine configuration
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        /// Number of anomalies to list
        #[arg(long, default_value = "10")]
        top: usize,

        /// Processing date for future-date checks (YYYY-MM-DD, default today)
        #[arg(long, value_name = "DATE")]
        as_of: Option<chrono::NaiveDate>,

        /// Field delimiter (auto-detected when omitted)
        #[arg(short, long, value_name = "CHAR")]
        delimiter: Option<char>,

        /// Read at most this many rows
        #[arg(long, value_name = "N")]
        max_rows: Option<usize>,
    },

    /// Print the inferred schema only
    Schema {
        /// Path to the data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
