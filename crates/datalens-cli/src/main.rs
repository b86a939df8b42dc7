//! datalens CLI: run the data intelligence engine over a file.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose, cli.quiet) {
        eprintln!("Warning: {}", e);
    }

    let result = match cli.command {
        Commands::Analyze {
            file,
            config,
            json,
            top,
            as_of,
            delimiter,
            max_rows,
        } => commands::analyze::AnalyzeArgs {
            file,
            config,
            json,
            top,
            as_of,
            delimiter,
            max_rows,
        }
        .run(),

        Commands::Schema { file, json } => commands::schema::run(file, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
