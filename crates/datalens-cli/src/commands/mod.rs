//! CLI command implementations.

pub mod analyze;
pub mod schema;

use std::path::Path;

use datalens::{Dataset, EngineError, Parser, SourceMetadata};

/// Load a file, turning engine errors into actionable messages.
pub(crate) fn load(file: &Path) -> Result<(Dataset, SourceMetadata), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }
    Parser::new().parse_file(file).map_err(explain)
}

/// Attach the user-facing hint to an engine error.
pub(crate) fn explain(e: EngineError) -> Box<dyn std::error::Error> {
    format!("{}\n{}", e, e.user_message()).into()
}
