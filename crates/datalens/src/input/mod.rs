//! Input parsing and data source handling.

mod parser;
mod source;

pub use parser::{Parser, ParserConfig};
pub use source::{is_null_text, Dataset, Record, SourceMetadata, Value};
