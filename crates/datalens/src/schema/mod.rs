//! Schema types for representing inferred dataset structure.

mod column;
mod table;
mod types;

pub use column::{suggest_display_name, ColumnProfile};
pub use table::{Relationship, SchemaProfile};
pub use types::{InferredType, RelationshipKind, Structure};
