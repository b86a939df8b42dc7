//! Schema learning: type detection, structure detection and relationships.

pub mod detectors;
mod learner;
mod relationships;
mod structure;

pub use learner::SchemaLearner;
pub use relationships::{find_primary_key, find_relationships};
pub use structure::{detect_structure, DelimiterScore, StructureDetection, CANDIDATE_DELIMITERS};
