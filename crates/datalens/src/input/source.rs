//! In-memory dataset and source metadata.

use std::borrow::Cow;
use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{EngineError, Result};

/// Metadata about a data file loaded from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been loaded.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            row_count,
            column_count,
            loaded_at: Utc::now(),
        }
    }
}

/// A single raw cell as handed over by the extraction layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl Value {
    /// Check if this cell is missing, including textual NA markers.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Number(n) => n.is_nan(),
            Value::Date(_) => false,
            Value::Text(s) => is_null_text(s),
        }
    }

    /// Render the cell as text, the common ground every detector works on.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed(""),
            Value::Text(s) => Cow::Borrowed(s.trim()),
            Value::Date(d) => Cow::Owned(d.format("%Y-%m-%d").to_string()),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Cow::Owned(format!("{:.0}", n))
                } else {
                    Cow::Owned(n.to_string())
                }
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One extracted row: column name to raw value, in header order.
pub type Record = IndexMap<String, Value>;

/// Check if a text value represents a missing/null value.
pub fn is_null_text(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("nil")
        || trimmed == "."
        || trimmed == "-"
}

/// An ordered, session-owned table of extracted records.
///
/// Every row holds exactly one value per header column, in header order.
#[derive(Debug, Clone)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
    raw_text: Option<String>,
}

impl Dataset {
    /// Build a dataset from a header and row-major cells.
    ///
    /// Short rows are rejected rather than padded; the extraction layer owns
    /// that repair.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for header in &headers {
            if !seen.insert(header.as_str()) {
                return Err(EngineError::DuplicateColumn(header.clone()));
            }
        }

        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(EngineError::InconsistentRecord {
                    row: row_idx,
                    expected: headers.clone(),
                    found: headers.iter().take(row.len()).cloned().collect(),
                });
            }
        }

        Ok(Self {
            headers,
            rows,
            raw_text: None,
        })
    }

    /// Build a dataset from keyed records. The first record fixes the header.
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        let headers: Vec<String> = records
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();

        let mut rows = Vec::with_capacity(records.len());
        for (row_idx, mut record) in records.into_iter().enumerate() {
            let same_columns = record.len() == headers.len()
                && headers.iter().all(|h| record.contains_key(h));
            if !same_columns {
                return Err(EngineError::InconsistentRecord {
                    row: row_idx,
                    expected: headers.clone(),
                    found: record.keys().cloned().collect(),
                });
            }
            let row: Vec<Value> = headers
                .iter()
                .map(|h| record.shift_remove(h).unwrap_or(Value::Null))
                .collect();
            rows.push(row);
        }

        Ok(Self {
            headers,
            rows,
            raw_text: None,
        })
    }

    /// Attach the pre-tabulation text the rows were extracted from.
    pub fn with_raw_text(mut self, text: impl Into<String>) -> Self {
        self.raw_text = Some(text.into());
        self
    }

    /// Column headers in insertion order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Row-major cells.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Raw text lines, when the extraction layer supplied them.
    pub fn raw_text(&self) -> Option<&str> {
        self.raw_text.as_deref()
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Canonical key for a whole row, used for exact-duplicate checks.
    ///
    /// Each cell is written as `<byte length>:<text>` and a null as `-`, so
    /// the key stays unambiguous whatever characters the cells contain.
    pub fn row_key(&self, row: usize) -> String {
        let mut key = String::new();
        for cell in self.rows.get(row).into_iter().flatten() {
            if cell.is_null() {
                key.push('-');
            } else {
                let text = cell.as_text();
                key.push_str(&text.len().to_string());
                key.push(':');
                key.push_str(&text);
            }
        }
        key
    }

    /// SHA-256 over header and cells; ties derived reports to this snapshot.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.headers.join("\u{1e}").as_bytes());
        for row in 0..self.rows.len() {
            hasher.update(b"\x1e");
            hasher.update(self.row_key(row).as_bytes());
        }
        format!("sha256:{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_null_value() {
        assert!(is_null_text(""));
        assert!(is_null_text("NA"));
        assert!(is_null_text("na"));
        assert!(is_null_text("N/A"));
        assert!(is_null_text("null"));
        assert!(is_null_text("NULL"));
        assert!(is_null_text("."));
        assert!(!is_null_text("value"));
        assert!(!is_null_text("0"));
        assert!(Value::Null.is_null());
        assert!(Value::Number(f64::NAN).is_null());
        assert!(!Value::Number(0.0).is_null());
    }

    #[test]
    fn test_number_rendering() {
        assert_eq!(Value::Number(50000.0).as_text(), "50000");
        assert_eq!(Value::Number(2.5).as_text(), "2.5");
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Value::Date(date).as_text(), "2024-03-09");
    }

    #[test]
    fn test_from_records_preserves_order() {
        let mut a = Record::new();
        a.insert("name".to_string(), Value::from("Ann"));
        a.insert("age".to_string(), Value::from(31i64));
        let mut b = Record::new();
        b.insert("age".to_string(), Value::from(40i64));
        b.insert("name".to_string(), Value::from("Bo"));

        let dataset = Dataset::from_records(vec![a, b]).unwrap();
        assert_eq!(dataset.headers(), &["name".to_string(), "age".to_string()]);
        assert_eq!(dataset.get(1, 0), Some(&Value::from("Bo")));
    }

    #[test]
    fn test_from_records_rejects_ragged() {
        let mut a = Record::new();
        a.insert("name".to_string(), Value::from("Ann"));
        let mut b = Record::new();
        b.insert("email".to_string(), Value::from("x@y.com"));

        let err = Dataset::from_records(vec![a, b]).unwrap_err();
        assert!(matches!(err, EngineError::InconsistentRecord { row: 1, .. }));
    }

    #[test]
    fn test_duplicate_header_rejected() {
        let err = Dataset::new(vec!["a".into(), "a".into()], vec![]).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateColumn(_)));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = Dataset::new(vec!["x".into()], vec![vec![Value::from("1")]]).unwrap();
        let b = Dataset::new(vec!["x".into()], vec![vec![Value::from("2")]]).unwrap();
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_row_key_separates_embedded_separators() {
        let dataset = Dataset::new(
            vec!["a".into(), "b".into()],
            vec![
                vec![Value::from("x\u{1f}y"), Value::from("z")],
                vec![Value::from("x"), Value::from("y\u{1f}z")],
                vec![Value::from("x"), Value::Null],
                vec![Value::from("x"), Value::from("N/A")],
            ],
        )
        .unwrap();
        assert_ne!(dataset.row_key(0), dataset.row_key(1));
        assert_eq!(dataset.row_key(2), dataset.row_key(3));
        assert_eq!(dataset.row_key(2), "1:x-");
    }
}
