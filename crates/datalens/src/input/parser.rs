//! Delimited-text loader with delimiter and structure detection.
//!
//! Stands in for the document-extraction layer: text recovered from a
//! document is tabulated into a [`Dataset`] and the raw text is kept on the
//! dataset so the schema learner can score delimiters itself.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use sha2::{Digest, Sha256};

use crate::error::{EngineError, Result};
use crate::inference::{detect_structure, StructureDetection};
use crate::schema::Structure;

use super::source::{Dataset, SourceMetadata, Value};

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Whether the file has a header row.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
    /// Lines sampled when auto-detecting the delimiter.
    pub sample_lines: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
            sample_lines: 50,
        }
    }
}

/// Parses extracted text into datasets.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the dataset and metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(Dataset, SourceMetadata)> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| EngineError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(|e| EngineError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let text = String::from_utf8_lossy(&contents);
        let (dataset, format) = self.parse_text(&text)?;

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            contents.len() as u64,
            format,
            dataset.row_count(),
            dataset.column_count(),
        );

        Ok((dataset, metadata))
    }

    /// Parse text directly, returning the dataset and a format label.
    pub fn parse_text(&self, text: &str) -> Result<(Dataset, String)> {
        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => {
                let detection = detect_structure(text, self.config.sample_lines, 0.9);
                if detection.structure == Structure::KeyValue {
                    let dataset = self.parse_key_value(text)?;
                    return Ok((dataset.with_raw_text(text), "key-value".to_string()));
                }
                pick_delimiter(&detection)
            }
        };

        let dataset = self.parse_delimited(text.as_bytes(), delimiter)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        }
        .to_string();

        Ok((dataset.with_raw_text(text), format))
    }

    /// Parse delimited bytes with a known delimiter.
    fn parse_delimited(&self, bytes: &[u8], delimiter: u8) -> Result<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(self.config.has_header)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let mut headers: Vec<String> = if self.config.has_header {
            reader.headers()?.iter().map(|s| s.trim().to_string()).collect()
        } else {
            Vec::new()
        };

        let mut rows: Vec<Vec<Value>> = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            let record = result?;
            if headers.is_empty() {
                headers = (0..record.len()).map(|i| format!("column_{}", i + 1)).collect();
            }

            let mut row: Vec<Value> = record.iter().map(|s| Value::Text(s.to_string())).collect();
            // Extraction leaves ragged lines behind; square them off here.
            row.resize(headers.len(), Value::Null);
            rows.push(row);
        }

        if headers.is_empty() {
            return Err(EngineError::EmptyDataset("No columns found".to_string()));
        }

        dedupe_headers(&mut headers);
        Dataset::new(headers, rows)
    }

    /// Parse `key: value` blocks separated by blank lines, one record per block.
    fn parse_key_value(&self, text: &str) -> Result<Dataset> {
        let mut blocks: Vec<IndexMap<String, String>> = Vec::new();
        let mut current: IndexMap<String, String> = IndexMap::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                if !current.is_empty() {
                    blocks.push(std::mem::take(&mut current));
                }
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                current.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        if !current.is_empty() {
            blocks.push(current);
        }

        let mut headers: Vec<String> = Vec::new();
        for block in &blocks {
            for key in block.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }

        let rows = blocks
            .iter()
            .take(self.config.max_rows.unwrap_or(usize::MAX))
            .map(|block| {
                headers
                    .iter()
                    .map(|h| block.get(h).map(|v| Value::Text(v.clone())).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Dataset::new(headers, rows)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Best tabulation delimiter; mixed text falls back to the strongest candidate.
fn pick_delimiter(detection: &StructureDetection) -> u8 {
    detection
        .delimiter
        .or_else(|| detection.candidates.first().map(|c| c.delimiter))
        .filter(|d| d.is_ascii())
        .map(|d| d as u8)
        .unwrap_or(b',')
}

/// Suffix repeated header names so every column stays addressable.
fn dedupe_headers(headers: &mut [String]) {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for header in headers.iter_mut() {
        let count = counts.entry(header.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            *header = format!("{}_{}", header, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv() {
        let parser = Parser::new();
        let (dataset, format) = parser.parse_text("name,age,city\nAlice,30,NYC\nBob,25,LA").unwrap();

        assert_eq!(format, "csv");
        assert_eq!(dataset.headers(), &["name", "age", "city"]);
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.get(0, 0), Some(&Value::from("Alice")));
        assert_eq!(dataset.get(1, 1), Some(&Value::from("25")));
        assert!(dataset.raw_text().is_some());
    }

    #[test]
    fn test_parse_tsv_auto_detect() {
        let parser = Parser::new();
        let (dataset, format) = parser.parse_text("a\tb\tc\n1\t2\t3\n4\t5\t6").unwrap();
        assert_eq!(format, "tsv");
        assert_eq!(dataset.column_count(), 3);
    }

    #[test]
    fn test_parse_pads_short_rows() {
        let parser = Parser::new();
        let (dataset, _) = parser.parse_text("a,b,c\n1,2,3\n4,5\n7,8,9\n").unwrap();
        assert_eq!(dataset.get(1, 2), Some(&Value::Null));
    }

    #[test]
    fn test_parse_key_value_blocks() {
        let parser = Parser::new();
        let text = "Name: Ann\nAge: 31\n\nName: Bo\nAge: 40\n";
        let (dataset, format) = parser.parse_text(text).unwrap();

        assert_eq!(format, "key-value");
        assert_eq!(dataset.headers(), &["Name", "Age"]);
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.get(1, 1), Some(&Value::from("40")));
    }

    #[test]
    fn test_duplicate_headers_are_suffixed() {
        let parser = Parser::new();
        let (dataset, _) = parser.parse_text("id,id\n1,2\n3,4\n").unwrap();
        assert_eq!(dataset.headers(), &["id", "id_2"]);
    }
}
