//! Delimiter scoring and document structure classification.

use serde::{Deserialize, Serialize};

use crate::schema::Structure;

/// Candidate delimiters, in tie-break order.
pub const CANDIDATE_DELIMITERS: &[char] = &[',', ';', ':', '\t', '|'];

/// How well one delimiter tabulates the sampled lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelimiterScore {
    pub delimiter: char,
    /// Share of lines whose field count equals the modal count.
    pub consistency: f64,
    /// Modal field count.
    pub fields: usize,
}

/// Outcome of structure detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureDetection {
    /// Chosen delimiter; None when no candidate is consistent enough.
    pub delimiter: Option<char>,
    pub structure: Structure,
    /// Eligible candidates, best first.
    pub candidates: Vec<DelimiterScore>,
}

/// Score every candidate delimiter over the first `sample_lines` non-blank
/// lines and classify the text.
///
/// A candidate is eligible only when it splits lines into at least two
/// fields. The best eligible candidate is accepted when its consistency
/// reaches `threshold`; a colon splitting lines into exactly two fields marks
/// key-value text. Nothing acceptable means the text is mixed.
pub fn detect_structure(text: &str, sample_lines: usize, threshold: f64) -> StructureDetection {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(sample_lines.max(1))
        .collect();

    if lines.is_empty() {
        return StructureDetection {
            delimiter: None,
            structure: Structure::Tabular,
            candidates: Vec::new(),
        };
    }

    let mut candidates: Vec<(usize, DelimiterScore)> = CANDIDATE_DELIMITERS
        .iter()
        .enumerate()
        .filter_map(|(order, &delim)| score_delimiter(&lines, delim).map(|s| (order, s)))
        .collect();

    candidates.sort_by(|(oa, a), (ob, b)| {
        b.consistency
            .total_cmp(&a.consistency)
            .then(b.fields.cmp(&a.fields))
            .then(oa.cmp(ob))
    });
    let candidates: Vec<DelimiterScore> = candidates.into_iter().map(|(_, s)| s).collect();

    let (delimiter, structure) = match candidates.first() {
        Some(best) if best.consistency >= threshold => {
            let structure = if best.delimiter == ':' && best.fields == 2 {
                Structure::KeyValue
            } else {
                Structure::Tabular
            };
            (Some(best.delimiter), structure)
        }
        _ => (None, Structure::Mixed),
    };

    tracing::debug!(
        lines = lines.len(),
        delimiter = ?delimiter,
        structure = ?structure,
        "Structure detected"
    );

    StructureDetection {
        delimiter,
        structure,
        candidates,
    }
}

fn score_delimiter(lines: &[&str], delimiter: char) -> Option<DelimiterScore> {
    let counts: Vec<usize> = lines
        .iter()
        .map(|line| count_delimiter_in_line(line, delimiter) + 1)
        .collect();

    let fields = modal_count(&counts)?;
    if fields < 2 {
        return None;
    }

    let agreeing = counts.iter().filter(|&&c| c == fields).count();
    Some(DelimiterScore {
        delimiter,
        consistency: agreeing as f64 / counts.len() as f64,
        fields,
    })
}

/// Most frequent count; larger counts win ties.
fn modal_count(counts: &[usize]) -> Option<usize> {
    let mut tally: std::collections::BTreeMap<usize, usize> = std::collections::BTreeMap::new();
    for &c in counts {
        *tally.entry(c).or_insert(0) += 1;
    }
    tally
        .into_iter()
        .max_by(|(ca, na), (cb, nb)| na.cmp(nb).then(ca.cmp(cb)))
        .map(|(count, _)| count)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: char) -> usize {
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_is_tabular() {
        let text = "name,age,city\nAlice,30,NYC\nBob,25,LA\n";
        let detection = detect_structure(text, 50, 0.9);
        assert_eq!(detection.delimiter, Some(','));
        assert_eq!(detection.structure, Structure::Tabular);
        assert_eq!(detection.candidates[0].fields, 3);
    }

    #[test]
    fn test_tab_beats_comma_in_cells() {
        let text = "a\tb\n\"1,5\"\tx\n2\ty\n";
        let detection = detect_structure(text, 50, 0.9);
        assert_eq!(detection.delimiter, Some('\t'));
    }

    #[test]
    fn test_key_value() {
        let text = "Name: Ann\nAge: 31\n\nName: Bo\nAge: 40\n";
        let detection = detect_structure(text, 50, 0.9);
        assert_eq!(detection.delimiter, Some(':'));
        assert_eq!(detection.structure, Structure::KeyValue);
    }

    #[test]
    fn test_inconsistent_is_mixed() {
        let text = "a,b,c\nfree prose line\nx;y\nanother line, with a comma\nplain\n";
        let detection = detect_structure(text, 50, 0.9);
        assert_eq!(detection.delimiter, None);
        assert_eq!(detection.structure, Structure::Mixed);
    }

    #[test]
    fn test_quoted_delimiters_ignored() {
        assert_eq!(count_delimiter_in_line("\"a,b\",c", ','), 1);
    }

    #[test]
    fn test_empty_text() {
        let detection = detect_structure("", 50, 0.9);
        assert_eq!(detection.structure, Structure::Tabular);
        assert!(detection.candidates.is_empty());
    }
}
