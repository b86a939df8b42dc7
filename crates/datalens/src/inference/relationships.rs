//! Inter-column relationship hints and primary-key selection.

use crate::input::Dataset;
use crate::schema::{ColumnProfile, Relationship, RelationshipKind};
use crate::stats::pearson;

use super::detectors::parse_numeric;

/// Separators tried when checking whether a column concatenates two others.
const JOIN_SEPARATORS: &[&str] = &[" ", ", ", "-", "_", "/", ""];

/// Derived-column search is cubic in the column count.
const MAX_DERIVED_COLUMNS: usize = 50;

/// Fewest paired values a correlation is computed over.
const MIN_PAIRED_VALUES: usize = 3;

/// Fewest rows a concatenation must be checked on.
const MIN_COMPARABLE_ROWS: usize = 2;

/// Find derived and correlated column pairs.
pub fn find_relationships(
    dataset: &Dataset,
    columns: &[ColumnProfile],
    correlation_threshold: f64,
) -> Vec<Relationship> {
    let mut relationships = find_derived(dataset, columns);
    relationships.extend(find_correlated(dataset, columns, correlation_threshold));
    relationships
}

fn cell_text(dataset: &Dataset, row: usize, col: usize) -> Option<String> {
    dataset
        .get(row, col)
        .filter(|v| !v.is_null())
        .map(|v| v.as_text().into_owned())
}

fn find_derived(dataset: &Dataset, columns: &[ColumnProfile]) -> Vec<Relationship> {
    if columns.len() > MAX_DERIVED_COLUMNS {
        tracing::debug!(columns = columns.len(), "Skipping derived-column search");
        return Vec::new();
    }

    let texts: Vec<Vec<Option<String>>> = columns
        .iter()
        .map(|c| {
            (0..dataset.row_count())
                .map(|r| cell_text(dataset, r, c.position))
                .collect()
        })
        .collect();

    let mut found = Vec::new();
    for (ci, target) in columns.iter().enumerate() {
        if !target.inferred_type.is_text() {
            continue;
        }
        'pairs: for ai in 0..columns.len() {
            for bi in (ai + 1)..columns.len() {
                if ai == ci || bi == ci {
                    continue;
                }
                let joined = JOIN_SEPARATORS.iter().any(|sep| {
                    concatenates(&texts[ci], &texts[ai], &texts[bi], sep)
                        || concatenates(&texts[ci], &texts[bi], &texts[ai], sep)
                });
                if joined {
                    for part in [ai, bi] {
                        found.push(Relationship {
                            column_a: target.name.clone(),
                            column_b: columns[part].name.clone(),
                            kind: RelationshipKind::DerivedFrom,
                            coefficient: None,
                        });
                    }
                    break 'pairs;
                }
            }
        }
    }
    found
}

/// Every row where all three cells are present satisfies `target == left + sep + right`.
fn concatenates(
    target: &[Option<String>],
    left: &[Option<String>],
    right: &[Option<String>],
    sep: &str,
) -> bool {
    let mut comparable = 0;
    for ((t, l), r) in target.iter().zip(left).zip(right) {
        if let (Some(t), Some(l), Some(r)) = (t, l, r) {
            comparable += 1;
            let matches = t.len() == l.len() + sep.len() + r.len()
                && t.starts_with(l.as_str())
                && t.ends_with(r.as_str())
                && t[l.len()..t.len() - r.len()] == *sep;
            if !matches {
                return false;
            }
        }
    }
    comparable >= MIN_COMPARABLE_ROWS
}

fn find_correlated(
    dataset: &Dataset,
    columns: &[ColumnProfile],
    threshold: f64,
) -> Vec<Relationship> {
    let numeric: Vec<(&ColumnProfile, Vec<Option<f64>>)> = columns
        .iter()
        .filter(|c| c.inferred_type.is_numeric())
        .map(|c| {
            let values = (0..dataset.row_count())
                .map(|r| {
                    cell_text(dataset, r, c.position)
                        .and_then(|t| parse_numeric(c.inferred_type, &t))
                })
                .collect();
            (c, values)
        })
        .collect();

    let mut found = Vec::new();
    for i in 0..numeric.len() {
        for j in (i + 1)..numeric.len() {
            let (a, xs) = &numeric[i];
            let (b, ys) = &numeric[j];
            let pairs: Vec<(f64, f64)> = xs
                .iter()
                .zip(ys)
                .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                .collect();
            if pairs.len() < MIN_PAIRED_VALUES {
                continue;
            }
            if let Some(r) = pearson(&pairs) {
                if r.abs() > threshold {
                    found.push(Relationship {
                        column_a: a.name.clone(),
                        column_b: b.name.clone(),
                        kind: RelationshipKind::CorrelatedWith,
                        coefficient: Some(r),
                    });
                }
            }
        }
    }
    found
}

/// Pick the most key-like column that is complete and unique.
///
/// Numeric columns and id/key-like names score higher; the first column wins
/// ties.
pub fn find_primary_key(dataset: &Dataset, columns: &[ColumnProfile]) -> Option<String> {
    let rows = dataset.row_count();
    if rows == 0 {
        return None;
    }

    let mut best: Option<(&ColumnProfile, u32)> = None;
    for column in columns {
        if column.null_count > 0 || column.distinct_count != rows {
            continue;
        }
        let mut score = 0;
        if column.inferred_type.is_numeric() {
            score += 50;
        }
        let lower = column.name.to_lowercase();
        if lower.contains("id") || lower.contains("key") {
            score += 50;
        }
        if best.map(|(_, s)| score > s).unwrap_or(true) {
            best = Some((column, score));
        }
    }
    best.map(|(c, _)| c.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Value;
    use crate::schema::InferredType;

    fn dataset(headers: &[&str], rows: Vec<Vec<&str>>) -> Dataset {
        Dataset::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.into_iter()
                .map(|r| r.into_iter().map(Value::from).collect())
                .collect(),
        )
        .unwrap()
    }

    fn profile(name: &str, position: usize, ty: InferredType, distinct: usize) -> ColumnProfile {
        let mut p = ColumnProfile::new(name, position);
        p.inferred_type = ty;
        p.distinct_count = distinct;
        p
    }

    #[test]
    fn test_derived_full_name() {
        let ds = dataset(
            &["first", "last", "full"],
            vec![
                vec!["Ann", "Lee", "Ann Lee"],
                vec!["Bo", "Kim", "Bo Kim"],
                vec!["Cy", "Park", "Cy Park"],
            ],
        );
        let columns = vec![
            profile("first", 0, InferredType::FreeText, 3),
            profile("last", 1, InferredType::FreeText, 3),
            profile("full", 2, InferredType::FreeText, 3),
        ];
        let rels = find_relationships(&ds, &columns, 0.7);
        let derived: Vec<_> = rels
            .iter()
            .filter(|r| r.kind == RelationshipKind::DerivedFrom)
            .map(|r| (r.column_a.as_str(), r.column_b.as_str()))
            .collect();
        assert_eq!(derived, vec![("full", "first"), ("full", "last")]);
    }

    #[test]
    fn test_derived_needs_every_row() {
        assert!(!concatenates(
            &[Some("a b".into()), Some("x".into())],
            &[Some("a".into()), Some("c".into())],
            &[Some("b".into()), Some("d".into())],
            " ",
        ));
        assert!(!concatenates(&[Some("a b".into())], &[Some("a".into())], &[Some("b".into())], " "));
    }

    #[test]
    fn test_correlated() {
        let ds = dataset(
            &["x", "y"],
            vec![vec!["1", "2"], vec!["2", "4"], vec!["3", "6"], vec!["4", "8"]],
        );
        let columns = vec![
            profile("x", 0, InferredType::Integer, 4),
            profile("y", 1, InferredType::Integer, 4),
        ];
        let rels = find_relationships(&ds, &columns, 0.7);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].kind, RelationshipKind::CorrelatedWith);
        assert!((rels[0].coefficient.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_primary_key_prefers_id() {
        let ds = dataset(&["name", "emp_id"], vec![vec!["a", "1"], vec!["b", "2"]]);
        let columns = vec![
            profile("name", 0, InferredType::FreeText, 2),
            profile("emp_id", 1, InferredType::Integer, 2),
        ];
        assert_eq!(find_primary_key(&ds, &columns).as_deref(), Some("emp_id"));
    }
}
