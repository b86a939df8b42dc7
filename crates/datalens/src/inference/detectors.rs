//! Value-level type detectors.
//!
//! The battery is a static, ordered list: the learner walks it from most
//! specific (email, national id) to most general (integer, float) and the
//! first detector that clears the match threshold names the column type.
//! The scorer and the anomaly detector reuse the same predicates and parsers
//! so every component reads a cell the same way.

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::InferredType;

// =============================================================================
// LAZY STATIC PATTERNS
// =============================================================================

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

static NATIONAL_IDS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("us_ssn", Regex::new(r"^\d{3}-\d{2}-\d{4}$").unwrap()),
        (
            "uk_nino",
            Regex::new(r"(?i)^[A-CEGHJ-PR-TW-Z]{2}\s?\d{2}\s?\d{2}\s?\d{2}\s?[A-D]$").unwrap(),
        ),
        ("in_aadhaar", Regex::new(r"^[2-9]\d{3}\s\d{4}\s\d{4}$").unwrap()),
        ("in_pan", Regex::new(r"^[A-Z]{5}\d{4}[A-Z]$").unwrap()),
    ]
});

static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[\d\s\-().]+$").unwrap());

static CURRENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<neg>-)?(?P<pre>[$€£¥₹]|usd|eur|gbp|inr|jpy)?\s?-?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?\s?(?P<post>[$€£¥₹]|usd|eur|gbp|inr|jpy)?$",
    )
    .unwrap()
});

static PERCENTAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+(?:\.\d+)?\s?%$").unwrap());

static INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:\d{1,3}(?:,\d{3})+|\d+)$").unwrap());

/// Date patterns tried by the date detector, in tie-break order.
pub const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y/%m/%d",
    "%d %b %Y",
    "%b %d, %Y",
];

const BOOLEAN_VOCABULARIES: &[(&str, &[&str])] = &[
    ("true/false", &["true", "false", "t", "f"]),
    ("yes/no", &["yes", "no", "y", "n"]),
];

// =============================================================================
// PREDICATES AND PARSERS
// =============================================================================

pub fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

/// Name of the national-id scheme a value matches.
pub fn national_id_scheme(value: &str) -> Option<&'static str> {
    NATIONAL_IDS
        .iter()
        .find(|(_, re)| re.is_match(value))
        .map(|(name, _)| *name)
}

pub fn is_national_id(value: &str) -> bool {
    national_id_scheme(value).is_some()
}

pub fn digit_count(value: &str) -> usize {
    value.chars().filter(|c| c.is_ascii_digit()).count()
}

/// Phone numbers need 10-15 digits and some visible structure, so bare
/// integers and decimals stay numeric.
pub fn is_phone(value: &str) -> bool {
    if !PHONE.is_match(value) {
        return false;
    }
    let digits = digit_count(value);
    let structured = value.starts_with('+')
        || value.contains([' ', '-', '(', ')'])
        || value.matches('.').count() >= 2;
    (10..=15).contains(&digits) && structured
}

/// Currency symbol or code of a value; None when the value is not money.
pub fn currency_symbol(value: &str) -> Option<String> {
    let caps = CURRENCY.captures(value)?;
    match (caps.name("pre"), caps.name("post")) {
        (Some(sym), None) | (None, Some(sym)) => Some(sym.as_str().to_uppercase()),
        _ => None,
    }
}

pub fn is_currency(value: &str) -> bool {
    currency_symbol(value).is_some()
}

pub fn is_percentage(value: &str) -> bool {
    PERCENTAGE.is_match(value)
}

pub fn is_integer(value: &str) -> bool {
    INTEGER.is_match(value)
}

pub fn is_float(value: &str) -> bool {
    parse_plain_number(value).is_some()
}

/// Parse a date with one specific pattern.
pub fn parse_date_with(value: &str, format: &str) -> Option<NaiveDate> {
    if format.contains("%H") {
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .map(|dt| dt.date())
    } else {
        NaiveDate::parse_from_str(value, format).ok()
    }
}

/// Parse a date with the first pattern that fits.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| parse_date_with(value, fmt))
}

pub fn is_date(value: &str) -> bool {
    parse_date(value).is_some()
}

fn boolean_vocabulary(value: &str) -> Option<&'static str> {
    let lower = value.to_lowercase();
    BOOLEAN_VOCABULARIES
        .iter()
        .find(|(_, words)| words.contains(&lower.as_str()))
        .map(|(name, _)| *name)
}

pub fn is_boolean(value: &str) -> bool {
    boolean_vocabulary(value).is_some()
}

/// Parse a plain number, tolerating thousands separators. Rejects NaN/inf.
fn parse_plain_number(value: &str) -> Option<f64> {
    let cleaned: String = value.chars().filter(|c| *c != ',').collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numeric magnitude of a value read as `ty`.
pub fn parse_numeric(ty: InferredType, value: &str) -> Option<f64> {
    match ty {
        InferredType::Integer | InferredType::Float => parse_plain_number(value),
        InferredType::Percentage => {
            if !is_percentage(value) {
                return None;
            }
            parse_plain_number(value.trim_end_matches('%').trim())
        }
        InferredType::Currency => {
            let caps = CURRENCY.captures(value)?;
            let negative = caps.name("neg").is_some() || value.contains('-');
            let digits: String = value
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            let magnitude = digits.parse::<f64>().ok().filter(|n| n.is_finite())?;
            Some(if negative { -magnitude } else { magnitude })
        }
        _ => None,
    }
}

/// Check whether a value fits a column's type and dominant format.
pub fn conforms(ty: InferredType, format: Option<&str>, value: &str) -> bool {
    match (ty, format) {
        (InferredType::Date, Some(fmt)) => parse_date_with(value, fmt).is_some(),
        (InferredType::Date, None) => is_date(value),
        (InferredType::Phone, Some(fmt)) => {
            is_phone(value) && fmt.strip_prefix("digits:").and_then(|n| n.parse().ok()) == Some(digit_count(value))
        }
        (InferredType::Phone, None) => is_phone(value),
        (InferredType::Currency, Some(sym)) => currency_symbol(value).as_deref() == Some(sym),
        (InferredType::Currency, None) => is_currency(value),
        (InferredType::NationalId, Some(scheme)) => national_id_scheme(value) == Some(scheme),
        (InferredType::NationalId, None) => is_national_id(value),
        (InferredType::Boolean, Some(vocab)) => boolean_vocabulary(value) == Some(vocab),
        (InferredType::Boolean, None) => is_boolean(value),
        (InferredType::Email, _) => is_email(value),
        (InferredType::Percentage, _) => is_percentage(value),
        (InferredType::Integer, _) => is_integer(value),
        (InferredType::Float, _) => is_float(value),
        (InferredType::CategoricalText | InferredType::FreeText, _) => true,
    }
}

// =============================================================================
// DOMINANT FORMATS
// =============================================================================

/// Most frequent label, first seen wins ties.
fn most_common<I: IntoIterator<Item = String>>(labels: I) -> Option<String> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    let mut best: Option<(String, usize)> = None;
    for (label, count) in counts {
        if best.as_ref().map(|(_, c)| count > *c).unwrap_or(true) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}

/// The date pattern that parses the most values; earlier patterns win ties.
pub fn dominant_date_format(values: &[&str]) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for &fmt in DATE_FORMATS {
        let count = values.iter().filter(|v| parse_date_with(v, fmt).is_some()).count();
        if count > 0 && best.map(|(_, c)| count > c).unwrap_or(true) {
            best = Some((fmt, count));
        }
    }
    best.map(|(fmt, _)| fmt.to_string())
}

fn format_none(_: &[&str]) -> Option<String> {
    None
}

fn format_national_id(values: &[&str]) -> Option<String> {
    most_common(values.iter().filter_map(|v| national_id_scheme(v)).map(String::from))
}

fn format_phone(values: &[&str]) -> Option<String> {
    most_common(
        values
            .iter()
            .filter(|v| is_phone(v))
            .map(|v| format!("digits:{}", digit_count(v))),
    )
}

fn format_currency(values: &[&str]) -> Option<String> {
    most_common(values.iter().filter_map(|v| currency_symbol(v)))
}

fn format_percentage(_: &[&str]) -> Option<String> {
    Some("%".to_string())
}

fn format_boolean(values: &[&str]) -> Option<String> {
    most_common(values.iter().filter_map(|v| boolean_vocabulary(v)).map(String::from))
}

// =============================================================================
// BATTERY
// =============================================================================

/// One entry of the ordered type battery.
pub struct TypeDetector {
    pub inferred_type: InferredType,
    pub matches: fn(&str) -> bool,
    /// Dominant format over the sample.
    pub format: fn(&[&str]) -> Option<String>,
}

impl TypeDetector {
    /// Share of `sample` this detector accepts.
    pub fn match_rate(&self, sample: &[&str]) -> f64 {
        if sample.is_empty() {
            return 0.0;
        }
        let hits = sample.iter().filter(|v| (self.matches)(v)).count();
        hits as f64 / sample.len() as f64
    }
}

/// Most specific first, so structural types beat numeric coercions.
pub static TYPE_BATTERY: [TypeDetector; 9] = [
    TypeDetector {
        inferred_type: InferredType::Email,
        matches: is_email,
        format: format_none,
    },
    TypeDetector {
        inferred_type: InferredType::NationalId,
        matches: is_national_id,
        format: format_national_id,
    },
    TypeDetector {
        inferred_type: InferredType::Phone,
        matches: is_phone,
        format: format_phone,
    },
    TypeDetector {
        inferred_type: InferredType::Currency,
        matches: is_currency,
        format: format_currency,
    },
    TypeDetector {
        inferred_type: InferredType::Percentage,
        matches: is_percentage,
        format: format_percentage,
    },
    TypeDetector {
        inferred_type: InferredType::Date,
        matches: is_date,
        format: dominant_date_format,
    },
    TypeDetector {
        inferred_type: InferredType::Boolean,
        matches: is_boolean,
        format: format_boolean,
    },
    TypeDetector {
        inferred_type: InferredType::Integer,
        matches: is_integer,
        format: format_none,
    },
    TypeDetector {
        inferred_type: InferredType::Float,
        matches: is_float,
        format: format_none,
    },
];

/// Look up the battery entry for a type.
pub fn detector_for(ty: InferredType) -> Option<&'static TypeDetector> {
    TYPE_BATTERY.iter().find(|d| d.inferred_type == ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(is_email("a@b.com"));
        assert!(!is_email("not-an-email"));
    }

    #[test]
    fn test_national_ids() {
        assert_eq!(national_id_scheme("123-45-6789"), Some("us_ssn"));
        assert_eq!(national_id_scheme("AB123456C"), Some("uk_nino"));
        assert_eq!(national_id_scheme("2345 6789 0123"), Some("in_aadhaar"));
        assert_eq!(national_id_scheme("ABCDE1234F"), Some("in_pan"));
        assert_eq!(national_id_scheme("12345"), None);
    }

    #[test]
    fn test_phone_needs_structure() {
        assert!(is_phone("+1 555 123 4567"));
        assert!(is_phone("(555) 123-4567"));
        assert!(!is_phone("5551234567"));
        assert!(!is_phone("1234567.89012"));
        assert!(!is_phone("555-1234"));
    }

    #[test]
    fn test_currency() {
        assert_eq!(currency_symbol("$1,200.50").as_deref(), Some("$"));
        assert_eq!(currency_symbol("1200 EUR").as_deref(), Some("EUR"));
        assert_eq!(currency_symbol("1200"), None);
        assert_eq!(parse_numeric(InferredType::Currency, "$1,200.50"), Some(1200.5));
        assert_eq!(parse_numeric(InferredType::Currency, "-$300"), Some(-300.0));
    }

    #[test]
    fn test_numbers() {
        assert!(is_integer("42"));
        assert!(is_integer("-1,234"));
        assert!(!is_integer("4.2"));
        assert!(is_float("4.2"));
        assert!(is_float("42"));
        assert!(!is_float("NaN"));
        assert!(!is_float("inf"));
        assert_eq!(parse_numeric(InferredType::Percentage, "12.5%"), Some(12.5));
        assert_eq!(parse_numeric(InferredType::Integer, "1,000"), Some(1000.0));
    }

    #[test]
    fn test_dates() {
        assert!(is_date("2024-03-01"));
        assert!(is_date("2024-03-01T10:00:00"));
        assert!(is_date("03/01/2024"));
        assert!(is_date("25/12/2023"));
        assert!(!is_date("2024-13-45"));
        assert!(!is_date("hello"));
    }

    #[test]
    fn test_dominant_date_format_prefers_unambiguous() {
        let values = ["01/02/2024", "25/12/2023", "13/06/2022"];
        assert_eq!(dominant_date_format(&values).as_deref(), Some("%d/%m/%Y"));

        let iso = ["2024-01-02", "2024-02-03"];
        assert_eq!(dominant_date_format(&iso).as_deref(), Some("%Y-%m-%d"));
    }

    #[test]
    fn test_conforms_uses_format() {
        assert!(conforms(InferredType::Date, Some("%Y-%m-%d"), "2024-01-01"));
        assert!(!conforms(InferredType::Date, Some("%Y-%m-%d"), "01/01/2024"));
        assert!(conforms(InferredType::Phone, Some("digits:10"), "(555) 123-4567"));
        assert!(!conforms(InferredType::Phone, Some("digits:10"), "+44 20 7946 09581"));
        assert!(conforms(InferredType::FreeText, None, "anything"));
    }

    #[test]
    fn test_battery_order() {
        let order: Vec<InferredType> = TYPE_BATTERY.iter().map(|d| d.inferred_type).collect();
        assert_eq!(order.first(), Some(&InferredType::Email));
        assert_eq!(order.last(), Some(&InferredType::Float));
        let national = order.iter().position(|t| *t == InferredType::NationalId);
        let integer = order.iter().position(|t| *t == InferredType::Integer);
        assert!(national < integer);
    }
}
