//! Per-type validity checks used by the quality scorer.
//!
//! Consistency asks whether a value looks like its column; validity asks
//! whether it could be real. A well-formed SSN with area 000 is consistent
//! but invalid.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::QualityConfig;
use crate::inference::detectors::{digit_count, national_id_scheme, parse_date, parse_date_with};
use crate::schema::{ColumnProfile, InferredType};

static STRICT_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$",
    )
    .unwrap()
});

/// A check applied to every non-null value of a column.
pub trait ValidityCheck {
    fn is_valid(&self, value: &str) -> bool;
}

pub struct EmailCheck;

impl ValidityCheck for EmailCheck {
    fn is_valid(&self, value: &str) -> bool {
        STRICT_EMAIL.is_match(value)
    }
}

pub struct PhoneCheck;

impl ValidityCheck for PhoneCheck {
    fn is_valid(&self, value: &str) -> bool {
        (7..=15).contains(&digit_count(value))
    }
}

/// Dates must parse and fall inside a plausible window.
pub struct DateRangeCheck {
    pub format: Option<String>,
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl ValidityCheck for DateRangeCheck {
    fn is_valid(&self, value: &str) -> bool {
        let parsed = match &self.format {
            Some(fmt) => parse_date_with(value, fmt).or_else(|| parse_date(value)),
            None => parse_date(value),
        };
        parsed.map(|d| d >= self.min && d <= self.max).unwrap_or(false)
    }
}

pub struct NationalIdCheck;

impl ValidityCheck for NationalIdCheck {
    fn is_valid(&self, value: &str) -> bool {
        match national_id_scheme(value) {
            Some("us_ssn") => valid_ssn(value),
            Some("uk_nino") => valid_nino(value),
            Some("in_aadhaar") => verhoeff_valid(value),
            Some("in_pan") => valid_pan(value),
            _ => false,
        }
    }
}

/// Card-like digit runs must carry a valid Luhn check digit.
pub struct CardNumberCheck;

impl ValidityCheck for CardNumberCheck {
    fn is_valid(&self, value: &str) -> bool {
        match card_digits(value) {
            Some(digits) => luhn_valid(&digits),
            None => true,
        }
    }
}

/// The validity check for a column, if its type has one.
pub fn validity_check(column: &ColumnProfile, config: &QualityConfig) -> Option<Box<dyn ValidityCheck>> {
    match column.inferred_type {
        InferredType::Email => Some(Box::new(EmailCheck)),
        InferredType::Phone => Some(Box::new(PhoneCheck)),
        InferredType::Date => Some(Box::new(DateRangeCheck {
            format: column.detected_format.clone(),
            min: config.min_plausible_date,
            max: config.max_plausible_date,
        })),
        InferredType::NationalId => Some(Box::new(NationalIdCheck)),
        InferredType::Integer | InferredType::CategoricalText | InferredType::FreeText => {
            Some(Box::new(CardNumberCheck))
        }
        _ => None,
    }
}

fn valid_ssn(value: &str) -> bool {
    let parts: Vec<&str> = value.split('-').collect();
    let [area, group, serial] = parts.as_slice() else {
        return false;
    };
    *area != "000"
        && *area != "666"
        && !area.starts_with('9')
        && *group != "00"
        && *serial != "0000"
}

fn valid_nino(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    let prefix = compact.get(0..2).unwrap_or("");
    let second_ok = !prefix.ends_with('O');
    second_ok && !matches!(prefix, "BG" | "GB" | "NK" | "KN" | "TN" | "NT" | "ZZ")
}

fn valid_pan(value: &str) -> bool {
    value
        .chars()
        .nth(3)
        .map(|c| "PCHFATBLJG".contains(c))
        .unwrap_or(false)
}

fn card_digits(value: &str) -> Option<Vec<u32>> {
    if !value.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-') {
        return None;
    }
    let digits: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    (13..=19).contains(&digits.len()).then_some(digits)
}

pub fn luhn_valid(digits: &[u32]) -> bool {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

const VERHOEFF_D: [[u8; 10]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 2, 3, 4, 0, 6, 7, 8, 9, 5],
    [2, 3, 4, 0, 1, 7, 8, 9, 5, 6],
    [3, 4, 0, 1, 2, 8, 9, 5, 6, 7],
    [4, 0, 1, 2, 3, 9, 5, 6, 7, 8],
    [5, 9, 8, 7, 6, 0, 4, 3, 2, 1],
    [6, 5, 9, 8, 7, 1, 0, 4, 3, 2],
    [7, 6, 5, 9, 8, 2, 1, 0, 4, 3],
    [8, 7, 6, 5, 9, 3, 2, 1, 0, 4],
    [9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
];

const VERHOEFF_P: [[u8; 10]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 5, 7, 6, 2, 8, 3, 0, 9, 4],
    [5, 8, 0, 3, 7, 9, 6, 1, 4, 2],
    [8, 9, 1, 6, 0, 4, 3, 5, 2, 7],
    [9, 4, 5, 3, 1, 2, 6, 8, 7, 0],
    [4, 2, 8, 6, 5, 7, 3, 9, 0, 1],
    [2, 7, 9, 3, 8, 0, 6, 4, 1, 5],
    [7, 0, 4, 6, 9, 1, 3, 2, 5, 8],
];

/// Verhoeff checksum, as used by Aadhaar numbers.
pub fn verhoeff_valid(value: &str) -> bool {
    let digits: Vec<usize> = value
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| d as usize)
        .collect();
    if digits.is_empty() {
        return false;
    }
    let check = digits
        .iter()
        .rev()
        .enumerate()
        .fold(0usize, |c, (i, &d)| VERHOEFF_D[c][VERHOEFF_P[i % 8][d] as usize] as usize);
    check == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_email() {
        assert!(EmailCheck.is_valid("jane.doe@example.com"));
        assert!(!EmailCheck.is_valid("jane..doe@example.com"));
        assert!(!EmailCheck.is_valid(".jane@example.com"));
    }

    #[test]
    fn test_phone_digits() {
        assert!(PhoneCheck.is_valid("555-1234"));
        assert!(!PhoneCheck.is_valid("12-34"));
    }

    #[test]
    fn test_date_window() {
        let check = DateRangeCheck {
            format: Some("%Y-%m-%d".to_string()),
            min: NaiveDate::from_ymd_opt(1900, 1, 1).unwrap(),
            max: NaiveDate::from_ymd_opt(2100, 12, 31).unwrap(),
        };
        assert!(check.is_valid("1999-05-01"));
        assert!(!check.is_valid("1850-01-01"));
        assert!(!check.is_valid("not a date"));
    }

    #[test]
    fn test_ssn_rules() {
        assert!(NationalIdCheck.is_valid("123-45-6789"));
        assert!(!NationalIdCheck.is_valid("000-45-6789"));
        assert!(!NationalIdCheck.is_valid("666-45-6789"));
        assert!(!NationalIdCheck.is_valid("912-45-6789"));
        assert!(!NationalIdCheck.is_valid("123-00-6789"));
        assert!(!NationalIdCheck.is_valid("123-45-0000"));
    }

    #[test]
    fn test_other_schemes() {
        assert!(NationalIdCheck.is_valid("AB123456C"));
        assert!(!NationalIdCheck.is_valid("GB123456C"));
        assert!(NationalIdCheck.is_valid("2345 6789 0124"));
        assert!(!NationalIdCheck.is_valid("2345 6789 0123"));
        assert!(NationalIdCheck.is_valid("ABCPE1234F"));
        assert!(!NationalIdCheck.is_valid("ABCXE1234F"));
    }

    #[test]
    fn test_luhn_on_card_like_values() {
        assert!(CardNumberCheck.is_valid("4111 1111 1111 1111"));
        assert!(!CardNumberCheck.is_valid("4111111111111112"));
        assert!(CardNumberCheck.is_valid("12345"));
        assert!(CardNumberCheck.is_valid("hello"));
    }

    #[test]
    fn test_verhoeff_short_vector() {
        assert!(verhoeff_valid("2363"));
        assert!(!verhoeff_valid("2364"));
    }
}
