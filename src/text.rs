//! Value coercion and column-name helpers shared by every parser.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]+").unwrap());

/// A scalar coerced from a text cell: integer first, then real, else the trimmed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    /// Integer view of the value. Reals without a fractional part count as integers.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            FieldValue::Real(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Integer(n) => serde_json::Value::from(*n),
            FieldValue::Real(f) => serde_json::Value::from(*f),
            FieldValue::Text(s) => serde_json::Value::from(s.as_str()),
        }
    }
}

/// A non-empty cell: the trimmed source text plus its coerced value.
///
/// The text is kept because codes such as `0560512` lose their leading zeros
/// once coerced to an integer.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub value: FieldValue,
}

/// Coerce a raw cell. Empty or whitespace-only input is absent.
pub fn parse_value(raw: &str) -> Option<FieldValue> {
    let t = raw.trim();
    if t.is_empty() {
        return None;
    }

    if let Ok(n) = t.parse::<i64>() {
        return Some(FieldValue::Integer(n));
    }

    // "inf" and "NaN" parse as f64 but have no JSON representation
    if let Ok(f) = t.parse::<f64>()
        && f.is_finite()
    {
        return Some(FieldValue::Real(f));
    }

    Some(FieldValue::Text(t.to_string()))
}

pub fn parse_cell(raw: &str) -> Option<Cell> {
    parse_value(raw).map(|value| Cell {
        text: raw.trim().to_string(),
        value,
    })
}

pub fn to_opt_string(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Normalize a header to snake_case: runs of non-alphanumerics become a single
/// underscore, the result is lowercased and stripped of edge underscores.
pub fn normalize_column_name(name: &str) -> String {
    let replaced = NON_ALNUM_RE.replace_all(name.trim(), "_");
    replaced.trim_matches('_').to_lowercase()
}

/// Headers that carry no information: empty after normalization, positional
/// placeholders (`col_3`) or spreadsheet export artifacts (`unnamed_2`).
pub fn is_placeholder_column(normalized: &str) -> bool {
    if normalized.is_empty() || normalized.contains("unnamed") {
        return true;
    }
    match normalized.strip_prefix("col_") {
        Some(rest) => rest.is_empty() || rest.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_order() {
        assert_eq!(parse_value("  42 "), Some(FieldValue::Integer(42)));
        assert_eq!(parse_value("007"), Some(FieldValue::Integer(7)));
        assert_eq!(parse_value("-3"), Some(FieldValue::Integer(-3)));
        assert_eq!(parse_value("1.5"), Some(FieldValue::Real(1.5)));
        assert_eq!(parse_value("1e3"), Some(FieldValue::Real(1000.0)));
        assert_eq!(
            parse_value(" CESSNA "),
            Some(FieldValue::Text("CESSNA".to_string()))
        );
        assert_eq!(parse_value("nan"), Some(FieldValue::Text("nan".to_string())));
    }

    #[test]
    fn test_parse_value_blank_is_absent() {
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("   "), None);
        assert_eq!(parse_value("\t"), None);
    }

    #[test]
    fn test_parse_cell_keeps_leading_zeros_in_text() {
        let cell = parse_cell(" 0560512 ").unwrap();
        assert_eq!(cell.text, "0560512");
        assert_eq!(cell.value, FieldValue::Integer(560512));
    }

    #[test]
    fn test_as_i64() {
        assert_eq!(FieldValue::Integer(4).as_i64(), Some(4));
        assert_eq!(FieldValue::Real(4.0).as_i64(), Some(4));
        assert_eq!(FieldValue::Real(4.5).as_i64(), None);
        assert_eq!(FieldValue::Text("4".to_string()).as_i64(), None);
    }

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("N-NUMBER"), "n_number");
        assert_eq!(normalize_column_name("  Mode S Code (Hex) "), "mode_s_code_hex");
        assert_eq!(normalize_column_name("__a__b__"), "a_b");
        assert_eq!(normalize_column_name("***"), "");
        assert_eq!(normalize_column_name("Year"), "year");
    }

    #[test]
    fn test_placeholder_columns() {
        assert!(is_placeholder_column(""));
        assert!(is_placeholder_column("col_3"));
        assert!(is_placeholder_column("unnamed_2"));
        assert!(!is_placeholder_column("color"));
        assert!(!is_placeholder_column("col_name"));
        assert!(!is_placeholder_column("tail_number"));
    }
}
