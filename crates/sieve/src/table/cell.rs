//! Scalar cell values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single scalar value in a table.
///
/// Serializes untagged, so a row of cells becomes plain JSON values
/// (`null`, numbers, strings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// A finite number.
    Number(f64),
    /// Free text.
    Text(String),
    /// A missing value.
    Null,
}

/// Hashable identity of a cell, used for duplicate detection and counting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellKey {
    Null,
    Number(u64),
    Text(String),
}

impl Cell {
    /// Parse a raw string into a cell.
    ///
    /// Conventional missing-value tokens become [`Cell::Null`], finite
    /// numeric literals become [`Cell::Number`], everything else is text
    /// kept as-is.
    pub fn parse(raw: &str) -> Self {
        if Self::is_null_token(raw) {
            return Cell::Null;
        }
        match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Cell::Number(n),
            _ => Cell::Text(raw.to_string()),
        }
    }

    /// Build a numeric cell, mapping non-finite values to null.
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Cell::Number(value)
        } else {
            Cell::Null
        }
    }

    /// Build a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Check if a value represents a missing/null value.
    pub fn is_null_token(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("nan")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed.eq_ignore_ascii_case("nil")
            || trimmed == "."
            || trimmed == "-"
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Identity used for hashing. `0.0` and `-0.0` share a key.
    pub fn key(&self) -> CellKey {
        match self {
            Cell::Null => CellKey::Null,
            Cell::Number(n) if *n == 0.0 => CellKey::Number(0.0f64.to_bits()),
            Cell::Number(n) => CellKey::Number(n.to_bits()),
            Cell::Text(s) => CellKey::Text(s.clone()),
        }
    }
}

impl fmt::Display for Cell {
    /// Nulls render as an empty string and integral numbers without a
    /// fractional part.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kinds() {
        assert_eq!(Cell::parse("42"), Cell::Number(42.0));
        assert_eq!(Cell::parse(" 3.5 "), Cell::Number(3.5));
        assert_eq!(Cell::parse("Alice"), Cell::text("Alice"));
        assert_eq!(Cell::parse(""), Cell::Null);
        assert_eq!(Cell::parse("inf"), Cell::text("inf"));
    }

    #[test]
    fn test_is_null_token() {
        assert!(Cell::is_null_token(""));
        assert!(Cell::is_null_token("NA"));
        assert!(Cell::is_null_token("na"));
        assert!(Cell::is_null_token("N/A"));
        assert!(Cell::is_null_token("NaN"));
        assert!(Cell::is_null_token("null"));
        assert!(Cell::is_null_token("NULL"));
        assert!(Cell::is_null_token("."));
        assert!(!Cell::is_null_token("value"));
        assert!(!Cell::is_null_token("0"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Cell::Number(1.0).to_string(), "1");
        assert_eq!(Cell::Number(2.25).to_string(), "2.25");
        assert_eq!(Cell::Null.to_string(), "");
        assert_eq!(Cell::text("x y").to_string(), "x y");
    }

    #[test]
    fn test_signed_zero_shares_key() {
        assert_eq!(Cell::Number(0.0).key(), Cell::Number(-0.0).key());
        assert_ne!(Cell::Number(1.0).key(), Cell::text("1").key());
    }

    #[test]
    fn test_json_shape() {
        let row = vec![Cell::Number(1.0), Cell::text("x"), Cell::Null];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[1.0,"x",null]"#);
        let back: Vec<Cell> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }
}
