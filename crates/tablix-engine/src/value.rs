//! Typed cell values.
//!
//! Columns store one [`Value`] per row. The column's declared kind decides
//! how values are parsed, formatted and compared; the value itself only
//! carries the storage representation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single cell value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Empty,
    Number(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Numeric view of the value. Invalid or empty cells map to NaN so that
    /// "zero" and "no value" stay distinguishable.
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Empty => f64::NAN,
            Value::Number(n) => *n,
            Value::Text(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
            Value::DateTime(dt) => dt.and_utc().timestamp() as f64,
        }
    }

    /// Text view of the value using a plain representation (no per-kind
    /// format string applied).
    pub fn as_text(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Number(n) => {
                if n.is_nan() {
                    String::new()
                } else {
                    n.to_string()
                }
            }
            Value::Text(s) => s.clone(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_as_number_is_nan() {
        assert!(Value::Empty.as_number().is_nan());
    }

    #[test]
    fn test_text_as_number_parses() {
        assert_eq!(Value::Text("3.5".into()).as_number(), 3.5);
        assert!(Value::Text("abc".into()).as_number().is_nan());
    }

    #[test]
    fn test_number_as_text() {
        assert_eq!(Value::Number(42.0).as_text(), "42");
        assert_eq!(Value::Number(f64::NAN).as_text(), "");
    }
}
