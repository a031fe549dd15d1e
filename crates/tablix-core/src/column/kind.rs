//! Column kinds: per-kind parsing, formatting and comparison rules.
//!
//! Each kind owns the three functions the rest of the core relies on:
//! parse (text to stored value), format (stored value to display text using
//! the column's format string) and compare (total order used by the sort
//! engine). Date-family kinds store absolute timestamps so ordering never
//! consults the display string.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tablix_engine::Value;

/// The declared value domain of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
    Date,
    Time,
    Month,
    Day,
    DateTime,
}

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const DATE_FALLBACKS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];
const TIME_FALLBACKS: [&str; 2] = ["%H:%M:%S", "%H:%M"];
const DATETIME_FALLBACKS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

impl ColumnKind {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "Numeric",
            ColumnKind::Text => "Text",
            ColumnKind::Date => "Date",
            ColumnKind::Time => "Time",
            ColumnKind::Month => "Month",
            ColumnKind::Day => "Day",
            ColumnKind::DateTime => "DateTime",
        }
    }

    pub fn from_name(name: &str) -> Option<ColumnKind> {
        match name {
            "Numeric" => Some(ColumnKind::Numeric),
            "Text" => Some(ColumnKind::Text),
            "Date" => Some(ColumnKind::Date),
            "Time" => Some(ColumnKind::Time),
            "Month" => Some(ColumnKind::Month),
            "Day" => Some(ColumnKind::Day),
            "DateTime" => Some(ColumnKind::DateTime),
            _ => None,
        }
    }

    /// The format string a fresh column of this kind starts with.
    /// Numeric uses "" (shortest representation); date-family kinds use
    /// chrono patterns; Month/Day pick abbreviated names.
    pub fn default_format(&self) -> &'static str {
        match self {
            ColumnKind::Numeric | ColumnKind::Text => "",
            ColumnKind::Date => "%Y-%m-%d",
            ColumnKind::Time => "%H:%M:%S",
            ColumnKind::Month => "%b",
            ColumnKind::Day => "%a",
            ColumnKind::DateTime => "%Y-%m-%d %H:%M:%S",
        }
    }

    /// Parse display text into this kind's stored representation.
    /// Returns `None` when the text is not interpretable under this kind.
    pub fn parse(&self, text: &str, format: &str) -> Option<Value> {
        let text = text.trim();
        if text.is_empty() {
            return Some(Value::Empty);
        }
        match self {
            ColumnKind::Numeric => parse_number(text).map(Value::Number),
            ColumnKind::Text => Some(Value::Text(text.to_string())),
            ColumnKind::Date => parse_date(text, format).map(Value::DateTime),
            ColumnKind::Time => parse_time(text, format).map(Value::DateTime),
            ColumnKind::DateTime => parse_datetime(text, format).map(Value::DateTime),
            ColumnKind::Month => parse_name_or_ordinal(text, &MONTHS).map(Value::Number),
            ColumnKind::Day => parse_name_or_ordinal(text, &DAYS).map(Value::Number),
        }
    }

    /// Format a stored value for display with the column's format string.
    /// Values that do not match the kind fall back to their plain text form.
    pub fn format_value(&self, value: &Value, format: &str) -> String {
        match (self, value) {
            (_, Value::Empty) => String::new(),
            (ColumnKind::Numeric, Value::Number(n)) => format_number(*n, format),
            (ColumnKind::Date | ColumnKind::Time | ColumnKind::DateTime, Value::DateTime(dt)) => {
                let fmt = if format.is_empty() {
                    self.default_format()
                } else {
                    format
                };
                dt.format(fmt).to_string()
            }
            (ColumnKind::Month, Value::Number(n)) => format_ordinal(*n, &MONTHS, format == "%B"),
            (ColumnKind::Day, Value::Number(n)) => format_ordinal(*n, &DAYS, format == "%A"),
            (_, v) => v.as_text(),
        }
    }

    /// Whether the value is a well-formed member of this kind's domain.
    /// Invalid values sort after all valid ones, see [`ColumnKind::compare`].
    pub fn is_valid(&self, value: &Value) -> bool {
        match (self, value) {
            (ColumnKind::Numeric | ColumnKind::Month | ColumnKind::Day, Value::Number(n)) => {
                !n.is_nan()
            }
            (ColumnKind::Text, Value::Text(_)) => true,
            (
                ColumnKind::Date | ColumnKind::Time | ColumnKind::DateTime,
                Value::DateTime(_),
            ) => true,
            _ => false,
        }
    }

    /// Total ascending order with invalid/empty values grouped last.
    /// Never consults display strings.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        match (self.is_valid(a), self.is_valid(b)) {
            (false, false) => Ordering::Equal,
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (true, true) => match (a, b) {
                (Value::Number(x), Value::Number(y)) => {
                    x.partial_cmp(y).unwrap_or(Ordering::Equal)
                }
                (Value::Text(x), Value::Text(y)) => x.cmp(y),
                (Value::DateTime(x), Value::DateTime(y)) => x.cmp(y),
                _ => Ordering::Equal,
            },
        }
    }

    /// Re-interpret a value stored under `self` as a value of `to`,
    /// round-tripping through the display text. Unconvertible cells
    /// become empty.
    pub fn convert(&self, value: &Value, from_format: &str, to: ColumnKind, to_format: &str) -> Value {
        if value.is_empty() {
            return Value::Empty;
        }
        let text = self.format_value(value, from_format);
        to.parse(&text, to_format).unwrap_or(Value::Empty)
    }
}

/// Locale-tolerant numeric parse: accepts a decimal comma when no decimal
/// point is present.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok(n) = text.parse::<f64>() {
        return Some(n);
    }
    if text.contains(',') && !text.contains('.') {
        return text.replace(',', ".").parse::<f64>().ok();
    }
    None
}

/// Format a number for display. An empty format string picks the shortest
/// representation; a numeric format string is a fixed decimal count.
pub fn format_number(n: f64, format: &str) -> String {
    if n.is_nan() {
        return String::new();
    }
    if let Ok(precision) = format.parse::<usize>() {
        return format!("{:.*}", precision, n);
    }
    n.to_string()
}

fn parse_date(text: &str, format: &str) -> Option<NaiveDateTime> {
    let formats = std::iter::once(format).chain(DATE_FALLBACKS.iter().copied());
    for fmt in formats.filter(|f| !f.is_empty()) {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn parse_time(text: &str, format: &str) -> Option<NaiveDateTime> {
    let formats = std::iter::once(format).chain(TIME_FALLBACKS.iter().copied());
    for fmt in formats.filter(|f| !f.is_empty()) {
        if let Ok(t) = NaiveTime::parse_from_str(text, fmt) {
            // Times are anchored to the epoch day so they order totally.
            return NaiveDate::from_ymd_opt(1970, 1, 1).map(|d| d.and_time(t));
        }
    }
    None
}

fn parse_datetime(text: &str, format: &str) -> Option<NaiveDateTime> {
    let formats = std::iter::once(format).chain(DATETIME_FALLBACKS.iter().copied());
    for fmt in formats.filter(|f| !f.is_empty()) {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    None
}

/// Parse a month/weekday as a 1-based ordinal or a (possibly abbreviated)
/// case-insensitive name.
fn parse_name_or_ordinal(text: &str, names: &[&str]) -> Option<f64> {
    if let Ok(n) = text.parse::<usize>() {
        if (1..=names.len()).contains(&n) {
            return Some(n as f64);
        }
        return None;
    }
    let lower = text.to_lowercase();
    for (idx, name) in names.iter().enumerate() {
        let full = name.to_lowercase();
        if full == lower || (lower.len() >= 3 && full.starts_with(&lower)) {
            return Some((idx + 1) as f64);
        }
    }
    None
}

fn format_ordinal(n: f64, names: &[&str], full: bool) -> String {
    let idx = n as usize;
    if n.fract() != 0.0 || !(1..=names.len()).contains(&idx) {
        return String::new();
    }
    let name = names[idx - 1];
    if full {
        name.to_string()
    } else {
        name[..3].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_parse_decimal_comma() {
        assert_eq!(parse_number("3,5"), Some(3.5));
        assert_eq!(parse_number("3.5"), Some(3.5));
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_numeric_format_precision() {
        assert_eq!(format_number(3.14159, "2"), "3.14");
        assert_eq!(format_number(42.0, ""), "42");
    }

    #[test]
    fn test_date_parse_and_format_roundtrip() {
        let kind = ColumnKind::Date;
        let v = kind.parse("2024-03-01", "").unwrap();
        assert_eq!(kind.format_value(&v, "%Y-%m-%d"), "2024-03-01");
    }

    #[test]
    fn test_month_parse_names_and_ordinals() {
        let kind = ColumnKind::Month;
        assert_eq!(kind.parse("Feb", ""), Some(Value::Number(2.0)));
        assert_eq!(kind.parse("february", ""), Some(Value::Number(2.0)));
        assert_eq!(kind.parse("12", ""), Some(Value::Number(12.0)));
        assert_eq!(kind.parse("13", ""), None);
    }

    #[test]
    fn test_month_format() {
        let kind = ColumnKind::Month;
        assert_eq!(kind.format_value(&Value::Number(4.0), "%b"), "Apr");
        assert_eq!(kind.format_value(&Value::Number(4.0), "%B"), "April");
    }

    #[test]
    fn test_day_parse() {
        let kind = ColumnKind::Day;
        assert_eq!(kind.parse("Wed", ""), Some(Value::Number(3.0)));
        assert_eq!(kind.parse("7", ""), Some(Value::Number(7.0)));
    }

    #[test]
    fn test_compare_nan_sorts_last() {
        let kind = ColumnKind::Numeric;
        let nan = Value::Number(f64::NAN);
        let one = Value::Number(1.0);
        assert_eq!(kind.compare(&nan, &one), Ordering::Greater);
        assert_eq!(kind.compare(&one, &nan), Ordering::Less);
        assert_eq!(kind.compare(&nan, &Value::Empty), Ordering::Equal);
    }

    #[test]
    fn test_compare_dates_uses_timestamps() {
        let kind = ColumnKind::Date;
        let a = kind.parse("2023-12-31", "").unwrap();
        let b = kind.parse("2024-01-01", "").unwrap();
        assert_eq!(kind.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_convert_numeric_to_text() {
        let v = ColumnKind::Numeric.convert(&Value::Number(2.5), "", ColumnKind::Text, "");
        assert_eq!(v, Value::Text("2.5".to_string()));
    }

    #[test]
    fn test_convert_text_to_numeric_failure_is_empty() {
        let v = ColumnKind::Text.convert(
            &Value::Text("hello".to_string()),
            "",
            ColumnKind::Numeric,
            "",
        );
        assert_eq!(v, Value::Empty);
    }
}
