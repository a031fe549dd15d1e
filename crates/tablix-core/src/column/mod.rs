//! Column storage: one typed, independently resizable vector of cells plus
//! its metadata (name, comment, plot designation, format, width, formula).

mod kind;

pub use kind::{ColumnKind, format_number, parse_number};

use tablix_engine::Value;

/// A column's semantic role for charting, independent of its kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlotDesignation {
    None,
    X,
    Y,
    Z,
    XErr,
    YErr,
}

impl PlotDesignation {
    /// Tag used in saved headers, e.g. `Voltage[Y]`.
    pub fn tag(&self) -> &'static str {
        match self {
            PlotDesignation::None => "",
            PlotDesignation::X => "[X]",
            PlotDesignation::Y => "[Y]",
            PlotDesignation::Z => "[Z]",
            PlotDesignation::XErr => "[xEr]",
            PlotDesignation::YErr => "[yEr]",
        }
    }

    pub fn from_tag(tag: &str) -> Option<PlotDesignation> {
        match tag {
            "" => Some(PlotDesignation::None),
            "[X]" => Some(PlotDesignation::X),
            "[Y]" => Some(PlotDesignation::Y),
            "[Z]" => Some(PlotDesignation::Z),
            "[xEr]" => Some(PlotDesignation::XErr),
            "[yEr]" => Some(PlotDesignation::YErr),
            _ => None,
        }
    }
}

/// A typed column owned by a [`crate::Table`].
///
/// The table keeps every column's value count equal to its row count;
/// `resize` is only called from table-level operations.
#[derive(Clone, Debug)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub plot_designation: PlotDesignation,
    pub comment: String,
    pub width: usize,
    /// Per-kind display format (chrono pattern for date kinds, decimal
    /// count for Numeric, "" for the kind default).
    pub format: String,
    /// Optional formula recalculated on demand; not dependency-tracked.
    pub formula: Option<String>,
    pub(crate) values: Vec<Value>,
}

pub(crate) const DEFAULT_COLUMN_WIDTH: usize = 100;

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind, rows: usize) -> Column {
        Column {
            name: name.into(),
            kind,
            plot_designation: PlotDesignation::Y,
            comment: String::new(),
            width: DEFAULT_COLUMN_WIDTH,
            format: kind.default_format().to_string(),
            formula: None,
            values: vec![Value::Empty; rows],
        }
    }

    pub fn with_designation(mut self, pd: PlotDesignation) -> Column {
        self.plot_designation = pd;
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Display text for one cell using the column's kind and format string.
    pub fn display(&self, row: usize) -> String {
        match self.values.get(row) {
            Some(v) => self.kind.format_value(v, &self.format),
            None => String::new(),
        }
    }

    /// Numeric view of one cell (NaN for empty/non-numeric cells).
    pub fn number(&self, row: usize) -> f64 {
        self.values.get(row).map_or(f64::NAN, Value::as_number)
    }

    /// Store a raw value without conversion. Caller guarantees `row` is in
    /// range; table-level writes validate first.
    pub(crate) fn set_value(&mut self, row: usize, value: Value) {
        self.values[row] = value;
    }

    /// Parse `text` under this column's kind and store it.
    /// Returns `false` (cell unchanged) when the text does not parse.
    pub(crate) fn set_from_text(&mut self, row: usize, text: &str) -> bool {
        match self.kind.parse(text, &self.format) {
            Some(v) => {
                self.values[row] = v;
                true
            }
            None => false,
        }
    }

    pub(crate) fn resize(&mut self, rows: usize) {
        self.values.resize(rows, Value::Empty);
    }

    /// Switch the column to a new kind, converting every stored value
    /// through its display text. Unconvertible cells become empty.
    pub fn set_kind(&mut self, kind: ColumnKind) {
        if kind == self.kind {
            return;
        }
        let new_format = kind.default_format().to_string();
        for value in &mut self.values {
            *value = self.kind.convert(value, &self.format, kind, &new_format);
        }
        self.kind = kind;
        self.format = new_format;
    }
}
