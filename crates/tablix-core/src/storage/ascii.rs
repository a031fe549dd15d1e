//! ASCII import/export.
//!
//! Export writes one line per row, columns joined by a caller-supplied
//! separator. With labels enabled a header block precedes the data:
//! comments line (when comments are enabled), kind/format tag line, then
//! the names line last so a re-import can skip the non-name lines with
//! `ignored_lines` and pick the names up with `rename_cols`.

use std::io::{BufRead, Write};

use crate::column::{Column, ColumnKind, PlotDesignation, parse_number};
use crate::error::Result;
use crate::table::Table;
use tablix_engine::Value;

/// Options controlling ASCII import.
#[derive(Clone, Debug)]
pub struct ImportOptions {
    pub separator: String,
    /// Leading lines to discard before the header/data.
    pub ignored_lines: usize,
    /// Treat the first remaining line as column names.
    pub rename_cols: bool,
    /// Trim leading/trailing whitespace per field.
    pub strip_spaces: bool,
    /// Additionally collapse internal whitespace runs.
    pub simplify_spaces: bool,
    /// Retype columns whose non-empty cells all parse as numbers.
    pub convert_to_numeric: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            separator: "\t".to_string(),
            ignored_lines: 0,
            rename_cols: false,
            strip_spaces: false,
            simplify_spaces: false,
            convert_to_numeric: false,
        }
    }
}

/// A row/column restriction for export (0-based indices).
#[derive(Clone, Debug)]
pub struct Selection {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
}

fn clean_field(field: &str, opts: &ImportOptions) -> String {
    if opts.simplify_spaces {
        field.split_whitespace().collect::<Vec<_>>().join(" ")
    } else if opts.strip_spaces {
        field.trim().to_string()
    } else {
        field.to_string()
    }
}

/// Parse delimited text into a fresh table.
///
/// The establishing line (the header when `rename_cols` is set, otherwise
/// the first data line) fixes the column count; later ragged lines pad
/// with empty cells and longer lines are truncated. Import is best-effort:
/// a stream error aborts with whatever was read so far discarded by the
/// caller.
pub fn read_ascii(reader: impl BufRead, opts: &ImportOptions) -> Result<Table> {
    let mut table = Table::new();
    let mut lines = reader.lines().skip(opts.ignored_lines);

    let mut names: Vec<String> = Vec::new();
    if opts.rename_cols {
        match lines.next() {
            Some(line) => {
                let line = line?;
                for raw in line.split(opts.separator.as_str()) {
                    let name = clean_field(raw, opts);
                    names.push(name);
                }
                ensure_unique(&mut names);
            }
            None => return Ok(table),
        }
    }

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut col_count = names.len();
    for line in lines {
        let line = line?;
        let mut fields: Vec<String> = line
            .split(opts.separator.as_str())
            .map(|f| clean_field(f, opts))
            .collect();
        if col_count == 0 {
            // First data line establishes the column count.
            col_count = fields.len();
        }
        // Pads ragged lines and truncates excess fields alike.
        fields.resize(col_count, String::new());
        rows.push(fields);
    }

    if names.is_empty() {
        names = (1..=col_count).map(|i| i.to_string()).collect();
    }

    for (i, name) in names.into_iter().enumerate() {
        let pd = if i == 0 {
            PlotDesignation::X
        } else {
            PlotDesignation::Y
        };
        let mut col = Column::new(name, ColumnKind::Text, rows.len()).with_designation(pd);
        for (r, fields) in rows.iter().enumerate() {
            let text = &fields[i];
            if !text.is_empty() {
                col.set_value(r, Value::Text(text.clone()));
            }
        }
        table.columns.push(col);
    }
    table.row_count = rows.len();

    if opts.convert_to_numeric {
        convert_numeric_columns(&mut table);
    }
    Ok(table)
}

/// Retype every column whose non-empty cells all parse as numbers.
fn convert_numeric_columns(table: &mut Table) {
    for col in &mut table.columns {
        let mut parsed: Vec<Value> = Vec::with_capacity(col.len());
        let mut all_numeric = true;
        for v in col.values() {
            match v {
                Value::Empty => parsed.push(Value::Empty),
                Value::Text(s) => match parse_number(s) {
                    Some(n) => parsed.push(Value::Number(n)),
                    None => {
                        all_numeric = false;
                        break;
                    }
                },
                _ => {
                    all_numeric = false;
                    break;
                }
            }
        }
        if all_numeric {
            col.kind = ColumnKind::Numeric;
            col.format = ColumnKind::Numeric.default_format().to_string();
            col.values = parsed;
        }
    }
}

/// Make every name non-empty and pairwise distinct, suffixing duplicates.
/// Shared with the template restore path, which reads names from the same
/// kind of untrusted input.
pub(crate) fn ensure_unique(names: &mut [String]) {
    for i in 0..names.len() {
        if names[i].is_empty() {
            names[i] = (i + 1).to_string();
        }
        let base = names[i].clone();
        let mut suffix = 2;
        while names[..i].contains(&names[i]) {
            names[i] = format!("{base}_{suffix}");
            suffix += 1;
        }
    }
}

/// Write the table (or a selection of it) as delimited text.
pub fn write_ascii(
    table: &Table,
    mut writer: impl Write,
    separator: &str,
    with_labels: bool,
    selection: Option<&Selection>,
) -> Result<()> {
    // Out-of-range selection indices are dropped here, once, so the label
    // lines and the data rows always agree on field count.
    let cols: Vec<usize> = match selection {
        Some(sel) => sel
            .cols
            .iter()
            .copied()
            .filter(|&c| c < table.column_count())
            .collect(),
        None => (0..table.column_count()).collect(),
    };
    let rows: Vec<usize> = match selection {
        Some(sel) => sel
            .rows
            .iter()
            .copied()
            .filter(|&r| r < table.row_count())
            .collect(),
        None => (0..table.row_count()).collect(),
    };

    if with_labels {
        if table.comments_enabled {
            let comments: Vec<&str> = cols
                .iter()
                .filter_map(|&c| table.column(c).ok().map(|col| col.comment.as_str()))
                .collect();
            writeln!(writer, "{}", comments.join(separator))?;
        }
        let tags: Vec<String> = cols
            .iter()
            .filter_map(|&c| table.column(c).ok().map(kind_tag))
            .collect();
        writeln!(writer, "{}", tags.join(separator))?;
        let names: Vec<&str> = cols
            .iter()
            .filter_map(|&c| table.column(c).ok().map(|col| col.name.as_str()))
            .collect();
        writeln!(writer, "{}", names.join(separator))?;
    }

    for &r in &rows {
        let fields: Vec<String> = cols
            .iter()
            .map(|&c| table.cell_as_text(r, c))
            .collect();
        writeln!(writer, "{}", fields.join(separator))?;
    }
    Ok(())
}

/// Kind tag written to labelled exports, e.g. `Numeric` or `Date{%Y-%m-%d}`.
fn kind_tag(col: &Column) -> String {
    if col.format.is_empty() || col.format == col.kind.default_format() {
        col.kind.name().to_string()
    } else {
        format!("{}{{{}}}", col.kind.name(), col.format)
    }
}
