//! Round-trippable template format.
//!
//! A table serializes to a tab-delimited text blob with a fixed section
//! order: geometry, header (names with plot-designation tags), column
//! widths, column types, comments, formulas, then the cell data:
//!
//! ```text
//! <table>	3	2
//! geometry	<opaque string>
//! header	time[X]	volts[Y]
//! ColWidth	100	100
//! ColType	Numeric	Numeric;2
//! Comments		measured
//! com	1	col("time", i) * 2
//! data
//! 0.1	0.2
//! ...
//! </table>
//! ```

use crate::column::{Column, ColumnKind, PlotDesignation};
use crate::error::{Result, TableError};
use crate::table::Table;
use tablix_engine::Value;

/// Serialize the table (plus an opaque geometry string owned by the shell)
/// into the template text format.
pub fn save_to_string(table: &Table, geometry: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<table>\t{}\t{}\n",
        table.row_count(),
        table.column_count()
    ));
    out.push_str(&format!("geometry\t{geometry}\n"));

    let header: Vec<String> = table
        .columns()
        .map(|c| format!("{}{}", c.name, c.plot_designation.tag()))
        .collect();
    out.push_str(&format!("header\t{}\n", header.join("\t")));

    let widths: Vec<String> = table.columns().map(|c| c.width.to_string()).collect();
    out.push_str(&format!("ColWidth\t{}\n", widths.join("\t")));

    let types: Vec<String> = table.columns().map(type_field).collect();
    out.push_str(&format!("ColType\t{}\n", types.join("\t")));

    let comments: Vec<&str> = table.columns().map(|c| c.comment.as_str()).collect();
    out.push_str(&format!("Comments\t{}\n", comments.join("\t")));

    for (i, col) in table.columns().enumerate() {
        if let Some(formula) = &col.formula {
            out.push_str(&format!("com\t{i}\t{formula}\n"));
        }
    }

    out.push_str("data\n");
    for r in 0..table.row_count() {
        let fields: Vec<String> = (0..table.column_count())
            .map(|c| table.cell_as_text(r, c))
            .collect();
        out.push_str(&fields.join("\t"));
        out.push('\n');
    }
    out.push_str("</table>\n");
    out
}

fn type_field(col: &Column) -> String {
    if col.format.is_empty() || col.format == col.kind.default_format() {
        col.kind.name().to_string()
    } else {
        format!("{};{}", col.kind.name(), col.format)
    }
}

/// Rebuild a table from the template text format.
pub fn restore_from_string(text: &str) -> Result<Table> {
    let mut lines = text.lines().enumerate();

    let (line_no, first) = lines
        .next()
        .ok_or_else(|| restore_err(0, "empty template"))?;
    let mut head = first.split('\t');
    if head.next() != Some("<table>") {
        return Err(restore_err(line_no, "expected <table> marker"));
    }
    let rows: usize = head
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| restore_err(line_no, "bad row count"))?;
    let cols: usize = head
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| restore_err(line_no, "bad column count"))?;

    let mut table = Table::new();
    table.row_count = rows;
    for i in 0..cols {
        table
            .columns
            .push(Column::new((i + 1).to_string(), ColumnKind::Numeric, rows));
    }

    // Metadata sections, in any order, until the data marker.
    let mut in_data = false;
    let mut data_row = 0usize;
    for (line_no, line) in lines {
        if line == "</table>" {
            break;
        }
        if in_data {
            if data_row >= rows {
                return Err(restore_err(line_no, "more data rows than declared"));
            }
            for (c, field) in line.split('\t').take(cols).enumerate() {
                let col = &mut table.columns[c];
                if field.is_empty() {
                    col.set_value(data_row, Value::Empty);
                } else if !col.set_from_text(data_row, field) {
                    col.set_value(data_row, Value::Empty);
                }
            }
            data_row += 1;
            continue;
        }
        if line == "data" {
            in_data = true;
            continue;
        }
        let Some((section, rest)) = line.split_once('\t') else {
            if line == "geometry" {
                continue; // empty geometry
            }
            return Err(restore_err(line_no, "expected section\\tpayload"));
        };
        match section {
            "geometry" => {} // owned by the shell, not restored here
            "header" => {
                let mut names = Vec::new();
                let mut designations = Vec::new();
                for field in rest.split('\t').take(cols) {
                    let (name, pd) = split_designation(field);
                    names.push(name.to_string());
                    designations.push(pd);
                }
                // Untrusted blobs may repeat names; the table requires them
                // pairwise distinct.
                crate::storage::ascii::ensure_unique(&mut names);
                for (c, (name, pd)) in names.into_iter().zip(designations).enumerate() {
                    table.columns[c].name = name;
                    table.columns[c].plot_designation = pd;
                }
            }
            "ColWidth" => {
                for (c, field) in rest.split('\t').take(cols).enumerate() {
                    if let Ok(w) = field.parse::<usize>() {
                        table.columns[c].width = w;
                    }
                }
            }
            "ColType" => {
                for (c, field) in rest.split('\t').take(cols).enumerate() {
                    let (kind_name, format) = match field.split_once(';') {
                        Some((k, f)) => (k, f),
                        None => (field, ""),
                    };
                    let kind = ColumnKind::from_name(kind_name)
                        .ok_or_else(|| restore_err(line_no, "unknown column type"))?;
                    table.columns[c].kind = kind;
                    table.columns[c].format = if format.is_empty() {
                        kind.default_format().to_string()
                    } else {
                        format.to_string()
                    };
                }
            }
            "Comments" => {
                for (c, field) in rest.split('\t').take(cols).enumerate() {
                    table.columns[c].comment = field.to_string();
                }
            }
            "com" => {
                let (idx, formula) = rest
                    .split_once('\t')
                    .ok_or_else(|| restore_err(line_no, "bad formula line"))?;
                let idx: usize = idx
                    .parse()
                    .map_err(|_| restore_err(line_no, "bad formula column index"))?;
                if idx < cols {
                    table.columns[idx].formula = Some(formula.to_string());
                }
            }
            other => {
                return Err(restore_err(line_no, &format!("unknown section {other:?}")));
            }
        }
    }

    Ok(table)
}

fn restore_err(line_no: usize, message: &str) -> TableError {
    TableError::Restore {
        line: line_no + 1,
        message: message.to_string(),
    }
}

/// Split a header field like `volts[Y]` into name and designation.
fn split_designation(field: &str) -> (&str, PlotDesignation) {
    if let Some(open) = field.rfind('[') {
        if field.ends_with(']') {
            if let Some(pd) = PlotDesignation::from_tag(&field[open..]) {
                return (&field[..open], pd);
            }
        }
    }
    (field, PlotDesignation::Y)
}
