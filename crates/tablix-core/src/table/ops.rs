use super::Table;
use crate::column::{Column, ColumnKind, PlotDesignation, format_number};
use crate::error::{Result, TableError};
use crate::events::TableEvent;
use tablix_engine::Value;

impl Table {
    /// Set the shared row count; every column is padded with empty cells or
    /// truncated together.
    pub fn set_row_count(&mut self, rows: usize) {
        if rows == self.row_count {
            return;
        }
        for col in &mut self.columns {
            col.resize(rows);
        }
        self.row_count = rows;
        self.record(TableEvent::RowsChanged);
    }

    /// Insert `count` fresh Numeric columns at position `at`.
    pub fn insert_columns(&mut self, at: usize, count: usize, pd: PlotDesignation) -> Result<()> {
        if at > self.columns.len() {
            return Err(TableError::col_index(at, self.columns.len()));
        }
        for offset in 0..count {
            let name = self.next_column_name();
            let col =
                Column::new(name, ColumnKind::Numeric, self.row_count).with_designation(pd);
            self.columns.insert(at + offset, col);
        }
        if count > 0 {
            self.record(TableEvent::ColumnsInserted { first: at, count });
        }
        Ok(())
    }

    /// Append one column; returns its index.
    pub fn add_column(&mut self, pd: PlotDesignation) -> usize {
        let at = self.columns.len();
        // Appending cannot be out of range.
        let _ = self.insert_columns(at, 1, pd);
        at
    }

    /// Append `count` Y-designated columns.
    pub fn add_columns(&mut self, count: usize) {
        let at = self.columns.len();
        let _ = self.insert_columns(at, count, PlotDesignation::Y);
    }

    /// Remove the columns at the given indices. Out-of-range indices are
    /// skipped silently. Each contiguous run produces a before/after event
    /// pair bracketing the structural change.
    pub fn remove_columns(&mut self, indices: &[usize]) {
        let mut valid: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.columns.len())
            .collect();
        valid.sort_unstable();
        valid.dedup();

        // Split into contiguous runs, removed from the right so earlier
        // indices stay valid.
        let mut runs: Vec<(usize, usize)> = Vec::new();
        for &idx in &valid {
            match runs.last_mut() {
                Some((first, count)) if *first + *count == idx => *count += 1,
                _ => runs.push((idx, 1)),
            }
        }
        for &(first, count) in runs.iter().rev() {
            self.record(TableEvent::ColumnsAboutToBeRemoved { first, count });
            self.columns.drain(first..first + count);
            self.record(TableEvent::ColumnsRemoved { first, count });
        }
    }

    pub fn remove_column(&mut self, index: usize) {
        self.remove_columns(&[index]);
    }

    /// Rename a column; names must stay unique within the table.
    pub fn set_col_name(&mut self, col: usize, name: &str) -> Result<()> {
        self.check_col(col)?;
        if self
            .columns
            .iter()
            .enumerate()
            .any(|(i, c)| i != col && c.name == name)
        {
            return Err(TableError::InvalidArgument(format!(
                "column name {name:?} already in use"
            )));
        }
        self.columns[col].name = name.to_string();
        self.record(TableEvent::ColumnChanged(col));
        Ok(())
    }

    /// Change a column's kind, converting stored values through their
    /// display text.
    pub fn set_column_kind(&mut self, col: usize, kind: ColumnKind) -> Result<()> {
        self.column_mut(col)?.set_kind(kind);
        self.record(TableEvent::ColumnChanged(col));
        Ok(())
    }

    /// Strict cell read.
    pub fn value(&self, row: usize, col: usize) -> Result<&Value> {
        self.check_col(col)?;
        self.check_row(row)?;
        Ok(&self.columns[col].values[row])
    }

    /// Permissive numeric read: NaN on any invalid index or non-numeric
    /// cell, never an error. NaN (not the legacy zero) so that "invalid"
    /// stays distinguishable from an actual zero.
    pub fn cell_as_number(&self, row: usize, col: usize) -> f64 {
        match self.columns.get(col) {
            Some(c) => c.number(row),
            None => f64::NAN,
        }
    }

    /// Permissive text read: empty string on any invalid index.
    pub fn cell_as_text(&self, row: usize, col: usize) -> String {
        match self.columns.get(col) {
            Some(c) => c.display(row),
            None => String::new(),
        }
    }

    /// Write a numeric value. Text columns store the formatted
    /// representation; date-family columns interpret the value as a Unix
    /// timestamp in seconds.
    pub fn set_cell_number(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        self.check_col(col)?;
        self.check_row(row)?;
        let column = &mut self.columns[col];
        let stored = match column.kind {
            ColumnKind::Numeric | ColumnKind::Month | ColumnKind::Day => Value::Number(value),
            ColumnKind::Text => Value::Text(format_number(value, &column.format)),
            ColumnKind::Date | ColumnKind::Time | ColumnKind::DateTime => {
                match chrono::DateTime::from_timestamp(value as i64, 0) {
                    Some(dt) => Value::DateTime(dt.naive_utc()),
                    None => {
                        return Err(TableError::Parse {
                            value: value.to_string(),
                            kind: column.kind.name(),
                        });
                    }
                }
            }
        };
        column.set_value(row, stored);
        self.record(TableEvent::ColumnChanged(col));
        Ok(())
    }

    /// Write display text, coerced through the column's kind. On a parse
    /// failure the cell keeps its previous value and the error is returned.
    pub fn set_cell_text(&mut self, row: usize, col: usize, text: &str) -> Result<()> {
        self.check_col(col)?;
        self.check_row(row)?;
        let column = &mut self.columns[col];
        if column.set_from_text(row, text) {
            self.record(TableEvent::ColumnChanged(col));
            Ok(())
        } else {
            Err(TableError::Parse {
                value: text.to_string(),
                kind: column.kind.name(),
            })
        }
    }

    pub fn clear_cell(&mut self, row: usize, col: usize) -> Result<()> {
        self.check_col(col)?;
        self.check_row(row)?;
        self.columns[col].set_value(row, Value::Empty);
        self.record(TableEvent::ColumnChanged(col));
        Ok(())
    }
}
