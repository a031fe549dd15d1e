use crate::column::{Column, ColumnKind, PlotDesignation};
use crate::error::{Result, TableError};
use crate::events::TableEvent;

/// Column-oriented table state.
///
/// Invariants maintained by every mutation:
/// - each column's value count equals `row_count`
/// - column names are pairwise distinct
///
/// Mutations append [`TableEvent`] diff records; an attached view drains
/// them with [`Table::drain_events`] after each call.
pub struct Table {
    pub(crate) columns: Vec<Column>,
    pub(crate) row_count: usize,
    /// Pending change notifications, in emission order.
    events: Vec<TableEvent>,
    /// Message from the most recent failed import/export.
    last_error: Option<String>,
    /// Whether exports with labels include the per-column comment line.
    pub comments_enabled: bool,
}

impl Table {
    /// Create an empty table (no rows, no columns).
    pub fn new() -> Table {
        Table {
            columns: Vec::new(),
            row_count: 0,
            events: Vec::new(),
            last_error: None,
            comments_enabled: false,
        }
    }

    /// Create a table with `cols` Numeric columns of `rows` empty cells.
    /// The first column is designated X, the rest Y.
    pub fn with_size(rows: usize, cols: usize) -> Table {
        let mut table = Table::new();
        table.row_count = rows;
        for i in 0..cols {
            let pd = if i == 0 {
                PlotDesignation::X
            } else {
                PlotDesignation::Y
            };
            let name = (i + 1).to_string();
            table
                .columns
                .push(Column::new(name, ColumnKind::Numeric, rows).with_designation(pd));
        }
        table
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> Result<&Column> {
        self.columns
            .get(index)
            .ok_or(TableError::col_index(index, self.columns.len()))
    }

    pub(crate) fn column_mut(&mut self, index: usize) -> Result<&mut Column> {
        let len = self.columns.len();
        self.columns
            .get_mut(index)
            .ok_or(TableError::col_index(index, len))
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn col_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Resolve a column name to its index.
    pub fn col_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| TableError::InvalidArgument(format!("unknown column {name:?}")))
    }

    pub fn column_by_name(&self, name: &str) -> Result<&Column> {
        let idx = self.col_index(name)?;
        Ok(&self.columns[idx])
    }

    /// Smallest positive integer not yet used as a column name.
    pub(crate) fn next_column_name(&self) -> String {
        let mut n = self.columns.len() + 1;
        loop {
            let candidate = n.to_string();
            if self.columns.iter().all(|c| c.name != candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    pub(crate) fn check_row(&self, row: usize) -> Result<()> {
        if row < self.row_count {
            Ok(())
        } else {
            Err(TableError::row_index(row, self.row_count))
        }
    }

    pub(crate) fn check_col(&self, col: usize) -> Result<()> {
        if col < self.columns.len() {
            Ok(())
        } else {
            Err(TableError::col_index(col, self.columns.len()))
        }
    }

    pub(crate) fn record(&mut self, event: TableEvent) {
        self.events.push(event);
    }

    /// Drain pending change notifications in emission order.
    pub fn drain_events(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.events)
    }

    /// Message from the most recent failed import/export, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn set_last_error(&mut self, message: Option<String>) {
        self.last_error = message;
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_size_designations() {
        let t = Table::with_size(4, 3);
        assert_eq!(t.row_count(), 4);
        assert_eq!(t.column_count(), 3);
        assert_eq!(t.column(0).unwrap().plot_designation, PlotDesignation::X);
        assert_eq!(t.column(1).unwrap().plot_designation, PlotDesignation::Y);
        assert_eq!(t.col_names(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_all_columns_match_row_count() {
        let t = Table::with_size(5, 4);
        assert!(t.columns().all(|c| c.len() == t.row_count()));
    }

    #[test]
    fn test_col_index_unknown_name() {
        let t = Table::with_size(1, 1);
        assert!(matches!(
            t.col_index("nope"),
            Err(TableError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_next_column_name_skips_used() {
        let mut t = Table::with_size(0, 2); // names "1", "2"
        assert_eq!(t.next_column_name(), "3");
        t.columns[1].name = "3".to_string();
        assert_eq!(t.next_column_name(), "4");
    }
}
