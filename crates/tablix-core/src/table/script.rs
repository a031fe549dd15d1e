//! Script-facing facade.
//!
//! The scripting environment addresses cells with 1-based indices; internal
//! storage is 0-based throughout. All conversion happens here, at the single
//! facade boundary, so the core engines never see mixed conventions.
//!
//! Cell reads are permissive by documented policy: an invalid index returns
//! NaN (numeric) or "" (text) instead of raising. This replaces the legacy
//! zero-on-failure behavior so a stored zero stays distinguishable from an
//! invalid access. Writes and metadata lookups stay strict.

use std::path::Path;

use super::sort::{ColumnSpec, SortOrder, SortType};
use super::Table;
use crate::column::{ColumnKind, PlotDesignation};
use crate::error::{Result, TableError};
use crate::storage::{ImportOptions, Selection};
use tablix_engine::Evaluator;

/// 1-based view over a table for the scripting bridge.
pub struct ScriptFacade<'a> {
    table: &'a mut Table,
}

impl Table {
    /// The 1-based script-facing surface.
    pub fn script(&mut self) -> ScriptFacade<'_> {
        ScriptFacade { table: self }
    }
}

/// Convert a 1-based script index to storage, `None` when out of range.
fn to0(index: usize) -> Option<usize> {
    index.checked_sub(1)
}

fn to0_strict(index: usize, what: &'static str, len: usize) -> Result<usize> {
    to0(index).ok_or(TableError::Index {
        what,
        index: 0,
        len,
    })
}

impl ScriptFacade<'_> {
    // --- cell access -----------------------------------------------------

    /// Numeric cell read; NaN on any invalid index or non-numeric content.
    pub fn cell(&self, row: usize, col: usize) -> f64 {
        match (to0(row), to0(col)) {
            (Some(r), Some(c)) => self.table.cell_as_number(r, c),
            _ => f64::NAN,
        }
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let r = to0_strict(row, "row", self.table.row_count())?;
        let c = to0_strict(col, "column", self.table.column_count())?;
        self.table.set_cell_number(r, c, value)
    }

    /// Text cell read; "" on any invalid index.
    pub fn text(&self, row: usize, col: usize) -> String {
        match (to0(row), to0(col)) {
            (Some(r), Some(c)) => self.table.cell_as_text(r, c),
            _ => String::new(),
        }
    }

    pub fn set_text(&mut self, row: usize, col: usize, text: &str) -> Result<()> {
        let r = to0_strict(row, "row", self.table.row_count())?;
        let c = to0_strict(col, "column", self.table.column_count())?;
        self.table.set_cell_text(r, c, text)
    }

    // --- structure -------------------------------------------------------

    pub fn num_rows(&self) -> usize {
        self.table.row_count()
    }

    pub fn num_cols(&self) -> usize {
        self.table.column_count()
    }

    pub fn set_num_rows(&mut self, rows: usize) {
        self.table.set_row_count(rows);
    }

    /// Grow or shrink the column count at the right edge.
    pub fn set_num_cols(&mut self, cols: usize) {
        let current = self.table.column_count();
        if cols > current {
            self.table.add_columns(cols - current);
        } else if cols < current {
            let doomed: Vec<usize> = (cols..current).collect();
            self.table.remove_columns(&doomed);
        }
    }

    /// Insert one empty column before 1-based position `before`.
    pub fn insert_col(&mut self, before: usize) -> Result<()> {
        self.insert_cols(before, 1)
    }

    pub fn insert_cols(&mut self, before: usize, count: usize) -> Result<()> {
        let at = to0_strict(before, "column", self.table.column_count())?;
        self.table.insert_columns(at, count, PlotDesignation::Y)
    }

    /// Remove one column; a missing index is a silent no-op.
    pub fn remove_col(&mut self, col: usize) {
        if let Some(c) = to0(col) {
            self.table.remove_column(c);
        }
    }

    pub fn add_col(&mut self, pd: PlotDesignation) -> usize {
        self.table.add_column(pd) + 1
    }

    pub fn add_columns(&mut self, count: usize) {
        self.table.add_columns(count);
    }

    // --- column metadata -------------------------------------------------

    pub fn col_name(&self, col: usize) -> Result<String> {
        let c = to0_strict(col, "column", self.table.column_count())?;
        Ok(self.table.column(c)?.name.clone())
    }

    pub fn set_col_name(&mut self, col: usize, name: &str) -> Result<()> {
        let c = to0_strict(col, "column", self.table.column_count())?;
        self.table.set_col_name(c, name)
    }

    /// 1-based index of the named column.
    pub fn col_index(&self, name: &str) -> Result<usize> {
        Ok(self.table.col_index(name)? + 1)
    }

    pub fn col_comment(&self, col: usize) -> Result<String> {
        let c = to0_strict(col, "column", self.table.column_count())?;
        Ok(self.table.column(c)?.comment.clone())
    }

    pub fn set_col_comment(&mut self, col: usize, comment: &str) -> Result<()> {
        let c = to0_strict(col, "column", self.table.column_count())?;
        self.table.column_mut(c)?.comment = comment.to_string();
        Ok(())
    }

    pub fn column_type(&self, col: usize) -> Result<ColumnKind> {
        let c = to0_strict(col, "column", self.table.column_count())?;
        Ok(self.table.column(c)?.kind)
    }

    pub fn set_column_type(&mut self, col: usize, kind: ColumnKind) -> Result<()> {
        let c = to0_strict(col, "column", self.table.column_count())?;
        self.table.set_column_kind(c, kind)
    }

    pub fn col_plot_designation(&self, col: usize) -> Result<PlotDesignation> {
        let c = to0_strict(col, "column", self.table.column_count())?;
        Ok(self.table.column(c)?.plot_designation)
    }

    pub fn set_col_plot_designation(&mut self, col: usize, pd: PlotDesignation) -> Result<()> {
        let c = to0_strict(col, "column", self.table.column_count())?;
        self.table.column_mut(c)?.plot_designation = pd;
        Ok(())
    }

    /// 1-based index of the first X-designated column, if any.
    pub fn first_x_col(&self) -> Option<usize> {
        self.table
            .columns()
            .position(|c| c.plot_designation == PlotDesignation::X)
            .map(|i| i + 1)
    }

    /// 1-based index of the X column associated with `col`: the nearest
    /// X-designated column to its left, else the nearest to its right.
    pub fn col_x(&self, col: usize) -> Option<usize> {
        self.nearest_designated(col, PlotDesignation::X)
    }

    /// 1-based index of the Y column associated with `col`, found like
    /// [`ScriptFacade::col_x`]. Used to pair error columns with data.
    pub fn col_y(&self, col: usize) -> Option<usize> {
        self.nearest_designated(col, PlotDesignation::Y)
    }

    fn nearest_designated(&self, col: usize, pd: PlotDesignation) -> Option<usize> {
        let c = to0(col)?;
        let designations: Vec<PlotDesignation> = self
            .table
            .columns()
            .map(|c| c.plot_designation)
            .collect();
        if c >= designations.len() {
            return None;
        }
        let left = designations[..c].iter().rposition(|&d| d == pd);
        let right = designations[c + 1..]
            .iter()
            .position(|&d| d == pd)
            .map(|i| c + 1 + i);
        left.or(right).map(|i| i + 1)
    }

    pub fn no_x_column(&self) -> bool {
        self.first_x_col().is_none()
    }

    pub fn no_y_column(&self) -> bool {
        !self
            .table
            .columns()
            .any(|c| c.plot_designation == PlotDesignation::Y)
    }

    // --- bulk operations -------------------------------------------------

    pub fn sort_column(&mut self, col: usize, order: SortOrder) -> Result<()> {
        let c = to0_strict(col, "column", self.table.column_count())?;
        self.table.sort_column(c, order)
    }

    /// Sort a loosely-specified set of columns. Index-based sets are
    /// 1-based; the leading column is named.
    pub fn sort_columns(
        &mut self,
        spec: &ColumnSpec,
        sort_type: SortType,
        order: SortOrder,
        leading: Option<&str>,
    ) -> Result<()> {
        let cols = self.resolve(spec)?;
        let leading = match leading {
            Some(name) => Some(self.table.col_index(name)?),
            None => None,
        };
        self.table.sort_columns(&cols, sort_type, order, leading)
    }

    pub fn normalize(&mut self, col: usize) -> Result<()> {
        let c = to0_strict(col, "column", self.table.column_count())?;
        self.table.normalize(c)
    }

    pub fn normalize_all(&mut self) {
        self.table.normalize_all();
    }

    /// Recalculate one column; `rows` restricts to a 1-based selection.
    pub fn recalculate(
        &mut self,
        col: usize,
        rows: Option<&[usize]>,
        evaluator: &mut dyn Evaluator,
    ) -> Result<bool> {
        let c = to0_strict(col, "column", self.table.column_count())?;
        let rows0: Option<Vec<usize>> =
            rows.map(|rs| rs.iter().filter_map(|&r| to0(r)).collect());
        self.table.recalculate(c, rows0.as_deref(), evaluator)
    }

    /// Recalculate every column intersecting a 1-based selection.
    pub fn recalculate_selection(
        &mut self,
        cols: &[usize],
        rows: &[usize],
        evaluator: &mut dyn Evaluator,
    ) -> Result<bool> {
        let cols0: Vec<usize> = cols.iter().filter_map(|&c| to0(c)).collect();
        let rows0: Vec<usize> = rows.iter().filter_map(|&r| to0(r)).collect();
        self.table.recalculate_selection(&cols0, &rows0, evaluator)
    }

    // --- serialization ---------------------------------------------------

    pub fn export_ascii(
        &mut self,
        path: &Path,
        separator: &str,
        with_labels: bool,
        selection: Option<&Selection>,
    ) -> bool {
        self.table
            .export_ascii(path, separator, with_labels, selection)
    }

    pub fn import_ascii(&mut self, path: &Path, opts: &ImportOptions) -> bool {
        self.table.import_ascii(path, opts)
    }

    pub fn save_to_string(&self, geometry: &str) -> String {
        self.table.save_to_string(geometry)
    }

    fn resolve(&self, spec: &ColumnSpec) -> Result<Vec<usize>> {
        match spec {
            ColumnSpec::Indices(indices) => {
                let mut out = Vec::with_capacity(indices.len());
                for &i in indices {
                    let c = to0_strict(i, "column", self.table.column_count())?;
                    self.table.check_col(c)?;
                    out.push(c);
                }
                Ok(out)
            }
            ColumnSpec::Names(_) => self.table.resolve_columns(spec),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_is_one_based() {
        let mut t = Table::with_size(2, 1);
        t.set_cell_number(0, 0, 42.0).unwrap();
        let facade = t.script();
        assert_eq!(facade.cell(1, 1), 42.0);
    }

    #[test]
    fn test_cell_out_of_range_returns_nan() {
        let mut t = Table::with_size(3, 1);
        let facade = t.script();
        assert!(facade.cell(10, 1).is_nan());
        assert!(facade.cell(0, 1).is_nan());
        assert_eq!(facade.text(10, 1), "");
    }

    #[test]
    fn test_set_cell_strict() {
        let mut t = Table::with_size(2, 1);
        let mut facade = t.script();
        facade.set_cell(2, 1, 5.0).unwrap();
        assert!(facade.set_cell(3, 1, 5.0).is_err());
        assert!(facade.set_cell(0, 1, 5.0).is_err());
        assert_eq!(facade.cell(2, 1), 5.0);
    }

    #[test]
    fn test_set_num_cols_grows_and_shrinks() {
        let mut t = Table::with_size(1, 2);
        let mut facade = t.script();
        facade.set_num_cols(4);
        assert_eq!(facade.num_cols(), 4);
        facade.set_num_cols(1);
        assert_eq!(facade.num_cols(), 1);
    }

    #[test]
    fn test_col_index_is_one_based() {
        let mut t = Table::with_size(1, 2);
        t.set_col_name(1, "Y").unwrap();
        let facade = t.script();
        assert_eq!(facade.col_index("Y").unwrap(), 2);
    }

    #[test]
    fn test_sort_columns_by_name_with_leading() {
        let mut t = Table::with_size(3, 2);
        t.set_col_name(0, "X").unwrap();
        t.set_col_name(1, "Y").unwrap();
        for (r, (x, y)) in [(3.0, 30.0), (1.0, 10.0), (2.0, 20.0)].iter().enumerate() {
            t.set_cell_number(r, 0, *x).unwrap();
            t.set_cell_number(r, 1, *y).unwrap();
        }
        let mut facade = t.script();
        let spec = ColumnSpec::Names(vec!["X".to_string(), "Y".to_string()]);
        facade
            .sort_columns(&spec, SortType::Together, SortOrder::Ascending, Some("X"))
            .unwrap();
        assert_eq!(facade.cell(1, 1), 1.0);
        assert_eq!(facade.cell(1, 2), 10.0);
        assert_eq!(facade.cell(3, 2), 30.0);
    }

    #[test]
    fn test_col_x_prefers_left_neighbor() {
        let mut t = Table::with_size(1, 4);
        {
            let mut facade = t.script();
            facade
                .set_col_plot_designation(3, PlotDesignation::X)
                .unwrap();
        }
        let facade = t.script();
        // Designations are now X Y X Y.
        assert_eq!(facade.col_x(2), Some(1));
        assert_eq!(facade.col_x(4), Some(3));
        assert_eq!(facade.col_y(1), Some(2));
        assert_eq!(facade.col_x(99), None);
    }

    #[test]
    fn test_first_x_col() {
        let mut t = Table::with_size(1, 3);
        {
            let facade = t.script();
            assert_eq!(facade.first_x_col(), Some(1));
        }
        t.script()
            .set_col_plot_designation(1, PlotDesignation::Y)
            .unwrap();
        assert!(t.script().no_x_column());
        assert!(!t.script().no_y_column());
    }
}
