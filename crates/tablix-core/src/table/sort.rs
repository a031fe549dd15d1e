//! Sort engine: stable single-column and linked multi-column sorting,
//! plus normalization.

use super::Table;
use crate::column::ColumnKind;
use crate::error::{Result, TableError};
use crate::events::TableEvent;
use std::cmp::Ordering;
use tablix_engine::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortType {
    /// Sort each column independently by its own values.
    Separate,
    /// Apply the leading column's permutation to every column in the set,
    /// keeping rows aligned.
    Together,
}

/// Loosely-typed column set as it arrives from a script surface; resolved
/// to concrete indices before reaching the sort or formula engines.
#[derive(Clone, Debug)]
pub enum ColumnSpec {
    Indices(Vec<usize>),
    Names(Vec<String>),
}

impl Table {
    pub(crate) fn resolve_columns(&self, spec: &ColumnSpec) -> Result<Vec<usize>> {
        match spec {
            ColumnSpec::Indices(indices) => {
                for &i in indices {
                    self.check_col(i)?;
                }
                Ok(indices.clone())
            }
            ColumnSpec::Names(names) => {
                names.iter().map(|n| self.col_index(n)).collect()
            }
        }
    }

    /// Stable permutation that sorts `col` in the requested order.
    /// Invalid and empty cells always group after the valid ones, in their
    /// original relative order, regardless of direction.
    pub fn sort_permutation(&self, col: usize, order: SortOrder) -> Result<Vec<usize>> {
        let column = self.column(col)?;
        let kind = column.kind;
        let values = column.values();
        let mut perm: Vec<usize> = (0..values.len()).collect();
        perm.sort_by(|&a, &b| {
            let (va, vb) = (&values[a], &values[b]);
            match (kind.is_valid(va), kind.is_valid(vb)) {
                (false, false) => Ordering::Equal,
                (false, true) => Ordering::Greater,
                (true, false) => Ordering::Less,
                (true, true) => {
                    let ord = kind.compare(va, vb);
                    match order {
                        SortOrder::Ascending => ord,
                        SortOrder::Descending => ord.reverse(),
                    }
                }
            }
        });
        Ok(perm)
    }

    fn apply_permutation(&mut self, col: usize, perm: &[usize]) {
        let column = &mut self.columns[col];
        let reordered: Vec<Value> = perm.iter().map(|&i| column.values[i].clone()).collect();
        column.values = reordered;
        self.record(TableEvent::ColumnChanged(col));
    }

    /// Sort one column by its own values; other columns are untouched.
    pub fn sort_column(&mut self, col: usize, order: SortOrder) -> Result<()> {
        let perm = self.sort_permutation(col, order)?;
        self.apply_permutation(col, &perm);
        Ok(())
    }

    /// Sort a set of columns. In `Together` mode the permutation of the
    /// leading column is applied to every column in the set; the leading
    /// column must be a member of the set.
    pub fn sort_columns(
        &mut self,
        cols: &[usize],
        sort_type: SortType,
        order: SortOrder,
        leading: Option<usize>,
    ) -> Result<()> {
        if cols.is_empty() {
            return Ok(());
        }
        for &c in cols {
            self.check_col(c)?;
        }
        match sort_type {
            SortType::Separate => {
                for &c in cols {
                    self.sort_column(c, order)?;
                }
            }
            SortType::Together => {
                let leading = leading.ok_or_else(|| {
                    TableError::InvalidArgument("together sort requires a leading column".into())
                })?;
                if !cols.contains(&leading) {
                    return Err(TableError::InvalidArgument(format!(
                        "leading column {leading} is not part of the sorted set"
                    )));
                }
                let perm = self.sort_permutation(leading, order)?;
                for &c in cols {
                    self.apply_permutation(c, &perm);
                }
            }
        }
        Ok(())
    }

    /// Scale a Numeric column so its maximum magnitude is 1. Idempotent.
    /// Non-Numeric columns (Month/Day ordinals included) and columns
    /// without finite non-zero values are left untouched.
    pub fn normalize(&mut self, col: usize) -> Result<()> {
        let column = self.column_mut(col)?;
        if column.kind != ColumnKind::Numeric {
            return Ok(());
        }
        let max = column
            .values
            .iter()
            .filter_map(|v| match v {
                Value::Number(n) if n.is_finite() => Some(n.abs()),
                _ => None,
            })
            .fold(0.0f64, f64::max);
        if max > 0.0 {
            for v in &mut column.values {
                if let Value::Number(n) = v {
                    *n /= max;
                }
            }
            self.record(TableEvent::ColumnChanged(col));
        }
        Ok(())
    }

    /// Normalize every column.
    pub fn normalize_all(&mut self) {
        for col in 0..self.columns.len() {
            // Indices stay valid, normalize never restructures.
            let _ = self.normalize(col);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnKind;

    fn numeric_table(data: &[&[f64]]) -> Table {
        let rows = data.first().map_or(0, |c| c.len());
        let mut t = Table::with_size(rows, data.len());
        for (c, col) in data.iter().enumerate() {
            for (r, &v) in col.iter().enumerate() {
                t.set_cell_number(r, c, v).unwrap();
            }
        }
        t
    }

    #[test]
    fn test_sort_column_ascending() {
        let mut t = numeric_table(&[&[3.0, 1.0, 2.0]]);
        t.sort_column(0, SortOrder::Ascending).unwrap();
        assert_eq!(
            (0..3).map(|r| t.cell_as_number(r, 0)).collect::<Vec<_>>(),
            vec![1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn test_sort_column_descending() {
        let mut t = numeric_table(&[&[3.0, 1.0, 2.0]]);
        t.sort_column(0, SortOrder::Descending).unwrap();
        assert_eq!(
            (0..3).map(|r| t.cell_as_number(r, 0)).collect::<Vec<_>>(),
            vec![3.0, 2.0, 1.0]
        );
    }

    #[test]
    fn test_sort_is_stable_for_duplicate_keys() {
        let mut t = Table::with_size(4, 2);
        t.set_column_kind(1, ColumnKind::Text).unwrap();
        for (r, (k, tag)) in [(1.0, "a"), (0.0, "b"), (1.0, "c"), (0.0, "d")]
            .iter()
            .enumerate()
        {
            t.set_cell_number(r, 0, *k).unwrap();
            t.set_cell_text(r, 1, tag).unwrap();
        }
        t.sort_columns(&[0, 1], SortType::Together, SortOrder::Ascending, Some(0))
            .unwrap();
        let tags: Vec<String> = (0..4).map(|r| t.cell_as_text(r, 1)).collect();
        assert_eq!(tags, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_together_sort_keeps_rows_aligned() {
        let mut t = numeric_table(&[&[3.0, 1.0, 2.0], &[30.0, 10.0, 20.0]]);
        t.sort_columns(&[0, 1], SortType::Together, SortOrder::Ascending, Some(0))
            .unwrap();
        let x: Vec<f64> = (0..3).map(|r| t.cell_as_number(r, 0)).collect();
        let y: Vec<f64> = (0..3).map(|r| t.cell_as_number(r, 1)).collect();
        assert_eq!(x, vec![1.0, 2.0, 3.0]);
        assert_eq!(y, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_separate_sort_breaks_alignment() {
        let mut t = numeric_table(&[&[3.0, 1.0, 2.0], &[10.0, 30.0, 20.0]]);
        t.sort_columns(&[0, 1], SortType::Separate, SortOrder::Ascending, None)
            .unwrap();
        let x: Vec<f64> = (0..3).map(|r| t.cell_as_number(r, 0)).collect();
        let y: Vec<f64> = (0..3).map(|r| t.cell_as_number(r, 1)).collect();
        assert_eq!(x, vec![1.0, 2.0, 3.0]);
        assert_eq!(y, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_together_sort_leading_not_in_set() {
        let mut t = numeric_table(&[&[1.0], &[2.0], &[3.0]]);
        let err = t.sort_columns(&[0, 1], SortType::Together, SortOrder::Ascending, Some(2));
        assert!(matches!(err, Err(TableError::InvalidArgument(_))));
    }

    #[test]
    fn test_empty_set_is_noop() {
        let mut t = numeric_table(&[&[2.0, 1.0]]);
        t.sort_columns(&[], SortType::Together, SortOrder::Ascending, None)
            .unwrap();
        assert_eq!(t.cell_as_number(0, 0), 2.0);
    }

    #[test]
    fn test_empty_cells_sort_last_either_direction() {
        let mut t = Table::with_size(3, 1);
        t.set_cell_number(0, 0, 2.0).unwrap();
        t.set_cell_number(2, 0, 1.0).unwrap(); // row 1 stays empty
        t.sort_column(0, SortOrder::Ascending).unwrap();
        assert_eq!(t.cell_as_number(0, 0), 1.0);
        assert_eq!(t.cell_as_number(1, 0), 2.0);
        assert!(t.cell_as_number(2, 0).is_nan());

        t.sort_column(0, SortOrder::Descending).unwrap();
        assert_eq!(t.cell_as_number(0, 0), 2.0);
        assert_eq!(t.cell_as_number(1, 0), 1.0);
        assert!(t.cell_as_number(2, 0).is_nan());
    }

    #[test]
    fn test_text_column_sorts_lexically() {
        let mut t = Table::with_size(3, 1);
        t.set_column_kind(0, ColumnKind::Text).unwrap();
        for (r, s) in ["pear", "apple", "mango"].iter().enumerate() {
            t.set_cell_text(r, 0, s).unwrap();
        }
        t.sort_column(0, SortOrder::Ascending).unwrap();
        let got: Vec<String> = (0..3).map(|r| t.cell_as_text(r, 0)).collect();
        assert_eq!(got, vec!["apple", "mango", "pear"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut t = numeric_table(&[&[2.0, -4.0, 1.0]]);
        t.normalize(0).unwrap();
        let first: Vec<f64> = (0..3).map(|r| t.cell_as_number(r, 0)).collect();
        assert_eq!(first, vec![0.5, -1.0, 0.25]);
        t.normalize(0).unwrap();
        let second: Vec<f64> = (0..3).map(|r| t.cell_as_number(r, 0)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_normalize_skips_non_numeric_kinds() {
        let mut t = Table::with_size(2, 2);
        t.set_column_kind(0, ColumnKind::Month).unwrap();
        t.set_cell_text(0, 0, "Feb").unwrap();
        t.set_cell_text(1, 0, "Dec").unwrap();
        t.set_cell_number(0, 1, 4.0).unwrap();
        t.set_cell_number(1, 1, 2.0).unwrap();
        t.normalize_all();
        // Ordinals keep formatting as month names.
        assert_eq!(t.cell_as_text(0, 0), "Feb");
        assert_eq!(t.cell_as_text(1, 0), "Dec");
        assert_eq!(t.cell_as_number(0, 1), 1.0);
        assert_eq!(t.cell_as_number(1, 1), 0.5);
    }

    #[test]
    fn test_normalize_all_zero_column_untouched() {
        let mut t = numeric_table(&[&[0.0, 0.0]]);
        t.normalize(0).unwrap();
        assert_eq!(t.cell_as_number(0, 0), 0.0);
    }

    #[test]
    fn test_resolve_columns_by_name() {
        let t = Table::with_size(1, 3);
        let spec = ColumnSpec::Names(vec!["2".to_string(), "3".to_string()]);
        assert_eq!(t.resolve_columns(&spec).unwrap(), vec![1, 2]);
        let bad = ColumnSpec::Names(vec!["missing".to_string()]);
        assert!(t.resolve_columns(&bad).is_err());
    }
}
