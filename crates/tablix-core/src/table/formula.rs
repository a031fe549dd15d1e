//! Formula engine: on-demand recalculation of column formulas.
//!
//! Each column carries at most one formula string. There is no dependency
//! tracking; callers decide when to recalculate and over which rows. The
//! expression itself is evaluated by an injected [`Evaluator`].

use super::Table;
use crate::error::Result;
use crate::events::TableEvent;
use tablix_engine::{Evaluator, Value};

impl Table {
    /// Set or clear one column's formula.
    pub fn set_formula(&mut self, col: usize, formula: Option<String>) -> Result<()> {
        self.column_mut(col)?.formula = formula;
        Ok(())
    }

    pub fn formula(&self, col: usize) -> Result<Option<&str>> {
        Ok(self.column(col)?.formula.as_deref())
    }

    /// Assign formulas to the leading columns in order; columns beyond the
    /// list keep their formula. Empty strings clear.
    pub fn set_formulas(&mut self, formulas: &[String]) {
        for (col, text) in formulas.iter().enumerate().take(self.columns.len()) {
            self.columns[col].formula = if text.is_empty() {
                None
            } else {
                Some(text.clone())
            };
        }
    }

    /// Recalculate one column over `rows` (or every row when `None`).
    ///
    /// Returns `Ok(false)` when the column has no formula. Per-row
    /// evaluation failures leave that row's cell at its prior value and do
    /// not abort the pass; the call still returns `Ok(true)`.
    pub fn recalculate(
        &mut self,
        col: usize,
        rows: Option<&[usize]>,
        evaluator: &mut dyn Evaluator,
    ) -> Result<bool> {
        let Some(formula) = self.column(col)?.formula.clone() else {
            return Ok(false);
        };

        // Snapshot every column so builtins observe pre-pass values even
        // while results are being written back.
        evaluator.sync_columns(
            self.columns
                .iter()
                .map(|c| (c.name.clone(), c.values.clone()))
                .collect(),
        );

        let targets: Vec<usize> = match rows {
            Some(rows) => rows.iter().copied().filter(|&r| r < self.row_count).collect(),
            None => (0..self.row_count).collect(),
        };

        let mut failures = 0usize;
        for row in targets {
            match evaluator.evaluate(&formula, row) {
                Ok(value) => self.write_result(col, row, value),
                Err(_) => failures += 1,
            }
        }
        if failures > 0 {
            let name = &self.columns[col].name;
            self.set_last_error(Some(format!(
                "formula for column {name:?} failed on {failures} row(s)"
            )));
        }
        self.record(TableEvent::ColumnChanged(col));
        Ok(true)
    }

    /// Recalculate every listed column whose cells intersect `rows`.
    /// Returns `true` when at least one column had a formula.
    pub fn recalculate_selection(
        &mut self,
        cols: &[usize],
        rows: &[usize],
        evaluator: &mut dyn Evaluator,
    ) -> Result<bool> {
        let mut any = false;
        for &col in cols {
            any |= self.recalculate(col, Some(rows), evaluator)?;
        }
        Ok(any)
    }

    /// Store an evaluation result under the column's kind: numeric results
    /// into text columns become formatted text, textual results into typed
    /// columns go through the kind's parser. Unconvertible results leave
    /// the cell at its prior value.
    fn write_result(&mut self, col: usize, row: usize, value: Value) {
        let column = &mut self.columns[col];
        match value {
            Value::Empty => column.set_value(row, Value::Empty),
            Value::Number(n) => {
                if column.kind.is_valid(&Value::Number(n)) {
                    column.set_value(row, Value::Number(n));
                } else {
                    let text = Value::Number(n).as_text();
                    column.set_from_text(row, &text);
                }
            }
            Value::Text(s) => {
                column.set_from_text(row, &s);
            }
            Value::DateTime(dt) => {
                if column.kind.is_valid(&Value::DateTime(dt)) {
                    column.set_value(row, Value::DateTime(dt));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnKind;
    use tablix_engine::{EvalError, RhaiEvaluator};

    #[test]
    fn test_recalculate_without_formula_is_false() {
        let mut t = Table::with_size(3, 1);
        let mut eval = RhaiEvaluator::new();
        assert!(!t.recalculate(0, None, &mut eval).unwrap());
    }

    #[test]
    fn test_recalculate_all_rows() {
        let mut t = Table::with_size(3, 1);
        t.set_formula(0, Some("i * i".to_string())).unwrap();
        let mut eval = RhaiEvaluator::new();
        assert!(t.recalculate(0, None, &mut eval).unwrap());
        let got: Vec<f64> = (0..3).map(|r| t.cell_as_number(r, 0)).collect();
        assert_eq!(got, vec![1.0, 4.0, 9.0]);
    }

    #[test]
    fn test_recalculate_selected_rows_only() {
        let mut t = Table::with_size(3, 1);
        for r in 0..3 {
            t.set_cell_number(r, 0, 100.0).unwrap();
        }
        t.set_formula(0, Some("0.0 + i".to_string())).unwrap();
        let mut eval = RhaiEvaluator::new();
        t.recalculate(0, Some(&[1]), &mut eval).unwrap();
        assert_eq!(t.cell_as_number(0, 0), 100.0);
        assert_eq!(t.cell_as_number(1, 0), 2.0);
        assert_eq!(t.cell_as_number(2, 0), 100.0);
    }

    #[test]
    fn test_formula_reads_other_columns() {
        let mut t = Table::with_size(2, 2);
        t.set_col_name(0, "X").unwrap();
        t.set_col_name(1, "Y").unwrap();
        t.set_cell_number(0, 0, 10.0).unwrap();
        t.set_cell_number(1, 0, 20.0).unwrap();
        t.set_formula(1, Some("col(\"X\", i) * 3".to_string()))
            .unwrap();
        let mut eval = RhaiEvaluator::new();
        t.recalculate(1, None, &mut eval).unwrap();
        assert_eq!(t.cell_as_number(0, 1), 30.0);
        assert_eq!(t.cell_as_number(1, 1), 60.0);
    }

    #[test]
    fn test_snapshot_is_pre_pass() {
        // A self-referencing formula must see the old values for every row.
        let mut t = Table::with_size(2, 1);
        t.set_col_name(0, "X").unwrap();
        t.set_cell_number(0, 0, 1.0).unwrap();
        t.set_cell_number(1, 0, 2.0).unwrap();
        // Each row becomes the value of the other row, pre-pass.
        t.set_formula(0, Some("col(\"X\", 3 - i)".to_string())).unwrap();
        let mut eval = RhaiEvaluator::new();
        t.recalculate(0, None, &mut eval).unwrap();
        assert_eq!(t.cell_as_number(0, 0), 2.0);
        assert_eq!(t.cell_as_number(1, 0), 1.0);
    }

    #[test]
    fn test_per_row_failure_keeps_prior_value() {
        let mut t = Table::with_size(3, 1);
        for r in 0..3 {
            t.set_cell_number(r, 0, 7.0).unwrap();
        }
        t.set_formula(0, Some("x".to_string())).unwrap();
        let mut failing = |_: &str, row: usize| {
            if row == 1 {
                Err(EvalError::new("boom"))
            } else {
                Ok(Value::Number(row as f64))
            }
        };
        assert!(t.recalculate(0, None, &mut failing).unwrap());
        assert_eq!(t.cell_as_number(0, 0), 0.0);
        assert_eq!(t.cell_as_number(1, 0), 7.0);
        assert_eq!(t.cell_as_number(2, 0), 2.0);
        assert!(t.last_error().unwrap().contains("1 row"));
    }

    #[test]
    fn test_numeric_result_into_text_column() {
        let mut t = Table::with_size(1, 1);
        t.set_column_kind(0, ColumnKind::Text).unwrap();
        t.set_formula(0, Some("2 + 2".to_string())).unwrap();
        let mut eval = RhaiEvaluator::new();
        t.recalculate(0, None, &mut eval).unwrap();
        assert_eq!(t.cell_as_text(0, 0), "4");
    }

    #[test]
    fn test_recalculate_selection_reports_any_formula() {
        let mut t = Table::with_size(2, 2);
        t.set_formula(1, Some("1.0 * i".to_string())).unwrap();
        let mut eval = RhaiEvaluator::new();
        let any = t
            .recalculate_selection(&[0, 1], &[0, 1], &mut eval)
            .unwrap();
        assert!(any);
        assert_eq!(t.cell_as_number(1, 1), 2.0);
    }
}
