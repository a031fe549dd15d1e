//! Formula evaluation.
//!
//! The table core never parses expressions itself; it calls an [`Evaluator`]
//! once per row and writes the result back into the column. [`RhaiEvaluator`]
//! is the stock implementation: a Rhai engine with column-access builtins
//! registered over a shared snapshot of the table's data.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use rhai::{AST, Dynamic, Engine, Scope};

use crate::value::Value;

/// Shared, read-only snapshot of column data visible to formula builtins.
/// DashMap is internally Arc-based, clones are cheap.
pub type ColumnData = Arc<DashMap<String, Vec<Value>>>;

/// Error produced while evaluating a formula for one row.
#[derive(Debug, Clone)]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        EvalError {
            message: message.into(),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EvalError {}

/// Capability the formula engine calls to evaluate a column formula.
///
/// `row` is the 0-based row index; implementations must be reentrant across
/// calls for different rows.
pub trait Evaluator {
    fn evaluate(&mut self, formula: &str, row: usize) -> Result<Value, EvalError>;

    /// Called once before a recalculation pass with a snapshot of every
    /// column, so builtins observe pre-pass values. Default: ignore.
    fn sync_columns(&mut self, _columns: Vec<(String, Vec<Value>)>) {}
}

/// Closure-backed evaluator, handy for tests and simple embedders.
impl<F> Evaluator for F
where
    F: FnMut(&str, usize) -> Result<Value, EvalError>,
{
    fn evaluate(&mut self, formula: &str, row: usize) -> Result<Value, EvalError> {
        self(formula, row)
    }
}

/// Rhai-backed formula evaluator.
///
/// Formulas are plain Rhai expressions. The 1-based row index is bound as
/// `i`; `col(name, i)` and `cell(name, i)` read from the shared column
/// snapshot, `text(name, i)` reads the textual representation, and `rand()`
/// yields a uniform random number in `[0, 1)`.
pub struct RhaiEvaluator {
    engine: Engine,
    data: ColumnData,
    ast_cache: HashMap<String, AST>,
}

impl RhaiEvaluator {
    pub fn new() -> Self {
        Self::with_data(Arc::new(DashMap::new()))
    }

    /// Create an evaluator over an existing shared snapshot.
    pub fn with_data(data: ColumnData) -> Self {
        let mut engine = Engine::new();
        register_builtins(&mut engine, data.clone());
        RhaiEvaluator {
            engine,
            data,
            ast_cache: HashMap::new(),
        }
    }

    /// The shared column snapshot read by the builtins.
    pub fn data(&self) -> ColumnData {
        self.data.clone()
    }

    fn compiled(&mut self, formula: &str) -> Result<&AST, EvalError> {
        if !self.ast_cache.contains_key(formula) {
            let ast = self
                .engine
                .compile(formula)
                .map_err(|e| EvalError::new(e.to_string()))?;
            self.ast_cache.insert(formula.to_string(), ast);
        }
        Ok(&self.ast_cache[formula])
    }
}

impl Default for RhaiEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for RhaiEvaluator {
    fn evaluate(&mut self, formula: &str, row: usize) -> Result<Value, EvalError> {
        // Compile once per distinct formula text; row changes only the scope.
        self.compiled(formula)?;
        let ast = &self.ast_cache[formula];

        let mut scope = Scope::new();
        scope.push("i", (row + 1) as i64);

        let result: Dynamic = self
            .engine
            .eval_ast_with_scope(&mut scope, ast)
            .map_err(|e| EvalError::new(e.to_string()))?;
        Ok(dynamic_to_value(&result))
    }

    fn sync_columns(&mut self, columns: Vec<(String, Vec<Value>)>) {
        self.data.clear();
        for (name, values) in columns {
            self.data.insert(name, values);
        }
    }
}

/// Convert a Rhai result into a cell value.
fn dynamic_to_value(value: &Dynamic) -> Value {
    if value.is_unit() {
        Value::Empty
    } else if let Ok(n) = value.as_float() {
        Value::Number(n)
    } else if let Ok(n) = value.as_int() {
        Value::Number(n as f64)
    } else if let Ok(b) = value.as_bool() {
        Value::Number(if b { 1.0 } else { 0.0 })
    } else if let Ok(s) = value.clone().into_string() {
        Value::Text(s)
    } else {
        Value::Text(value.to_string())
    }
}

fn register_builtins(engine: &mut Engine, data: ColumnData) {
    let col_data = data.clone();
    engine.register_fn("col", move |name: &str, i: i64| -> f64 {
        lookup(&col_data, name, i).map_or(f64::NAN, |v| v.as_number())
    });

    let cell_data = data.clone();
    engine.register_fn("cell", move |name: &str, i: i64| -> f64 {
        lookup(&cell_data, name, i).map_or(f64::NAN, |v| v.as_number())
    });

    let text_data = data;
    engine.register_fn("text", move |name: &str, i: i64| -> String {
        lookup(&text_data, name, i).map_or_else(String::new, |v| v.as_text())
    });

    engine.register_fn("rand", || rand::random::<f64>());
}

/// Fetch a value from the snapshot by column name and 1-based row index.
fn lookup(data: &ColumnData, name: &str, i: i64) -> Option<Value> {
    if i < 1 {
        return None;
    }
    data.get(name)
        .and_then(|values| values.get((i - 1) as usize).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_binds_one_based_row() {
        let mut eval = RhaiEvaluator::new();
        let v = eval.evaluate("i * 2", 0).unwrap();
        assert_eq!(v, Value::Number(2.0));
        let v = eval.evaluate("i * 2", 4).unwrap();
        assert_eq!(v, Value::Number(10.0));
    }

    #[test]
    fn test_col_builtin_reads_snapshot() {
        let mut eval = RhaiEvaluator::new();
        eval.sync_columns(vec![(
            "X".to_string(),
            vec![Value::Number(3.0), Value::Number(7.0)],
        )]);
        let v = eval.evaluate("col(\"X\", i) + 1", 1).unwrap();
        assert_eq!(v, Value::Number(8.0));
    }

    #[test]
    fn test_col_builtin_missing_column_is_nan() {
        let mut eval = RhaiEvaluator::new();
        let v = eval.evaluate("col(\"nope\", i)", 0).unwrap();
        match v {
            Value::Number(n) => assert!(n.is_nan()),
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn test_text_result_becomes_text_value() {
        let mut eval = RhaiEvaluator::new();
        let v = eval.evaluate("\"row \" + i.to_string()", 2).unwrap();
        assert_eq!(v, Value::Text("row 3".to_string()));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let mut eval = RhaiEvaluator::new();
        assert!(eval.evaluate("1 +", 0).is_err());
    }

    #[test]
    fn test_closure_evaluator() {
        let mut eval = |_f: &str, row: usize| Ok(Value::Number(row as f64));
        let v = Evaluator::evaluate(&mut eval, "ignored", 3).unwrap();
        assert_eq!(v, Value::Number(3.0));
    }
}
