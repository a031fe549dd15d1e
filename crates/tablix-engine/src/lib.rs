//! tablix-engine - value model and formula evaluation.
//!
//! - [`Value`] - Typed cell value shared between the table model and the
//!   evaluator
//! - [`Evaluator`] - Capability trait the table's formula engine calls once
//!   per row
//! - [`RhaiEvaluator`] - Rhai-backed implementation with column builtins

pub mod eval;
pub mod value;

pub use eval::{ColumnData, EvalError, Evaluator, RhaiEvaluator};
pub use value::Value;

pub use rhai::{AST, Dynamic};
