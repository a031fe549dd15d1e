//! tablix-core - UI-agnostic table model + storage.

pub mod column;
pub mod error;
pub mod events;
pub mod storage;
pub mod table;

pub use column::{Column, ColumnKind, PlotDesignation};
pub use error::{Result, TableError};
pub use events::TableEvent;
pub use storage::{ImportOptions, Selection};
pub use table::{ColumnSpec, ScriptFacade, SortOrder, SortType, Table};

pub use tablix_engine::{Evaluator, RhaiEvaluator, Value};
