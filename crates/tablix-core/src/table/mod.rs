//! The table: an ordered sequence of unique-named typed columns sharing one
//! row count, with sorting, normalization, formula recalculation and ASCII
//! import/export layered on top.

mod formula;
mod io;
mod ops;
mod script;
mod sort;
mod state;

pub use script::ScriptFacade;
pub use sort::{ColumnSpec, SortOrder, SortType};
pub use state::Table;
