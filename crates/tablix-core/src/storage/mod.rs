//! Plain-text persistence: ASCII import/export and the round-trippable
//! template format.

pub mod ascii;
pub mod template;

pub use ascii::{ImportOptions, Selection, read_ascii, write_ascii};
pub use template::{restore_from_string, save_to_string};
