//! Error types for the Tablix table core.

use thiserror::Error;

/// Errors raised by table operations.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("{what} index {index} out of range (0..{len})")]
    Index {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("cannot parse {value:?} as {kind}")]
    Parse { value: String, kind: &'static str },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("restore error at line {line}: {message}")]
    Restore { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, TableError>;

impl TableError {
    pub(crate) fn row_index(index: usize, len: usize) -> Self {
        TableError::Index {
            what: "row",
            index,
            len,
        }
    }

    pub(crate) fn col_index(index: usize, len: usize) -> Self {
        TableError::Index {
            what: "column",
            index,
            len,
        }
    }
}
