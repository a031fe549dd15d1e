//! Change notifications for external views.
//!
//! Structural edits record diff events instead of invoking callbacks: each
//! mutation appends to the table's internal queue and the view drains it
//! after the call returns. Removals still produce a before/after pair in
//! queue order, so a listener replaying the queue never sees a column count
//! that disagrees with an index it holds.

/// A change record emitted by a table mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableEvent {
    /// Emitted before the columns `first..first + count` are removed.
    ColumnsAboutToBeRemoved { first: usize, count: usize },
    /// Emitted once the removal is committed.
    ColumnsRemoved { first: usize, count: usize },
    /// Columns `first..first + count` were inserted.
    ColumnsInserted { first: usize, count: usize },
    /// Cell data or metadata of one column changed.
    ColumnChanged(usize),
    /// The shared row count changed; every column was padded or truncated.
    RowsChanged,
}
