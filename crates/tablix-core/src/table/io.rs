use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::Table;
use crate::error::Result;
use crate::events::TableEvent;
use crate::storage::{self, ImportOptions, Selection};

impl Table {
    /// Read a new table from a delimited text file.
    pub fn from_ascii_file(path: &Path, opts: &ImportOptions) -> Result<Table> {
        let file = File::open(path)?;
        storage::read_ascii(BufReader::new(file), opts)
    }

    /// Replace this table's contents with an ASCII import.
    ///
    /// Returns a success flag; on failure the message is retrievable via
    /// [`Table::last_error`]. Import is best-effort: a mid-stream failure
    /// leaves the table unchanged only because the new contents are staged
    /// in a fresh table first.
    pub fn import_ascii(&mut self, path: &Path, opts: &ImportOptions) -> bool {
        match Table::from_ascii_file(path, opts) {
            Ok(imported) => {
                // The whole column set is replaced; bracket it like any
                // other structural edit so listeners can detach and rebuild.
                let removed = self.columns.len();
                if removed > 0 {
                    self.record(TableEvent::ColumnsAboutToBeRemoved {
                        first: 0,
                        count: removed,
                    });
                }
                self.columns = imported.columns;
                self.row_count = imported.row_count;
                if removed > 0 {
                    self.record(TableEvent::ColumnsRemoved {
                        first: 0,
                        count: removed,
                    });
                }
                let inserted = self.columns.len();
                if inserted > 0 {
                    self.record(TableEvent::ColumnsInserted {
                        first: 0,
                        count: inserted,
                    });
                }
                self.set_last_error(None);
                self.record(TableEvent::RowsChanged);
                true
            }
            Err(e) => {
                self.set_last_error(Some(e.to_string()));
                false
            }
        }
    }

    /// Export to a delimited text file; the table is left untouched.
    ///
    /// Returns a success flag with the message retrievable via
    /// [`Table::last_error`].
    pub fn export_ascii(
        &mut self,
        path: &Path,
        separator: &str,
        with_labels: bool,
        selection: Option<&Selection>,
    ) -> bool {
        let result = File::create(path).map_err(crate::error::TableError::from).and_then(|f| {
            storage::write_ascii(self, BufWriter::new(f), separator, with_labels, selection)
        });
        match result {
            Ok(()) => {
                self.set_last_error(None);
                true
            }
            Err(e) => {
                self.set_last_error(Some(e.to_string()));
                false
            }
        }
    }

    /// Serialize into the round-trippable template blob.
    pub fn save_to_string(&self, geometry: &str) -> String {
        storage::save_to_string(self, geometry)
    }

    /// Rebuild a table from a template blob produced by
    /// [`Table::save_to_string`].
    pub fn restore(text: &str) -> Result<Table> {
        storage::restore_from_string(text)
    }
}
