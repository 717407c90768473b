//! Spreadsheet-side model: worksheets, the in-memory [`Table`] view of a tab,
//! key [`Index`]es over it and the [`FieldMapping`] upload policy.

mod csv_book;
mod index;
mod mapping;
mod sheet;
mod table;

use std::path::Path;

use thiserror::Error;

pub use csv_book::{CsvSheet, CsvWorkbook};
pub use index::{Index, IndexError, IndexProblem, Key, KEY_SEPARATOR, MAX_INDEX_ERRORS};
pub use mapping::FieldMapping;
pub use sheet::{Cell, CellRange, ListRow, MemorySheet, Worksheet};
pub use table::{DeleteVerifier, Row, RowId, Table};

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    Exists(String),
    #[error("Key {0} not found")]
    UnknownColumn(String),
    #[error("cell ({row}, {col}) is out of range")]
    OutOfRange { row: usize, col: usize },
    #[error("query for empty cells needs bounded rows and columns")]
    UnboundedQuery,
    #[error("Blank cell not returned by query at row {row}, column {col}")]
    BlankCellMissing { row: usize, col: usize },
    #[error("row {0} has been deleted")]
    RowDeleted(usize),
    #[error("table {0} is unusable after a failed delete")]
    Poisoned(String),
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("{0}")]
    Remote(String),
}

impl SheetError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        SheetError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        SheetError::Csv {
            path: path.display().to_string(),
            source,
        }
    }
}

/// A collection of documents, each holding named tabs.
pub trait Workbook {
    fn spreadsheets(&self) -> Result<Vec<String>, SheetError>;
    fn tabs(&self, doc: &str) -> Result<Vec<String>, SheetError>;
    fn open_tab(&self, doc: &str, tab: &str) -> Result<Box<dyn Worksheet>, SheetError>;
    fn create_tab(&self, doc: &str, tab: &str, headers: &[String]) -> Result<(), SheetError>;
    fn delete_tab(&self, doc: &str, tab: &str) -> Result<(), SheetError>;

    /// Load a tab into a [`Table`].
    fn load_tab(&self, doc: &str, tab: &str) -> Result<Table, SheetError> {
        Table::load(self.open_tab(doc, tab)?)
    }
}
