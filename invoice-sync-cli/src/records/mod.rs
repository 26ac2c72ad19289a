//! Tabular invoice records
//!
//! A [`RecordSet`] is a header plus rows of optional cells. Rows are always
//! normalized to the header arity on insertion, so column indices taken from
//! the header are valid for every record.

pub mod clean;
pub mod delimited;
pub mod excel;

use std::path::Path;

use crate::error::{SyncError, SyncResult};

pub use clean::{CleanedRecords, clean_invoice_data};
pub use delimited::{read_record_csv, write_record_csv};
pub use excel::read_record_excel;

/// A single cell; `None` when the source had nothing there
pub type Cell = Option<String>;

/// One row of source data
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    pub cells: Vec<Cell>,
}

impl Record {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Build a record from plain strings, treating empty strings as missing
    pub fn from_strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cells = values
            .into_iter()
            .map(|v| {
                let v = v.into();
                if v.is_empty() { None } else { Some(v) }
            })
            .collect();
        Self { cells }
    }

    /// Value at a column, if present
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.cells.get(idx).and_then(|c| c.as_deref())
    }

    /// Number of cells holding a value
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// True when every cell is missing
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_none())
    }

    /// Render as output strings; missing cells become empty strings
    pub fn to_strings(&self) -> Vec<String> {
        self.cells
            .iter()
            .map(|c| c.clone().unwrap_or_default())
            .collect()
    }

    fn fit_to(&mut self, arity: usize) {
        self.cells.resize(arity, None);
    }
}

/// Ordered records sharing one header
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordSet {
    header: Vec<String>,
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new(header: Vec<String>, records: Vec<Record>) -> Self {
        let mut set = Self {
            header,
            records: Vec::with_capacity(records.len()),
        };
        for record in records {
            set.push(record);
        }
        set
    }

    /// An empty set with the same header
    pub fn empty_like(&self) -> Self {
        Self {
            header: self.header.clone(),
            records: Vec::new(),
        }
    }

    /// Append a record, padding or truncating it to the header arity
    pub fn push(&mut self, mut record: Record) {
        record.fit_to(self.header.len());
        self.records.push(record);
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Index of a column that must exist; `origin` names the file for the error
    pub fn require_column(&self, name: &str, origin: &Path) -> SyncResult<usize> {
        self.column_index(name).ok_or_else(|| SyncError::Schema {
            column: name.to_string(),
            path: origin.to_path_buf(),
        })
    }

    /// Keep only the records matching a predicate, preserving order
    pub fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&Record) -> bool,
    {
        self.records.retain(f);
    }

    /// Values of one column across all records (missing values skipped)
    pub fn column_values(&self, idx: usize) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|r| r.get(idx).map(str::to_string))
            .collect()
    }
}
