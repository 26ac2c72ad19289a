//! Error taxonomy shared by the extractor and the publisher
//!
//! Every external-facing step (file read, remote connect, remote read/write)
//! maps its failure onto one of these variants. Command handlers wrap them in
//! `anyhow` for context; `main` is the only place they are reported.

use std::path::PathBuf;

use thiserror::Error;

pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("required column `{column}` not found in {}", .path.display())]
    Schema { column: String, path: PathBuf },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("could not reach remote sheet: {0}")]
    Connection(String),

    #[error("remote {operation} failed: {message}")]
    RemoteOperation {
        operation: &'static str,
        message: String,
    },

    #[error("no usable rows: {0}")]
    EmptyInput(String),

    #[error("failed to read spreadsheet {}: {message}", .path.display())]
    Spreadsheet { path: PathBuf, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SyncError {
    pub fn remote(operation: &'static str, err: impl std::fmt::Display) -> Self {
        SyncError::RemoteOperation {
            operation,
            message: err.to_string(),
        }
    }

    /// Short label used in the error log so entries can be grepped by kind
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::FileNotFound(_) => "FileNotFound",
            SyncError::Schema { .. } => "SchemaError",
            SyncError::Auth(_) => "AuthError",
            SyncError::Connection(_) => "ConnectionError",
            SyncError::RemoteOperation { .. } => "RemoteOperationError",
            SyncError::EmptyInput(_) => "EmptyInputError",
            SyncError::Spreadsheet { .. } => "SpreadsheetError",
            SyncError::Csv(_) => "CsvError",
            SyncError::Io(_) => "IoError",
        }
    }
}
