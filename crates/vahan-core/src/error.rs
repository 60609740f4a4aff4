use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the Vahan dashboard crates.
#[derive(Error, Debug)]
pub enum VahanError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A spreadsheet could not be opened or its first sheet could not be read.
    #[error("Failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    /// A sheet held fewer rows than a header plus one data row.
    #[error("Sheet has {rows} usable row(s); at least 2 are required")]
    InsufficientRows { rows: usize },

    /// The spreadsheet root directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// The record store rejected or failed an operation.
    #[error("Record store error: {0}")]
    Store(String),

    /// A required query parameter was not supplied.
    #[error("{0} parameter is required")]
    MissingParameter(String),

    /// A JSON document could not be parsed or produced.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, VahanError>;
