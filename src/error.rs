use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, EtlError>;

/// Error type covering the different failure cases that can occur while a
/// pipeline run extracts, transforms, or exports data.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the configuration document does not parse as valid YAML or
    /// does not match the expected schema.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_yaml::Error),

    /// Raised when a configuration location yields no candidate file.
    #[error("no configuration file found in folder '{0}'")]
    ConfigNotFound(String),

    /// Errors bubbled up from the staging store.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when neither a sheet name nor a sheet index resolves inside a
    /// workbook.
    #[error("sheet '{sheet}' not found in workbook '{workbook}'")]
    SheetNotFound { workbook: String, sheet: String },

    /// Raised when a column label normalizes to the empty string.
    #[error("column label is invalid: {0:?}")]
    InvalidColumnLabel(String),

    /// Raised when an exporter declares an unrecognized suffix policy.
    #[error("invalid suffix policy: {0:?}")]
    InvalidSuffixPolicy(String),

    /// Raised when a window's header row lies outside a non-empty grid.
    #[error("header row {header_row} is outside the grid ({rows} rows)")]
    HeaderRowOutOfRange { header_row: usize, rows: usize },

    /// Raised when files merged into one logical table disagree on their
    /// normalized column set.
    #[error("column mismatch in table '{table}': expected {expected:?}, found {found:?}")]
    ColumnMismatch {
        table: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Raised when an extractor's selector matches no source files.
    #[error("extractor '{0}' selected no input files")]
    NoInputFiles(String),

    /// Raised when an extractor names a source format the loader cannot read.
    #[error("extractor '{extractor}' uses unsupported source format '{kind}'")]
    UnsupportedSource { extractor: String, kind: String },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when a remote identifier does not resolve in the file store.
    #[error("remote file not found: {0}")]
    RemoteNotFound(String),
}
