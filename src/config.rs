use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

/// Identifies a single remote file by opaque id, optionally carrying the
/// human-readable name reported by the file store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl RemoteFile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// Identifies a remote container by opaque id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFolder {
    pub id: String,
}

/// The closed set of file types a selector can filter by, each mapped to a
/// fixed mime type. Declaring a type outside this table is a configuration
/// parse error rather than a silent pass-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Json,
    Gsheet,
    Xlsx,
    Yaml,
    Csv,
    Db,
}

impl FileKind {
    /// Mime type the remote file store reports for this kind.
    pub fn mime_type(self) -> &'static str {
        match self {
            FileKind::Json => "application/json",
            FileKind::Gsheet => "application/vnd.google-apps.spreadsheet",
            FileKind::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            FileKind::Yaml => "application/x-yaml",
            FileKind::Csv => "text/csv",
            FileKind::Db => "application/x-sqlite3",
        }
    }

    /// Maps a filename extension back to a kind, for stores that derive mime
    /// types from names.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(FileKind::Json),
            "gsheet" => Some(FileKind::Gsheet),
            "xlsx" => Some(FileKind::Xlsx),
            "yaml" | "yml" => Some(FileKind::Yaml),
            "csv" => Some(FileKind::Csv),
            "db" | "sqlite" | "sqlite3" => Some(FileKind::Db),
            _ => None,
        }
    }
}

/// Metadata field a selector orders its results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    Name,
    Created,
    #[default]
    Modified,
}

/// Declarative description of which files under a folder feed an extractor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileSelector {
    pub folder: RemoteFolder,
    /// Keep only the first `top` entries, applied after filtering and sorting.
    #[serde(default)]
    pub top: Option<usize>,
    #[serde(default)]
    pub extension: Option<FileKind>,
    #[serde(default)]
    pub order_by: OrderBy,
    #[serde(default)]
    pub descending: bool,
}

/// Rectangular sub-region of a sheet designated as header + data. `end_row`
/// is exclusive, `end_col` inclusive; absent bounds extend to the natural end
/// of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CellWindow {
    #[serde(default)]
    pub header_row: usize,
    #[serde(default = "default_start_row")]
    pub start_row: usize,
    #[serde(default)]
    pub start_col: usize,
    #[serde(default)]
    pub end_row: Option<usize>,
    #[serde(default)]
    pub end_col: Option<usize>,
}

fn default_start_row() -> usize {
    1
}

impl Default for CellWindow {
    fn default() -> Self {
        Self {
            header_row: 0,
            start_row: 1,
            start_col: 0,
            end_row: None,
            end_col: None,
        }
    }
}

/// Names one sheet of a workbook. The name, when present, takes precedence
/// over the index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct SheetRef {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub window: CellWindow,
}

/// Binds a staging-table name to the sheet region it is read from (extract)
/// or written to (export).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableSpec {
    pub name: String,
    #[serde(default)]
    pub sheet: SheetRef,
}

/// One extraction unit: a file selection plus the logical tables every
/// selected file contributes to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Extractor {
    pub name: String,
    pub inputs: FileSelector,
    pub tables: Vec<TableSpec>,
}

/// A single SQL statement run against the staging store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Transform {
    pub statement: String,
}

/// One export unit: which staging tables to write to which sheets of an
/// output file, and where the file goes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Exporter {
    pub name: String,
    /// Suffix policy: absent, `unix`, or `datetime`.
    #[serde(default)]
    pub suffix: Option<String>,
    pub extension: String,
    #[serde(default)]
    pub template: Option<RemoteFile>,
    pub destination: RemoteFolder,
    #[serde(default)]
    pub tables: Vec<TableSpec>,
}

/// Optional file-backed staging store. When `key` is set the database file is
/// downloaded before the run; when `update` is also set it is written back
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub update: bool,
}

/// A full ETL run configuration. Missing sections deserialize as empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct EtlConfig {
    #[serde(default)]
    pub store: Option<StoreConfig>,
    #[serde(default)]
    pub extractors: Vec<Extractor>,
    #[serde(default)]
    pub transforms: Vec<Transform>,
    #[serde(default)]
    pub exporters: Vec<Exporter>,
}

impl EtlConfig {
    /// Parses a configuration from a YAML document.
    pub fn from_yaml(source: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Reads and parses a configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_yaml(&source)
    }
}
