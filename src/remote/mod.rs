//! Collaborator seams for the remote file store and spreadsheet service.
//!
//! The pipeline core only ever talks to these traits; the concrete transport
//! (a cloud drive, or the directory-backed [`local`] implementation) stays
//! swappable.

use std::path::{Path, PathBuf};

use crate::config::SheetRef;
use crate::error::{EtlError, Result};
use crate::model::Grid;

pub mod local;

/// Metadata the file store reports for one non-trashed file. Timestamps are
/// carried as strings whose lexical order matches chronological order
/// (RFC 3339 style).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub created_time: String,
    pub modified_time: String,
}

/// Remote file storage operations the pipeline consumes.
pub trait FileStore {
    /// Lists the non-trashed files directly under a folder.
    fn list_folder(&self, folder_id: &str) -> Result<Vec<FileMetadata>>;

    /// Fetches a file's content into `dest_dir`, naming the local file after
    /// the remote display name, and returns the local path.
    fn download(&self, file_id: &str, dest_dir: &Path) -> Result<PathBuf>;

    /// Uploads a local file as a new file under the given folder.
    fn upload(&self, path: &Path, folder_id: &str) -> Result<()>;

    /// Replaces the content of an existing remote file.
    fn overwrite(&self, file_id: &str, path: &Path) -> Result<()>;
}

/// Remote spreadsheet access: opens a workbook by file id and materializes
/// every sheet as a grid of strings.
pub trait SheetService {
    fn open(&self, file_id: &str) -> Result<RemoteWorkbook>;
}

/// One sheet of a workbook, fully materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSheet {
    pub name: String,
    pub grid: Grid,
}

/// A workbook as a list of named grids, in sheet order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteWorkbook {
    pub id: String,
    pub sheets: Vec<NamedSheet>,
}

impl RemoteWorkbook {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sheets: Vec::new(),
        }
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }

    /// Resolves a sheet reference, name first, index otherwise.
    pub fn grid(&self, sheet: &SheetRef) -> Result<&Grid> {
        let found = match &sheet.name {
            Some(name) => self.sheets.iter().find(|s| &s.name == name),
            None => self.sheets.get(sheet.index),
        };
        found.map(|s| &s.grid).ok_or_else(|| EtlError::SheetNotFound {
            workbook: self.id.clone(),
            sheet: sheet
                .name
                .clone()
                .unwrap_or_else(|| format!("#{}", sheet.index)),
        })
    }

    /// Replaces the named sheet's grid, or appends a new sheet when the name
    /// is not present yet.
    pub fn set_sheet(&mut self, name: &str, grid: Grid) {
        match self.sheets.iter_mut().find(|s| s.name == name) {
            Some(sheet) => sheet.grid = grid,
            None => self.sheets.push(NamedSheet {
                name: name.to_string(),
                grid,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workbook() -> RemoteWorkbook {
        let mut book = RemoteWorkbook::new("wb");
        book.set_sheet("First", vec![vec!["a".into()]]);
        book.set_sheet("Second", vec![vec!["b".into()]]);
        book
    }

    #[test]
    fn name_takes_precedence_over_index() {
        let book = workbook();
        let sheet = SheetRef {
            index: 0,
            name: Some("Second".into()),
            ..SheetRef::default()
        };
        assert_eq!(book.grid(&sheet).unwrap(), &vec![vec!["b".to_string()]]);
    }

    #[test]
    fn index_resolves_when_name_is_absent() {
        let book = workbook();
        let sheet = SheetRef {
            index: 1,
            ..SheetRef::default()
        };
        assert_eq!(book.grid(&sheet).unwrap(), &vec![vec!["b".to_string()]]);
    }

    #[test]
    fn unresolved_sheets_are_an_error() {
        let book = workbook();
        let by_name = SheetRef {
            name: Some("Missing".into()),
            ..SheetRef::default()
        };
        assert!(matches!(
            book.grid(&by_name),
            Err(EtlError::SheetNotFound { .. })
        ));
        let by_index = SheetRef {
            index: 9,
            ..SheetRef::default()
        };
        assert!(matches!(
            book.grid(&by_index),
            Err(EtlError::SheetNotFound { .. })
        ));
    }

    #[test]
    fn set_sheet_replaces_in_place() {
        let mut book = workbook();
        book.set_sheet("First", vec![vec!["z".into()]]);
        assert_eq!(book.sheets.len(), 2);
        assert_eq!(book.sheets[0].grid, vec![vec!["z".to_string()]]);
    }
}
