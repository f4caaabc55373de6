use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::FileKind;
use crate::error::{EtlError, Result};
use crate::io::excel_read;
use crate::remote::{FileMetadata, FileStore, RemoteWorkbook, SheetService};

/// Directory-backed implementation of the remote collaborators, standing in
/// for a cloud drive: folder and file ids are paths relative to a root
/// directory, mime types derive from filename extensions, and timestamps come
/// from filesystem metadata rendered as RFC 3339 so lexical order is
/// chronological.
#[derive(Debug, Clone)]
pub struct LocalDrive {
    root: PathBuf,
}

impl LocalDrive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }
}

impl FileStore for LocalDrive {
    fn list_folder(&self, folder_id: &str) -> Result<Vec<FileMetadata>> {
        let folder = self.resolve(folder_id);
        let mut listing = Vec::new();
        for entry in fs::read_dir(&folder)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let metadata = entry.metadata()?;
            let modified = render_time(metadata.modified()?);
            let created = metadata
                .created()
                .map(render_time)
                .unwrap_or_else(|_| modified.clone());
            listing.push(FileMetadata {
                id: format!("{folder_id}/{name}"),
                mime_type: mime_for(&name),
                name,
                created_time: created,
                modified_time: modified,
            });
        }
        // read_dir order is platform dependent
        listing.sort_by(|lhs, rhs| lhs.name.cmp(&rhs.name));
        Ok(listing)
    }

    fn download(&self, file_id: &str, dest_dir: &Path) -> Result<PathBuf> {
        let source = self.resolve(file_id);
        if !source.is_file() {
            return Err(EtlError::RemoteNotFound(file_id.to_string()));
        }
        let filename = source
            .file_name()
            .ok_or_else(|| EtlError::RemoteNotFound(file_id.to_string()))?;
        let dest = dest_dir.join(filename);
        fs::copy(&source, &dest)?;
        Ok(dest)
    }

    fn upload(&self, path: &Path, folder_id: &str) -> Result<()> {
        if !path.is_file() {
            return Err(EtlError::MissingInput(path.to_path_buf()));
        }
        let folder = self.resolve(folder_id);
        fs::create_dir_all(&folder)?;
        let filename = path
            .file_name()
            .ok_or_else(|| EtlError::MissingInput(path.to_path_buf()))?;
        fs::copy(path, folder.join(filename))?;
        Ok(())
    }

    fn overwrite(&self, file_id: &str, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(EtlError::MissingInput(path.to_path_buf()));
        }
        fs::copy(path, self.resolve(file_id))?;
        Ok(())
    }
}

impl SheetService for LocalDrive {
    fn open(&self, file_id: &str) -> Result<RemoteWorkbook> {
        let path = self.resolve(file_id);
        if !path.is_file() {
            return Err(EtlError::RemoteNotFound(file_id.to_string()));
        }
        excel_read::read_workbook(&path, file_id)
    }
}

fn mime_for(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(FileKind::from_extension)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

fn render_time(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn listing_reports_names_and_mime_types() {
        let root = tempdir().unwrap();
        let inbox = root.path().join("inbox");
        fs::create_dir(&inbox).unwrap();
        fs::write(inbox.join("config.yaml"), "{}").unwrap();
        fs::write(inbox.join("data.xlsx"), "stub").unwrap();
        fs::write(inbox.join("notes.txt"), "stub").unwrap();

        let drive = LocalDrive::new(root.path());
        let listing = drive.list_folder("inbox").unwrap();
        assert_eq!(listing.len(), 3);
        assert_eq!(listing[0].name, "config.yaml");
        assert_eq!(listing[0].mime_type, "application/x-yaml");
        assert_eq!(listing[0].id, "inbox/config.yaml");
        assert_eq!(
            listing[1].mime_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(listing[2].mime_type, "application/octet-stream");
    }

    #[test]
    fn download_names_the_local_copy_after_the_remote_file() {
        let root = tempdir().unwrap();
        let inbox = root.path().join("inbox");
        fs::create_dir(&inbox).unwrap();
        fs::write(inbox.join("data.csv"), "a,b").unwrap();

        let scratch = tempdir().unwrap();
        let drive = LocalDrive::new(root.path());
        let path = drive.download("inbox/data.csv", scratch.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "data.csv");
        assert_eq!(fs::read_to_string(path).unwrap(), "a,b");
    }

    #[test]
    fn upload_places_the_file_under_the_folder() {
        let root = tempdir().unwrap();
        let scratch = tempdir().unwrap();
        let local = scratch.path().join("out.xlsx");
        fs::write(&local, "stub").unwrap();

        let drive = LocalDrive::new(root.path());
        drive.upload(&local, "exports").unwrap();
        assert!(root.path().join("exports/out.xlsx").is_file());
    }

    #[test]
    fn missing_remote_files_are_reported() {
        let root = tempdir().unwrap();
        let scratch = tempdir().unwrap();
        let drive = LocalDrive::new(root.path());
        assert!(matches!(
            drive.download("nope/nothing.xlsx", scratch.path()),
            Err(EtlError::RemoteNotFound(_))
        ));
    }
}
