use std::path::Path;

use tracing::{debug, info, instrument};

use crate::columns;
use crate::config::{Extractor, FileKind};
use crate::error::{EtlError, Result};
use crate::io::excel_read;
use crate::model::Table;
use crate::remote::{FileStore, RemoteWorkbook, SheetService};
use crate::select::select_files;
use crate::store::StagingStore;
use crate::window;

/// Runs one extractor: selects its source files, reads one windowed and
/// column-normalized table per logical table per file, concatenates the
/// per-file tables row-wise in file order, and replace-writes each logical
/// table into the staging store.
///
/// Merged files must agree on their normalized column set; any per-file
/// failure aborts the whole extractor.
#[instrument(level = "info", skip_all, fields(extractor = %extractor.name))]
pub fn run_extractor<F: FileStore, S: SheetService>(
    extractor: &Extractor,
    files: &F,
    sheets: &S,
    store: &StagingStore,
    work_dir: &Path,
) -> Result<()> {
    let listing = files.list_folder(&extractor.inputs.folder.id)?;
    let selected = select_files(&listing, &extractor.inputs);
    if selected.is_empty() {
        return Err(EtlError::NoInputFiles(extractor.name.clone()));
    }
    info!(files = selected.len(), "source files selected");

    let mut merged: Vec<Option<Table>> = vec![None; extractor.tables.len()];
    for file in &selected {
        debug!(file = %file.id, "reading source file");
        let workbook = open_source(extractor, file.id.as_str(), files, sheets, work_dir)?;
        for (slot, spec) in merged.iter_mut().zip(&extractor.tables) {
            let grid = workbook.grid(&spec.sheet)?;
            let mut part = window::slice(grid, &spec.sheet.window)?;
            part.columns = columns::normalize_all(&part.columns)?;
            match slot {
                Some(accumulated) => accumulated.append(part, &spec.name)?,
                None => *slot = Some(part),
            }
        }
    }

    for (slot, spec) in merged.into_iter().zip(&extractor.tables) {
        let table = slot.ok_or_else(|| EtlError::NoInputFiles(extractor.name.clone()))?;
        info!(table = %spec.name, rows = table.len(), "loading table into staging store");
        store.replace_table(&spec.name, &table)?;
    }
    Ok(())
}

fn open_source<F: FileStore, S: SheetService>(
    extractor: &Extractor,
    file_id: &str,
    files: &F,
    sheets: &S,
    work_dir: &Path,
) -> Result<RemoteWorkbook> {
    match extractor.inputs.extension {
        Some(FileKind::Gsheet) => sheets.open(file_id),
        Some(FileKind::Xlsx) => {
            let path = files.download(file_id, work_dir)?;
            excel_read::read_workbook(&path, file_id)
        }
        other => Err(EtlError::UnsupportedSource {
            extractor: extractor.name.clone(),
            kind: other
                .map(|kind| format!("{kind:?}").to_lowercase())
                .unwrap_or_else(|| "unspecified".to_string()),
        }),
    }
}
