use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use tracing::{info, instrument};

use crate::config::{EtlConfig, FileKind, FileSelector, OrderBy, RemoteFolder};
use crate::error::{EtlError, Result};
use crate::export::{self, SuffixPolicy};
use crate::extract;
use crate::remote::{FileStore, SheetService};
use crate::select::select_files;
use crate::store::StagingStore;
use crate::transform;

/// Drives one full pipeline run: configuration resolution, store open,
/// extract, transform, export, store close. The runner owns the run-scoped
/// state (start instant, scratch directory for downloads and outputs) so
/// independent runs never share anything.
pub struct EtlRunner<F, S> {
    files: F,
    sheets: S,
    started_at: DateTime<Utc>,
    work_dir: TempDir,
}

impl<F: FileStore, S: SheetService> EtlRunner<F, S> {
    pub fn new(files: F, sheets: S) -> Result<Self> {
        Ok(Self {
            files,
            sheets,
            started_at: Utc::now(),
            work_dir: tempfile::tempdir()?,
        })
    }

    /// Instant the run started; export suffixes derive from it.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Performs the full run. `location` names the configuration file, or a
    /// folder whose most recently modified YAML file is the configuration
    /// when `from_folder` is set. The staging store is closed on every exit
    /// path before an error propagates.
    #[instrument(level = "info", skip(self))]
    pub fn run(&self, location: &str, from_folder: bool) -> Result<()> {
        let config = self.load_config(location, from_folder)?;
        // Surface bad suffix policies before the store opens or anything
        // is downloaded.
        for exporter in &config.exporters {
            SuffixPolicy::parse(exporter.suffix.as_deref())?;
        }

        let (store, db_file) = self.open_store(&config)?;
        let outcome = self.run_phases(&config, &store);
        let closed = store.close();
        outcome?;
        closed?;

        self.push_back_store(&config, db_file)
    }

    fn load_config(&self, location: &str, from_folder: bool) -> Result<EtlConfig> {
        let file_id = if from_folder {
            let selector = FileSelector {
                folder: RemoteFolder {
                    id: location.to_string(),
                },
                top: Some(1),
                extension: Some(FileKind::Yaml),
                order_by: OrderBy::Modified,
                descending: true,
            };
            let listing = self.files.list_folder(location)?;
            let candidates = select_files(&listing, &selector);
            match candidates.into_iter().next() {
                Some(file) => file.id,
                None => return Err(EtlError::ConfigNotFound(location.to_string())),
            }
        } else {
            location.to_string()
        };

        info!(config = %file_id, "loading configuration");
        let path = self.files.download(&file_id, self.work_dir.path())?;
        EtlConfig::from_path(&path)
    }

    /// Opens the staging store: a downloaded database file when the config
    /// names one, an ephemeral in-memory store otherwise. Returns the local
    /// database path alongside so a configured write-back can find it.
    fn open_store(&self, config: &EtlConfig) -> Result<(StagingStore, Option<PathBuf>)> {
        if let Some(key) = config.store.as_ref().and_then(|store| store.key.as_ref()) {
            let path = self.files.download(key, self.work_dir.path())?;
            info!(path = %path.display(), "opened file-backed staging store");
            return Ok((StagingStore::open_path(&path)?, Some(path)));
        }
        Ok((StagingStore::open_in_memory()?, None))
    }

    fn run_phases(&self, config: &EtlConfig, store: &StagingStore) -> Result<()> {
        info!(count = config.extractors.len(), "extract phase");
        for extractor in &config.extractors {
            extract::run_extractor(
                extractor,
                &self.files,
                &self.sheets,
                store,
                self.work_dir.path(),
            )?;
        }

        info!(count = config.transforms.len(), "transform phase");
        transform::run_transforms(&config.transforms, store)?;

        info!(count = config.exporters.len(), "export phase");
        for exporter in &config.exporters {
            export::run_exporter(
                exporter,
                store,
                &self.files,
                self.work_dir.path(),
                self.started_at,
            )?;
        }
        Ok(())
    }

    /// Writes the staging database back to its remote source when the
    /// configuration asks for it. Runs after the store is closed so the file
    /// is fully flushed.
    fn push_back_store(&self, config: &EtlConfig, db_file: Option<PathBuf>) -> Result<()> {
        let Some(store_config) = &config.store else {
            return Ok(());
        };
        if !store_config.update {
            return Ok(());
        }
        if let (Some(key), Some(path)) = (&store_config.key, db_file) {
            info!(key = %key, "writing staging database back to remote store");
            self.files.overwrite(key, &path)?;
        }
        Ok(())
    }
}
