use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::config::{Exporter, TableSpec};
use crate::error::{EtlError, Result};
use crate::io::{excel_read, excel_write};
use crate::model::Table;
use crate::remote::{FileStore, RemoteWorkbook};
use crate::store::StagingStore;

/// Naming rule appending a time-derived token to an exported file's base
/// name. The token always derives from the run's start instant so every
/// exporter of one run agrees on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixPolicy {
    None,
    Unix,
    Datetime,
}

impl SuffixPolicy {
    /// Parses the configured policy string, failing on anything but absent,
    /// `unix`, or `datetime`.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw {
            None => Ok(SuffixPolicy::None),
            Some("unix") => Ok(SuffixPolicy::Unix),
            Some("datetime") => Ok(SuffixPolicy::Datetime),
            Some(other) => Err(EtlError::InvalidSuffixPolicy(other.to_string())),
        }
    }

    fn render(self, started_at: DateTime<Utc>) -> String {
        match self {
            SuffixPolicy::None => String::new(),
            SuffixPolicy::Unix => started_at.timestamp().to_string(),
            SuffixPolicy::Datetime => started_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }
}

/// Computes an exporter's output filename: `<name>_<suffix>.<extension>`,
/// the underscore present even when the suffix policy yields nothing.
pub fn output_filename(exporter: &Exporter, started_at: DateTime<Utc>) -> Result<String> {
    let suffix = SuffixPolicy::parse(exporter.suffix.as_deref())?.render(started_at);
    Ok(format!("{}_{}.{}", exporter.name, suffix, exporter.extension))
}

/// Runs one exporter: reads each declared staging table, skips the empty
/// ones, materializes the remainder into an xlsx workbook (merged into the
/// template when one is configured), and uploads the file to the destination
/// folder. Nothing is uploaded when every table came back empty.
#[instrument(level = "info", skip_all, fields(exporter = %exporter.name))]
pub fn run_exporter<F: FileStore>(
    exporter: &Exporter,
    store: &StagingStore,
    files: &F,
    work_dir: &Path,
    started_at: DateTime<Utc>,
) -> Result<()> {
    // Filename computation also validates the suffix policy, before any
    // download or upload happens.
    let filename = output_filename(exporter, started_at)?;

    let mut extracted: Vec<(&TableSpec, Table)> = Vec::new();
    for spec in &exporter.tables {
        let table = store.read_table(&spec.name)?;
        if table.is_empty() {
            debug!(table = %spec.name, "staging table is empty, skipping");
            continue;
        }
        extracted.push((spec, table));
    }

    if exporter.extension != "xlsx" {
        warn!(
            extension = %exporter.extension,
            "only xlsx export is supported, skipping exporter"
        );
        return Ok(());
    }
    if extracted.is_empty() {
        info!("no table produced data, nothing to upload");
        return Ok(());
    }

    let mut workbook = match &exporter.template {
        Some(template) => {
            let path = files.download(&template.id, work_dir)?;
            excel_read::read_workbook(&path, &template.id)?
        }
        None => RemoteWorkbook::new(filename.clone()),
    };

    for (spec, table) in extracted {
        let sheet_name = resolve_sheet_name(spec, exporter, &workbook)?;
        let grid = merge_into_sheet(&sheet_name, &workbook, exporter, table)?;
        workbook.set_sheet(&sheet_name, grid);
        info!(table = %spec.name, sheet = %sheet_name, "sheet written");
    }

    let output_path = work_dir.join(&filename);
    excel_write::write_workbook(&output_path, &workbook)?;
    files.upload(&output_path, &exporter.destination.id)?;
    info!(file = %filename, folder = %exporter.destination.id, "export uploaded");
    Ok(())
}

/// Picks the worksheet a table lands in: the explicit sheet name when given,
/// else the template's sheet at the configured index, else the logical table
/// name itself.
fn resolve_sheet_name(
    spec: &TableSpec,
    exporter: &Exporter,
    workbook: &RemoteWorkbook,
) -> Result<String> {
    if let Some(name) = &spec.sheet.name {
        return Ok(name.clone());
    }
    if exporter.template.is_some() {
        return workbook
            .sheets
            .get(spec.sheet.index)
            .map(|sheet| sheet.name.clone())
            .ok_or_else(|| EtlError::SheetNotFound {
                workbook: workbook.id.clone(),
                sheet: format!("#{}", spec.sheet.index),
            });
    }
    Ok(spec.name.clone())
}

/// Builds the final grid for one sheet. With a template the extracted rows go
/// beneath the sheet's existing rows (header and prior data preserved);
/// without one the staging column labels become the header row.
fn merge_into_sheet(
    sheet_name: &str,
    workbook: &RemoteWorkbook,
    exporter: &Exporter,
    table: Table,
) -> Result<Vec<Vec<String>>> {
    let existing = workbook
        .sheets
        .iter()
        .find(|sheet| sheet.name == sheet_name)
        .map(|sheet| sheet.grid.clone());

    match existing {
        Some(mut grid) => {
            grid.extend(table.rows);
            Ok(grid)
        }
        None if exporter.template.is_some() => Err(EtlError::SheetNotFound {
            workbook: workbook.id.clone(),
            sheet: sheet_name.to_string(),
        }),
        None => {
            let mut grid = vec![table.columns];
            grid.extend(table.rows);
            Ok(grid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteFolder;
    use chrono::TimeZone;

    fn exporter(suffix: Option<&str>) -> Exporter {
        Exporter {
            name: "report".into(),
            suffix: suffix.map(str::to_string),
            extension: "xlsx".into(),
            template: None,
            destination: RemoteFolder { id: "out".into() },
            tables: Vec::new(),
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 4, 5, 6, 7, 8).unwrap()
    }

    #[test]
    fn filename_without_policy_keeps_the_separator() {
        assert_eq!(
            output_filename(&exporter(None), start()).unwrap(),
            "report_.xlsx"
        );
    }

    #[test]
    fn unix_suffix_is_run_start_in_seconds() {
        let expected = format!("report_{}.xlsx", start().timestamp());
        assert_eq!(output_filename(&exporter(Some("unix")), start()).unwrap(), expected);
    }

    #[test]
    fn datetime_suffix_is_utc_iso8601() {
        assert_eq!(
            output_filename(&exporter(Some("datetime")), start()).unwrap(),
            "report_2023-04-05T06:07:08Z.xlsx"
        );
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(matches!(
            output_filename(&exporter(Some("weekly")), start()),
            Err(EtlError::InvalidSuffixPolicy(_))
        ));
    }

    #[test]
    fn suffix_parse_roundtrip() {
        assert_eq!(SuffixPolicy::parse(None).unwrap(), SuffixPolicy::None);
        assert_eq!(SuffixPolicy::parse(Some("unix")).unwrap(), SuffixPolicy::Unix);
        assert_eq!(
            SuffixPolicy::parse(Some("datetime")).unwrap(),
            SuffixPolicy::Datetime
        );
    }
}
