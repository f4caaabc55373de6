use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::error::Result;
use crate::remote::RemoteWorkbook;

/// Writes a workbook of string grids to the given path, one worksheet per
/// sheet, cells written verbatim.
pub fn write_workbook(path: &Path, workbook: &RemoteWorkbook) -> Result<()> {
    let mut writer = Workbook::new();

    for sheet in &workbook.sheets {
        let worksheet = writer.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (row_idx, row) in sheet.grid.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                worksheet.write_string(row_idx as u32, col_idx as u16, cell)?;
            }
        }
    }

    writer.save(path)?;
    Ok(())
}
