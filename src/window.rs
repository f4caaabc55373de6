use crate::config::CellWindow;
use crate::error::{EtlError, Result};
use crate::model::{Grid, Table};

/// Slices the header and data region described by `window` out of a raw grid.
///
/// Columns are restricted first (`start_col ..= end_col`, inclusive end), the
/// header labels come from `header_row` after that restriction, and the data
/// rows cover `start_row .. end_row` (exclusive end, clamped to the grid).
/// Rows are re-indexed contiguously; ragged rows pad with empty cells. An
/// empty grid yields an empty table with no columns. Whether the header row
/// actually precedes the data region is the config author's responsibility.
pub fn slice(grid: &Grid, window: &CellWindow) -> Result<Table> {
    if grid.is_empty() {
        return Ok(Table::default());
    }
    if window.header_row >= grid.len() {
        return Err(EtlError::HeaderRowOutOfRange {
            header_row: window.header_row,
            rows: grid.len(),
        });
    }

    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    let kept: Vec<usize> = (window.start_col..width)
        .filter(|idx| window.end_col.map_or(true, |end| *idx <= end))
        .collect();

    let project = |row: &Vec<String>| -> Vec<String> {
        kept.iter()
            .map(|idx| row.get(*idx).cloned().unwrap_or_default())
            .collect()
    };

    let columns = project(&grid[window.header_row]);
    let end_row = window.end_row.unwrap_or(grid.len()).min(grid.len());
    let rows = if window.start_row < end_row {
        grid[window.start_row..end_row].iter().map(project).collect()
    } else {
        Vec::new()
    };

    Ok(Table { columns, rows })
}
