use std::path::Path;

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::error::Result;
use crate::model::Grid;
use crate::remote::{NamedSheet, RemoteWorkbook};

/// Reads an xlsx file into a workbook of string grids, one per sheet, in
/// sheet order. `id` is the identifier error messages should refer to.
pub fn read_workbook(path: &Path, id: &str) -> Result<RemoteWorkbook> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let grid = match workbook.worksheet_range(&name) {
            Some(range) => range_to_grid(&range?),
            None => Grid::new(),
        };
        sheets.push(NamedSheet { name, grid });
    }

    Ok(RemoteWorkbook {
        id: id.to_string(),
        sheets,
    })
}

/// Converts a calamine range into a grid anchored at cell A1. Ranges report
/// only the used region, so leading empty rows and columns are padded back in
/// to keep window indices meaningful.
fn range_to_grid(range: &Range<DataType>) -> Grid {
    let Some((start_row, start_col)) = range.start() else {
        return Grid::new();
    };

    let mut grid: Grid = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![String::new(); start_col as usize];
        cells.extend(row.iter().map(|cell| cell_to_string(Some(cell))));
        grid.push(cells);
    }
    grid
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
