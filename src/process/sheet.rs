use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::debug;

/// A sheet as a grid of cells, indexed by absolute row and column, so
/// `grid[3]` is always the sheet's fourth row even when leading rows are
/// empty.
pub type Grid = Vec<Vec<Data>>;

/// Read `sheet` from the workbook at `path`.
///
/// `.csv` files are read as a single sheet and `sheet` is ignored; every
/// other extension goes through calamine (xlsx, xlsm, xlsb, xls, ods).
pub fn read_grid(path: &Path, sheet: &str) -> Result<Grid> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let grid = if is_csv {
        read_csv_grid(path)?
    } else {
        read_workbook_grid(path, sheet)?
    };
    debug!(path = %path.display(), rows = grid.len(), "read sheet");
    Ok(grid)
}

fn read_workbook_grid(path: &Path, sheet: &str) -> Result<Grid> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| anyhow!("opening workbook {}: {}", path.display(), e))?;
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| anyhow!("reading sheet '{}' from {}: {}", sheet, path.display(), e))?;

    // calamine trims empty leading rows/columns off the range; put them back
    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let mut grid: Grid = vec![Vec::new(); first_row as usize];
    for row in range.rows() {
        let mut cells = vec![Data::Empty; first_col as usize];
        cells.extend(row.iter().cloned());
        grid.push(cells);
    }
    Ok(grid)
}

fn read_csv_grid(path: &Path) -> Result<Grid> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening CSV {}", path.display()))?;

    let mut grid = Grid::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result
            .with_context(|| format!("CSV parse error in {} at record {}", path.display(), idx))?;
        grid.push(record.iter().map(csv_cell).collect());
    }
    Ok(grid)
}

fn csv_cell(raw: &str) -> Data {
    if raw.trim().is_empty() {
        Data::Empty
    } else {
        Data::String(raw.to_string())
    }
}

/// Number of columns up to and including the last non-empty cell.
pub fn occupied_width(row: &[Data]) -> usize {
    row.iter()
        .rposition(|c| !is_blank(c))
        .map(|i| i + 1)
        .unwrap_or(0)
}

pub fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Cell rendered as text; missing and empty cells become `""`.
pub fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
