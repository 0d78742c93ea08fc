use anyhow::{bail, Context, Result};
use calamine::Data;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::config::SheetSource;
use crate::process::{
    layout::SheetLayout,
    normalize::normalize_county,
    record::PopulationRecord,
    sheet::{cell_text, is_blank, occupied_width, read_grid},
};

/// Read one state's sheet and melt it into observed records, one per
/// (county, year column).
#[tracing::instrument(level = "info", skip(source, layout), fields(state = %source.state, path = %source.path.display()))]
pub fn load_state(source: &SheetSource, layout: &SheetLayout) -> Result<Vec<PopulationRecord>> {
    let grid = read_grid(&source.path, &source.sheet)?;
    reshape_grid(&grid, &source.state, layout)
}

/// Wide-to-long reshape of an already-read sheet.
pub fn reshape_grid(
    grid: &[Vec<Data>],
    state: &str,
    layout: &SheetLayout,
) -> Result<Vec<PopulationRecord>> {
    let county_idx = layout
        .county_index()
        .with_context(|| format!("layout has no '{}' column", layout.county_column))?;
    let year_cols = layout.year_columns();

    // 1) title rows + header row must be there
    let body_start = layout.body_start();
    if grid.len() < body_start {
        bail!(
            "sheet has {} rows, expected at least {} before the data",
            grid.len(),
            body_start
        );
    }

    // 2) data rows end at the first blank county cell, if asked to
    let mut body_end = grid.len();
    if layout.stop_at_blank_row {
        let first_data = body_start + usize::from(layout.drop_aggregate_row);
        if let Some(offset) = grid
            .iter()
            .skip(first_data)
            .position(|row| row.get(county_idx).map_or(true, is_blank))
        {
            body_end = first_data + offset;
            debug!(row = body_end + 1, "blank county cell; ignoring the rest of the sheet");
        }
    }

    // 3) header + data must have exactly the layout's columns
    let header_at = body_start.saturating_sub(usize::from(layout.header_row));
    let width = grid[header_at..body_end.max(header_at)]
        .iter()
        .map(|row| occupied_width(row))
        .max()
        .unwrap_or(0);
    if width != layout.columns.len() {
        bail!(
            "expected {} columns {:?}, found {}",
            layout.columns.len(),
            layout.columns,
            width
        );
    }

    // 4) drop the state total
    let mut data_start = body_start;
    if layout.drop_aggregate_row && data_start < body_end {
        debug!(row = ?cell_text(grid[data_start].get(county_idx)), "dropping aggregate row");
        data_start += 1;
    }

    // 5) melt
    let rows = &grid[data_start.min(body_end)..body_end];
    let mut records = Vec::with_capacity(rows.len() * year_cols.len());
    let mut seen = HashSet::with_capacity(rows.len());
    for (offset, row) in rows.iter().enumerate() {
        let line = data_start + offset + 1;
        let raw = cell_text(row.get(county_idx));
        if raw.trim().is_empty() {
            warn!(row = line, "skipping row with blank county");
            continue;
        }

        let county = normalize_county(&raw, state);
        if !seen.insert(county.clone()) {
            bail!("county '{}' appears more than once (row {})", county, line);
        }

        for &(col, year) in &year_cols {
            let population = parse_population(row.get(col)).with_context(|| {
                format!("row {} ({}), column '{}'", line, county, layout.columns[col])
            })?;
            records.push(PopulationRecord {
                state: state.to_string(),
                county: county.clone(),
                year,
                population,
            });
        }
    }

    debug!(counties = seen.len(), records = records.len(), "reshaped sheet");
    Ok(records)
}

/// Missing cells count as 0; fractional values are truncated.
pub fn parse_population(cell: Option<&Data>) -> Result<i64> {
    let value = match cell {
        None | Some(Data::Empty) => return Ok(0),
        Some(Data::Int(v)) => *v,
        Some(Data::Float(v)) => float_population(*v)?,
        Some(Data::String(s)) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            if cleaned.is_empty() {
                return Ok(0);
            }
            match cleaned.parse::<i64>() {
                Ok(v) => v,
                Err(_) => {
                    let v = cleaned
                        .parse::<f64>()
                        .with_context(|| format!("population '{}' is not a number", s))?;
                    float_population(v)?
                }
            }
        }
        Some(other) => bail!("population cell {:?} is not a number", other),
    };
    if value < 0 {
        bail!("population {} is negative", value);
    }
    Ok(value)
}

fn float_population(v: f64) -> Result<i64> {
    if !v.is_finite() {
        bail!("population {} is not finite", v);
    }
    Ok(v.trunc() as i64)
}
