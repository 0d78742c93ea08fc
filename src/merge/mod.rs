// src/merge/mod.rs

use anyhow::{anyhow, bail, Context, Result};
use csv::{ReaderBuilder, Writer};
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

pub const KEY_COLUMN: &str = "Year";

/// Inputs in join order; the first is the base table.
pub const INDICATOR_FILES: [&str; 4] = ["income.csv", "cpi.csv", "Population.csv", "unemployment.csv"];

pub const MERGED_FILE: &str = "merged_dataset.csv";

/// A delimited table held as text, keyed by its `Year` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorTable {
    pub headers: Vec<String>,
    /// One `Vec` per row, `headers.len()` cells each. Missing values are `""`.
    pub rows: Vec<Vec<String>>,
}

impl IndicatorTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let table = Self { headers, rows };
        for (idx, row) in table.rows.iter().enumerate() {
            if row.len() != table.headers.len() {
                bail!(
                    "row {} has {} cells, expected {}",
                    idx,
                    row.len(),
                    table.headers.len()
                );
            }
        }
        table.key_index()?;
        Ok(table)
    }

    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .with_context(|| format!("opening {}", path.display()))?;

        let headers: Vec<String> = rdr
            .headers()
            .with_context(|| format!("reading header of {}", path.display()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let record = result
                .with_context(|| format!("CSV parse error in {} at record {}", path.display(), idx))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        let table = Self::new(headers, rows).with_context(|| format!("loading {}", path.display()))?;
        debug!(path = %path.display(), rows = table.rows.len(), cols = table.headers.len(), "read table");
        Ok(table)
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut wtr = Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush().with_context(|| format!("flushing {}", path.display()))?;
        Ok(())
    }

    pub fn key_index(&self) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == KEY_COLUMN)
            .ok_or_else(|| anyhow!("no '{}' column in {:?}", KEY_COLUMN, self.headers))
    }

    /// Parsed `Year` of every row, in row order.
    pub fn years(&self) -> Result<Vec<i64>> {
        let idx = self.key_index()?;
        self.rows
            .iter()
            .enumerate()
            .map(|(r, row)| {
                let raw = row[idx].trim();
                raw.parse::<i64>()
                    .with_context(|| format!("row {}: year '{}' is not an integer", r, raw))
            })
            .collect()
    }

    /// Left join on `Year`: every row of `self` is kept; each match in
    /// `other` adds one output row (so repeated years fan out), and rows with
    /// no match get empty cells for `other`'s columns.
    ///
    /// Non-key column names present on both sides become `<name>_x` (left)
    /// and `<name>_y` (right).
    pub fn left_join(&self, other: &IndicatorTable) -> Result<IndicatorTable> {
        let left_key = self.key_index()?;
        let right_key = other.key_index()?;

        // 1) output header
        let right_names: HashSet<&str> = other
            .headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != right_key)
            .map(|(_, h)| h.as_str())
            .collect();
        let left_names: HashSet<&str> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != left_key)
            .map(|(_, h)| h.as_str())
            .collect();

        let mut headers: Vec<String> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                if i != left_key && right_names.contains(h.as_str()) {
                    format!("{}_x", h)
                } else {
                    h.clone()
                }
            })
            .collect();
        let right_cols: Vec<usize> = (0..other.headers.len()).filter(|i| *i != right_key).collect();
        for &i in &right_cols {
            let h = &other.headers[i];
            if left_names.contains(h.as_str()) {
                headers.push(format!("{}_y", h));
            } else {
                headers.push(h.clone());
            }
        }

        let mut seen = HashSet::new();
        for h in &headers {
            if !seen.insert(h.as_str()) {
                bail!("joining would produce duplicate column '{}'", h);
            }
        }

        // 2) index the right side by year, preserving row order
        let mut by_year: HashMap<i64, Vec<usize>> = HashMap::new();
        for (r, year) in other.years()?.into_iter().enumerate() {
            by_year.entry(year).or_default().push(r);
        }

        // 3) emit
        let mut rows = Vec::with_capacity(self.rows.len());
        for (row, year) in self.rows.iter().zip(self.years()?) {
            match by_year.get(&year) {
                Some(matches) => {
                    for &m in matches {
                        let mut out = row.clone();
                        out.extend(right_cols.iter().map(|&i| other.rows[m][i].clone()));
                        rows.push(out);
                    }
                }
                None => {
                    let mut out = row.clone();
                    out.extend(right_cols.iter().map(|_| String::new()));
                    rows.push(out);
                }
            }
        }

        Ok(IndicatorTable { headers, rows })
    }

    /// Stable sort by `Year` ascending.
    pub fn sort_by_year(&mut self) -> Result<()> {
        let years = self.years()?;
        let mut keyed: Vec<(i64, Vec<String>)> = years.into_iter().zip(self.rows.drain(..)).collect();
        keyed.sort_by_key(|(year, _)| *year);
        self.rows = keyed.into_iter().map(|(_, row)| row).collect();
        Ok(())
    }
}

/// Left-join the indicator tables in order and sort the result by year.
pub fn merge_tables(tables: &[IndicatorTable]) -> Result<IndicatorTable> {
    let (base, rest) = tables
        .split_first()
        .ok_or_else(|| anyhow!("no tables to merge"))?;

    let mut merged = base.clone();
    for (idx, table) in rest.iter().enumerate() {
        merged = merged
            .left_join(table)
            .with_context(|| format!("joining table #{}", idx + 1))?;
    }
    merged.sort_by_year()?;
    Ok(merged)
}

/// Read the four indicator files from `dir`, merge them, and write
/// `merged_dataset.csv` next to them. Any missing file or malformed table
/// aborts the merge.
#[tracing::instrument(level = "info", skip(dir), fields(dir = %dir.as_ref().display()))]
pub fn merge_indicators<P: AsRef<Path>>(dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();

    let tables = INDICATOR_FILES
        .iter()
        .map(|name| IndicatorTable::read_csv(dir.join(name)))
        .collect::<Result<Vec<_>>>()?;

    let merged = merge_tables(&tables)?;
    let out = dir.join(MERGED_FILE);
    merged.write_csv(&out)?;
    info!(rows = merged.rows.len(), cols = merged.headers.len(), "merged dataset saved as {}", out.display());
    Ok(out)
}
