use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Describes where the table sits inside a population sheet and what each
/// column means.
///
/// Columns named by a year (e.g. `"2021"`) hold population for that year,
/// the column named `county_column` holds the county, and anything else is
/// dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SheetLayout {
    /// Rows of title text above the column-header row.
    pub skip_rows: usize,
    /// Whether a column-header row follows the skipped rows. Its text is
    /// ignored; `columns` supplies the names.
    pub header_row: bool,
    /// Whether the first data row is a state-level total.
    pub drop_aggregate_row: bool,
    /// Stop at the first row with a blank county cell (footnotes follow).
    pub stop_at_blank_row: bool,
    pub county_column: String,
    pub columns: Vec<String>,
}

impl Default for SheetLayout {
    /// Census Bureau `co-est2024-pop-XX` county sheets.
    fn default() -> Self {
        Self {
            skip_rows: 3,
            header_row: true,
            drop_aggregate_row: true,
            stop_at_blank_row: true,
            county_column: "County".into(),
            columns: ["County", "Base_Pop", "2020", "2021", "2022", "2023", "2024"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl SheetLayout {
    pub fn county_index(&self) -> Option<usize> {
        self.columns.iter().position(|c| *c == self.county_column)
    }

    /// `(column index, year)` for every year column, in sheet order.
    pub fn year_columns(&self) -> Vec<(usize, i32)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, name)| **name != self.county_column)
            .filter_map(|(idx, name)| name.trim().parse::<i32>().ok().map(|y| (idx, y)))
            .collect()
    }

    pub fn observed_years(&self) -> Vec<i32> {
        self.year_columns().into_iter().map(|(_, y)| y).collect()
    }

    /// Index of the first row after the title rows and the header row.
    pub fn body_start(&self) -> usize {
        self.skip_rows + usize::from(self.header_row)
    }

    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for name in &self.columns {
            if !names.insert(name.as_str()) {
                bail!("layout column '{}' is listed more than once", name);
            }
        }
        if self.county_index().is_none() {
            bail!(
                "layout columns {:?} do not include the county column '{}'",
                self.columns,
                self.county_column
            );
        }
        if self.year_columns().is_empty() {
            bail!("layout columns {:?} contain no year column", self.columns);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_roles() {
        let layout = SheetLayout::default();
        assert_eq!(layout.county_index(), Some(0));
        assert_eq!(
            layout.year_columns(),
            vec![(2, 2020), (3, 2021), (4, 2022), (5, 2023), (6, 2024)]
        );
        assert_eq!(layout.body_start(), 4);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn validate_rejects_broken_layouts() {
        let mut layout = SheetLayout::default();
        layout.county_column = "Area".into();
        assert!(layout.validate().is_err());

        let mut layout = SheetLayout::default();
        layout.columns = vec!["County".into(), "Base_Pop".into()];
        assert!(layout.validate().is_err());

        let mut layout = SheetLayout::default();
        layout.columns.push("2024".into());
        assert!(layout.validate().is_err());
    }
}
