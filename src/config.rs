// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use crate::process::layout::SheetLayout;

/// One spreadsheet to ingest: which file, which sheet inside it, and the
/// state its counties belong to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SheetSource {
    pub path: PathBuf,
    pub sheet: String,
    pub state: String,
}

impl SheetSource {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet: sheet.into(),
            state: state.into(),
        }
    }
}

/// Inclusive range of years to backcast.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackcastWindow {
    pub start_year: i32,
    pub end_year: i32,
}

impl Default for BackcastWindow {
    fn default() -> Self {
        Self {
            start_year: 2005,
            end_year: 2019,
        }
    }
}

impl BackcastWindow {
    pub fn years(&self) -> RangeInclusive<i32> {
        self.start_year..=self.end_year
    }

    pub fn len(&self) -> usize {
        if self.end_year < self.start_year {
            0
        } else {
            (self.end_year - self.start_year + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything one pipeline run needs.
///
/// Loaded from YAML:
///
/// ```yaml
/// output_path: county_population.csv
/// window: { start_year: 2005, end_year: 2019 }
/// sources:
///   - { path: co-est2024-pop-37.xlsx, sheet: CO-EST2024-POP-37, state: North Carolina }
/// ```
///
/// `window` and `layout` fall back to their defaults when omitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineConfig {
    pub output_path: PathBuf,
    pub sources: Vec<SheetSource>,
    #[serde(default)]
    pub window: BackcastWindow,
    #[serde(default)]
    pub layout: SheetLayout,
}

impl PipelineConfig {
    /// The four Census Bureau `co-est2024-pop` workbooks the pipeline was
    /// first run against, resolved against the working directory.
    pub fn census_default() -> Self {
        let sources = [
            ("37", "North Carolina"),
            ("45", "South Carolina"),
            ("47", "Tennessee"),
            ("51", "Virginia"),
        ]
        .into_iter()
        .map(|(fips, state)| {
            SheetSource::new(
                format!("co-est2024-pop-{}.xlsx", fips),
                format!("CO-EST2024-POP-{}", fips),
                state,
            )
        })
        .collect();

        Self {
            output_path: PathBuf::from("county_population.csv"),
            sources,
            window: BackcastWindow::default(),
            layout: SheetLayout::default(),
        }
    }

    /// Parse and validate a YAML document. Paths are kept as written.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text).context("parsing pipeline config YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML config file. Relative source and output paths are taken
    /// relative to the directory holding the config file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.output_path = resolve(base, &config.output_path);
        for source in &mut config.sources {
            source.path = resolve(base, &source.path);
        }

        config
            .validate()
            .with_context(|| format!("invalid config in {}", path.display()))?;
        Ok(config)
    }

    /// Reject configs that cannot produce a well-keyed output before any
    /// spreadsheet is opened.
    pub fn validate(&self) -> Result<()> {
        if self.output_path.as_os_str().is_empty() {
            bail!("output_path must not be empty");
        }
        if self.sources.is_empty() {
            bail!("no sources configured");
        }

        let mut states = HashSet::new();
        for (idx, source) in self.sources.iter().enumerate() {
            if source.path.as_os_str().is_empty() {
                bail!("source #{} has an empty path", idx);
            }
            if source.sheet.trim().is_empty() {
                bail!("source #{} ({}) has an empty sheet name", idx, source.path.display());
            }
            if source.state.trim().is_empty() {
                bail!("source #{} ({}) has an empty state name", idx, source.path.display());
            }
            if !states.insert(source.state.as_str()) {
                bail!("state '{}' is listed more than once", source.state);
            }
        }

        self.layout.validate()?;

        if self.window.start_year > self.window.end_year {
            bail!(
                "backcast window start {} is after end {}",
                self.window.start_year,
                self.window.end_year
            );
        }
        if let Some(year) = self
            .layout
            .observed_years()
            .into_iter()
            .find(|y| self.window.years().contains(y))
        {
            bail!(
                "backcast window {}..={} overlaps observed year {}",
                self.window.start_year,
                self.window.end_year,
                year
            );
        }

        Ok(())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
