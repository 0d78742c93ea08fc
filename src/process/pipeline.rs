use anyhow::Result;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::config::{PipelineConfig, SheetSource};
use crate::process::{
    backcast::regress_backcast,
    load::load_state,
    record::{sort_records, PopulationRecord},
    write::write_records,
};

/// What one run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub states_loaded: usize,
    pub states_failed: usize,
    pub observed_rows: usize,
    pub projected_rows: usize,
    /// `None` when nothing was loaded and no file was written.
    pub output: Option<PathBuf>,
}

/// Drives load → backcast → combine → write over every configured state.
pub struct PopulationProcessor {
    config: PipelineConfig,
}

impl PopulationProcessor {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load one state, logging and swallowing any failure so the remaining
    /// states still run. A failed state yields an empty vec.
    pub fn load_and_transform(&self, source: &SheetSource) -> Vec<PopulationRecord> {
        info!(
            state = %source.state,
            "processing file {}",
            source
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| source.path.display().to_string())
        );
        match load_state(source, &self.config.layout) {
            Ok(records) => records,
            Err(err) => {
                error!(state = %source.state, "failed to process {}: {:#}", source.state, err);
                Vec::new()
            }
        }
    }

    /// Run every source in order and write the combined, sorted table.
    ///
    /// Writes nothing (and returns `Ok`) when no state produced data. Only
    /// output I/O failures are returned as errors.
    pub fn run(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let mut all_states: Vec<Vec<PopulationRecord>> = Vec::new();

        for source in &self.config.sources {
            let observed = self.load_and_transform(source);
            if observed.is_empty() {
                summary.states_failed += 1;
                continue;
            }

            let mut combined = regress_backcast(&observed, self.config.window);
            summary.projected_rows += combined.len();
            summary.observed_rows += observed.len();
            combined.extend(observed);

            summary.states_loaded += 1;
            all_states.push(combined);
        }

        if all_states.is_empty() {
            warn!("no data processed; {} not written", self.config.output_path.display());
            return Ok(summary);
        }

        let mut full_data: Vec<PopulationRecord> = all_states.into_iter().flatten().collect();
        sort_records(&mut full_data);
        write_records(&self.config.output_path, &full_data)?;
        info!(
            rows = full_data.len(),
            states = summary.states_loaded,
            "output written to {}",
            self.config.output_path.display()
        );

        summary.output = Some(self.config.output_path.clone());
        Ok(summary)
    }
}
