use anyhow::Result;
use popcast::{config::PipelineConfig, process::PopulationProcessor};
use std::env;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) load config ──────────────────────────────────────────────
    let config = match env::args().nth(1) {
        Some(path) => {
            info!("loading config from {}", path);
            PipelineConfig::from_yaml_file(&path)?
        }
        None => {
            info!("no config given; using the built-in census source list");
            PipelineConfig::census_default()
        }
    };
    info!(
        sources = config.sources.len(),
        window = ?config.window.years(),
        "output → {}",
        config.output_path.display()
    );

    // ─── 3) load, backcast, write ────────────────────────────────────
    let summary = PopulationProcessor::new(config)?.run()?;
    info!(
        loaded = summary.states_loaded,
        failed = summary.states_failed,
        observed = summary.observed_rows,
        projected = summary.projected_rows,
        "all done"
    );
    Ok(())
}
