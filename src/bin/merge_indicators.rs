// src/bin/merge_indicators.rs

use anyhow::Result;
use popcast::merge::merge_indicators;
use std::{env, path::PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(filter).init();

    // directory holding income.csv, cpi.csv, Population.csv, unemployment.csv
    let dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    merge_indicators(&dir)?;
    Ok(())
}
