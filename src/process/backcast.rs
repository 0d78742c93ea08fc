use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::BackcastWindow;
use crate::process::record::PopulationRecord;

/// Ordinary least-squares line `population = slope * year + intercept`,
/// stored around the sample means so predictions stay exact for
/// integer-valued trends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub mean_year: f64,
    pub mean_population: f64,
}

impl LinearFit {
    /// Fit over `(year, population)` points. `None` for an empty series.
    ///
    /// With fewer than two distinct years the slope is 0 and the line is the
    /// mean population, so a single observation projects as a constant.
    pub fn fit(points: &[(i32, i64)]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let mean_year = points.iter().map(|&(x, _)| f64::from(x)).sum::<f64>() / n;
        let mean_population = points.iter().map(|&(_, y)| y as f64).sum::<f64>() / n;

        let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), &(x, y)| {
            let dx = f64::from(x) - mean_year;
            let dy = y as f64 - mean_population;
            (sxy + dx * dy, sxx + dx * dx)
        });
        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };

        Some(Self {
            slope,
            mean_year,
            mean_population,
        })
    }

    pub fn intercept(&self) -> f64 {
        self.mean_population - self.slope * self.mean_year
    }

    pub fn predict(&self, year: i32) -> f64 {
        self.mean_population + self.slope * (f64::from(year) - self.mean_year)
    }

    /// Prediction truncated toward zero. Negative values are kept.
    pub fn project(&self, year: i32) -> i64 {
        self.predict(year) as i64
    }
}

/// Fit one line per county and evaluate it over every year of `window`.
///
/// Counties are visited in first-seen order; the caller sorts the output.
pub fn regress_backcast(records: &[PopulationRecord], window: BackcastWindow) -> Vec<PopulationRecord> {
    info!(records = records.len(), "performing regression projections");

    let mut order: Vec<(&str, &str)> = Vec::new();
    let mut series: HashMap<(&str, &str), Vec<(i32, i64)>> = HashMap::new();
    for r in records {
        let key = (r.state.as_str(), r.county.as_str());
        series
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push((r.year, r.population));
    }

    let mut projections = Vec::with_capacity(order.len() * window.len());
    for key @ (state, county) in order {
        let Some(fit) = LinearFit::fit(&series[&key]) else {
            continue;
        };
        debug!(
            state,
            county,
            slope = fit.slope,
            intercept = fit.intercept(),
            "fitted county trend"
        );
        for year in window.years() {
            projections.push(PopulationRecord {
                state: state.to_string(),
                county: county.to_string(),
                year,
                population: fit.project(year),
            });
        }
    }
    projections
}
