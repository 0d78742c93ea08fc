use serde::{Deserialize, Serialize};

/// One county's population in one year, observed or projected.
///
/// Field order is the output column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationRecord {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "County")]
    pub county: String,
    #[serde(rename = "Year")]
    pub year: i32,
    /// Observed values are never negative; projections may be.
    #[serde(rename = "Population")]
    pub population: i64,
}

impl PopulationRecord {
    /// Sort key of the combined output.
    pub fn key(&self) -> (&str, &str, i32) {
        (&self.state, &self.county, self.year)
    }
}

/// Sort by (State, County, Year) ascending.
pub fn sort_records(records: &mut [PopulationRecord]) {
    records.sort_by(|a, b| a.key().cmp(&b.key()));
}
