// src/process/mod.rs
//
// Spreadsheet → long-form table → per-county backcast → one sorted file.

pub mod backcast;
pub mod layout;
pub mod load;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod sheet;
pub mod write;

#[cfg(test)]
pub(crate) mod fixtures;

pub use backcast::{regress_backcast, LinearFit};
pub use layout::SheetLayout;
pub use load::load_state;
pub use pipeline::{PopulationProcessor, RunSummary};
pub use record::PopulationRecord;
