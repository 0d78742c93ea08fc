pub mod config;
pub mod merge;
pub mod process;
