//! Core engine: the per-account collection sequence and its report.

pub mod orchestrator;
pub mod report;

pub use orchestrator::Citybox;
pub use report::{AccountOutcome, AccountReport, RunReport};
