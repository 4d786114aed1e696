//! Pipeline entry points for scrape runs.
//!
//! - `run_scrape`: Search a list of postcodes with checkpointing and resume
//! - `run_single`: Search one postcode and write a single-search file

pub mod checkpoint;
pub mod scrape;

pub use checkpoint::{Checkpointer, compute_resume_index};
pub use scrape::{RunContext, RunOutcome, RunState, StopSignal, run_scrape, run_single};
