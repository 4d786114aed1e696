//! Service layer for the scraper.
//!
//! This module contains the business logic for:
//! - Searching one postcode (`SearchWorkflow`)
//! - Member extraction (`ExtractionEngine`, line-scan heuristics)
//! - Locator probing (`ProbeChain`)
//! - Bounded retry (`RetryPolicy`)

pub mod extraction;
pub mod heuristics;
mod probe;
mod retry;
mod search;

pub use extraction::{Extraction, ExtractionEngine, ExtractionTier};
pub use heuristics::{LineRules, scan_lines, text_lines};
pub use probe::{ProbeChain, wait_for_visible};
pub use retry::RetryPolicy;
pub use search::{SearchWorkflow, UnitStage};
