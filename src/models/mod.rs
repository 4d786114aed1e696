// src/models/mod.rs

//! Domain models for the scraper.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod checkpoint;
mod config;
mod locator;
mod member;
mod result;
mod run;

// Re-export all public types
pub use checkpoint::{
    FinalAggregate, PostcodeSummary, ProgressSnapshot, RunStatus, RunSummary, UnitOutput,
    progress_percent,
};
pub use config::{
    BrowserSettings, Config, ExtractionConfig, LoggingConfig, PaginationConfig, RetryConfig,
    SelectorConfig, SiteConfig, TimingConfig,
};
pub use locator::Locator;
pub use member::{MemberRecord, NameParts};
pub use result::{SearchResult, SearchStatus};
pub use run::{RunOptions, ScrapeMode};
