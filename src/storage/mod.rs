//! Storage abstractions for run output.
//!
//! Every file a run produces lives in one data directory, keyed by file name:
//!
//! ```text
//! data/
//! ├── config.toml                          # Scraper configuration
//! ├── progress_<output>.json               # In-progress checkpoint
//! ├── <output>.json                        # Final aggregate
//! ├── partial_<output>.json                # Aggregate of an aborted run
//! └── screenshots/                         # Diagnostic screenshots
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{FinalAggregate, ProgressSnapshot, UnitOutput};

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for run output backends.
#[async_trait]
pub trait CheckpointStorage: Send + Sync {
    /// Replace the progress checkpoint stored under `key`.
    async fn write_progress(&self, key: &str, snapshot: &ProgressSnapshot) -> Result<()>;

    /// Write a final or partial aggregate.
    async fn write_aggregate(&self, key: &str, aggregate: &FinalAggregate) -> Result<()>;

    /// Write the output of a single-postcode search.
    async fn write_unit_output(&self, key: &str, output: &UnitOutput) -> Result<()>;

    /// Load a progress checkpoint, if one exists.
    async fn load_progress(&self, key: &str) -> Result<Option<ProgressSnapshot>>;

    /// Human-readable location of `key`, for logs.
    fn location(&self, key: &str) -> String;
}
