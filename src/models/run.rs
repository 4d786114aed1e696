// src/models/run.rs

//! Scrape modes and per-run options.

use crate::catalog::Region;

/// Which postcodes a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeMode {
    /// Every postcode in the catalog
    Full,
    /// Postcodes of one state or territory
    Region(Region),
    /// A few evenly spaced postcodes per state
    Sample,
    /// Capital-city CBD postcodes
    Cities,
    /// Full catalog, starting at a postcode
    Resume(String),
    /// One postcode, written as a single-search file
    Single(String),
}

/// Settings fixed for the duration of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Units between progress checkpoints
    pub batch_size: usize,

    /// Pause between consecutive units in milliseconds
    pub delay_ms: u64,

    /// Postcode to start from
    pub resume_from: Option<String>,

    /// Final output file name (progress and partial files derive from it)
    pub output_file: String,

    /// Write periodic progress checkpoints
    pub save_progress: bool,
}

impl RunOptions {
    /// Defaults tuned per mode: larger runs checkpoint less often and pause longer.
    pub fn for_mode(mode: &ScrapeMode) -> Self {
        let (batch_size, delay_ms, output_file, resume_from) = match mode {
            ScrapeMode::Full => (10, 5000, "ca_members_all_australia.json".to_string(), None),
            ScrapeMode::Region(region) => (
                5,
                3000,
                format!("ca_members_{}.json", region.code().to_lowercase()),
                None,
            ),
            ScrapeMode::Sample => (2, 2000, "ca_members_sample.json".to_string(), None),
            ScrapeMode::Cities => (3, 4000, "ca_members_major_cities.json".to_string(), None),
            // Continues the full run so its progress checkpoint is picked up.
            ScrapeMode::Resume(postcode) => (
                10,
                5000,
                "ca_members_all_australia.json".to_string(),
                Some(postcode.clone()),
            ),
            ScrapeMode::Single(_) => (1, 0, "ca_members_headed.json".to_string(), None),
        };

        Self {
            batch_size,
            delay_ms,
            resume_from,
            output_file,
            save_progress: !matches!(mode, ScrapeMode::Single(_)),
        }
    }

    /// Progress checkpoint file name.
    pub fn progress_file(&self) -> String {
        format!("progress_{}", self.output_file)
    }

    /// Partial aggregate file name, written when a run aborts.
    pub fn partial_file(&self) -> String {
        format!("partial_{}", self.output_file)
    }
}
