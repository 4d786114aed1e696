// src/models/checkpoint.rs

//! Persisted run snapshots: progress checkpoints, final aggregates and
//! single-search output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Region;
use crate::models::{MemberRecord, SearchResult, SearchStatus};

/// Lifecycle status written into snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    InProgress,
    Completed,
    Failed,
}

/// Periodic snapshot of an unfinished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub status: RunStatus,
    pub processed: usize,
    pub total: usize,
    pub progress_percent: String,
    pub last_updated: DateTime<Utc>,
    pub results: Vec<SearchResult>,
}

impl ProgressSnapshot {
    pub fn new(results: &[SearchResult], processed: usize, total: usize) -> Self {
        Self {
            status: RunStatus::InProgress,
            processed,
            total,
            progress_percent: progress_percent(processed, total),
            last_updated: Utc::now(),
            results: results.to_vec(),
        }
    }
}

/// `processed / total` as a percentage with one decimal.
pub fn progress_percent(processed: usize, total: usize) -> String {
    if total == 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", processed as f64 / total as f64 * 100.0)
}

/// Run totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_postcodes_processed: usize,
    pub successful_postcodes: usize,
    pub failed_postcodes: usize,
    pub total_members_found: usize,
    pub scrape_completed: DateTime<Utc>,
    pub status: RunStatus,
}

/// One row of the per-postcode summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostcodeSummary {
    pub postcode: String,
    #[serde(rename = "memberCount")]
    pub member_count: usize,
    pub state: Option<Region>,
    pub status: SearchStatus,
    pub error: Option<String>,
}

/// Terminal output of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalAggregate {
    pub summary: RunSummary,
    pub postcode_summary: Vec<PostcodeSummary>,
    pub all_members: Vec<MemberRecord>,
}

impl FinalAggregate {
    /// Aggregate accumulated results. Members of failed units are not counted.
    pub fn from_results(results: &[SearchResult], status: RunStatus) -> Self {
        let mut all_members = Vec::new();
        let mut postcode_summary = Vec::with_capacity(results.len());
        let mut successful = 0;
        let mut failed = 0;

        for result in results {
            if result.is_success() {
                successful += 1;
                all_members.extend(result.members.iter().cloned());
            } else {
                failed += 1;
            }

            postcode_summary.push(PostcodeSummary {
                postcode: result.postcode.clone(),
                member_count: if result.is_success() { result.members.len() } else { 0 },
                state: result.state,
                status: result.status,
                error: result.error.clone(),
            });
        }

        Self {
            summary: RunSummary {
                total_postcodes_processed: results.len(),
                successful_postcodes: successful,
                failed_postcodes: failed,
                total_members_found: all_members.len(),
                scrape_completed: Utc::now(),
                status,
            },
            postcode_summary,
            all_members,
        }
    }
}

/// Output of a single-postcode search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitOutput {
    pub total_count: usize,
    pub search_details: Vec<MemberRecord>,
}

impl From<&SearchResult> for UnitOutput {
    fn from(result: &SearchResult) -> Self {
        Self {
            total_count: result.members.len(),
            search_details: result.members.clone(),
        }
    }
}
