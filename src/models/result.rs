// src/models/result.rs

//! Outcome of one postcode search.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Region;
use crate::models::MemberRecord;

/// Whether a unit's workflow completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Success,
    Failed,
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStatus::Success => f.write_str("success"),
            SearchStatus::Failed => f.write_str("failed"),
        }
    }
}

/// Records found for one postcode, or the reason none were.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub postcode: String,
    #[serde(default)]
    pub state: Option<Region>,
    pub total_count: usize,
    pub status: SearchStatus,
    #[serde(default)]
    pub members: Vec<MemberRecord>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SearchResult {
    /// A completed search.
    pub fn success(postcode: impl Into<String>, state: Option<Region>, members: Vec<MemberRecord>) -> Self {
        Self {
            postcode: postcode.into(),
            state,
            total_count: members.len(),
            status: SearchStatus::Success,
            members,
            error: None,
        }
    }

    /// A search that failed at unit level.
    pub fn failed(postcode: impl Into<String>, state: Option<Region>, error: impl fmt::Display) -> Self {
        Self {
            postcode: postcode.into(),
            state,
            total_count: 0,
            status: SearchStatus::Failed,
            members: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SearchStatus::Success && self.error.is_none()
    }
}
