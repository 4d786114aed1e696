// src/catalog.rs

//! Australian postcode catalog.
//!
//! Postcodes are generated from the Australia Post range table, normalized to
//! 4-digit zero-padded strings and kept in ascending numeric order. Every
//! scrape mode draws its unit sequence from here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// State or territory a postcode belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Nsw,
    Act,
    Vic,
    Qld,
    Sa,
    Wa,
    Tas,
    Nt,
    External,
}

impl Region {
    /// All regions in catalog order.
    pub const ALL: [Region; 9] = [
        Region::Nsw,
        Region::Act,
        Region::Vic,
        Region::Qld,
        Region::Sa,
        Region::Wa,
        Region::Tas,
        Region::Nt,
        Region::External,
    ];

    /// Short uppercase code (e.g. "NSW").
    pub fn code(self) -> &'static str {
        match self {
            Region::Nsw => "NSW",
            Region::Act => "ACT",
            Region::Vic => "VIC",
            Region::Qld => "QLD",
            Region::Sa => "SA",
            Region::Wa => "WA",
            Region::Tas => "TAS",
            Region::Nt => "NT",
            Region::External => "EXTERNAL",
        }
    }

    /// Inclusive numeric postcode ranges for this region.
    fn ranges(self) -> &'static [(u16, u16)] {
        match self {
            Region::Nsw => &[(1000, 1999), (2000, 2599), (2619, 2898), (2921, 2999)],
            Region::Act => &[(200, 299), (2600, 2618), (2900, 2920)],
            Region::Vic => &[(3000, 3999), (8000, 8999)],
            Region::Qld => &[(4000, 4999), (9000, 9999)],
            Region::Sa => &[(5000, 5999)],
            Region::Wa => &[(6000, 6797), (6999, 6999)],
            Region::Tas => &[(7000, 7999)],
            Region::Nt => &[(800, 999)],
            // Norfolk Island, Christmas Island, Cocos Islands
            Region::External => &[(2899, 2899), (6798, 6798), (6799, 6799)],
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_uppercase();
        Region::ALL
            .into_iter()
            .find(|r| r.code() == wanted)
            .ok_or_else(|| {
                let codes: Vec<&str> = Region::ALL.iter().map(|r| r.code()).collect();
                AppError::validation(format!(
                    "Unknown state '{s}'. Expected one of {}",
                    codes.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone)]
struct Entry {
    code: String,
    region: Region,
}

/// Ordered postcode table with region lookup.
#[derive(Debug, Clone)]
pub struct PostcodeCatalog {
    entries: Vec<Entry>,
}

/// Per-region postcode counts.
#[derive(Debug, Clone)]
pub struct CatalogStats {
    pub by_region: Vec<(Region, usize)>,
    pub total: usize,
}

impl CatalogStats {
    /// Rough run duration in minutes, at 10 to 20 seconds per postcode.
    pub fn estimated_minutes(&self) -> (u64, u64) {
        let total = self.total as u64;
        ((total * 10).div_ceil(60), (total * 20).div_ceil(60))
    }

    /// Rough output size in megabytes.
    pub fn estimated_storage_mb(&self) -> (u64, u64) {
        let total = self.total as u64;
        (total.div_ceil(2), total * 2)
    }
}

impl PostcodeCatalog {
    /// Build the full catalog from the range table.
    pub fn new() -> Self {
        let mut numbered: Vec<(u16, Region)> = Region::ALL
            .into_iter()
            .flat_map(|region| {
                region
                    .ranges()
                    .iter()
                    .flat_map(move |&(start, end)| (start..=end).map(move |n| (n, region)))
            })
            .collect();
        numbered.sort_by_key(|(n, _)| *n);

        let entries = numbered
            .into_iter()
            .map(|(n, region)| Entry {
                code: format!("{n:04}"),
                region,
            })
            .collect();

        Self { entries }
    }

    /// Normalize a postcode to its 4-digit zero-padded form.
    pub fn normalize(code: &str) -> String {
        let trimmed = code.trim();
        match trimmed.parse::<u16>() {
            Ok(n) => format!("{n:04}"),
            Err(_) => trimmed.to_string(),
        }
    }

    /// Every postcode in ascending order.
    pub fn all_units(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.code.clone()).collect()
    }

    /// Postcodes of a single region, ascending.
    pub fn units_for_region(&self, region: Region) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.region == region)
            .map(|e| e.code.clone())
            .collect()
    }

    /// Region of a postcode, if it is in the catalog.
    pub fn region_of(&self, code: &str) -> Option<Region> {
        let normalized = Self::normalize(code);
        self.entries
            .binary_search_by(|e| e.code.as_str().cmp(normalized.as_str()))
            .ok()
            .map(|idx| self.entries[idx].region)
    }

    /// Whether a postcode is in the catalog.
    pub fn is_valid(&self, code: &str) -> bool {
        self.region_of(code).is_some()
    }

    /// Evenly spaced sample of `per_region` postcodes from each state and
    /// territory (external territories excluded), sorted.
    pub fn sample_units(&self, per_region: usize) -> Vec<String> {
        let mut samples = Vec::new();

        for region in Region::ALL {
            if region == Region::External || per_region == 0 {
                continue;
            }

            let units = self.units_for_region(region);
            let step = (units.len() / per_region).max(1);
            samples.extend(units.into_iter().step_by(step).take(per_region));
        }

        samples.sort();
        samples.dedup();
        samples
    }

    /// CBD postcodes of the capital cities.
    pub fn major_city_units(&self) -> Vec<String> {
        [
            "2000", // Sydney
            "3000", // Melbourne
            "4000", // Brisbane
            "5000", // Adelaide
            "6000", // Perth
            "7000", // Hobart
            "0800", // Darwin
            "2600", // Canberra
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// Total number of postcodes.
    pub fn total_count(&self) -> usize {
        self.entries.len()
    }

    /// Per-region counts in catalog order.
    pub fn statistics(&self) -> CatalogStats {
        let by_region = Region::ALL
            .into_iter()
            .map(|r| (r, self.entries.iter().filter(|e| e.region == r).count()))
            .collect();

        CatalogStats {
            by_region,
            total: self.total_count(),
        }
    }
}

impl Default for PostcodeCatalog {
    fn default() -> Self {
        Self::new()
    }
}
