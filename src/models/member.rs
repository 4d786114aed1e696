// src/models/member.rs

//! Member record extracted from the directory.

use serde::{Deserialize, Serialize};

use crate::utils::patterns::is_valid_email;

/// A normalized directory listing.
///
/// Field names follow the directory's own JSON so output files line up with
/// what the site's API returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MemberRecord {
    #[serde(rename = "strSelectedMemberType", default)]
    pub member_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub preferred_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub business_address: String,
    #[serde(default)]
    pub phone: String,
    pub email: String,
    #[serde(rename = "CompanyWebsite", default)]
    pub website: Option<String>,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub specialties: Option<String>,
    #[serde(default)]
    pub special_conditions: String,
    #[serde(default)]
    pub specialisation: Option<String>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
}

impl MemberRecord {
    /// Start a record for `email`. Returns `None` unless the address is valid.
    pub fn with_email(email: &str) -> Option<Self> {
        let email = email.trim();
        if !is_valid_email(email) {
            return None;
        }

        Some(Self {
            member_type: String::new(),
            name: String::new(),
            preferred_name: String::new(),
            first_name: String::new(),
            middle_name: String::new(),
            last_name: String::new(),
            company: String::new(),
            business_address: String::new(),
            phone: String::new(),
            email: email.to_string(),
            website: None,
            designation: String::new(),
            specialties: None,
            special_conditions: String::new(),
            specialisation: None,
            longitude: None,
            latitude: None,
        })
    }

    /// Set the full name and its split parts.
    pub fn set_name(&mut self, full_name: &str) {
        let parts = NameParts::split(full_name);
        self.name = parts.full;
        self.preferred_name = parts.first.clone();
        self.first_name = parts.first;
        self.middle_name = parts.middle;
        self.last_name = parts.last;
    }

    /// Whether the record carries a syntactically valid email.
    pub fn has_valid_email(&self) -> bool {
        is_valid_email(&self.email)
    }
}

/// A personal name split into first, middle and last parts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameParts {
    pub full: String,
    pub first: String,
    pub middle: String,
    pub last: String,
}

impl NameParts {
    /// Split on whitespace.
    ///
    /// One token is a first name only; two are first/last; with three or
    /// more, the interior tokens form the middle name.
    pub fn split(full_name: &str) -> Self {
        let tokens: Vec<&str> = full_name.split_whitespace().collect();
        let full = tokens.join(" ");

        match tokens.as_slice() {
            [] => Self::default(),
            [first] => Self {
                full,
                first: first.to_string(),
                ..Self::default()
            },
            [first, last] => Self {
                full,
                first: first.to_string(),
                middle: String::new(),
                last: last.to_string(),
            },
            [first, middle @ .., last] => Self {
                full,
                first: first.to_string(),
                middle: middle.join(" "),
                last: last.to_string(),
            },
        }
    }
}
