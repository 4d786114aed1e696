// src/models/locator.rs

//! Page element locators.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A CSS selector, optionally narrowed to elements whose text contains a
/// fragment (compared case-insensitively).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub css: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_text: Option<String>,
}

impl Locator {
    pub fn css(css: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            has_text: None,
        }
    }

    /// Narrow to elements whose text contains `text`.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.has_text = Some(text.into());
        self
    }

    /// Whether an element's text satisfies the text filter.
    pub fn matches_text(&self, element_text: &str) -> bool {
        match &self.has_text {
            Some(fragment) => element_text
                .to_lowercase()
                .contains(&fragment.to_lowercase()),
            None => true,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.has_text {
            Some(text) => write!(f, "{}:has-text(\"{}\")", self.css, text),
            None => f.write_str(&self.css),
        }
    }
}
