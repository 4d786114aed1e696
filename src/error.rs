// src/error.rs

//! Unified error handling for the scraper.
//!
//! Errors fall into three groups that the orchestrator treats differently:
//! retryable (navigation hiccups, timeouts), unit-level (a missing control on one
//! search) and fatal (the browser session itself is gone).

use std::fmt;

use thiserror::Error;

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Page navigation failed (retryable)
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    /// A retryable operation ran out of attempts
    #[error("{operation} failed after {attempts} attempts: {message}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        message: String,
    },

    /// A page control could not be located
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// An in-page script failed
    #[error("Page script failed: {0}")]
    Script(String),

    /// A driver call timed out (retryable)
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Browser launch or protocol failure
    #[error("Browser error: {0}")]
    Browser(String),

    /// The search session is no longer usable
    #[error("Driver failure: {0}")]
    DriverFatal(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a navigation error for a URL.
    pub fn navigation(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create an element-not-found error.
    pub fn element_not_found(what: impl Into<String>) -> Self {
        Self::ElementNotFound(what.into())
    }

    /// Create a fatal driver error.
    pub fn driver_fatal(message: impl fmt::Display) -> Self {
        Self::DriverFatal(message.to_string())
    }

    /// Reclassify a failure that happened while `url` was loading as a
    /// navigation error. Fatal and already-retryable errors pass through.
    pub fn during_navigation(self, url: &str) -> Self {
        if self.is_fatal() || self.is_retryable() {
            self
        } else {
            Self::navigation(url, self)
        }
    }

    /// Whether the failed operation may succeed if attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Navigation { .. } | Self::Timeout(_))
    }

    /// Whether the error leaves the session unusable and must abort the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DriverFatal(_) | Self::Browser(_))
    }
}
