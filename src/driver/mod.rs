// src/driver/mod.rs

//! Browser session abstraction.
//!
//! The search workflow only talks to a page through [`SearchDriver`]. Elements
//! are addressed by opaque [`ElementHandle`]s obtained from [`SearchDriver::locate`];
//! a handle stays valid until the page navigates away.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Locator;

#[cfg(feature = "chromium")]
mod chromium;
#[cfg(test)]
pub(crate) mod fake;

#[cfg(feature = "chromium")]
pub use chromium::ChromiumDriver;

/// Quote `s` as a JavaScript string literal.
pub(crate) fn js_string(s: &str) -> String {
    // Serializing a str cannot fail.
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// Opaque reference to an element on the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Page lifecycle point at which navigation is considered done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitUntil {
    /// The DOM has been parsed; scripts may still be initializing
    #[default]
    DomContentLoaded,
    /// All subresources have loaded
    Load,
}

/// One page session against the directory site.
#[async_trait]
pub trait SearchDriver: Send + Sync {
    /// Load `url`, failing with a navigation or timeout error after `timeout`.
    async fn navigate(&self, url: &str, wait: WaitUntil, timeout: Duration) -> Result<()>;

    /// Document title.
    async fn title(&self) -> Result<String>;

    /// URL of the current document.
    async fn current_url(&self) -> Result<String>;

    /// First element matching `locator`, if any.
    async fn locate(&self, locator: &Locator) -> Result<Option<ElementHandle>>;

    /// Number of elements matching `locator`.
    async fn count(&self, locator: &Locator) -> Result<usize>;

    /// Replace the element's value with `text`, dispatching input, change and
    /// keyup events so client-side frameworks observe the edit.
    async fn fill(&self, handle: ElementHandle, text: &str) -> Result<()>;

    async fn click(&self, handle: ElementHandle) -> Result<()>;

    /// Whether the element is rendered with a non-empty box. A detached
    /// element is not visible.
    async fn is_visible(&self, handle: ElementHandle) -> Result<bool>;

    /// Whether the element accepts interaction. A detached element is not enabled.
    async fn is_enabled(&self, handle: ElementHandle) -> Result<bool>;

    /// Evaluate a script expression in the page and return its JSON value.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Serialized HTML of the current document.
    async fn content(&self) -> Result<String>;

    /// Rendered text of the document body, one visual line per line.
    async fn visible_text(&self) -> Result<String>;

    /// Settle delay.
    async fn wait_ms(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Save a full-page screenshot to `path`.
    async fn screenshot(&self, path: &Path) -> Result<()>;
}
