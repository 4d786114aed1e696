// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Locator;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Target directory site
    #[serde(default)]
    pub site: SiteConfig,

    /// Browser session settings
    #[serde(default)]
    pub browser: BrowserSettings,

    /// Settle delays between page interactions
    #[serde(default)]
    pub timing: TimingConfig,

    /// Navigation retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Load-more pagination limits
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Locators for the search form and result controls
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Structured and heuristic extraction rules
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.site.search_url)?;
        if self.browser.user_agent.trim().is_empty() {
            return Err(AppError::config("browser.user_agent is empty"));
        }
        if self.browser.navigation_timeout_ms == 0 {
            return Err(AppError::config(
                "browser.navigation_timeout_ms must be > 0",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::config("retry.max_attempts must be > 0"));
        }
        if self.pagination.max_clicks == 0 {
            return Err(AppError::config("pagination.max_clicks must be > 0"));
        }
        if self.selectors.submit_probes.is_empty() {
            return Err(AppError::config("selectors.submit_probes is empty"));
        }
        if self.selectors.load_more.is_empty() {
            return Err(AppError::config("selectors.load_more is empty"));
        }
        if self.extraction.container_selectors.is_empty() {
            return Err(AppError::config(
                "extraction.container_selectors is empty",
            ));
        }
        if self.extraction.name_window == 0 {
            return Err(AppError::config("extraction.name_window must be > 0"));
        }
        Ok(())
    }
}

/// Target site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Search page URL
    #[serde(default = "defaults::search_url")]
    pub search_url: String,

    /// Title fragments expected on the search page
    #[serde(default = "defaults::title_markers")]
    pub title_markers: Vec<String>,

    /// URL fragments that indicate a results page
    #[serde(default = "defaults::results_url_markers")]
    pub results_url_markers: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            search_url: defaults::search_url(),
            title_markers: defaults::title_markers(),
            results_url_markers: defaults::results_url_markers(),
        }
    }
}

/// Browser session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Run without a visible window
    #[serde(default)]
    pub headless: bool,

    /// User-Agent presented to the site
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Window width in pixels
    #[serde(default = "defaults::viewport_width")]
    pub viewport_width: u32,

    /// Window height in pixels
    #[serde(default = "defaults::viewport_height")]
    pub viewport_height: u32,

    /// Page load timeout in milliseconds
    #[serde(default = "defaults::navigation_timeout")]
    pub navigation_timeout_ms: u64,

    /// Directory for diagnostic screenshots (relative to the data dir)
    #[serde(default = "defaults::screenshot_dir")]
    pub screenshot_dir: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: false,
            user_agent: defaults::user_agent(),
            viewport_width: defaults::viewport_width(),
            viewport_height: defaults::viewport_height(),
            navigation_timeout_ms: defaults::navigation_timeout(),
            screenshot_dir: defaults::screenshot_dir(),
        }
    }
}

/// Fixed settle delays in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// After the search page loads, for the client app to initialize
    #[serde(default = "defaults::page_settle")]
    pub page_settle_ms: u64,

    /// After activating the location tab
    #[serde(default = "defaults::tab_settle")]
    pub tab_settle_ms: u64,

    /// Max wait for the postcode input to become visible
    #[serde(default = "defaults::input_wait")]
    pub input_wait_ms: u64,

    /// After filling the postcode
    #[serde(default = "defaults::input_settle")]
    pub input_settle_ms: u64,

    /// Extra wait when the submit button is still disabled
    #[serde(default = "defaults::enable_settle")]
    pub enable_settle_ms: u64,

    /// After forcing the submit button enabled
    #[serde(default = "defaults::force_enable_settle")]
    pub force_enable_settle_ms: u64,

    /// After submitting the search
    #[serde(default = "defaults::search_settle")]
    pub search_settle_ms: u64,

    /// After each load-more click
    #[serde(default = "defaults::load_more_settle")]
    pub load_more_settle_ms: u64,

    /// After pagination finishes
    #[serde(default = "defaults::final_settle")]
    pub final_settle_ms: u64,

    /// Poll interval while waiting for an element
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            page_settle_ms: defaults::page_settle(),
            tab_settle_ms: defaults::tab_settle(),
            input_wait_ms: defaults::input_wait(),
            input_settle_ms: defaults::input_settle(),
            enable_settle_ms: defaults::enable_settle(),
            force_enable_settle_ms: defaults::force_enable_settle(),
            search_settle_ms: defaults::search_settle(),
            load_more_settle_ms: defaults::load_more_settle(),
            final_settle_ms: defaults::final_settle(),
            poll_interval_ms: defaults::poll_interval(),
        }
    }
}

/// Retry policy for transient failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts in milliseconds
    #[serde(default = "defaults::retry_delay")]
    pub delay_ms: u64,

    /// Multiply the pause by this factor after each failure (1.0 = fixed)
    #[serde(default = "defaults::backoff_factor")]
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            delay_ms: defaults::retry_delay(),
            backoff_factor: defaults::backoff_factor(),
        }
    }
}

/// Load-more pagination limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Safety cap on load-more clicks per search
    #[serde(default = "defaults::max_clicks")]
    pub max_clicks: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_clicks: defaults::max_clicks(),
        }
    }
}

/// Locators for the search workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Tab that switches the form to location search
    #[serde(default = "defaults::location_tab")]
    pub location_tab: Locator,

    /// Postcode text input
    #[serde(default = "defaults::postcode_input")]
    pub postcode_input: Locator,

    /// Submit button checked for enablement after filling the form
    #[serde(default = "defaults::submit_button")]
    pub submit_button: Locator,

    /// Submit button candidates, most specific first
    #[serde(default = "defaults::submit_probes")]
    pub submit_probes: Vec<Locator>,

    /// Load-more button candidates, primary first
    #[serde(default = "defaults::load_more")]
    pub load_more: Vec<Locator>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            location_tab: defaults::location_tab(),
            postcode_input: defaults::postcode_input(),
            submit_button: defaults::submit_button(),
            submit_probes: defaults::submit_probes(),
            load_more: defaults::load_more(),
        }
    }
}

/// Extraction rules for both tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Member container selectors in priority order
    #[serde(default = "defaults::container_selectors")]
    pub container_selectors: Vec<String>,

    #[serde(default = "defaults::name_selectors")]
    pub name_selectors: Vec<String>,

    #[serde(default = "defaults::company_selectors")]
    pub company_selectors: Vec<String>,

    #[serde(default = "defaults::phone_selectors")]
    pub phone_selectors: Vec<String>,

    #[serde(default = "defaults::address_selectors")]
    pub address_selectors: Vec<String>,

    #[serde(default = "defaults::designation_selectors")]
    pub designation_selectors: Vec<String>,

    #[serde(default = "defaults::website_selectors")]
    pub website_selectors: Vec<String>,

    /// Lines containing any of these are page chrome, not listing text
    #[serde(default = "defaults::boilerplate")]
    pub boilerplate: Vec<String>,

    /// Lines above an email searched for the member's name
    #[serde(default = "defaults::name_window")]
    pub name_window: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            container_selectors: defaults::container_selectors(),
            name_selectors: defaults::name_selectors(),
            company_selectors: defaults::company_selectors(),
            phone_selectors: defaults::phone_selectors(),
            address_selectors: defaults::address_selectors(),
            designation_selectors: defaults::designation_selectors(),
            website_selectors: defaults::website_selectors(),
            boilerplate: defaults::boilerplate(),
            name_window: defaults::name_window(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use crate::models::Locator;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // Site defaults
    pub fn search_url() -> String {
        "https://www.charteredaccountantsanz.com/find-a-ca".into()
    }
    pub fn title_markers() -> Vec<String> {
        strings(&["Find a Chartered Accountant", "CA ANZ"])
    }
    pub fn results_url_markers() -> Vec<String> {
        strings(&["search-results", "results"])
    }

    // Browser defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.6 Safari/605.1.15".into()
    }
    pub fn viewport_width() -> u32 {
        1280
    }
    pub fn viewport_height() -> u32 {
        720
    }
    pub fn navigation_timeout() -> u64 {
        60_000
    }
    pub fn screenshot_dir() -> String {
        "screenshots".into()
    }

    // Timing defaults
    pub fn page_settle() -> u64 {
        5000
    }
    pub fn tab_settle() -> u64 {
        1500
    }
    pub fn input_wait() -> u64 {
        5000
    }
    pub fn input_settle() -> u64 {
        2000
    }
    pub fn enable_settle() -> u64 {
        3000
    }
    pub fn force_enable_settle() -> u64 {
        1000
    }
    pub fn search_settle() -> u64 {
        8000
    }
    pub fn load_more_settle() -> u64 {
        4000
    }
    pub fn final_settle() -> u64 {
        2000
    }
    pub fn poll_interval() -> u64 {
        250
    }

    // Retry defaults
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn retry_delay() -> u64 {
        5000
    }
    pub fn backoff_factor() -> f64 {
        1.0
    }

    // Pagination defaults
    pub fn max_clicks() -> usize {
        50
    }

    // Selector defaults
    pub fn location_tab() -> Locator {
        Locator::css(".tab-title").with_text("City, Suburb, or Postcode")
    }
    pub fn postcode_input() -> Locator {
        Locator::css(r#"input[name="postcode"]"#)
    }
    pub fn submit_button() -> Locator {
        Locator::css(r#"button[type="submit"].cta"#).with_text("Search")
    }
    pub fn submit_probes() -> Vec<Locator> {
        vec![
            Locator::css(r#"button[type="submit"].cta:has(img[alt*="arrow"])"#).with_text("Search"),
            Locator::css(r#"button.cta:has(img[src*="arrow-right"])"#).with_text("Search"),
            Locator::css(r#"button[type="submit"].cta:has(img[alt="arrow right icon"])"#),
            Locator::css(r#".form-group button[type="submit"].cta"#).with_text("Search"),
            Locator::css(r#"div.col-12 button[type="submit"].cta"#),
            Locator::css(r#"button[type="submit"].cta:not([disabled])"#),
        ]
    }
    pub fn load_more() -> Vec<Locator> {
        vec![
            Locator::css("button.btn-result, .btn-result"),
            Locator::css("button").with_text("load more"),
        ]
    }

    // Extraction defaults
    pub fn container_selectors() -> Vec<String> {
        strings(&[
            ".member-card",
            ".search-result",
            ".member-listing",
            "[data-member]",
            ".member",
            ".listing-item",
            ".result-item",
            ".card",
        ])
    }
    pub fn name_selectors() -> Vec<String> {
        strings(&[".name", ".member-name", "h3", "h2", "h4", ".title"])
    }
    pub fn company_selectors() -> Vec<String> {
        strings(&[".company", ".business", ".organization"])
    }
    pub fn phone_selectors() -> Vec<String> {
        strings(&[".phone", r#"a[href^="tel:"]"#])
    }
    pub fn address_selectors() -> Vec<String> {
        strings(&[".address", ".location"])
    }
    pub fn designation_selectors() -> Vec<String> {
        strings(&[".designation"])
    }
    pub fn website_selectors() -> Vec<String> {
        strings(&[r#"a[href*="http"]"#])
    }
    pub fn boilerplate() -> Vec<String> {
        strings(&["Skip to", "STEP", "Load More", "Toggle", "Filter", "Sort by"])
    }
    pub fn name_window() -> usize {
        8
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
}
