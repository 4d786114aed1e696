// src/services/search.rs

//! One postcode search, from loading the search page to extracted records.
//!
//! A unit moves through [`UnitStage`]s in order. Any non-fatal error ends the
//! unit as a failed [`SearchResult`]; fatal session errors are returned to the
//! caller so the run can stop.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::Region;
use crate::driver::{SearchDriver, WaitUntil, js_string};
use crate::error::{AppError, Result};
use crate::models::{Config, Locator, MemberRecord, SearchResult};
use crate::services::extraction::ExtractionEngine;
use crate::services::probe::{ProbeChain, wait_for_visible};
use crate::services::retry::RetryPolicy;

const FORM_FILL_SCREENSHOT: &str = "error-form-fill.png";
const BUTTON_MISSING_SCREENSHOT: &str = "search-button-not-found.png";
const BUTTON_DISABLED_SCREENSHOT: &str = "disabled-search-button.png";

/// Where a unit is in its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStage {
    Idle,
    Navigating,
    FormFilling,
    Searching,
    Paginating,
    Extracting,
    Recording,
}

impl fmt::Display for UnitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitStage::Idle => "idle",
            UnitStage::Navigating => "navigating",
            UnitStage::FormFilling => "form filling",
            UnitStage::Searching => "searching",
            UnitStage::Paginating => "paginating",
            UnitStage::Extracting => "extracting",
            UnitStage::Recording => "recording",
        };
        f.write_str(name)
    }
}

enum LoadMore {
    Absent,
    Clicked,
    ClickedLast,
}

/// Runs the search workflow for one unit at a time against a shared session.
pub struct SearchWorkflow<'a> {
    driver: &'a dyn SearchDriver,
    config: &'a Config,
    engine: ExtractionEngine,
    retry: RetryPolicy,
    screenshot_dir: PathBuf,
}

impl<'a> SearchWorkflow<'a> {
    /// Build a workflow. Fails if an extraction selector does not parse.
    pub fn new(
        driver: &'a dyn SearchDriver,
        config: &'a Config,
        screenshot_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            driver,
            config,
            engine: ExtractionEngine::new(&config.extraction)?,
            retry: RetryPolicy::with_config(config.retry.clone()),
            screenshot_dir: screenshot_dir.into(),
        })
    }

    /// Search one postcode.
    ///
    /// Unit-level failures come back as a failed result; only fatal session
    /// errors are returned as `Err`.
    pub async fn process_unit(&self, postcode: &str, region: Option<Region>) -> Result<SearchResult> {
        let mut stage = UnitStage::Idle;

        match self.run_stages(postcode, &mut stage).await {
            Ok(members) => {
                log::info!("[{postcode}] {} members", members.len());
                Ok(SearchResult::success(postcode, region, members))
            }
            Err(e) if e.is_fatal() => {
                log::error!("[{postcode}] Session lost while {stage}: {e}");
                Err(e)
            }
            Err(e) => {
                log::warn!("[{postcode}] Failed while {stage}: {e}");
                Ok(SearchResult::failed(postcode, region, e))
            }
        }
    }

    async fn run_stages(&self, postcode: &str, stage: &mut UnitStage) -> Result<Vec<MemberRecord>> {
        *stage = UnitStage::Navigating;
        self.navigate().await?;

        *stage = UnitStage::FormFilling;
        self.fill_form(postcode).await?;

        *stage = UnitStage::Searching;
        self.submit_search().await?;

        *stage = UnitStage::Paginating;
        self.paginate().await?;

        *stage = UnitStage::Extracting;
        let members = self.extract().await?;

        *stage = UnitStage::Recording;
        Ok(members)
    }

    /// Load the search page and let its client app initialize.
    async fn navigate(&self) -> Result<()> {
        let site = &self.config.site;
        let url = site.search_url.as_str();
        let timeout = Duration::from_millis(self.config.browser.navigation_timeout_ms);
        let settle = self.config.timing.page_settle_ms;

        self.retry
            .run("Navigation", |attempt| async move {
                log::debug!("Loading {url} (attempt {attempt})");
                self.driver
                    .navigate(url, WaitUntil::DomContentLoaded, timeout)
                    .await
                    .map_err(|e| e.during_navigation(url))?;
                self.driver.wait_ms(settle).await;

                let title = self
                    .driver
                    .title()
                    .await
                    .map_err(|e| e.during_navigation(url))?;
                if site.title_markers.iter().any(|m| title.contains(m.as_str())) {
                    log::debug!("On search page: {title}");
                } else {
                    log::warn!("Unexpected page title '{title}', continuing");
                }
                Ok(())
            })
            .await
    }

    async fn fill_form(&self, postcode: &str) -> Result<()> {
        let result = self.try_fill_form(postcode).await;
        if let Err(e) = &result {
            if !e.is_fatal() {
                self.capture(FORM_FILL_SCREENSHOT).await;
                if let (Ok(url), Ok(title)) = (self.driver.current_url().await, self.driver.title().await) {
                    log::debug!("Form fill failed on {url} ({title})");
                }
            }
        }
        result
    }

    async fn try_fill_form(&self, postcode: &str) -> Result<()> {
        let selectors = &self.config.selectors;
        let timing = &self.config.timing;

        let tab = self
            .driver
            .locate(&selectors.location_tab)
            .await?
            .ok_or_else(|| AppError::element_not_found(format!("location tab {}", selectors.location_tab)))?;
        if !self.driver.is_visible(tab).await? {
            return Err(AppError::element_not_found(format!(
                "location tab {} not visible",
                selectors.location_tab
            )));
        }
        self.driver.click(tab).await?;
        self.driver.wait_ms(timing.tab_settle_ms).await;

        let input = wait_for_visible(
            self.driver,
            &selectors.postcode_input,
            Duration::from_millis(timing.input_wait_ms),
            Duration::from_millis(timing.poll_interval_ms),
        )
        .await?;
        self.driver.fill(input, postcode).await?;
        self.driver.wait_ms(timing.input_settle_ms).await;

        if !self.submit_enabled().await? {
            log::warn!("Search button disabled after input, waiting");
            self.driver.wait_ms(timing.enable_settle_ms).await;
            if !self.submit_enabled().await? {
                self.force_enable(&selectors.submit_button).await?;
            }
        }
        Ok(())
    }

    async fn submit_enabled(&self) -> Result<bool> {
        let result = async {
            match self.driver.locate(&self.config.selectors.submit_button).await? {
                Some(handle) => self.driver.is_enabled(handle).await,
                None => Ok(false),
            }
        }
        .await;
        soft(result)
    }

    /// Clear the disabled state on the submit button in-page. The site keeps
    /// the button disabled until its own state catches up with the input,
    /// which does not always happen for programmatic edits.
    async fn force_enable(&self, button: &Locator) -> Result<()> {
        log::warn!("Forcing {button} enabled");
        let text = match &button.has_text {
            Some(t) => js_string(t),
            None => "null".to_string(),
        };
        let script = format!(
            r#"(() => {{
    let n = 0;
    document.querySelectorAll({css}).forEach(btn => {{
        if ({text} === null || btn.textContent.includes({text})) {{
            btn.disabled = false;
            btn.style.backgroundColor = '';
            btn.style.cursor = '';
            n++;
        }}
    }});
    return n;
}})()"#,
            css = js_string(&button.css),
        );
        self.driver.evaluate(&script).await?;
        Ok(())
    }

    async fn submit_search(&self) -> Result<()> {
        let selectors = &self.config.selectors;
        let timing = &self.config.timing;

        let Some((button, locator)) = ProbeChain::new(&selectors.submit_probes)
            .first_visible(self.driver)
            .await?
        else {
            self.capture(BUTTON_MISSING_SCREENSHOT).await;
            return Err(AppError::element_not_found("search submit button"));
        };
        log::debug!("Submit button found with {locator}");

        if !soft(self.driver.is_enabled(button).await)? {
            self.capture(BUTTON_DISABLED_SCREENSHOT).await;
            self.force_enable(&selectors.submit_button).await?;
            self.driver.wait_ms(timing.force_enable_settle_ms).await;
        }

        self.driver.click(button).await?;
        self.driver.wait_ms(timing.search_settle_ms).await;

        let url = self.driver.current_url().await?;
        let containers = Locator::css(self.config.extraction.container_selectors.join(", "));
        let on_results = self
            .config
            .site
            .results_url_markers
            .iter()
            .any(|m| url.contains(m.as_str()));
        if on_results || soft(self.driver.count(&containers).await.map(|n| n > 0))? {
            log::debug!("Search results loaded ({url})");
        } else {
            log::debug!("Search submitted, results unclear ({url})");
        }
        Ok(())
    }

    /// Click load-more until it disappears or the click cap is reached.
    async fn paginate(&self) -> Result<usize> {
        let chain = ProbeChain::new(&self.config.selectors.load_more);
        let max_clicks = self.config.pagination.max_clicks;
        let mut clicks = 0;

        while clicks < max_clicks {
            match self.load_more(&chain).await {
                Ok(LoadMore::Absent) => break,
                Ok(LoadMore::Clicked) => clicks += 1,
                Ok(LoadMore::ClickedLast) => {
                    clicks += 1;
                    break;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log::warn!("Load more stopped: {e}");
                    break;
                }
            }
        }

        if clicks >= max_clicks {
            log::warn!("Load more cap of {max_clicks} clicks reached");
        }
        log::debug!("Load more clicked {clicks} times");
        self.driver.wait_ms(self.config.timing.final_settle_ms).await;
        Ok(clicks)
    }

    async fn load_more(&self, chain: &ProbeChain<'_>) -> Result<LoadMore> {
        let Some((button, _)) = chain.first_actionable(self.driver).await? else {
            return Ok(LoadMore::Absent);
        };

        self.driver.click(button).await?;
        self.driver.wait_ms(self.config.timing.load_more_settle_ms).await;

        // The list re-renders after a click, so the old handle may be stale.
        match chain.first_actionable(self.driver).await? {
            Some(_) => Ok(LoadMore::Clicked),
            None => Ok(LoadMore::ClickedLast),
        }
    }

    async fn extract(&self) -> Result<Vec<MemberRecord>> {
        let html = self.driver.content().await?;
        let text = self.driver.visible_text().await?;
        let url = self.driver.current_url().await?;

        let extraction = self.engine.extract(&html, &text, &url);
        log::debug!("{} members via {:?}", extraction.members.len(), extraction.tier);
        Ok(extraction.members)
    }

    /// Best-effort diagnostic screenshot.
    async fn capture(&self, name: &str) {
        let path = self.screenshot_dir.join(name);
        if let Err(e) = self.try_capture(&path).await {
            log::warn!("Could not save screenshot {}: {}", path.display(), e);
        } else {
            log::info!("Screenshot saved to {}", path.display());
        }
    }

    async fn try_capture(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        self.driver.screenshot(path).await
    }
}

/// Treat non-fatal probe failures as a negative answer.
fn soft(result: Result<bool>) -> Result<bool> {
    match result {
        Ok(v) => Ok(v),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            log::debug!("Probe failed: {e}");
            Ok(false)
        }
    }
}
