// src/driver/fake.rs

//! Scripted in-memory driver for workflow tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{ElementHandle, SearchDriver, WaitUntil};
use crate::error::{AppError, Result};
use crate::models::{Config, Locator};

/// A page element the fake knows about.
#[derive(Debug, Clone)]
pub struct FakeElement {
    selectors: Vec<String>,
    text: String,
    visible: bool,
    enabled: bool,
    disable_after: Option<usize>,
    fatal_on_click: bool,
    rerender_on_click: bool,
    detached: bool,
    clicks: usize,
}

impl FakeElement {
    pub fn new(css: &str, text: &str) -> Self {
        Self {
            selectors: vec![css.to_string()],
            text: text.to_string(),
            visible: true,
            enabled: true,
            disable_after: None,
            fatal_on_click: false,
            rerender_on_click: false,
            detached: false,
            clicks: 0,
        }
    }

    /// Answer to `locator` as well.
    pub fn also(mut self, locator: &Locator) -> Self {
        self.selectors.push(locator.css.clone());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Become disabled once clicked `n` times.
    pub fn disable_after(mut self, n: usize) -> Self {
        self.disable_after = Some(n);
        self
    }

    /// Lose the session when clicked.
    pub fn fatal_on_click(mut self) -> Self {
        self.fatal_on_click = true;
        self
    }

    /// Replace itself with a fresh node on every click, leaving the old
    /// handle detached.
    pub fn rerender_on_click(mut self) -> Self {
        self.rerender_on_click = true;
        self
    }

    fn answers_to(&self, locator: &Locator) -> bool {
        self.selectors.iter().any(|s| s == &locator.css) && locator.matches_text(&self.text)
    }

    fn matches(&self, locator: &Locator) -> bool {
        !self.detached && self.answers_to(locator)
    }
}

#[derive(Debug, Default)]
struct FakeState {
    elements: Vec<FakeElement>,
    title: String,
    url: String,
    html: String,
    text: String,
    failing_navigations: usize,
    script_error_navigations: usize,
    fatal_at_navigation: Option<usize>,
    navigations: usize,
    waited_ms: u64,
    filled: Vec<String>,
    scripts: Vec<String>,
    screenshots: Vec<PathBuf>,
}

/// Driver that serves a fixed page and records every interaction.
#[derive(Debug, Default)]
pub struct FakeDriver {
    state: Mutex<FakeState>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A search page whose form controls match the default selectors.
    pub fn search_page(config: &Config) -> Self {
        let selectors = &config.selectors;

        Self::new()
            .with_title("Find a Chartered Accountant | CA ANZ")
            .with_url(&config.site.search_url)
            .with_element(FakeElement::new(
                &selectors.location_tab.css,
                "City, Suburb, or Postcode",
            ))
            .with_element(FakeElement::new(&selectors.postcode_input.css, ""))
            .with_element(
                FakeElement::new(&selectors.submit_button.css, "Search")
                    .also(&selectors.submit_probes[0]),
            )
    }

    pub fn with_element(self, element: FakeElement) -> Self {
        self.lock().elements.push(element);
        self
    }

    pub fn with_title(self, title: &str) -> Self {
        self.lock().title = title.to_string();
        self
    }

    pub fn with_url(self, url: &str) -> Self {
        self.lock().url = url.to_string();
        self
    }

    pub fn with_html(self, html: &str) -> Self {
        self.lock().html = html.to_string();
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.lock().text = text.to_string();
        self
    }

    /// Fail the next `n` navigations with a retryable error.
    pub fn failing_navigations(self, n: usize) -> Self {
        self.lock().failing_navigations = n;
        self
    }

    /// Fail the next `n` navigations with a page script error, as when the
    /// document is replaced mid-load.
    pub fn script_errors_on_navigation(self, n: usize) -> Self {
        self.lock().script_error_navigations = n;
        self
    }

    /// Lose the session on the `n`th navigation (1-based).
    pub fn fatal_at_navigation(self, n: usize) -> Self {
        self.lock().fatal_at_navigation = Some(n);
        self
    }

    pub fn navigations(&self) -> usize {
        self.lock().navigations
    }

    pub fn clicks_on(&self, locator: &Locator) -> usize {
        self.lock()
            .elements
            .iter()
            .filter(|e| e.answers_to(locator))
            .map(|e| e.clicks)
            .sum()
    }

    pub fn filled(&self) -> Vec<String> {
        self.lock().filled.clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.lock().scripts.clone()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.lock().screenshots.clone()
    }

    pub fn waited_ms(&self) -> u64 {
        self.lock().waited_ms
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn with_handle<T>(&self, handle: ElementHandle, f: impl FnOnce(&mut FakeElement) -> T) -> Result<T> {
        let mut state = self.lock();
        state
            .elements
            .get_mut(handle.0 as usize)
            .map(f)
            .ok_or_else(|| AppError::element_not_found(format!("element {handle} detached")))
    }
}

#[async_trait]
impl SearchDriver for FakeDriver {
    async fn navigate(&self, url: &str, _wait: WaitUntil, _timeout: Duration) -> Result<()> {
        let mut state = self.lock();
        state.navigations += 1;
        if state.fatal_at_navigation == Some(state.navigations) {
            return Err(AppError::driver_fatal("browser disconnected"));
        }
        if state.failing_navigations > 0 {
            state.failing_navigations -= 1;
            return Err(AppError::navigation(url, "net::ERR_CONNECTION_RESET"));
        }
        if state.script_error_navigations > 0 {
            state.script_error_navigations -= 1;
            return Err(AppError::Script("Execution context was destroyed".into()));
        }
        state.url = url.to_string();
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.lock().title.clone())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.lock().url.clone())
    }

    async fn locate(&self, locator: &Locator) -> Result<Option<ElementHandle>> {
        Ok(self
            .lock()
            .elements
            .iter()
            .position(|e| e.matches(locator))
            .map(|i| ElementHandle(i as u64)))
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        Ok(self.lock().elements.iter().filter(|e| e.matches(locator)).count())
    }

    async fn fill(&self, handle: ElementHandle, text: &str) -> Result<()> {
        self.with_handle(handle, |_| ())?;
        self.lock().filled.push(text.to_string());
        Ok(())
    }

    async fn click(&self, handle: ElementHandle) -> Result<()> {
        let clicked = self.with_handle(handle, |e| {
            if e.fatal_on_click || e.detached {
                return Err(e.fatal_on_click);
            }
            e.clicks += 1;
            if e.disable_after.is_some_and(|n| e.clicks >= n) {
                e.enabled = false;
            }
            if e.rerender_on_click {
                let fresh = e.clone();
                e.detached = true;
                e.clicks = 0;
                return Ok(Some(fresh));
            }
            Ok(None)
        })?;
        match clicked {
            Ok(Some(fresh)) => {
                self.lock().elements.push(fresh);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(true) => Err(AppError::driver_fatal("target closed")),
            Err(false) => Err(AppError::element_not_found(format!("element {handle} detached"))),
        }
    }

    async fn is_visible(&self, handle: ElementHandle) -> Result<bool> {
        Ok(self.with_handle(handle, |e| e.visible && !e.detached).unwrap_or(false))
    }

    async fn is_enabled(&self, handle: ElementHandle) -> Result<bool> {
        Ok(self.with_handle(handle, |e| e.enabled && !e.detached).unwrap_or(false))
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        let mut state = self.lock();
        state.scripts.push(script.to_string());
        // Force-enable scripts flip every disabled element back on.
        if script.contains("disabled = false") {
            for element in state.elements.iter_mut() {
                element.enabled = true;
            }
        }
        Ok(Value::Null)
    }

    async fn content(&self) -> Result<String> {
        Ok(self.lock().html.clone())
    }

    async fn visible_text(&self) -> Result<String> {
        Ok(self.lock().text.clone())
    }

    async fn wait_ms(&self, ms: u64) {
        self.lock().waited_ms += ms;
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.lock().screenshots.push(path.to_path_buf());
        Ok(())
    }
}
