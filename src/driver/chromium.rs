// src/driver/chromium.rs

//! Chromium session over the DevTools protocol.
//!
//! Element handles are implemented by tagging located elements with a
//! `data-fc-handle` attribute, so every handle operation is a small in-page
//! script addressed by that attribute.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;

use super::{ElementHandle, SearchDriver, WaitUntil, js_string};
use crate::error::{AppError, Result};
use crate::models::{BrowserSettings, Locator};

const HANDLE_ATTR: &str = "data-fc-handle";
const READY_POLL_MS: u64 = 100;
/// chromiumoxide's own per-request default.
const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Browser process plus the single page the scraper drives.
pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumDriver {
    /// Launch a browser and open a blank page.
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(settings.viewport_width, settings.viewport_height)
            .viewport(Viewport {
                width: settings.viewport_width,
                height: settings.viewport_height,
                ..Viewport::default()
            })
            .request_timeout(request_timeout(settings))
            .arg(format!("--user-agent={}", settings.user_agent));
        if !settings.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(AppError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::Browser(e.to_string()))?;

        // Drain protocol events; the page stops responding without this.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| AppError::Browser(e.to_string()))?;

        log::info!(
            "Browser launched ({}, {}x{})",
            if settings.headless { "headless" } else { "headed" },
            settings.viewport_width,
            settings.viewport_height
        );

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Close the browser and stop the event loop.
    pub async fn close(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .map_err(|e| AppError::Browser(e.to_string()))?;
        self.handler.abort();
        Ok(())
    }

    async fn run(&self, script: String) -> Result<Value> {
        let result = self.page.evaluate(script).await.map_err(map_cdp)?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn ready_state(&self) -> Result<String> {
        Ok(self
            .run("document.readyState".to_string())
            .await?
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    async fn wait_for_ready(&self, wait: WaitUntil) -> Result<()> {
        loop {
            let state = self.ready_state().await?;
            let done = match wait {
                WaitUntil::DomContentLoaded => state == "interactive" || state == "complete",
                WaitUntil::Load => state == "complete",
            };
            if done {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(READY_POLL_MS)).await;
        }
    }
}

/// Protocol request timeout. A `goto` must be allowed the whole navigation budget.
fn request_timeout(settings: &BrowserSettings) -> Duration {
    Duration::from_millis(settings.navigation_timeout_ms).max(MIN_REQUEST_TIMEOUT)
}

/// Connection-level failures leave the session unusable.
fn map_cdp(err: CdpError) -> AppError {
    match err {
        CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse => {
            AppError::driver_fatal(err)
        }
        CdpError::Timeout => AppError::Timeout(err.to_string()),
        CdpError::NotFound => AppError::element_not_found(err.to_string()),
        other => AppError::Script(other.to_string()),
    }
}

fn handle_selector(handle: ElementHandle) -> String {
    format!("[{HANDLE_ATTR}=\"{}\"]", handle.0)
}

fn matching_elements_js(locator: &Locator) -> String {
    let text = match &locator.has_text {
        Some(t) => js_string(&t.to_lowercase()),
        None => "null".to_string(),
    };
    format!(
        "Array.from(document.querySelectorAll({css})).filter(el => {text} === null || \
         (el.textContent || '').toLowerCase().includes({text}))",
        css = js_string(&locator.css),
    )
}

fn locate_js(locator: &Locator) -> String {
    format!(
        r#"(() => {{
    const el = {matches}[0];
    if (!el) return null;
    if (!el.hasAttribute('{HANDLE_ATTR}')) {{
        window.__fcHandles = (window.__fcHandles || 0) + 1;
        el.setAttribute('{HANDLE_ATTR}', String(window.__fcHandles));
    }}
    return Number(el.getAttribute('{HANDLE_ATTR}'));
}})()"#,
        matches = matching_elements_js(locator),
    )
}

fn with_element_js(handle: ElementHandle, body: &str, missing: &str) -> String {
    format!(
        r#"(() => {{
    const el = document.querySelector({sel});
    if (!el) return {missing};
    {body}
}})()"#,
        sel = js_string(&handle_selector(handle)),
    )
}

const VISIBLE_BODY: &str = r#"const style = window.getComputedStyle(el);
    if (style.visibility === 'hidden' || style.display === 'none') return false;
    return el.getClientRects().length > 0 && (el.offsetWidth > 0 || el.offsetHeight > 0);"#;

const ENABLED_BODY: &str =
    r#"return !el.disabled && el.getAttribute('aria-disabled') !== 'true';"#;

fn fill_body(text: &str) -> String {
    format!(
        r#"el.focus();
    const proto = Object.getPrototypeOf(el);
    const desc = Object.getOwnPropertyDescriptor(proto, 'value');
    const set = v => desc && desc.set ? desc.set.call(el, v) : (el.value = v);
    set('');
    set({value});
    for (const type of ['input', 'change', 'keyup']) {{
        el.dispatchEvent(new Event(type, {{ bubbles: true }}));
    }}
    return true;"#,
        value = js_string(text),
    )
}

#[async_trait]
impl SearchDriver for ChromiumDriver {
    async fn navigate(&self, url: &str, wait: WaitUntil, timeout: Duration) -> Result<()> {
        let load = async {
            self.page.goto(url).await.map_err(map_cdp)?;
            self.wait_for_ready(wait).await
        };

        // A script failing while the document swaps is part of loading.
        match tokio::time::timeout(timeout, load).await {
            Ok(result) => result.map_err(|e| e.during_navigation(url)),
            Err(_) => Err(AppError::navigation(
                url,
                format!("timed out after {}ms", timeout.as_millis()),
            )),
        }
    }

    async fn title(&self) -> Result<String> {
        Ok(self.page.get_title().await.map_err(map_cdp)?.unwrap_or_default())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await.map_err(map_cdp)?.unwrap_or_default())
    }

    async fn locate(&self, locator: &Locator) -> Result<Option<ElementHandle>> {
        let value = self.run(locate_js(locator)).await?;
        Ok(value.as_u64().map(ElementHandle))
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        let value = self
            .run(format!("{}.length", matching_elements_js(locator)))
            .await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn fill(&self, handle: ElementHandle, text: &str) -> Result<()> {
        let filled = self
            .run(with_element_js(handle, &fill_body(text), "false"))
            .await?;
        if filled.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(AppError::element_not_found(format!("element {handle} detached")))
        }
    }

    async fn click(&self, handle: ElementHandle) -> Result<()> {
        let element = self
            .page
            .find_element(handle_selector(handle))
            .await
            .map_err(|e| match map_cdp(e) {
                fatal if fatal.is_fatal() => fatal,
                _ => AppError::element_not_found(format!("element {handle} detached")),
            })?;
        element.click().await.map_err(map_cdp)?;
        Ok(())
    }

    async fn is_visible(&self, handle: ElementHandle) -> Result<bool> {
        let value = self
            .run(with_element_js(handle, VISIBLE_BODY, "false"))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_enabled(&self, handle: ElementHandle) -> Result<bool> {
        let value = self
            .run(with_element_js(handle, ENABLED_BODY, "false"))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        self.run(script.to_string()).await
    }

    async fn content(&self) -> Result<String> {
        self.page.content().await.map_err(map_cdp)
    }

    async fn visible_text(&self) -> Result<String> {
        let value = self
            .run("document.body ? document.body.innerText : ''".to_string())
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let params = ScreenshotParams::builder().full_page(true).build();
        self.page
            .save_screenshot(params, path)
            .await
            .map_err(map_cdp)?;
        Ok(())
    }
}
