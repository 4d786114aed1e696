// src/services/probe.rs

//! Ordered locator probing.

use std::time::Duration;

use tokio::time::Instant;

use crate::driver::{ElementHandle, SearchDriver};
use crate::error::{AppError, Result};
use crate::models::Locator;

/// Locators tried in order; the first one that satisfies the probe wins.
///
/// A probe that fails with a non-fatal driver error counts as a miss so the
/// next locator is still tried.
#[derive(Debug, Clone, Copy)]
pub struct ProbeChain<'a> {
    locators: &'a [Locator],
}

impl<'a> ProbeChain<'a> {
    pub fn new(locators: &'a [Locator]) -> Self {
        Self { locators }
    }

    /// First locator whose element is visible.
    pub async fn first_visible(
        &self,
        driver: &dyn SearchDriver,
    ) -> Result<Option<(ElementHandle, &'a Locator)>> {
        self.probe(driver, false).await
    }

    /// First locator whose element is visible and enabled.
    pub async fn first_actionable(
        &self,
        driver: &dyn SearchDriver,
    ) -> Result<Option<(ElementHandle, &'a Locator)>> {
        self.probe(driver, true).await
    }

    async fn probe(
        &self,
        driver: &dyn SearchDriver,
        require_enabled: bool,
    ) -> Result<Option<(ElementHandle, &'a Locator)>> {
        for locator in self.locators {
            match check(driver, locator, require_enabled).await {
                Ok(Some(handle)) => return Ok(Some((handle, locator))),
                Ok(None) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => log::debug!("Probe {} failed: {}", locator, e),
            }
        }
        Ok(None)
    }
}

async fn check(
    driver: &dyn SearchDriver,
    locator: &Locator,
    require_enabled: bool,
) -> Result<Option<ElementHandle>> {
    let Some(handle) = driver.locate(locator).await? else {
        return Ok(None);
    };
    if !driver.is_visible(handle).await? {
        return Ok(None);
    }
    if require_enabled && !driver.is_enabled(handle).await? {
        return Ok(None);
    }
    Ok(Some(handle))
}

/// Poll until `locator` resolves to a visible element or `timeout` passes.
pub async fn wait_for_visible(
    driver: &dyn SearchDriver,
    locator: &Locator,
    timeout: Duration,
    poll: Duration,
) -> Result<ElementHandle> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(handle) = check(driver, locator, false).await? {
            return Ok(handle);
        }
        if Instant::now() >= deadline {
            return Err(AppError::element_not_found(format!(
                "{} not visible within {}ms",
                locator,
                timeout.as_millis()
            )));
        }
        tokio::time::sleep(poll).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{FakeDriver, FakeElement};

    #[tokio::test]
    async fn test_first_visible_skips_hidden() {
        let chain = [Locator::css("button.a"), Locator::css("button.b"), Locator::css("button.c")];
        let driver = FakeDriver::new()
            .with_element(FakeElement::new("button.a", "A").hidden())
            .with_element(FakeElement::new("button.b", "B").disabled())
            .with_element(FakeElement::new("button.c", "C"));

        let probe = ProbeChain::new(&chain);
        let (_, visible) = probe.first_visible(&driver).await.unwrap().unwrap();
        assert_eq!(visible.css, "button.b");

        let (_, actionable) = probe.first_actionable(&driver).await.unwrap().unwrap();
        assert_eq!(actionable.css, "button.c");
    }

    #[tokio::test]
    async fn test_no_match() {
        let chain = [Locator::css("button").with_text("load more")];
        let driver = FakeDriver::new().with_element(FakeElement::new("button", "Search"));
        assert!(ProbeChain::new(&chain).first_visible(&driver).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_visible_times_out() {
        let driver = FakeDriver::new().with_element(FakeElement::new("input", "").hidden());
        let err = wait_for_visible(
            &driver,
            &Locator::css("input"),
            Duration::from_millis(5000),
            Duration::from_millis(250),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ElementNotFound(_)));
    }
}
