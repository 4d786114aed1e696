// src/services/retry.rs

//! Bounded retry for transient failures.
//!
//! Only errors classified as retryable are attempted again. Anything else,
//! fatal session errors included, is returned on first occurrence.

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::RetryConfig;

/// Retry policy shared by every retried operation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a policy with default configuration.
    pub fn new() -> Self {
        Self::with_config(RetryConfig::default())
    }

    /// Create a policy with custom configuration.
    pub fn with_config(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts.max(1)
    }

    /// Pause before attempt `attempt + 1`, given `attempt` failures so far.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self
            .config
            .backoff_factor
            .max(1.0)
            .powi(attempt.saturating_sub(1) as i32);
        Duration::from_millis((self.config.delay_ms as f64 * factor) as u64)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt bound is reached. `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max = self.max_attempts();
        let mut attempt = 1;

        loop {
            log::debug!("{operation} attempt {attempt}/{max}");
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= max => {
                    log::error!("{operation}: all {max} attempts failed");
                    return Err(AppError::RetriesExhausted {
                        operation: operation.to_string(),
                        attempts: max,
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    let delay = self.delay_after(attempt);
                    log::warn!(
                        "{operation} attempt {attempt} failed: {e}. Retrying in {}ms",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}
