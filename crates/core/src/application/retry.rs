// Retry logic for storage placement
use crate::error::{AppError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Default attempt limit (first try included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the second attempt (1000ms = 1s)
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;

/// Default upper bound for a single backoff delay (30s)
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after the given delay
    Retry(Duration),
    /// Do not retry, surface the error
    Failed,
}

/// Retry configuration (`[retry]` section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    /// Growth factor between consecutive delays (1.0 = fixed delay)
    pub multiplier: f64,
    pub max_delay_ms: u64,
    /// Relative jitter in `[0, 1)`; 0.1 scales each delay by 0.9..=1.1
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            multiplier: 1.0,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter: 0.0,
        }
    }
}

/// Bounded retry with exponential backoff and jitter.
///
/// Only errors classified as transient by [`AppError::is_transient`] are
/// retried; permanent errors fail on the first attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Errors
    /// `AppError::Config` if the configuration is out of range
    ///
    /// # Example
    /// ```text
    /// let policy = RetryPolicy::new(RetryConfig::default())?;
    /// ```
    pub fn new(config: RetryConfig) -> Result<Self> {
        if config.max_attempts == 0 {
            return Err(AppError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        // negated so NaN is rejected too
        if !(config.multiplier >= 1.0) {
            return Err(AppError::Config(format!(
                "retry.multiplier must be >= 1.0, got {}",
                config.multiplier
            )));
        }
        if !(0.0..1.0).contains(&config.jitter) {
            return Err(AppError::Config(format!(
                "retry.jitter must be in [0, 1), got {}",
                config.jitter
            )));
        }
        if config.max_delay_ms < config.initial_delay_ms {
            return Err(AppError::Config(format!(
                "retry.max_delay_ms ({}) is below retry.initial_delay_ms ({})",
                config.max_delay_ms, config.initial_delay_ms
            )));
        }

        Ok(Self { config })
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Backoff before the attempt following `attempt` (1-based), without jitter
    ///
    /// delay = initial_delay * multiplier ^ (attempt - 1), capped at max_delay
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let raw = self.config.initial_delay_ms as f64 * self.config.multiplier.powi(exponent);
        let capped = raw.min(self.config.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// Determine whether a failed attempt should be retried
    ///
    /// # Arguments
    /// * `attempt` - Number of the attempt that just failed (1-based)
    /// * `error` - The failure
    pub fn should_retry(&self, attempt: u32, error: &AppError) -> RetryDecision {
        if !error.is_transient() {
            return RetryDecision::Failed;
        }

        if attempt >= self.config.max_attempts {
            warn!(
                attempt = attempt,
                max_attempts = self.config.max_attempts,
                error = %error,
                "Max retry attempts reached"
            );
            return RetryDecision::Failed;
        }

        let base = self.backoff_delay(attempt);
        let delay = if self.config.jitter > 0.0 {
            let j = self.config.jitter;
            let factor = rand::thread_rng().gen_range(1.0 - j..=1.0 + j);
            Duration::from_millis((base.as_millis() as f64 * factor) as u64)
        } else {
            base
        };

        info!(
            attempt = attempt,
            max_attempts = self.config.max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Scheduling retry"
        );

        RetryDecision::Retry(delay)
    }
}
