//! Retry logic.
//!
//! # Responsibilities
//! - Classify call outcomes as success, transient, or permanent
//! - Compute the delay before each retry
//!
//! # Design Decisions
//! - Connection errors always transient; 5xx and 408 transient
//! - Extra statuses can be opted in through config
//! - 404 means "not found", never "try again", unless configured

use std::time::Duration;

use reqwest::StatusCode;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;

/// How the resilience layer should treat one call outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Upstream answered as expected.
    Success,
    /// Worth retrying, and counts against the circuit breaker.
    Transient,
    /// Upstream is alive but said no; surfaced without retry.
    Permanent,
}

/// Retry schedule and transient-status classification.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    extra_transient_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            extra_transient_statuses: Vec::new(),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        if config.extra_transient_statuses.contains(&404) {
            tracing::warn!("404 is configured as transient; missing products will be retried");
        }
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            extra_transient_statuses: config.extra_transient_statuses.clone(),
        }
    }

    /// Treat `status` as transient in addition to the defaults.
    pub fn with_transient_status(mut self, status: u16) -> Self {
        self.extra_transient_statuses.push(status);
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        calculate_backoff(retry, self.base_delay)
    }

    pub fn is_transient_status(&self, status: StatusCode) -> bool {
        status.is_server_error()
            || status == StatusCode::REQUEST_TIMEOUT
            || self.extra_transient_statuses.contains(&status.as_u16())
    }

    /// Classify one HTTP exchange by its status, or as transient when it
    /// failed in transport (connect, timeout, or a body cut short).
    pub fn classify_outcome<E>(&self, outcome: Result<StatusCode, E>) -> Verdict {
        match outcome {
            Ok(status) => self.classify_status(status),
            Err(_) => Verdict::Transient,
        }
    }

    pub fn classify_status(&self, status: StatusCode) -> Verdict {
        if status.is_success() {
            Verdict::Success
        } else if self.is_transient_status(status) {
            Verdict::Transient
        } else {
            Verdict::Permanent
        }
    }
}
