//! Configuration for the explore services
//!
//! Defines the listing page size, the per-request deadline and the retry
//! policy for store operations.

use crate::ExploreError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest accepted page size
pub const MAX_PAGE_SIZE: usize = 1000;

/// Largest accepted retry attempt cap
pub const MAX_ATTEMPTS: u32 = 10;

/// Configuration for the explore services
///
/// Page size is process-wide; callers cannot change it per request.
///
/// # Examples
///
/// ```
/// use cupid_explore::ExploreConfig;
///
/// let config = ExploreConfig::default();
/// assert_eq!(config.page_size, 10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreConfig {
    /// Number of actors returned per listing page
    /// Default: 10
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Deadline for one request, including retries (in milliseconds)
    /// Default: 5000
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Retry policy for conflicting or unavailable store operations
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_page_size() -> usize {
    10
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            request_timeout_ms: default_request_timeout_ms(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ExploreConfig {
    /// Set the page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the request deadline
    pub fn with_request_timeout_ms(mut self, request_timeout_ms: u64) -> Self {
        self.request_timeout_ms = request_timeout_ms;
        self
    }

    /// Get the request deadline as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ExploreError> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ExploreError::Config(format!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(ExploreError::Config(
                "request_timeout_ms must be positive".to_string(),
            ));
        }
        self.retry.validate()
    }
}

/// Bounded retry with exponential backoff
///
/// Attempt `n` (1-based) that fails retryably is followed by a pause of
/// `min(base_delay * 2^(n-1), max_delay)` before attempt `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    /// Default: 3
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause after the first failed attempt (in milliseconds)
    /// Default: 10
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on any single pause (in milliseconds)
    /// Default: 200
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    10
}

fn default_max_delay_ms() -> u64 {
    200
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Policy with the given attempt cap and backoff bounds
    pub fn new(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
            max_delay_ms,
        }
    }

    /// Run every operation exactly once
    pub fn no_retry() -> Self {
        Self::new(1, 0, 0)
    }

    /// Pause after failed attempt `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u64
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ExploreError> {
        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS {
            return Err(ExploreError::Config(format!(
                "retry.max_attempts must be between 1 and {}, got {}",
                MAX_ATTEMPTS, self.max_attempts
            )));
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(ExploreError::Config(format!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.base_delay_ms, self.max_delay_ms
            )));
        }
        Ok(())
    }
}
