//! Rate-limit guard around single page requests
//!
//! Rate-limited responses are retried with exponential backoff up to a
//! fixed budget; every other failure aborts the run.

use std::thread::sleep;
use std::time::Duration;

use chrono::Utc;

use crate::github::HttpResponse;
use crate::types::{Result, TrendsError};

/// First backoff after a rate-limit response
pub const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(5);

/// Ceiling for the exponential backoff
pub const DEFAULT_RATE_LIMIT_MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Ceiling for a wait requested by the server (`Retry-After`, quota reset)
pub const DEFAULT_RATE_LIMIT_MAX_WAIT: Duration = Duration::from_secs(3600);

/// Retries per page before giving up
pub const DEFAULT_MAX_RATE_LIMIT_RETRIES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_wait: Duration,
    pub max_retries: u32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: DEFAULT_RATE_LIMIT_BACKOFF,
            max_backoff: DEFAULT_RATE_LIMIT_MAX_BACKOFF,
            max_wait: DEFAULT_RATE_LIMIT_MAX_WAIT,
            max_retries: DEFAULT_MAX_RATE_LIMIT_RETRIES,
        }
    }
}

impl RateLimitPolicy {
    /// Delay before retry number `attempt` (0-based).
    ///
    /// A server-requested wait wins over the exponential schedule but never
    /// exceeds `max_wait`.
    pub fn delay(&self, attempt: u32, server_wait: Option<Duration>) -> Duration {
        if let Some(wait) = server_wait {
            return wait.min(self.max_wait);
        }
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |d| d.min(self.max_backoff))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimitGuard {
    policy: RateLimitPolicy,
}

impl RateLimitGuard {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self { policy }
    }

    /// Run `send` until it yields a success, retrying rate-limit responses.
    ///
    /// `query` and `page` only label errors and log lines.
    pub fn execute<F>(&self, query: &str, page: u32, mut send: F) -> Result<HttpResponse>
    where
        F: FnMut() -> Result<HttpResponse>,
    {
        let mut attempt = 0u32;
        loop {
            let response = send()?;

            if response.is_success() {
                return Ok(response);
            }

            if !response.is_rate_limited() {
                return Err(TrendsError::RemoteApi {
                    status: response.status,
                    query: query.to_string(),
                    page,
                    body: response.body,
                });
            }

            if attempt >= self.policy.max_retries {
                return Err(TrendsError::RateLimitExhausted {
                    query: query.to_string(),
                    page,
                    retries: attempt,
                });
            }

            let delay = self
                .policy
                .delay(attempt, response.server_wait(Utc::now().timestamp()));
            log::warn!(
                "Rate limited (HTTP {}) on page {}; retry {} of {} in {:.1}s",
                response.status,
                page,
                attempt + 1,
                self.policy.max_retries,
                delay.as_secs_f64()
            );
            sleep(delay);
            attempt += 1;
        }
    }
}
