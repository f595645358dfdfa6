//! Exchange Configuration
//!
//! Connection tunables for the shuffle, with environment variable overrides.

use std::time::Duration;

use crate::error::{Result, SortError};
use crate::exchange::sender::RetryPolicy;

pub const ENV_CONNECT_TIMEOUT_MS: &str = "NETSORT_CONNECT_TIMEOUT_MS";
pub const ENV_RETRY_DELAY_MS: &str = "NETSORT_RETRY_DELAY_MS";
pub const ENV_MAX_CONNECT_ATTEMPTS: &str = "NETSORT_MAX_CONNECT_ATTEMPTS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Bound on a single dial attempt (env: NETSORT_CONNECT_TIMEOUT_MS)
    pub connect_timeout: Duration,

    /// Pause between dial attempts (env: NETSORT_RETRY_DELAY_MS)
    pub retry_delay: Duration,

    /// Dial attempts per peer before the run aborts, unbounded when unset
    /// (env: NETSORT_MAX_CONNECT_ATTEMPTS)
    pub max_connect_attempts: Option<u32>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            connect_timeout: retry.connect_timeout,
            retry_delay: retry.retry_delay,
            max_connect_attempts: retry.max_attempts,
        }
    }
}

impl ExchangeConfig {
    /// Create configuration from environment variables with defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = lookup(ENV_CONNECT_TIMEOUT_MS) {
            config.connect_timeout = Duration::from_millis(parse_var(ENV_CONNECT_TIMEOUT_MS, &ms)?);
        }

        if let Some(ms) = lookup(ENV_RETRY_DELAY_MS) {
            config.retry_delay = Duration::from_millis(parse_var(ENV_RETRY_DELAY_MS, &ms)?);
        }

        if let Some(attempts) = lookup(ENV_MAX_CONNECT_ATTEMPTS) {
            let attempts: u32 = parse_var(ENV_MAX_CONNECT_ATTEMPTS, &attempts)?;
            // 0 keeps retrying forever
            config.max_connect_attempts = (attempts > 0).then_some(attempts);
        }

        if config.connect_timeout.is_zero() {
            return Err(SortError::Config(format!(
                "{} must be greater than zero",
                ENV_CONNECT_TIMEOUT_MS
            )));
        }

        Ok(config)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            connect_timeout: self.connect_timeout,
            retry_delay: self.retry_delay,
            max_attempts: self.max_connect_attempts,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SortError::Config(format!("{} has an invalid value {:?}", key, value)))
}
