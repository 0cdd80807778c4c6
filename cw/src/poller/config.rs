//! Poller configuration

use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Largest page size the platform accepts
const MAX_PAGE_SIZE: u32 = 100;

/// One year
const MAX_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

/// Ten years
const MAX_INITIAL_LOOKBACK_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Configuration for the Poller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Seconds between timer ticks
    #[serde(rename = "interval-secs", default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Repositories requested per listing page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Upper bound on platform requests in flight during a cycle
    #[serde(rename = "max-concurrent-requests", default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Lookback used when no watermark has been stored yet
    #[serde(rename = "initial-lookback-secs", default = "default_initial_lookback_secs")]
    pub initial_lookback_secs: u64,
}

fn default_interval_secs() -> u64 {
    60
}

fn default_page_size() -> u32 {
    10
}

fn default_max_concurrent_requests() -> usize {
    8
}

fn default_initial_lookback_secs() -> u64 {
    3600
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            page_size: default_page_size(),
            max_concurrent_requests: default_max_concurrent_requests(),
            initial_lookback_secs: default_initial_lookback_secs(),
        }
    }
}

impl PollerConfig {
    /// Get the poll interval as a Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Get the first-cycle lookback as a chrono Duration
    pub fn initial_lookback(&self) -> Result<chrono::Duration> {
        i64::try_from(self.initial_lookback_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| eyre!("poll.initial-lookback-secs out of range: {}", self.initial_lookback_secs))
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 || self.interval_secs > MAX_INTERVAL_SECS {
            return Err(eyre!("poll.interval-secs must be between 1 and {}", MAX_INTERVAL_SECS));
        }
        if self.initial_lookback_secs > MAX_INITIAL_LOOKBACK_SECS {
            return Err(eyre!(
                "poll.initial-lookback-secs must be at most {}",
                MAX_INITIAL_LOOKBACK_SECS
            ));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(eyre!("poll.page-size must be between 1 and {}", MAX_PAGE_SIZE));
        }
        if self.max_concurrent_requests == 0 {
            return Err(eyre!("poll.max-concurrent-requests must be at least 1"));
        }
        Ok(())
    }
}
