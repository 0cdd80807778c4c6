//! Incremental poller
//!
//! Lists repositories pushed since the watermark, fetches each branch's new
//! commits, notifies per branch and advances the watermark once the cycle
//! settles.

mod config;
mod core;
mod fetch;
mod listing;

pub use config::PollerConfig;
pub use self::core::{Poller, TickOutcome};
pub use fetch::{Fetcher, RepoOutcome};
pub use listing::{list_active_repositories, trim_stale_tail};
