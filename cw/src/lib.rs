//! commitwatch - organization commit notifier
//!
//! Polls a hosting platform for commits pushed to any branch of any
//! repository in an organization since the last check, and posts one
//! summary per branch to a chat webhook.
//!
//! # Modules
//!
//! - [`poller`] - Watermark cut-off listing, fan-out fetching and the poll loop
//! - [`github`] - Platform client trait and GitHub REST implementation
//! - [`notify`] - Message formatting and webhook delivery
//! - [`state`] - Watermark and cycle output persistence
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod github;
pub mod notify;
pub mod poller;
pub mod state;

// Re-export commonly used types
pub use config::{Config, GithubConfig, NotifyConfig, StorageConfig};
pub use domain::{Branch, BranchCommits, Commit, CycleReport, RepoCommits, Repository};
pub use github::{GitHost, GitHostError, GithubClient};
pub use notify::{ChatSink, DiscordWebhook, Notifier, NotifyError, format_message};
pub use poller::{Poller, PollerConfig, TickOutcome, list_active_repositories};
pub use state::{FileStateStore, StateStore};
