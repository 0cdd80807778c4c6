//! Commit notifications
//!
//! Delivery is best-effort: one attempt per non-empty batch, failures are
//! logged and dropped. Nothing is queued or retried, so callers must not
//! treat a cycle as proof that every batch reached the chat.

mod discord;
mod error;
mod format;

use std::sync::Arc;

use async_trait::async_trait;
use chrono_tz::Tz;
use tracing::{error, info};

pub use discord::DiscordWebhook;
pub use error::NotifyError;
pub use format::{DIVIDER, format_message};

use crate::domain::Commit;

/// Outbound chat destination
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Deliver one message; a single attempt
    async fn post(&self, content: &str) -> Result<(), NotifyError>;
}

/// Formats commit batches and hands them to a [`ChatSink`]
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn ChatSink>,
    tz: Tz,
}

impl Notifier {
    pub fn new(sink: Arc<dyn ChatSink>, tz: Tz) -> Self {
        Self { sink, tz }
    }

    /// Send one message for `commits` on `branch`
    ///
    /// Returns whether the sink accepted it. Errors never leave this call.
    pub async fn holler(&self, repo: &str, branch: &str, commits: &[Commit]) -> bool {
        let content = format_message(repo, branch, commits, &self.tz);

        match self.sink.post(&content).await {
            Ok(()) => {
                info!(%repo, %branch, commits = commits.len(), "Notification sent");
                true
            }
            Err(e) => {
                error!(%repo, %branch, error = %e, "Notification failed, dropping");
                false
            }
        }
    }
}
