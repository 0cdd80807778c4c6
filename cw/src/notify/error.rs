//! Notification error types

use thiserror::Error;

/// Errors delivering a message to the chat sink
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Webhook rejected message with {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
