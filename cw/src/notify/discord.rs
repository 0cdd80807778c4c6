//! Discord webhook sink

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use super::{ChatSink, NotifyError};

/// Posts `{ "content": ... }` to a Discord webhook URL
pub struct DiscordWebhook {
    url: String,
    http: Client,
}

impl DiscordWebhook {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { url: url.into(), http })
    }
}

#[async_trait]
impl ChatSink for DiscordWebhook {
    async fn post(&self, content: &str) -> Result<(), NotifyError> {
        debug!(len = content.len(), "DiscordWebhook::post: called");
        let resp = self.http.post(&self.url).json(&json!({ "content": content })).send().await?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}
