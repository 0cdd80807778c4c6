//! commitwatch configuration types and loading

use chrono_tz::Tz;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::poller::PollerConfig;

/// Main commitwatch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Organization whose repositories are polled
    pub org: String,

    /// Chat webhook receiving the summaries
    #[serde(rename = "discordWebhook", alias = "discord-webhook")]
    pub discord_webhook: String,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Hosting platform access
    pub github: GithubConfig,

    /// Poll loop timing and fan-out limits
    pub poll: PollerConfig,

    /// Where the watermark and cycle output live
    pub storage: StorageConfig,

    /// Message rendering and delivery
    pub notify: NotifyConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks required keys, the token environment variable and numeric
    /// limits. Call this early in startup to fail fast with clear messages.
    pub fn validate(&self) -> Result<()> {
        if self.org.trim().is_empty() {
            return Err(eyre!("`org` is required"));
        }
        if self.discord_webhook.trim().is_empty() {
            return Err(eyre!("`discordWebhook` is required"));
        }
        if !self.discord_webhook.starts_with("http://") && !self.discord_webhook.starts_with("https://") {
            return Err(eyre!("`discordWebhook` must start with http:// or https://"));
        }

        self.github.token()?;
        self.poll.validate()?;
        self.notify.timezone()?;
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let mut candidates = vec![PathBuf::from("commitwatch.yml"), PathBuf::from("config.json")];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("commitwatch").join("commitwatch.yml"));
        }

        for candidate in candidates {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is set up
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        // YAML parsing also accepts JSON documents
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Hosting platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Environment variable containing the API token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Repository visibility filter for the organization listing
    pub visibility: String,

    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token_env: "GITHUB_TOKEN".to_string(),
            base_url: "https://api.github.com".to_string(),
            timeout_ms: 30_000,
            visibility: "public".to_string(),
            user_agent: "commitwatch".to_string(),
        }
    }
}

impl GithubConfig {
    /// Read the API token from the configured environment variable
    pub fn token(&self) -> Result<String> {
        match std::env::var(&self.token_env) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(eyre!(
                "GitHub token not found. Set the {} environment variable.",
                self.token_env
            )),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `last_checked.json` and `commits.json`
    #[serde(rename = "state-dir")]
    pub state_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/commitwatch on Linux)
        let state_dir = dirs::data_local_dir()
            .map(|d| d.join("commitwatch"))
            .unwrap_or_else(|| PathBuf::from(".commitwatch"))
            .to_string_lossy()
            .into_owned();

        Self { state_dir }
    }
}

impl StorageConfig {
    /// State directory with `~/` expanded
    pub fn state_dir(&self) -> PathBuf {
        match self.state_dir.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(&self.state_dir)),
            None => PathBuf::from(&self.state_dir),
        }
    }

    pub fn watermark_path(&self) -> PathBuf {
        self.state_dir().join("last_checked.json")
    }

    pub fn output_path(&self) -> PathBuf {
        self.state_dir().join("commits.json")
    }
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// IANA timezone commit times are rendered in
    #[serde(rename = "display-timezone")]
    pub display_timezone: String,

    /// Webhook request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            display_timezone: "UTC".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl NotifyConfig {
    pub fn timezone(&self) -> Result<Tz> {
        self.display_timezone
            .parse::<Tz>()
            .map_err(|e| eyre!("Unknown display-timezone '{}': {}", self.display_timezone, e))
    }
}
