//! Platform error types

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur talking to the hosting platform
#[derive(Debug, Error)]
pub enum GitHostError {
    #[error("Rate limited, resets at {reset_at:?}")]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GitHostError {
    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, GitHostError::RateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_rate_limit() {
        assert!(GitHostError::RateLimited { reset_at: None }.is_rate_limit());
        assert!(
            !GitHostError::ApiError {
                status: 404,
                message: "Not Found".to_string()
            }
            .is_rate_limit()
        );
    }

    #[test]
    fn test_api_error_display() {
        let err = GitHostError::ApiError {
            status: 502,
            message: "Bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "API error 502: Bad gateway");
    }
}
