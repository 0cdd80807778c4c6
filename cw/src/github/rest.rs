//! GitHub REST API client
//!
//! Implements [`GitHost`] against `api.github.com` (or a GitHub Enterprise
//! base URL) with a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{GitHost, GitHostError};
use crate::config::GithubConfig;
use crate::domain::timestamp::format_utc_secs;
use crate::domain::{Branch, Commit, Repository};

/// Page size for branch and commit listings (the platform maximum)
const LIST_PAGE_SIZE: u32 = 100;

const API_VERSION: &str = "2022-11-28";

/// GitHub API client
pub struct GithubClient {
    base_url: String,
    token: String,
    visibility: String,
    user_agent: String,
    http: Client,
}

impl GithubClient {
    /// Create a new client from configuration
    ///
    /// Reads the token from the environment variable named in the config.
    pub fn from_config(config: &GithubConfig) -> Result<Self, GitHostError> {
        debug!(base_url = %config.base_url, visibility = %config.visibility, "from_config: called");
        let token = config.token().map_err(|e| GitHostError::Config(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            visibility: config.visibility.clone(),
            user_agent: config.user_agent.clone(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, GitHostError> {
        debug!(%path, ?query, "get_json: called");
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, &self.user_agent)
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            debug!(%status, "get_json: non-success status");
            return Err(error_for_status(status, &headers, &body));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Follow page numbers until the platform returns a short page
    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, GitHostError> {
        let all = collect_pages(LIST_PAGE_SIZE, |page| {
            let mut paged = query.to_vec();
            paged.push(("per_page", LIST_PAGE_SIZE.to_string()));
            paged.push(("page", page.to_string()));
            async move { self.get_json(path, &paged).await }
        })
        .await?;

        debug!(%path, total = all.len(), "get_all_pages: done");
        Ok(all)
    }
}

/// Request pages 1, 2, ... until one comes back shorter than `per_page`
async fn collect_pages<T, F, Fut>(per_page: u32, mut fetch: F) -> Result<Vec<T>, GitHostError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>, GitHostError>>,
{
    let mut all = Vec::new();
    let mut page = 1u32;

    loop {
        let items = fetch(page).await?;
        let count = items.len();
        all.extend(items);

        if count < per_page as usize {
            return Ok(all);
        }
        page += 1;
    }
}

fn repo_listing_query(visibility: &str, page: u32, per_page: u32) -> Vec<(&'static str, String)> {
    vec![
        ("type", visibility.to_string()),
        ("sort", "pushed".to_string()),
        ("direction", "desc".to_string()),
        ("per_page", per_page.to_string()),
        ("page", page.to_string()),
    ]
}

fn commits_query(branch: &str, since: &DateTime<Utc>) -> Vec<(&'static str, String)> {
    vec![("sha", branch.to_string()), ("since", format_utc_secs(since))]
}

#[async_trait]
impl GitHost for GithubClient {
    async fn list_org_repos(&self, org: &str, page: u32, per_page: u32) -> Result<Vec<Repository>, GitHostError> {
        let path = format!("/orgs/{}/repos", org);
        let query = repo_listing_query(&self.visibility, page, per_page);
        self.get_json(&path, &query).await
    }

    async fn list_branches(&self, repo: &Repository) -> Result<Vec<Branch>, GitHostError> {
        let path = format!("/repos/{}/{}/branches", repo.owner.login, repo.name);
        self.get_all_pages(&path, &[]).await
    }

    async fn list_commits_since(
        &self,
        repo: &Repository,
        branch: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Commit>, GitHostError> {
        let path = format!("/repos/{}/{}/commits", repo.owner.login, repo.name);
        let query = commits_query(branch, &since);
        self.get_all_pages(&path, &query).await
    }
}

/// Map a non-success response onto a [`GitHostError`]
///
/// GitHub reports an exhausted quota as 403 or 429 with
/// `x-ratelimit-remaining: 0` and the reset time as epoch seconds.
fn error_for_status(status: StatusCode, headers: &HeaderMap, body: &str) -> GitHostError {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let quota_exhausted = header("x-ratelimit-remaining") == Some("0");
    if status == StatusCode::TOO_MANY_REQUESTS || (status == StatusCode::FORBIDDEN && quota_exhausted) {
        let reset_at = header("x-ratelimit-reset")
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
        return GitHostError::RateLimited { reset_at };
    }

    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string());

    GitHostError::ApiError {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_error_for_status_rate_limited() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1714557600"));

        let err = error_for_status(StatusCode::FORBIDDEN, &headers, "{}");
        match err {
            GitHostError::RateLimited { reset_at } => {
                assert_eq!(reset_at, Some(Utc.timestamp_opt(1_714_557_600, 0).unwrap()));
            }
            other => panic!("Expected RateLimited, got {:?}", other),
        }
    }

    #[test]
    fn test_error_for_status_forbidden_with_quota_left() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("4999"));

        let err = error_for_status(
            StatusCode::FORBIDDEN,
            &headers,
            r#"{"message":"Resource not accessible by integration"}"#,
        );
        match err {
            GitHostError::ApiError { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Resource not accessible by integration");
            }
            other => panic!("Expected ApiError, got {:?}", other),
        }
    }

    #[test]
    fn test_error_for_status_plain_body() {
        let err = error_for_status(StatusCode::BAD_GATEWAY, &HeaderMap::new(), "upstream timeout");
        assert_eq!(err.to_string(), "API error 502: upstream timeout");
    }

    #[test]
    fn test_repo_listing_query() {
        let query = repo_listing_query("public", 3, 10);
        assert_eq!(
            query,
            vec![
                ("type", "public".to_string()),
                ("sort", "pushed".to_string()),
                ("direction", "desc".to_string()),
                ("per_page", "10".to_string()),
                ("page", "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_commits_query_uses_second_precision_utc() {
        let since = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + chrono::Duration::milliseconds(750);
        let query = commits_query("release/1.x", &since);
        assert_eq!(
            query,
            vec![
                ("sha", "release/1.x".to_string()),
                ("since", "2024-05-01T12:00:00Z".to_string()),
            ]
        );
    }

    /// Serve `sizes[page - 1]` items per page and record the pages asked for
    async fn collect_with_sizes(sizes: &[usize]) -> (Vec<u32>, usize) {
        let requested = std::sync::Mutex::new(Vec::new());
        let items = collect_pages(LIST_PAGE_SIZE, |page| {
            requested.lock().unwrap().push(page);
            let size = sizes.get(page as usize - 1).copied().unwrap_or(0);
            async move { Ok::<_, GitHostError>(vec![(); size]) }
        })
        .await
        .unwrap();
        (requested.into_inner().unwrap(), items.len())
    }

    #[tokio::test]
    async fn test_collect_pages_stops_on_short_page() {
        assert_eq!(collect_with_sizes(&[100, 42]).await, (vec![1, 2], 142));
    }

    #[tokio::test]
    async fn test_collect_pages_full_page_requests_one_more() {
        assert_eq!(collect_with_sizes(&[100, 100, 0]).await, (vec![1, 2, 3], 200));
    }

    #[tokio::test]
    async fn test_collect_pages_empty_first_page() {
        assert_eq!(collect_with_sizes(&[]).await, (vec![1], 0));
    }

    #[tokio::test]
    async fn test_collect_pages_propagates_errors() {
        let result: Result<Vec<()>, _> = collect_pages(LIST_PAGE_SIZE, |page| async move {
            if page == 1 {
                Ok(vec![(); 100])
            } else {
                Err(GitHostError::RateLimited { reset_at: None })
            }
        })
        .await;
        assert!(result.is_err_and(|e| e.is_rate_limit()));
    }

    #[test]
    fn test_too_many_requests_without_headers() {
        let err = error_for_status(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new(), "");
        assert!(err.is_rate_limit());
    }
}
