//! GitHost trait definition

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::GitHostError;
use crate::domain::{Branch, Commit, Repository};

/// Read-only view of an organization on the hosting platform
///
/// Every call is a single logical listing; implementations handle their own
/// pagination except for [`GitHost::list_org_repos`], whose pages are driven by
/// the repository lister so it can stop early.
#[async_trait]
pub trait GitHost: Send + Sync {
    /// Fetch one page of the organization's repositories, most recently
    /// pushed first. Pages are 1-based.
    async fn list_org_repos(&self, org: &str, page: u32, per_page: u32) -> Result<Vec<Repository>, GitHostError>;

    /// List every branch of a repository
    async fn list_branches(&self, repo: &Repository) -> Result<Vec<Branch>, GitHostError>;

    /// List commits on `branch` authored at or after `since`, in platform order
    async fn list_commits_since(
        &self,
        repo: &Repository,
        branch: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Commit>, GitHostError>;
}
