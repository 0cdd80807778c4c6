//! Repository, branch and commit descriptors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account reference as embedded in platform objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRef {
    pub login: String,
}

/// Repository descriptor from the organization listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,

    pub full_name: String,

    pub owner: AccountRef,

    /// `public`, `private` or `internal`
    #[serde(default)]
    pub visibility: Option<String>,

    /// Last push; `None` for repositories nothing was ever pushed to
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
}

impl Repository {
    /// True when the last push happened at or after `watermark`
    pub fn pushed_since(&self, watermark: &DateTime<Utc>) -> bool {
        self.pushed_at.is_some_and(|pushed| pushed >= *watermark)
    }
}

/// Head commit reference of a branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchHead {
    pub sha: String,
}

/// Branch descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: BranchHead,
}

/// Git-level author/committer signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSignature {
    pub name: String,
    pub date: DateTime<Utc>,
}

/// Git-level commit data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    pub message: String,

    #[serde(default)]
    pub author: Option<GitSignature>,
}

/// Commit record in the platform's shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,

    pub html_url: String,

    pub commit: CommitDetail,

    /// Platform account of the author; absent when the commit email is not
    /// linked to an account
    #[serde(default)]
    pub author: Option<AccountRef>,
}

impl Commit {
    pub fn message(&self) -> &str {
        &self.commit.message
    }

    pub fn author_name(&self) -> &str {
        self.commit.author.as_ref().map(|a| a.name.as_str()).unwrap_or("unknown")
    }

    pub fn author_login(&self) -> Option<&str> {
        self.author.as_ref().map(|a| a.login.as_str())
    }

    pub fn authored_at(&self) -> Option<DateTime<Utc>> {
        self.commit.author.as_ref().map(|a| a.date)
    }
}
