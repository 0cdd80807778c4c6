//! Cycle result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Commit;

/// Commits found on one branch during a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchCommits {
    pub branch: String,
    pub commits: Vec<Commit>,
}

/// Per-repository entry of the cycle output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCommits {
    pub repo: String,

    #[serde(rename = "branchCommits")]
    pub branch_commits: Vec<BranchCommits>,
}

impl RepoCommits {
    /// Total commits across all branches
    pub fn commit_count(&self) -> usize {
        self.branch_commits.iter().map(|b| b.commits.len()).sum()
    }
}

/// Summary of one completed cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Wall-clock instant captured before listing; becomes the new watermark
    pub started_at: DateTime<Utc>,

    /// Watermark the cycle compared against
    pub watermark: DateTime<Utc>,

    /// Repositories returned by the lister
    pub repos_listed: usize,

    /// Repositories dropped because they reported no branches
    pub skipped_repos: Vec<String>,

    /// Notifications attempted (one per non-empty branch batch)
    pub notifications: usize,

    pub results: Vec<RepoCommits>,
}

impl CycleReport {
    pub fn commit_count(&self) -> usize {
        self.results.iter().map(RepoCommits::commit_count).sum()
    }
}
