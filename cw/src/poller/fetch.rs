//! Branch and commit fetching for one repository
//!
//! Failures here are recovered at the source: a repository whose branches
//! cannot be listed looks like a repository with no branches, and a branch
//! whose commits cannot be listed looks like a quiet branch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::domain::{Branch, BranchCommits, Commit, RepoCommits, Repository};
use crate::github::GitHost;
use crate::notify::Notifier;

/// Result of processing one repository
#[derive(Debug)]
pub enum RepoOutcome {
    /// No branches reported (or the branch listing failed)
    NoBranches,

    Processed { entry: RepoCommits, notifications: usize },
}

/// Fans out over branches, bounded by a shared request limiter
pub struct Fetcher {
    host: Arc<dyn GitHost>,
    notifier: Notifier,
    limiter: Arc<Semaphore>,
}

impl Fetcher {
    pub fn new(host: Arc<dyn GitHost>, notifier: Notifier, max_concurrent_requests: usize) -> Self {
        Self {
            host,
            notifier,
            limiter: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
        }
    }

    /// Fetch branches, then all branches' commits concurrently, notifying
    /// per non-empty branch as soon as its commits arrive
    pub async fn process_repository(&self, repo: &Repository, since: DateTime<Utc>) -> RepoOutcome {
        let branches = self.branches(repo).await;
        if branches.is_empty() {
            debug!(repo = %repo.name, "process_repository: no branches, skipping");
            return RepoOutcome::NoBranches;
        }

        let results = join_all(branches.iter().map(|b| self.process_branch(repo, b, since))).await;

        let notifications = results.iter().filter(|(_, notified)| *notified).count();
        let branch_commits = results.into_iter().map(|(bc, _)| bc).collect();

        RepoOutcome::Processed {
            entry: RepoCommits {
                repo: repo.name.clone(),
                branch_commits,
            },
            notifications,
        }
    }

    /// Returns the branch's commits and whether a notification was attempted
    async fn process_branch(&self, repo: &Repository, branch: &Branch, since: DateTime<Utc>) -> (BranchCommits, bool) {
        let commits = self.commits(repo, &branch.name, since).await;

        let notified = if commits.is_empty() {
            false
        } else {
            self.notifier.holler(&repo.name, &branch.name, &commits).await;
            true
        };

        (
            BranchCommits {
                branch: branch.name.clone(),
                commits,
            },
            notified,
        )
    }

    async fn branches(&self, repo: &Repository) -> Vec<Branch> {
        let Ok(_permit) = self.limiter.acquire().await else {
            warn!(repo = %repo.name, "Request limiter closed, skipping branch listing");
            return Vec::new();
        };

        match self.host.list_branches(repo).await {
            Ok(branches) => branches,
            Err(e) => {
                warn!(repo = %repo.name, error = %e, rate_limited = e.is_rate_limit(), "Failed to list branches");
                Vec::new()
            }
        }
    }

    async fn commits(&self, repo: &Repository, branch: &str, since: DateTime<Utc>) -> Vec<Commit> {
        let Ok(_permit) = self.limiter.acquire().await else {
            warn!(repo = %repo.name, %branch, "Request limiter closed, skipping commit listing");
            return Vec::new();
        };

        match self.host.list_commits_since(repo, branch, since).await {
            Ok(commits) => {
                debug!(repo = %repo.name, %branch, count = commits.len(), "commits: fetched");
                commits
            }
            Err(e) => {
                warn!(repo = %repo.name, %branch, error = %e, rate_limited = e.is_rate_limit(), "Failed to list commits");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::client::mock::{MockGitHost, branch, commit, repo};
    use crate::notify::mock::RecordingSink;
    use chrono::{Duration, TimeZone};
    use chrono_tz::Tz;

    fn since() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn fetcher(host: Arc<MockGitHost>, sink: Arc<RecordingSink>, limit: usize) -> Fetcher {
        Fetcher::new(host, Notifier::new(sink, Tz::UTC), limit)
    }

    #[tokio::test]
    async fn test_no_branches_skips_commit_requests() {
        let host = Arc::new(MockGitHost::new());
        let sink = Arc::new(RecordingSink::new());
        let f = fetcher(host.clone(), sink.clone(), 4);

        let outcome = f.process_repository(&repo("empty", since()), since()).await;

        assert!(matches!(outcome, RepoOutcome::NoBranches));
        assert!(host.commit_requests().is_empty());
        assert!(sink.messages().is_empty());
    }

    #[tokio::test]
    async fn test_branch_listing_failure_looks_like_no_branches() {
        let host = Arc::new(MockGitHost::new().with_branches("flaky", vec![branch("main")]).failing_branches("flaky"));
        let sink = Arc::new(RecordingSink::new());
        let f = fetcher(host.clone(), sink, 4);

        let outcome = f.process_repository(&repo("flaky", since()), since()).await;

        assert!(matches!(outcome, RepoOutcome::NoBranches));
        assert!(host.commit_requests().is_empty());
    }

    #[tokio::test]
    async fn test_quiet_branch_recorded_without_notification() {
        let later = since() + Duration::minutes(5);
        let host = Arc::new(
            MockGitHost::new()
                .with_branches("widgets", vec![branch("main"), branch("dev")])
                .with_commits("widgets", "dev", vec![commit("d1", "dev work", later)]),
        );
        let sink = Arc::new(RecordingSink::new());
        let f = fetcher(host, sink.clone(), 4);

        let outcome = f.process_repository(&repo("widgets", later), since()).await;

        let RepoOutcome::Processed { entry, notifications } = outcome else {
            panic!("Expected Processed");
        };
        assert_eq!(notifications, 1);
        assert_eq!(entry.branch_commits.len(), 2);
        assert_eq!(entry.branch_commits[0].branch, "main");
        assert!(entry.branch_commits[0].commits.is_empty());
        assert_eq!(entry.branch_commits[1].commits.len(), 1);

        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("`dev`"));
    }

    #[tokio::test]
    async fn test_commit_failure_does_not_affect_sibling_branch() {
        let later = since() + Duration::minutes(5);
        let host = Arc::new(
            MockGitHost::new()
                .with_branches("widgets", vec![branch("main"), branch("dev")])
                .with_commits("widgets", "main", vec![commit("m1", "main work", later)])
                .with_commits("widgets", "dev", vec![commit("d1", "dev work", later)])
                .failing_commits("widgets", "main"),
        );
        let sink = Arc::new(RecordingSink::new());
        let f = fetcher(host, sink.clone(), 4);

        let RepoOutcome::Processed { entry, notifications } = f.process_repository(&repo("widgets", later), since()).await
        else {
            panic!("Expected Processed");
        };

        assert_eq!(notifications, 1);
        assert!(entry.branch_commits[0].commits.is_empty());
        assert_eq!(entry.branch_commits[1].commits[0].sha, "d1");
        assert_eq!(sink.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_commit_order_is_preserved() {
        let host = Arc::new(MockGitHost::new().with_branches("widgets", vec![branch("main")]).with_commits(
            "widgets",
            "main",
            vec![
                commit("c3", "third", since() + Duration::minutes(3)),
                commit("c1", "first", since() + Duration::minutes(1)),
                commit("c2", "second", since() + Duration::minutes(2)),
            ],
        ));
        let sink = Arc::new(RecordingSink::new());
        let f = fetcher(host, sink, 4);

        let RepoOutcome::Processed { entry, .. } = f.process_repository(&repo("widgets", since()), since()).await else {
            panic!("Expected Processed");
        };

        let shas: Vec<&str> = entry.branch_commits[0].commits.iter().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, vec!["c3", "c1", "c2"]);
    }

    #[tokio::test]
    async fn test_requests_are_bounded() {
        let branches: Vec<Branch> = (0..6).map(|i| branch(&format!("b{}", i))).collect();
        let host = Arc::new(
            MockGitHost::new()
                .with_branches("widgets", branches)
                .with_delay(std::time::Duration::from_millis(20)),
        );
        let sink = Arc::new(RecordingSink::new());
        let f = fetcher(host.clone(), sink, 2);

        f.process_repository(&repo("widgets", since()), since()).await;

        assert_eq!(host.commit_requests().len(), 6);
        assert!(host.peak_in_flight() <= 2);
    }
}
