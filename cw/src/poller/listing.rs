//! Repository listing with watermark cut-off
//!
//! Pages arrive most-recently-pushed first, so the first page whose tail
//! falls behind the watermark is the last page worth fetching.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::Repository;
use crate::github::{GitHost, GitHostError};

/// Drop trailing repositories pushed before `watermark`
///
/// Returns true if anything was dropped, which means no later page can hold
/// newer activity.
pub fn trim_stale_tail(page: &mut Vec<Repository>, watermark: &DateTime<Utc>) -> bool {
    let before = page.len();
    while page.last().is_some_and(|repo| !repo.pushed_since(watermark)) {
        page.pop();
    }
    page.len() < before
}

/// List repositories of `org` pushed at or after `watermark`
///
/// Any page failure is returned as-is; a partial listing is never reported
/// as complete.
pub async fn list_active_repositories(
    host: &dyn GitHost,
    org: &str,
    watermark: DateTime<Utc>,
    page_size: u32,
) -> Result<Vec<Repository>, GitHostError> {
    debug!(%org, %watermark, page_size, "list_active_repositories: called");
    let mut active = Vec::new();
    let mut page = 1u32;

    loop {
        let mut repos = host.list_org_repos(org, page, page_size).await?;
        if repos.is_empty() {
            debug!(page, "list_active_repositories: empty page, listing exhausted");
            break;
        }

        let reached_watermark = trim_stale_tail(&mut repos, &watermark);
        debug!(page, kept = repos.len(), reached_watermark, "list_active_repositories: page scanned");
        active.extend(repos);

        if reached_watermark {
            break;
        }
        page += 1;
    }

    Ok(active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::client::mock::{MockGitHost, repo};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn watermark() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    /// Repositories pushed at the given offsets (seconds) from the watermark
    fn repos_at(offsets: &[i64]) -> Vec<Repository> {
        offsets
            .iter()
            .enumerate()
            .map(|(i, off)| repo(&format!("repo-{}", i), watermark() + Duration::seconds(*off)))
            .collect()
    }

    fn names(repos: &[Repository]) -> Vec<String> {
        repos.iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn test_trim_keeps_equal_timestamps() {
        let mut page = repos_at(&[30, 0, 0]);
        assert!(!trim_stale_tail(&mut page, &watermark()));
        assert_eq!(page.len(), 3);
    }

    #[test]
    fn test_trim_drops_only_trailing_entries() {
        let mut page = repos_at(&[30, 10, -1, -50]);
        assert!(trim_stale_tail(&mut page, &watermark()));
        assert_eq!(names(&page), vec!["repo-0", "repo-1"]);
    }

    #[test]
    fn test_trim_treats_missing_push_as_stale() {
        let mut page = repos_at(&[30]);
        let mut never_pushed = repo("never", watermark());
        never_pushed.pushed_at = None;
        page.push(never_pushed);

        assert!(trim_stale_tail(&mut page, &watermark()));
        assert_eq!(names(&page), vec!["repo-0"]);
    }

    #[tokio::test]
    async fn test_empty_organization() {
        let host = MockGitHost::new();

        let repos = list_active_repositories(&host, "acme", watermark(), 10).await.unwrap();

        assert!(repos.is_empty());
        assert_eq!(host.pages_requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_first_page_tail_older_than_watermark() {
        // 10 on page 1, last 3 older; page 2 would be older still
        let mut offsets: Vec<i64> = (0..7).map(|i| 700 - i * 100).collect();
        offsets.extend([-10, -20, -30]);
        offsets.extend((0..10).map(|i| -100 - i));
        let host = MockGitHost::new().with_repos(repos_at(&offsets));

        let repos = list_active_repositories(&host, "acme", watermark(), 10).await.unwrap();

        assert_eq!(repos.len(), 7);
        assert_eq!(names(&repos), names(&repos_at(&offsets)[..7]));
        assert_eq!(host.pages_requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_page_entirely_older_than_watermark() {
        let offsets: Vec<i64> = (0..10).map(|i| 100 - i).chain((0..10).map(|i| -1 - i)).collect();
        let host = MockGitHost::new().with_repos(repos_at(&offsets));

        let repos = list_active_repositories(&host, "acme", watermark(), 10).await.unwrap();

        assert_eq!(repos.len(), 10);
        assert_eq!(host.pages_requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_full_page_equal_to_watermark_requests_next_page() {
        // Page-size aligned count where every entry sits on the watermark
        let host = MockGitHost::new().with_repos(repos_at(&[0; 10]));

        let repos = list_active_repositories(&host, "acme", watermark(), 10).await.unwrap();

        assert_eq!(repos.len(), 10);
        assert_eq!(host.pages_requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_listing_failure_propagates() {
        let host = MockGitHost::new().with_repos(repos_at(&[10])).failing_listing();

        let result = list_active_repositories(&host, "acme", watermark(), 10).await;

        assert!(matches!(result, Err(GitHostError::ApiError { status: 500, .. })));
    }

    proptest! {
        #[test]
        fn prop_listing_matches_filter(
            mut offsets in proptest::collection::vec(-500i64..500, 0..45),
            page_size in 1u32..12,
        ) {
            offsets.sort_unstable_by(|a, b| b.cmp(a));
            let all = repos_at(&offsets);
            let host = MockGitHost::new().with_repos(all.clone());

            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let repos = rt
                .block_on(list_active_repositories(&host, "acme", watermark(), page_size))
                .unwrap();

            let expected: Vec<Repository> = all.iter().filter(|r| r.pushed_since(&watermark())).cloned().collect();
            prop_assert_eq!(&repos, &expected);

            let ps = page_size as usize;
            let last_page = match offsets.iter().position(|off| *off < 0) {
                Some(first_stale) => first_stale / ps + 1,
                None => offsets.len().div_ceil(ps) + 1,
            };
            let expected_pages: Vec<u32> = (1..=last_page as u32).collect();
            prop_assert_eq!(host.pages_requested(), expected_pages);
        }
    }
}
