//! Poll loop implementation

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use eyre::{Context, Result, eyre};
use futures::FutureExt;
use futures::future::join_all;
use tokio::time::{Instant, interval_at};
use tracing::{debug, error, info};

use super::config::PollerConfig;
use super::fetch::{Fetcher, RepoOutcome};
use super::listing::list_active_repositories;
use crate::domain::CycleReport;
use crate::domain::timestamp::truncate_secs;
use crate::github::GitHost;
use crate::notify::Notifier;
use crate::state::StateStore;

/// What a trigger did
#[derive(Debug)]
pub enum TickOutcome {
    Completed(CycleReport),

    /// A previous cycle was still running
    Skipped,

    /// The cycle errored or panicked; the watermark was not advanced
    Failed(String),
}

/// Clears the Running flag however the cycle ends
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The Poller runs list/fetch/notify/persist cycles on a fixed interval
pub struct Poller {
    org: String,
    config: PollerConfig,
    host: Arc<dyn GitHost>,
    fetcher: Fetcher,
    store: Arc<dyn StateStore>,
    running: AtomicBool,
}

impl Poller {
    pub fn new(
        org: impl Into<String>,
        config: PollerConfig,
        host: Arc<dyn GitHost>,
        notifier: Notifier,
        store: Arc<dyn StateStore>,
    ) -> Self {
        let fetcher = Fetcher::new(Arc::clone(&host), notifier, config.max_concurrent_requests);
        Self {
            org: org.into(),
            config,
            host,
            fetcher,
            store,
            running: AtomicBool::new(false),
        }
    }

    /// True while a cycle is in flight
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run one cycle starting now, unless one is already running
    pub async fn tick(&self) -> TickOutcome {
        self.tick_at(truncate_secs(Utc::now())).await
    }

    /// Run one cycle with an explicit start instant
    pub async fn tick_at(&self, started_at: DateTime<Utc>) -> TickOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("Previous cycle still running, skipping tick");
            return TickOutcome::Skipped;
        }
        let _guard = RunningGuard(&self.running);

        match AssertUnwindSafe(self.run_cycle(started_at)).catch_unwind().await {
            Ok(Ok(report)) => TickOutcome::Completed(report),
            Ok(Err(e)) => {
                let reason = format!("{:#}", e);
                error!(error = %reason, "Poll cycle failed");
                TickOutcome::Failed(reason)
            }
            Err(_) => {
                error!("Poll cycle panicked");
                TickOutcome::Failed("cycle panicked".to_string())
            }
        }
    }

    async fn run_cycle(&self, started_at: DateTime<Utc>) -> Result<CycleReport> {
        let watermark = match self.store.load_watermark().await.context("Failed to read watermark")? {
            Some(at) => at,
            None => started_at
                .checked_sub_signed(self.config.initial_lookback()?)
                .ok_or_else(|| eyre!("Initial lookback reaches before the earliest representable time"))?,
        };
        info!(org = %self.org, %watermark, "Cycle started");

        let repos = list_active_repositories(self.host.as_ref(), &self.org, watermark, self.config.page_size)
            .await
            .context("Failed to list organization repositories")?;
        debug!(count = repos.len(), "run_cycle: repositories listed");

        let outcomes = join_all(repos.iter().map(|repo| self.fetcher.process_repository(repo, watermark))).await;

        let mut results = Vec::new();
        let mut skipped_repos = Vec::new();
        let mut notifications = 0;
        for (repo, outcome) in repos.iter().zip(outcomes) {
            match outcome {
                RepoOutcome::NoBranches => skipped_repos.push(repo.name.clone()),
                RepoOutcome::Processed {
                    entry,
                    notifications: sent,
                } => {
                    notifications += sent;
                    results.push(entry);
                }
            }
        }

        if !repos.is_empty() {
            self.store
                .save_cycle(&results)
                .await
                .context("Failed to write cycle output")?;
        }

        let next = started_at.max(watermark);
        self.store
            .save_watermark(next)
            .await
            .context("Failed to write watermark")?;

        let report = CycleReport {
            started_at,
            watermark,
            repos_listed: repos.len(),
            skipped_repos,
            notifications,
            results,
        };
        info!(
            repos = report.repos_listed,
            skipped = report.skipped_repos.len(),
            commits = report.commit_count(),
            notifications = report.notifications,
            next_watermark = %next,
            "Cycle complete"
        );
        Ok(report)
    }

    /// Run forever: one awaited cycle, then one spawned cycle per interval
    ///
    /// Ticks do not wait for the previous cycle; overlapping ticks are
    /// turned away by the Running guard.
    pub async fn run(self: Arc<Self>) {
        info!(org = %self.org, interval_secs = self.config.interval_secs, "Poller started");

        if let TickOutcome::Failed(reason) = self.tick().await {
            debug!(%reason, "run: initial cycle failed");
        }

        let period = self.config.interval();
        let now = Instant::now();
        let Some(first) = now.checked_add(period) else {
            error!(interval_secs = self.config.interval_secs, "Poll interval out of range, timer not started");
            return;
        };
        let mut ticker = interval_at(first, period);

        loop {
            ticker.tick().await;
            let poller = Arc::clone(&self);
            tokio::spawn(async move {
                poller.tick().await;
            });
        }
    }
}
