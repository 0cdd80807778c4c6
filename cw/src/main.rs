//! commitwatch - organization commit notifier
//!
//! CLI entry point for the poll loop.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use commitwatch::cli::{Cli, Command, get_log_path, parse_log_level};
use commitwatch::config::Config;
use commitwatch::github::GithubClient;
use commitwatch::notify::{DiscordWebhook, Notifier};
use commitwatch::poller::{Poller, TickOutcome};
use commitwatch::state::{FileStateStore, StateStore};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => parse_log_level(s).unwrap_or_else(|| {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
            tracing::Level::INFO
        }),
        None => tracing::Level::INFO,
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let command = cli.command.unwrap_or(Command::Run);
    debug!(?command, "main: dispatching command");
    match command {
        Command::Run => cmd_run(&config).await,
        Command::Once => cmd_once(&config).await,
        Command::Status => cmd_status(&config).await,
    }
}

fn file_store(config: &Config) -> FileStateStore {
    FileStateStore::new(config.storage.watermark_path(), config.storage.output_path())
}

fn build_poller(config: &Config) -> Result<Poller> {
    config.validate().context("Invalid configuration")?;

    let host = GithubClient::from_config(&config.github).context("Failed to create GitHub client")?;
    let sink = DiscordWebhook::new(&config.discord_webhook, Duration::from_millis(config.notify.timeout_ms))
        .context("Failed to create webhook client")?;
    let notifier = Notifier::new(Arc::new(sink), config.notify.timezone()?);

    Ok(Poller::new(
        config.org.clone(),
        config.poll.clone(),
        Arc::new(host),
        notifier,
        Arc::new(file_store(config)),
    ))
}

/// Poll until the process is terminated
async fn cmd_run(config: &Config) -> Result<()> {
    let poller = Arc::new(build_poller(config)?);

    println!(
        "commitwatch polling '{}' every {}s (log: {})",
        config.org,
        config.poll.interval_secs,
        get_log_path().display()
    );
    poller.run().await;
    Ok(())
}

/// Run one cycle and report it
async fn cmd_once(config: &Config) -> Result<()> {
    let poller = build_poller(config)?;

    match poller.tick().await {
        TickOutcome::Completed(report) => {
            println!(
                "Checked {} repositories since {}: {} commits, {} notifications, {} skipped",
                report.repos_listed,
                report.watermark,
                report.commit_count(),
                report.notifications,
                report.skipped_repos.len()
            );
            Ok(())
        }
        TickOutcome::Skipped => Err(eyre!("A cycle is already running")),
        TickOutcome::Failed(reason) => Err(eyre!("Cycle failed: {}", reason)),
    }
}

/// Print the stored watermark
async fn cmd_status(config: &Config) -> Result<()> {
    let store = file_store(config);

    match store.load_watermark().await? {
        Some(at) => println!("last_checked: {}", commitwatch::domain::timestamp::format_utc_secs(&at)),
        None => println!("last_checked: never ({} not found)", store.watermark_path().display()),
    }
    Ok(())
}
