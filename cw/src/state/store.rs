//! StateStore trait and its file and memory implementations

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::domain::RepoCommits;
use crate::domain::timestamp::utc_secs;

/// Durable home of the watermark and the latest cycle output
///
/// Only the poll loop calls into a store, once at cycle start and once at
/// cycle end, so implementations need no cross-call locking.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the stored watermark; `None` when nothing has been stored yet
    async fn load_watermark(&self) -> Result<Option<DateTime<Utc>>>;

    async fn save_watermark(&self, at: DateTime<Utc>) -> Result<()>;

    /// Replace the previous cycle output with `results`
    async fn save_cycle(&self, results: &[RepoCommits]) -> Result<()>;
}

/// On-disk shape of the watermark file
///
/// Unknown keys are carried through a read-modify-write untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkFile {
    #[serde(with = "utc_secs")]
    pub last_checked: DateTime<Utc>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// JSON files on the local filesystem
#[derive(Debug, Clone)]
pub struct FileStateStore {
    watermark_path: PathBuf,
    output_path: PathBuf,
}

impl FileStateStore {
    pub fn new(watermark_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            watermark_path: watermark_path.into(),
            output_path: output_path.into(),
        }
    }

    pub fn watermark_path(&self) -> &Path {
        &self.watermark_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    async fn read_watermark_file(&self) -> Result<Option<WatermarkFile>> {
        if !fs::try_exists(&self.watermark_path).await? {
            debug!(path = ?self.watermark_path, "read_watermark_file: no file yet");
            return Ok(None);
        }

        let data = fs::read_to_string(&self.watermark_path)
            .await
            .context(format!("Failed to read {}", self.watermark_path.display()))?;
        let file: WatermarkFile = serde_json::from_str(&data).with_context(|| {
            format!(
                "Failed to parse {}; delete or fix it to resume polling from the initial lookback",
                self.watermark_path.display()
            )
        })?;
        Ok(Some(file))
    }
}

/// Write through a sibling temp file so readers never see a torn file
async fn write_replace(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| eyre!("Not a file path: {}", path.display()))?
        .to_string_lossy();
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    fs::write(&tmp, contents).await?;
    fs::rename(&tmp, path)
        .await
        .context(format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load_watermark(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.read_watermark_file().await?.map(|f| f.last_checked))
    }

    async fn save_watermark(&self, at: DateTime<Utc>) -> Result<()> {
        debug!(%at, "FileStateStore::save_watermark: called");
        let file = match self.read_watermark_file().await? {
            Some(mut existing) => {
                existing.last_checked = at;
                existing
            }
            None => WatermarkFile {
                last_checked: at,
                extra: serde_json::Map::new(),
            },
        };

        let json = serde_json::to_string_pretty(&file)?;
        write_replace(&self.watermark_path, &json).await
    }

    async fn save_cycle(&self, results: &[RepoCommits]) -> Result<()> {
        debug!(repos = results.len(), "FileStateStore::save_cycle: called");
        let json = serde_json::to_string_pretty(results)?;
        write_replace(&self.output_path, &json).await
    }
}
