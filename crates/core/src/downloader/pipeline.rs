//! HTTP tile download pipeline.

use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::metrics::{BYTES_WRITTEN, TILE_DOWNLOADS};
use crate::observer::{ResolutionTier, TileRecord};

use super::config::DownloadConfig;
use super::error::DownloadError;
use super::types::{DownloadOutcome, DownloadReport, FailedDownload, TileDownload};

/// Writes observed tiles to a directory, at most `max_concurrent` at a time.
///
/// Re-running over the same directory only fetches what is missing: a tile
/// whose derived file name already exists is skipped. Bytes are streamed into
/// a `.part` sibling that is renamed into place once complete, so a failed or
/// cancelled fetch never leaves a file under the final name.
pub struct DownloadPipeline {
    client: Client,
    config: DownloadConfig,
}

impl DownloadPipeline {
    pub fn new(config: DownloadConfig) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .https_only(config.https_only)
            .build()
            .map_err(|e| DownloadError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self, DownloadError> {
        Self::new(DownloadConfig::default())
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Download every record into `destination`.
    ///
    /// Per-tile failures are collected in the report; only a destination
    /// that cannot be created fails the whole run. Once `cancel` fires,
    /// in-flight fetches are dropped and their partial files removed.
    pub async fn download_all(
        &self,
        records: &[TileRecord],
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<DownloadReport, DownloadError> {
        let start = Instant::now();

        fs::create_dir_all(destination)
            .await
            .map_err(|e| DownloadError::DirectoryCreationFailed {
                path: destination.to_path_buf(),
                source: e,
            })?;

        // Tiles from different directories can share a basename. Records
        // mapping to the same file run one after another so the first writes
        // and the rest see it on disk.
        let mut seen = HashSet::new();
        let mut groups: BTreeMap<&str, Vec<TileRecord>> = BTreeMap::new();
        for record in records {
            if seen.insert(record.url.as_str()) {
                groups
                    .entry(record.file_name.as_str())
                    .or_default()
                    .push(record.clone());
            }
        }

        info!(
            tiles = seen.len(),
            files = groups.len(),
            destination = %destination.display(),
            max_concurrent = self.config.max_concurrent,
            "Starting tile downloads"
        );

        let groups: Vec<Vec<TileRecord>> = groups.into_values().collect();
        let results: Vec<Vec<TileDownload>> = stream::iter(groups)
            .map(|group| self.fetch_group(group, destination, cancel))
            .buffer_unordered(self.config.max_concurrent.max(1))
            .collect()
            .await;

        let mut tiles: Vec<TileDownload> = results.into_iter().flatten().collect();
        tiles.sort_by(|a, b| a.url.cmp(&b.url));

        let mut report = DownloadReport {
            destination: destination.to_path_buf(),
            ..Default::default()
        };
        for tile in &tiles {
            TILE_DOWNLOADS.with_label_values(&[tile.outcome.label()]).inc();
            match &tile.outcome {
                DownloadOutcome::Downloaded { bytes } => {
                    report.downloaded += 1;
                    report.bytes_written += bytes;
                }
                DownloadOutcome::SkippedExisting => report.skipped += 1,
                DownloadOutcome::Failed { reason } => report.failed.push(FailedDownload {
                    url: tile.url.clone(),
                    reason: reason.clone(),
                }),
            }
        }
        BYTES_WRITTEN.inc_by(report.bytes_written);

        let high_names: HashSet<&str> = tiles
            .iter()
            .filter(|t| t.tier == ResolutionTier::High)
            .map(|t| t.file_name.as_str())
            .collect();
        for name in high_names {
            if matches!(fs::try_exists(destination.join(name)).await, Ok(true)) {
                report.high_on_disk += 1;
            }
        }

        report.tiles = tiles;
        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            downloaded = report.downloaded,
            skipped = report.skipped,
            failed = report.failed.len(),
            high_on_disk = report.high_on_disk,
            bytes = report.bytes_written,
            duration_ms = report.duration_ms,
            "Tile downloads finished"
        );

        Ok(report)
    }

    /// Fetch records sharing one file name, one after another.
    async fn fetch_group(
        &self,
        group: Vec<TileRecord>,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Vec<TileDownload> {
        let mut done = Vec::with_capacity(group.len());
        for record in group {
            let outcome = self.fetch_tile(&record, destination, cancel).await;
            done.push(TileDownload {
                url: record.url,
                file_name: record.file_name,
                tier: record.tier,
                outcome,
            });
        }
        done
    }

    async fn fetch_tile(
        &self,
        record: &TileRecord,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> DownloadOutcome {
        let path = destination.join(&record.file_name);

        if cancel.is_cancelled() {
            return DownloadOutcome::Failed {
                reason: DownloadError::Cancelled.reason(),
            };
        }

        match fs::try_exists(&path).await {
            Ok(true) => {
                debug!(file = %record.file_name, "Tile already on disk, skipping");
                return DownloadOutcome::SkippedExisting;
            }
            Ok(false) => {}
            Err(e) => {
                return DownloadOutcome::Failed {
                    reason: DownloadError::write_failed(path, e).reason(),
                }
            }
        }

        let part = part_path(&path);
        let written = tokio::select! {
            result = self.write_tile(&record.url, &part) => result,
            _ = cancel.cancelled() => Err(DownloadError::Cancelled),
        };
        let result = match written {
            Ok(bytes) => fs::rename(&part, &path)
                .await
                .map(|()| bytes)
                .map_err(|e| DownloadError::write_failed(path.clone(), e)),
            Err(e) => Err(e),
        };

        match result {
            Ok(bytes) => {
                debug!(file = %record.file_name, bytes, "Tile written");
                DownloadOutcome::Downloaded { bytes }
            }
            Err(e) => {
                remove_partial(&part).await;
                warn!(url = %record.url, error = %e, "Tile download failed");
                DownloadOutcome::Failed { reason: e.reason() }
            }
        }
    }

    /// Stream the response body of `url` into `part`.
    async fn write_tile(&self, url: &str, part: &Path) -> Result<u64, DownloadError> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                status: status.as_u16(),
            });
        }

        let file = File::create(part)
            .await
            .map_err(|e| DownloadError::write_failed(part.to_path_buf(), e))?;
        let mut writer = BufWriter::new(file);

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| DownloadError::write_failed(part.to_path_buf(), e))?;
            written += chunk.len() as u64;
        }
        writer
            .flush()
            .await
            .map_err(|e| DownloadError::write_failed(part.to_path_buf(), e))?;

        Ok(written)
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

async fn remove_partial(part: &Path) {
    match fs::remove_file(part).await {
        Ok(()) => debug!(path = %part.display(), "Removed partial file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %part.display(), error = %e, "Failed to remove partial file"),
    }
}
