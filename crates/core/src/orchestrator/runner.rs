//! Extraction runner.
//!
//! Sequences one run: load the page with the observer attached, wait for the
//! viewer, drive zoom and two rotation sweeps with settling delays in
//! between, freeze the observed set and hand it to the download pipeline.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::downloader::{DownloadConfig, DownloadPipeline, TierSelection};
use crate::driver::InteractionDriver;
use crate::metrics::{EXTRACTION_DURATION, EXTRACTION_RUNS};
use crate::observer::TileClassifier;

use super::config::ViewerConfig;
use super::session::ExtractionSession;
use super::types::{
    Extraction, ExtractionCounts, ExtractionError, ExtractionPhase, ExtractionSummary,
    InteractionReport,
};

/// Runs extractions. One extractor can serve any number of sessions.
pub struct TileExtractor {
    viewer: ViewerConfig,
    classifier: Arc<TileClassifier>,
    driver: InteractionDriver,
    downloader: DownloadPipeline,
}

impl TileExtractor {
    /// Build every component from configuration.
    pub fn new(config: &Config) -> Result<Self, ExtractionError> {
        Ok(Self::from_parts(
            config.viewer.clone(),
            Arc::new(TileClassifier::new(config.classifier.clone())),
            InteractionDriver::new(config.interaction.clone()),
            DownloadPipeline::new(config.download.clone())?,
        ))
    }

    pub fn from_parts(
        viewer: ViewerConfig,
        classifier: Arc<TileClassifier>,
        driver: InteractionDriver,
        downloader: DownloadPipeline,
    ) -> Self {
        Self {
            viewer,
            classifier,
            driver,
            downloader,
        }
    }

    pub fn classifier(&self) -> &Arc<TileClassifier> {
        &self.classifier
    }

    pub fn download_config(&self) -> &DownloadConfig {
        self.downloader.config()
    }

    /// Browser-side part of a run, `PageLoading` through `Summarizing`.
    ///
    /// Navigation and readiness failures are fatal. Interaction phases never
    /// fail; a missing control or entry point only degrades the phase. On
    /// success the page is closed and the frozen tile set returned.
    pub async fn extract(
        &self,
        session: &mut ExtractionSession,
    ) -> Result<Extraction, ExtractionError> {
        let page_url = session.page_url().to_string();
        let settle = self.viewer.settle.clone();

        session.advance(ExtractionPhase::PageLoading);
        session
            .attach_observer(Arc::clone(&self.classifier))
            .await
            .map_err(|e| ExtractionError::Browser {
                phase: ExtractionPhase::PageLoading,
                source: e,
            })?;
        info!(url = %page_url, "Loading viewer page");
        session
            .page()
            .navigate(&page_url, self.viewer.navigation_timeout())
            .await
            .map_err(ExtractionError::NavigationFailure)?;

        session.advance(ExtractionPhase::ViewerReady);
        session
            .page()
            .wait_for_selector(&self.viewer.ready_selector, self.viewer.ready_timeout())
            .await
            .map_err(ExtractionError::ViewerNotReady)?;
        info!("Viewer ready");
        self.settle(session, settle.initial_ms).await;

        session.advance(ExtractionPhase::ZoomPhase);
        let zoom = self.driver.zoom(session.page()).await;

        session.advance(ExtractionPhase::SettleA);
        self.settle(session, settle.after_zoom_ms).await;

        session.advance(ExtractionPhase::RotatePhaseA);
        let sweep_a = self
            .driver
            .sweep(session.page(), &self.driver.config().sweep_a)
            .await;

        session.advance(ExtractionPhase::SettleB);
        self.settle(session, settle.after_sweep_a_ms).await;

        session.advance(ExtractionPhase::RotatePhaseB);
        let sweep_b = self
            .driver
            .sweep(session.page(), &self.driver.config().sweep_b)
            .await;

        session.advance(ExtractionPhase::SettleC);
        self.settle(session, settle.after_sweep_b_ms).await;

        session.advance(ExtractionPhase::Summarizing);
        let tiles = session.finish_observation().await;
        let counts = ExtractionCounts {
            observed: tiles.len(),
            basic: tiles.basic_count(),
            high: tiles.high_count(),
        };
        info!(
            observed = counts.observed,
            basic = counts.basic,
            high = counts.high,
            "Observation finished"
        );

        Ok(Extraction {
            counts,
            interaction: InteractionReport {
                zoom,
                sweep_a,
                sweep_b,
            },
            tiles,
        })
    }

    /// A complete run: [`extract`](Self::extract), then download the tiers
    /// selected by `tiers` into `destination`.
    ///
    /// A fatal extraction error discards the observed set and skips the
    /// download entirely. Cancelling `cancel` closes the page, or stops the
    /// downloads in flight, and ends the run as cancelled.
    pub async fn run(
        &self,
        mut session: ExtractionSession,
        tiers: TierSelection,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<ExtractionSummary, ExtractionError> {
        let start = Instant::now();
        let started_at = Utc::now();
        info!(id = %session.id(), url = %session.page_url(), "Starting extraction");

        let extracted = tokio::select! {
            result = self.extract(&mut session) => Some(result),
            _ = cancel.cancelled() => None,
        };

        let extraction = match extracted {
            Some(Ok(extraction)) => extraction,
            Some(Err(e)) => {
                error!(id = %session.id(), phase = %e.phase(), error = %e, "Extraction failed");
                session.advance(ExtractionPhase::Failed);
                session.discard().await;
                record_run(e.result_label(), start.elapsed());
                return Err(e);
            }
            None => {
                let e = ExtractionError::Cancelled(session.phase());
                warn!(id = %session.id(), phase = %session.phase(), "Extraction cancelled");
                session.advance(ExtractionPhase::Cancelled);
                session.discard().await;
                record_run(e.result_label(), start.elapsed());
                return Err(e);
            }
        };

        session.advance(ExtractionPhase::DownloadPhase);
        let records = tiers.filter(extraction.tiles.records());
        info!(
            selected = records.len(),
            tiers = %tiers,
            destination = %destination.display(),
            "Downloading tiles"
        );

        let download = match self.downloader.download_all(&records, destination, cancel).await {
            Ok(report) => report,
            Err(e) => {
                let e = ExtractionError::from(e);
                error!(id = %session.id(), error = %e, "Download phase failed");
                session.advance(ExtractionPhase::Failed);
                record_run(e.result_label(), start.elapsed());
                return Err(e);
            }
        };

        if cancel.is_cancelled() {
            let e = ExtractionError::Cancelled(ExtractionPhase::DownloadPhase);
            warn!(
                id = %session.id(),
                downloaded = download.downloaded,
                "Extraction cancelled during downloads"
            );
            session.advance(ExtractionPhase::Cancelled);
            record_run(e.result_label(), start.elapsed());
            return Err(e);
        }

        session.advance(ExtractionPhase::Done);
        let elapsed = start.elapsed();
        record_run("completed", elapsed);

        info!(
            id = %session.id(),
            observed = extraction.counts.observed,
            high = extraction.counts.high,
            downloaded = download.downloaded,
            skipped = download.skipped,
            failed = download.failed.len(),
            high_on_disk = download.high_on_disk,
            "Extraction completed"
        );

        Ok(ExtractionSummary {
            id: session.id().to_string(),
            page_url: session.page_url().to_string(),
            counts: extraction.counts,
            interaction: extraction.interaction,
            download,
            started_at,
            finished_at: Utc::now(),
            duration_ms: elapsed.as_millis() as u64,
        })
    }

    async fn settle(&self, session: &ExtractionSession, ms: u64) {
        if ms > 0 {
            session.page().wait_for_timeout(Duration::from_millis(ms)).await;
        }
    }
}

fn record_run(result: &str, elapsed: Duration) {
    EXTRACTION_RUNS.with_label_values(&[result]).inc();
    EXTRACTION_DURATION
        .with_label_values(&[result])
        .observe(elapsed.as_secs_f64());
}
