//! Extraction service implementation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::browser::PageLauncher;
use crate::config::Config;
use crate::orchestrator::{
    ExtractionError, ExtractionPhase, ExtractionSession, ExtractionSummary, PhaseCallback,
    TileExtractor,
};
use crate::target::TargetConfig;

use super::types::{ExtractionRecord, ExtractionRequest, ExtractionStatus};

/// Run records. The lock is never held across an `.await`, so phase
/// callbacks can take it from synchronous code.
type Records = Arc<RwLock<HashMap<String, ExtractionRecord>>>;

fn read(records: &Records) -> RwLockReadGuard<'_, HashMap<String, ExtractionRecord>> {
    records.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(records: &Records) -> RwLockWriteGuard<'_, HashMap<String, ExtractionRecord>> {
    records.write().unwrap_or_else(PoisonError::into_inner)
}

/// A running extraction.
pub struct ExtractionHandle {
    id: String,
    cancel: CancellationToken,
    task: JoinHandle<Result<ExtractionSummary, ExtractionError>>,
}

impl ExtractionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ask the run to stop. The page is closed and in-flight downloads are
    /// dropped; [`ExtractionService::await_completion`] then reports
    /// [`ExtractionError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this run when fired.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Starts extractions on pages from a [`PageLauncher`] and tracks them.
pub struct ExtractionService {
    launcher: Arc<dyn PageLauncher>,
    extractor: Arc<TileExtractor>,
    target: TargetConfig,
    records: Records,
}

impl ExtractionService {
    pub fn new(config: &Config, launcher: Arc<dyn PageLauncher>) -> Result<Self, ExtractionError> {
        Ok(Self {
            launcher,
            extractor: Arc::new(TileExtractor::new(config)?),
            target: config.target.clone(),
            records: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Resolve the request and start the run in the background.
    pub async fn start_extraction(
        &self,
        request: ExtractionRequest,
    ) -> Result<ExtractionHandle, ExtractionError> {
        let page_url = request
            .target
            .resolve(&self.target)
            .map_err(|e| ExtractionError::InvalidRequest(e.to_string()))?;
        let download = self.extractor.download_config();
        let tiers = request.tiers.unwrap_or(download.tiers);
        let destination: PathBuf = request
            .destination
            .unwrap_or_else(|| download.destination.clone());

        let id = Uuid::new_v4().to_string();
        write(&self.records)
            .insert(id.clone(), ExtractionRecord::new(id.clone(), page_url.clone()));
        info!(
            id = %id,
            url = %page_url,
            tiers = %tiers,
            launcher = self.launcher.name(),
            "Extraction queued"
        );

        let cancel = CancellationToken::new();
        let task = tokio::spawn({
            let id = id.clone();
            let cancel = cancel.clone();
            let launcher = Arc::clone(&self.launcher);
            let extractor = Arc::clone(&self.extractor);
            let records = Arc::clone(&self.records);
            async move {
                set_status(&records, &id, ExtractionStatus::InProgress);

                let page = tokio::select! {
                    page = launcher.open_page() => page.map_err(|e| ExtractionError::Browser {
                        phase: ExtractionPhase::Idle,
                        source: e,
                    }),
                    _ = cancel.cancelled() => Err(ExtractionError::Cancelled(ExtractionPhase::Idle)),
                };

                let result = match page {
                    Ok(page) => {
                        let session = ExtractionSession::new(id.clone(), page_url, page)
                            .with_phase_callback(phase_recorder(Arc::clone(&records)));
                        extractor.run(session, tiers, &destination, &cancel).await
                    }
                    Err(e) => Err(e),
                };

                finish(&records, &id, &result);
                result
            }
        });

        Ok(ExtractionHandle { id, cancel, task })
    }

    /// Wait for a run to end.
    pub async fn await_completion(
        &self,
        handle: ExtractionHandle,
    ) -> Result<ExtractionSummary, ExtractionError> {
        match handle.task.await {
            Ok(result) => result,
            Err(e) => {
                let result = Err(ExtractionError::Aborted(e.to_string()));
                finish(&self.records, &handle.id, &result);
                result
            }
        }
    }

    pub fn cancel(&self, handle: &ExtractionHandle) {
        info!(id = %handle.id, "Cancelling extraction");
        handle.cancel();
    }

    pub async fn status(&self, id: &str) -> Option<ExtractionRecord> {
        read(&self.records).get(id).cloned()
    }

    /// Every tracked run, oldest first.
    pub async fn list(&self) -> Vec<ExtractionRecord> {
        let mut records: Vec<ExtractionRecord> = read(&self.records).values().cloned().collect();
        records.sort_by_key(|r| r.created_at);
        records
    }
}

fn phase_recorder(records: Records) -> PhaseCallback {
    Arc::new(move |id: &str, phase: ExtractionPhase| {
        if let Some(record) = write(&records).get_mut(id) {
            record.phase = phase;
        }
    })
}

fn set_status(records: &Records, id: &str, status: ExtractionStatus) {
    if let Some(record) = write(records).get_mut(id) {
        record.status = status;
    }
}

fn finish(records: &Records, id: &str, result: &Result<ExtractionSummary, ExtractionError>) {
    let mut records = write(records);
    let Some(record) = records.get_mut(id) else {
        warn!(id = %id, "Finished extraction has no record");
        return;
    };

    record.completed_at = Some(Utc::now());
    match result {
        Ok(summary) => {
            record.status = ExtractionStatus::Completed;
            record.phase = ExtractionPhase::Done;
            record.counts = Some(summary.counts);
        }
        Err(e) if e.is_cancelled() => {
            record.status = ExtractionStatus::Cancelled;
            record.phase = ExtractionPhase::Cancelled;
            record.error_message = Some(e.to_string());
        }
        Err(e) => {
            record.status = ExtractionStatus::Failed;
            record.phase = ExtractionPhase::Failed;
            record.error_message = Some(e.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockBrowserPage, MockLauncher};
    use std::time::Duration;
    use tempfile::TempDir;

    fn service(page: &MockBrowserPage) -> (ExtractionService, Arc<MockLauncher>) {
        let launcher = Arc::new(MockLauncher::new(page.clone()));
        let service = ExtractionService::new(&fixtures::fast_config(), launcher.clone()).unwrap();
        (service, launcher)
    }

    #[tokio::test]
    async fn test_invalid_target_is_rejected_up_front() {
        let (service, launcher) = service(&MockBrowserPage::new());

        let result = service
            .start_extraction(ExtractionRequest::for_url("not a url"))
            .await;

        assert!(matches!(result, Err(ExtractionError::InvalidRequest(_))));
        assert_eq!(launcher.opened_pages(), 0);
        assert!(service.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_completed_run_is_recorded() {
        let page = MockBrowserPage::new();
        let (service, _launcher) = service(&page);
        let dir = TempDir::new().unwrap();

        let handle = service
            .start_extraction(
                ExtractionRequest::for_url("https://viewer.test/city").with_destination(dir.path()),
            )
            .await
            .unwrap();
        let id = handle.id().to_string();
        let summary = service.await_completion(handle).await.unwrap();

        assert_eq!(summary.id, id);
        assert_eq!(summary.counts.observed, 0);
        let record = service.status(&id).await.unwrap();
        assert_eq!(record.status, ExtractionStatus::Completed);
        assert_eq!(record.phase, ExtractionPhase::Done);
        assert!(record.completed_at.is_some());
        assert!(record.error_message.is_none());
    }

    #[tokio::test]
    async fn test_failed_run_keeps_error_message() {
        let page = MockBrowserPage::new();
        page.set_viewer_ready(false).await;
        let (service, _launcher) = service(&page);

        let handle = service
            .start_extraction(ExtractionRequest::for_url("https://viewer.test/city"))
            .await
            .unwrap();
        let id = handle.id().to_string();
        let result = service.await_completion(handle).await;

        assert!(matches!(result, Err(ExtractionError::ViewerNotReady(_))));
        let record = service.status(&id).await.unwrap();
        assert_eq!(record.status, ExtractionStatus::Failed);
        assert!(record
            .error_message
            .unwrap()
            .starts_with("viewer_ready failed"));
    }

    #[tokio::test]
    async fn test_launch_failure_fails_run() {
        let page = MockBrowserPage::new();
        let (service, launcher) = service(&page);
        launcher.set_launch_error("no chrome").await;

        let handle = service
            .start_extraction(ExtractionRequest::for_url("https://viewer.test/city"))
            .await
            .unwrap();
        let result = service.await_completion(handle).await;

        assert!(matches!(result, Err(ExtractionError::Browser { .. })));
    }

    #[tokio::test]
    async fn test_cancel_marks_run_cancelled() {
        let page = MockBrowserPage::new();
        let (service, _launcher) = service(&page);

        let handle = service
            .start_extraction(ExtractionRequest::for_url("https://viewer.test/city"))
            .await
            .unwrap();
        let id = handle.id().to_string();
        service.cancel(&handle);
        let result = service.await_completion(handle).await;

        assert!(matches!(result, Err(ExtractionError::Cancelled(_))));
        assert_eq!(
            service.status(&id).await.unwrap().status,
            ExtractionStatus::Cancelled
        );
    }

    #[test]
    fn test_phase_update_waits_for_readers() {
        let records: Records = Arc::new(RwLock::new(HashMap::new()));
        write(&records).insert(
            "run".to_string(),
            ExtractionRecord::new("run".to_string(), "https://viewer.test/city".to_string()),
        );
        let recorder = phase_recorder(Arc::clone(&records));

        let (held_tx, held_rx) = std::sync::mpsc::channel();
        let reader = {
            let records = Arc::clone(&records);
            std::thread::spawn(move || {
                let guard = read(&records);
                held_tx.send(()).unwrap();
                std::thread::sleep(Duration::from_millis(50));
                guard.len()
            })
        };
        held_rx.recv().unwrap();

        recorder("run", ExtractionPhase::RotatePhaseA);

        assert_eq!(reader.join().unwrap(), 1);
        assert_eq!(read(&records)["run"].phase, ExtractionPhase::RotatePhaseA);
    }
}
