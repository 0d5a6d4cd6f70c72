//! Per-run extraction state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::browser::{BrowserError, BrowserPage};
use crate::observer::{ObservedTiles, RequestObserver, TileClassifier};

use super::types::ExtractionPhase;

/// Called with the run ID on every phase transition.
pub type PhaseCallback = Arc<dyn Fn(&str, ExtractionPhase) + Send + Sync>;

/// How long a closed page's request stream gets to drain.
const OBSERVER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything one run owns: the page, the observed tile set and the
/// current phase. Nothing here outlives the run.
pub struct ExtractionSession {
    id: String,
    page_url: String,
    page: Box<dyn BrowserPage>,
    tiles: Arc<RwLock<ObservedTiles>>,
    phase: ExtractionPhase,
    observer: Option<JoinHandle<()>>,
    on_phase: Option<PhaseCallback>,
}

impl ExtractionSession {
    pub fn new(id: impl Into<String>, page_url: impl Into<String>, page: Box<dyn BrowserPage>) -> Self {
        Self {
            id: id.into(),
            page_url: page_url.into(),
            page,
            tiles: Arc::new(RwLock::new(ObservedTiles::new())),
            phase: ExtractionPhase::Idle,
            observer: None,
            on_phase: None,
        }
    }

    pub fn with_phase_callback(mut self, callback: PhaseCallback) -> Self {
        self.on_phase = Some(callback);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn phase(&self) -> ExtractionPhase {
        self.phase
    }

    pub fn page(&self) -> &dyn BrowserPage {
        self.page.as_ref()
    }

    /// Shared handle to the live tile set.
    pub fn tiles(&self) -> Arc<RwLock<ObservedTiles>> {
        Arc::clone(&self.tiles)
    }

    pub(crate) fn advance(&mut self, next: ExtractionPhase) {
        if !self.phase.can_transition_to(next) {
            warn!(
                id = %self.id,
                from = %self.phase,
                to = %next,
                "Unexpected phase transition"
            );
        }
        debug!(id = %self.id, from = %self.phase, to = %next, "Phase transition");
        self.phase = next;
        if let Some(callback) = &self.on_phase {
            callback(&self.id, next);
        }
    }

    /// Start draining the page's request stream into the tile set.
    pub(crate) async fn attach_observer(
        &mut self,
        classifier: Arc<TileClassifier>,
    ) -> Result<(), BrowserError> {
        let requests = self.page.observe_requests().await?;
        let observer = RequestObserver::new(classifier, Arc::clone(&self.tiles));
        self.observer = Some(observer.attach(requests));
        Ok(())
    }

    /// Stop collection: close the page, let the observer drain what the
    /// page already issued and return the frozen tile set.
    pub(crate) async fn finish_observation(&mut self) -> ObservedTiles {
        self.close_page().await;

        if let Some(mut handle) = self.observer.take() {
            if tokio::time::timeout(OBSERVER_DRAIN_TIMEOUT, &mut handle)
                .await
                .is_err()
            {
                debug!(id = %self.id, "Request stream still open after close, stopping observer");
                handle.abort();
            }
        }

        self.tiles.read().await.clone()
    }

    /// Drop everything observed so far and release the page.
    pub(crate) async fn discard(&mut self) {
        if let Some(handle) = self.observer.take() {
            handle.abort();
        }
        *self.tiles.write().await = ObservedTiles::new();
        self.close_page().await;
        info!(id = %self.id, phase = %self.phase, "Discarded extraction state");
    }

    async fn close_page(&self) {
        if let Err(e) = self.page.close().await {
            warn!(id = %self.id, error = %e, "Failed to close page");
        }
    }
}

impl Drop for ExtractionSession {
    fn drop(&mut self) {
        if let Some(handle) = self.observer.take() {
            handle.abort();
        }
    }
}
