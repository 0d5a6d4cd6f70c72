//! Passive request observer.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::browser::RequestStream;
use crate::metrics::TILES_OBSERVED;

use super::classifier::TileClassifier;
use super::tiles::ObservedTiles;

/// Drains a page's outgoing request stream into a shared tile set.
///
/// Observation never touches the request itself; each URL costs one
/// classification and one set insert.
pub struct RequestObserver {
    classifier: Arc<TileClassifier>,
    tiles: Arc<RwLock<ObservedTiles>>,
}

impl RequestObserver {
    pub fn new(classifier: Arc<TileClassifier>, tiles: Arc<RwLock<ObservedTiles>>) -> Self {
        Self { classifier, tiles }
    }

    /// Handle a single request URL.
    pub async fn observe(&self, url: &str) {
        let Some(tier) = self.classifier.classify(url) else {
            return;
        };

        let is_new = self.tiles.write().await.insert(url, tier);
        if is_new {
            TILES_OBSERVED.with_label_values(&[tier.prefix()]).inc();
            debug!(url = %url, tier = %tier, "Tile observed");
        }
    }

    /// Spawn a task that observes every URL of `requests` until the stream
    /// ends or the returned handle is aborted.
    pub fn attach(self, mut requests: RequestStream) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(url) = requests.next().await {
                self.observe(&url).await;
            }
            debug!("Request stream closed");
        })
    }
}
