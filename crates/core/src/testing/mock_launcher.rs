//! Mock page launcher for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::browser::{BrowserError, BrowserPage, PageLauncher};

use super::MockBrowserPage;

/// Mock implementation of the [`PageLauncher`] trait.
///
/// Every opened page is a clone of one shared [`MockBrowserPage`], so the
/// test can configure and inspect it directly.
pub struct MockLauncher {
    page: MockBrowserPage,
    opened: AtomicUsize,
    launch_error: Arc<RwLock<Option<String>>>,
}

impl MockLauncher {
    pub fn new(page: MockBrowserPage) -> Self {
        Self {
            page,
            opened: AtomicUsize::new(0),
            launch_error: Arc::new(RwLock::new(None)),
        }
    }

    /// The shared page handed out by [`PageLauncher::open_page`].
    pub fn page(&self) -> &MockBrowserPage {
        &self.page
    }

    /// Make the next page opens fail.
    pub async fn set_launch_error(&self, reason: impl Into<String>) {
        *self.launch_error.write().await = Some(reason.into());
    }

    pub fn opened_pages(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageLauncher for MockLauncher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn open_page(&self) -> Result<Box<dyn BrowserPage>, BrowserError> {
        if let Some(reason) = self.launch_error.read().await.clone() {
            return Err(BrowserError::Launch(reason));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.page.clone()))
    }
}
