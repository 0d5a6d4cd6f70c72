//! Mock browser page for testing.

use async_trait::async_trait;
use futures::channel::mpsc::UnboundedSender;
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::browser::{BrowserError, BrowserPage, RequestStream};

#[derive(Default)]
struct MockPageState {
    /// Subscribers created by `observe_requests`.
    subscribers: Vec<UnboundedSender<String>>,
    /// Emitted once navigation succeeds.
    load_requests: Vec<String>,
    /// Emitted on the first zoom step that reaches an entry point.
    zoom_requests: Vec<String>,
    /// Emitted on the first pan step that reaches an entry point.
    pan_requests: Vec<String>,
    zoom_emitted: bool,
    pan_emitted: bool,
    navigation_error: Option<String>,
    /// How long a page load takes before it completes.
    navigation_delay: Duration,
    navigations: Vec<String>,
    scripts: Vec<String>,
    pan_angles: Vec<u32>,
    idle: Vec<Duration>,
    closed: bool,
}

/// Mock implementation of the [`BrowserPage`] trait.
///
/// Provides controllable behavior for testing:
/// - Emit scripted request URLs on load, on zoom and on pan
/// - Toggle the viewer marker, the zoom control and the entry point
/// - Fail navigation, or make it slower than its timeout
/// - Record scripts, pan angles, idles and navigations for assertions
///
/// Clones share state, so a test can keep one handle while the
/// orchestrator owns another.
#[derive(Clone)]
pub struct MockBrowserPage {
    state: Arc<RwLock<MockPageState>>,
    viewer_ready: Arc<RwLock<bool>>,
    zoom_control: Arc<RwLock<bool>>,
    entry_point: Arc<RwLock<bool>>,
}

impl std::fmt::Debug for MockBrowserPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBrowserPage")
            .field("state", &"<state>")
            .finish()
    }
}

impl Default for MockBrowserPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBrowserPage {
    /// A page whose viewer is ready and exposes both the zoom control and
    /// an entry point.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockPageState::default())),
            viewer_ready: Arc::new(RwLock::new(true)),
            zoom_control: Arc::new(RwLock::new(true)),
            entry_point: Arc::new(RwLock::new(true)),
        }
    }

    pub async fn set_viewer_ready(&self, ready: bool) {
        *self.viewer_ready.write().await = ready;
    }

    pub async fn set_zoom_control(&self, present: bool) {
        *self.zoom_control.write().await = present;
    }

    pub async fn set_entry_point(&self, present: bool) {
        *self.entry_point.write().await = present;
    }

    /// Make the next navigations fail with `reason`.
    pub async fn set_navigation_error(&self, reason: impl Into<String>) {
        self.state.write().await.navigation_error = Some(reason.into());
    }

    /// Make page loads take `delay`. Loads slower than the navigation
    /// timeout fail with [`BrowserError::NavigationTimeout`].
    pub async fn set_navigation_delay(&self, delay: Duration) {
        self.state.write().await.navigation_delay = delay;
    }

    pub async fn set_load_requests(&self, urls: Vec<String>) {
        self.state.write().await.load_requests = urls;
    }

    pub async fn set_zoom_requests(&self, urls: Vec<String>) {
        self.state.write().await.zoom_requests = urls;
    }

    pub async fn set_pan_requests(&self, urls: Vec<String>) {
        self.state.write().await.pan_requests = urls;
    }

    /// Push a request URL to every subscriber right now.
    pub async fn emit(&self, url: &str) {
        let mut state = self.state.write().await;
        broadcast(&mut state, std::slice::from_ref(&url.to_string()));
    }

    pub async fn evaluated_scripts(&self) -> Vec<String> {
        self.state.read().await.scripts.clone()
    }

    pub async fn pan_angles(&self) -> Vec<u32> {
        self.state.read().await.pan_angles.clone()
    }

    pub async fn navigations(&self) -> Vec<String> {
        self.state.read().await.navigations.clone()
    }

    /// Total time the page was asked to idle.
    pub async fn idle_time(&self) -> Duration {
        self.state.read().await.idle.iter().sum()
    }

    pub async fn is_closed(&self) -> bool {
        self.state.read().await.closed
    }
}

fn broadcast(state: &mut MockPageState, urls: &[String]) {
    state
        .subscribers
        .retain(|tx| urls.iter().all(|url| tx.unbounded_send(url.clone()).is_ok()));
}

/// Angle passed to a `changePan` invocation, if `script` is one.
fn pan_angle(script: &str) -> Option<u32> {
    let marker = "[\"changePan\"](";
    let start = script.find(marker)? + marker.len();
    let rest = &script[start..];
    let end = rest.find(')')?;
    rest[..end].trim().parse().ok()
}

#[async_trait]
impl BrowserPage for MockBrowserPage {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        let delay = {
            let mut state = self.state.write().await;
            state.navigations.push(url.to_string());
            state.navigation_delay
        };

        if !delay.is_zero()
            && tokio::time::timeout(timeout, tokio::time::sleep(delay))
                .await
                .is_err()
        {
            return Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }

        let mut state = self.state.write().await;

        if let Some(reason) = state.navigation_error.clone() {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason,
            });
        }

        let urls = state.load_requests.clone();
        broadcast(&mut state, &urls);
        Ok(())
    }

    async fn observe_requests(&self) -> Result<RequestStream, BrowserError> {
        let (tx, rx) = futures::channel::mpsc::unbounded();
        self.state.write().await.subscribers.push(tx);
        Ok(rx.boxed())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, BrowserError> {
        let zoom_control = *self.zoom_control.read().await;
        let entry_point = *self.entry_point.read().await;

        let mut state = self.state.write().await;
        state.scripts.push(script.to_string());

        if script.contains("new MouseEvent(") {
            return Ok(Value::Bool(zoom_control));
        }

        if script.contains("const candidates") {
            if let Some(angle) = pan_angle(script) {
                state.pan_angles.push(angle);
            }
            if !entry_point {
                return Ok(Value::from(-1));
            }

            if script.contains("\"changePan\"") && !state.pan_emitted {
                state.pan_emitted = true;
                let urls = state.pan_requests.clone();
                broadcast(&mut state, &urls);
            } else if script.contains("\"changeFovLog\"") && !state.zoom_emitted {
                state.zoom_emitted = true;
                let urls = state.zoom_requests.clone();
                broadcast(&mut state, &urls);
            }
            return Ok(Value::from(0));
        }

        Ok(Value::Null)
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        if *self.viewer_ready.read().await {
            Ok(())
        } else {
            Err(BrowserError::SelectorTimeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }

    async fn wait_for_timeout(&self, duration: Duration) {
        self.state.write().await.idle.push(duration);
        tokio::task::yield_now().await;
    }

    async fn close(&self) -> Result<(), BrowserError> {
        let mut state = self.state.write().await;
        state.closed = true;
        // ends every request stream
        state.subscribers.clear();
        Ok(())
    }
}
