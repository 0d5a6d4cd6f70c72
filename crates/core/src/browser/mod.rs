//! Controllable browser page abstraction.
//!
//! The extraction engine never talks to a browser directly; it drives a
//! [`BrowserPage`] handed out by a [`PageLauncher`]. The Chromium
//! implementation speaks the DevTools protocol through `chromiumoxide`; tests
//! use the scripted pages from [`crate::testing`].

mod chromium;
mod config;

pub use chromium::{ChromiumLauncher, ChromiumPage};
pub use config::LaunchConfig;
pub(crate) use config::default_user_agent;

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::time::Duration;
use thiserror::Error;

/// Stream of outgoing request URLs issued by a page.
pub type RequestStream = BoxStream<'static, String>;

/// Errors raised by a browser or one of its pages.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The browser process could not be started.
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// Navigation returned an error.
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// Navigation did not complete in time.
    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    /// No element matched the selector in time.
    #[error("selector '{selector}' not found within {timeout_ms}ms")]
    SelectorTimeout { selector: String, timeout_ms: u64 },

    /// Script evaluation failed inside the page.
    #[error("script evaluation failed: {0}")]
    Evaluation(String),

    /// Any other DevTools protocol failure.
    #[error("browser protocol error: {0}")]
    Protocol(String),
}

/// One controlled page (tab).
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Navigate and wait for the load to complete, bounded by `timeout`.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Subscribe to the URLs of every request the page issues from now on.
    /// Observation is passive; requests are never held or altered.
    async fn observe_requests(&self) -> Result<RequestStream, BrowserError>;

    /// Evaluate a script expression and return its JSON value (`null` for
    /// `undefined`).
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, BrowserError>;

    /// Wait until an element matching `selector` exists.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<(), BrowserError>;

    /// Idle for `duration` while the page keeps running.
    async fn wait_for_timeout(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Close the page. Closing twice is not an error.
    async fn close(&self) -> Result<(), BrowserError>;
}

/// Source of fresh pages.
#[async_trait]
pub trait PageLauncher: Send + Sync {
    /// Returns the name of this launcher implementation.
    fn name(&self) -> &str;

    /// Open a new blank page.
    async fn open_page(&self) -> Result<Box<dyn BrowserPage>, BrowserError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BrowserError::NavigationTimeout {
            url: "https://example.com".to_string(),
            timeout_ms: 60000,
        };
        assert_eq!(
            err.to_string(),
            "navigation to https://example.com timed out after 60000ms"
        );

        let err = BrowserError::SelectorTimeout {
            selector: "#object2vr".to_string(),
            timeout_ms: 30000,
        };
        assert_eq!(
            err.to_string(),
            "selector '#object2vr' not found within 30000ms"
        );
    }
}
