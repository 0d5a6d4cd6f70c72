//! Browser launch configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Slack kept between a navigation deadline and the protocol request timeout,
/// so the navigation deadline is the one that fires.
const NAVIGATION_SLACK_MS: u64 = 5_000;

/// How the controlled browser is started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Path to a Chrome/Chromium binary. Auto-detected when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,

    /// Run without a visible window.
    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// User-Agent presented by the page. The vendor serves a degraded viewer
    /// to obvious automation agents.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Additional command-line switches.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Timeout for each DevTools protocol request, page loads included.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_request_timeout_ms() -> u64 {
    90_000
}

pub(crate) fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36".to_string()
}

fn default_args() -> Vec<String> {
    [
        "--no-sandbox",
        "--disable-setuid-sandbox",
        "--disable-dev-shm-usage",
        "--disable-features=VizDisplayCompositor",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            window_width: default_window_width(),
            window_height: default_window_height(),
            user_agent: default_user_agent(),
            args: default_args(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl LaunchConfig {
    /// Show the browser window.
    pub fn with_head(mut self) -> Self {
        self.headless = false;
        self
    }

    pub fn with_executable(mut self, path: PathBuf) -> Self {
        self.executable = Some(path);
        self
    }

    /// Raise the protocol request timeout so that a page load allowed
    /// `navigation_timeout_ms` is not cut short by the browser connection.
    pub fn covering_navigation(mut self, navigation_timeout_ms: u64) -> Self {
        let needed = navigation_timeout_ms.saturating_add(NAVIGATION_SLACK_MS);
        self.request_timeout_ms = self.request_timeout_ms.max(needed);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LaunchConfig::default();
        assert!(config.headless);
        assert!(config.executable.is_none());
        assert_eq!((config.window_width, config.window_height), (1920, 1080));
        assert!(config.args.iter().any(|a| a == "--no-sandbox"));
        assert_eq!(config.request_timeout(), Duration::from_secs(90));
    }

    #[test]
    fn test_request_timeout_covers_navigation() {
        let config = LaunchConfig::default().covering_navigation(120_000);
        assert_eq!(config.request_timeout_ms, 125_000);

        // Already long enough: left alone.
        let config = LaunchConfig::default().covering_navigation(60_000);
        assert_eq!(config.request_timeout_ms, 90_000);
    }

    #[test]
    fn test_config_builder() {
        let config = LaunchConfig::default()
            .with_head()
            .with_executable(PathBuf::from("/usr/bin/chromium"));
        assert!(!config.headless);
        assert_eq!(
            config.executable.unwrap().to_str().unwrap(),
            "/usr/bin/chromium"
        );
    }
}
