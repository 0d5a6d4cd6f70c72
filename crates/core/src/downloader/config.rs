//! Configuration for the download pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::browser::default_user_agent;

use super::types::TierSelection;

/// Configuration for tile downloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory tiles are written into when a request names none.
    #[serde(default = "default_destination")]
    pub destination: PathBuf,

    /// Maximum downloads in flight.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent sent with every tile request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Refuse non-HTTPS tile URLs.
    #[serde(default = "default_true")]
    pub https_only: bool,

    /// Tiers written to disk when a request names none.
    #[serde(default)]
    pub tiers: TierSelection,
}

fn default_destination() -> PathBuf {
    PathBuf::from("tiles")
}

fn default_max_concurrent() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            max_concurrent: default_max_concurrent(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            https_only: true,
            tiers: TierSelection::default(),
        }
    }
}

impl DownloadConfig {
    pub fn with_destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination = path.into();
        self
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Allows plain HTTP tile URLs.
    pub fn allow_http(mut self) -> Self {
        self.https_only = false;
        self
    }
}
