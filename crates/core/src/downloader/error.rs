//! Error types for the download pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fetching or writing tiles.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// Failed to create the destination directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transport-level failure (DNS, TLS, connection, timeout, scheme).
    #[error("Request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("HTTP status {status}")]
    Status { status: u16 },

    /// Writing the tile to disk failed.
    #[error("Failed to write {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run was cancelled before the tile finished.
    #[error("Download cancelled")]
    Cancelled,
}

impl DownloadError {
    pub fn write_failed(path: PathBuf, source: std::io::Error) -> Self {
        Self::WriteFailed { path, source }
    }

    /// Reason text recorded against a failed tile.
    pub fn reason(&self) -> String {
        match self {
            Self::WriteFailed { path, source } => {
                format!("failed to write {}: {}", path.display(), source)
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else {
            Self::Request(e.to_string())
        }
    }
}
