//! Tile download pipeline.
//!
//! Turns the observed tile set into files named `{tier}_{basename}` in a
//! destination directory, skipping files that already exist.

mod config;
mod error;
mod pipeline;
mod types;

pub use config::DownloadConfig;
pub use error::DownloadError;
pub use pipeline::DownloadPipeline;
pub use types::{DownloadOutcome, DownloadReport, FailedDownload, TierSelection, TileDownload};
