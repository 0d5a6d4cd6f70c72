//! Types for the download pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::observer::{ResolutionTier, TileRecord};

/// Which tiers a run writes to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierSelection {
    #[default]
    All,
    High,
    Basic,
}

impl TierSelection {
    pub fn includes(&self, tier: ResolutionTier) -> bool {
        match self {
            Self::All => true,
            Self::High => tier == ResolutionTier::High,
            Self::Basic => tier == ResolutionTier::Basic,
        }
    }

    /// Keep only the records this selection includes.
    pub fn filter(&self, records: Vec<TileRecord>) -> Vec<TileRecord> {
        records
            .into_iter()
            .filter(|r| self.includes(r.tier))
            .collect()
    }
}

impl fmt::Display for TierSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::High => write!(f, "high"),
            Self::Basic => write!(f, "basic"),
        }
    }
}

impl FromStr for TierSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "high" => Ok(Self::High),
            "basic" => Ok(Self::Basic),
            other => Err(format!(
                "unknown tier selection '{other}' (expected all, high or basic)"
            )),
        }
    }
}

/// What happened to one tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DownloadOutcome {
    /// Fetched and written.
    Downloaded { bytes: u64 },
    /// A file of the same name was already on disk; nothing was fetched.
    SkippedExisting,
    /// Fetch or write failed; no file was left behind.
    Failed { reason: String },
}

impl DownloadOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Downloaded { .. } => "downloaded",
            Self::SkippedExisting => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Outcome of one tile, keyed by URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDownload {
    pub url: String,
    pub file_name: String,
    pub tier: ResolutionTier,
    #[serde(flatten)]
    pub outcome: DownloadOutcome,
}

/// A tile that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDownload {
    pub url: String,
    pub reason: String,
}

/// Summary of a download run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadReport {
    /// Directory the tiles were written into.
    pub destination: PathBuf,
    /// Tiles fetched and written by this run.
    pub downloaded: usize,
    /// Tiles already present on disk.
    pub skipped: usize,
    /// Tiles that failed, with reasons.
    pub failed: Vec<FailedDownload>,
    /// Distinct high-resolution file names of this run's selected tiles
    /// present on disk at the end. Tiles from directories that share a
    /// basename count once; tiers left out of the selection count zero.
    pub high_on_disk: usize,
    /// Bytes written by this run.
    pub bytes_written: u64,
    pub duration_ms: u64,
    /// Per-tile outcomes, sorted by URL.
    pub tiles: Vec<TileDownload>,
}

impl DownloadReport {
    /// Outcome recorded for `url`, if it was part of the run.
    pub fn outcome_of(&self, url: &str) -> Option<&DownloadOutcome> {
        self.tiles.iter().find(|t| t.url == url).map(|t| &t.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_selection_parse() {
        assert_eq!("all".parse::<TierSelection>(), Ok(TierSelection::All));
        assert_eq!("HIGH".parse::<TierSelection>(), Ok(TierSelection::High));
        assert_eq!("basic".parse::<TierSelection>(), Ok(TierSelection::Basic));
        assert!("level2".parse::<TierSelection>().is_err());
    }

    #[test]
    fn test_tier_selection_filter() {
        let records = vec![
            TileRecord::new("https://cdn.test/tiles/cf_0.jpg", ResolutionTier::High),
            TileRecord::new("https://cdn.test/tiles/x.jpg", ResolutionTier::Basic),
        ];

        assert_eq!(TierSelection::All.filter(records.clone()).len(), 2);
        let high = TierSelection::High.filter(records.clone());
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].tier, ResolutionTier::High);
        let basic = TierSelection::Basic.filter(records);
        assert_eq!(basic.len(), 1);
        assert_eq!(basic[0].tier, ResolutionTier::Basic);
    }

    #[test]
    fn test_outcome_serialization() {
        let tile = TileDownload {
            url: "https://cdn.test/tiles/cf_0.jpg".to_string(),
            file_name: "high_cf_0.jpg".to_string(),
            tier: ResolutionTier::High,
            outcome: DownloadOutcome::Downloaded { bytes: 12 },
        };
        let json = serde_json::to_value(&tile).unwrap();
        assert_eq!(json["outcome"], "downloaded");
        assert_eq!(json["bytes"], 12);
        assert_eq!(json["tier"], "high");
    }
}
