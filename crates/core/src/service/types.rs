//! Types for the extraction service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::downloader::TierSelection;
use crate::orchestrator::{ExtractionCounts, ExtractionPhase};
use crate::target::{ViewType, ViewerTarget};

/// What a caller asks to extract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub target: ViewerTarget,
    /// Tiers to write; the configured default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiers: Option<TierSelection>,
    /// Destination directory; the configured default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
}

impl ExtractionRequest {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            target: ViewerTarget::url(url),
            tiers: None,
            destination: None,
        }
    }

    pub fn for_model(year: impl Into<String>, view: ViewType) -> Self {
        Self {
            target: ViewerTarget::model(year, view),
            tiers: None,
            destination: None,
        }
    }

    pub fn with_tiers(mut self, tiers: TierSelection) -> Self {
        self.tiers = Some(tiers);
        self
    }

    pub fn with_destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination = Some(path.into());
        self
    }
}

/// Lifecycle status of an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl ExtractionStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Tracked state of one extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub id: String,
    pub page_url: String,
    pub status: ExtractionStatus,
    /// Last phase the run entered.
    pub phase: ExtractionPhase,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<ExtractionCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ExtractionRecord {
    pub fn new(id: String, page_url: String) -> Self {
        Self {
            id,
            page_url,
            status: ExtractionStatus::Pending,
            phase: ExtractionPhase::Idle,
            created_at: Utc::now(),
            completed_at: None,
            counts: None,
            error_message: None,
        }
    }
}
