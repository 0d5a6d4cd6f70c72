//! Types for the extraction orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::browser::BrowserError;
use crate::downloader::{DownloadError, DownloadReport};
use crate::driver::PhaseOutcome;
use crate::observer::ObservedTiles;

/// Where an extraction run currently is.
///
/// Runs move strictly forward through
/// `Idle → PageLoading → ViewerReady → ZoomPhase → SettleA → RotatePhaseA →
/// SettleB → RotatePhaseB → SettleC → Summarizing → DownloadPhase → Done`.
/// `Failed` is entered from `PageLoading` or `ViewerReady`, or from
/// `DownloadPhase` when the destination cannot be created; `Cancelled` from
/// any non-terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPhase {
    Idle,
    PageLoading,
    ViewerReady,
    ZoomPhase,
    SettleA,
    RotatePhaseA,
    SettleB,
    RotatePhaseB,
    SettleC,
    Summarizing,
    DownloadPhase,
    Done,
    Failed,
    Cancelled,
}

impl ExtractionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }

    /// Position in the forward sequence. Terminal failure states have none.
    fn ordinal(&self) -> Option<u8> {
        let n = match self {
            Self::Idle => 0,
            Self::PageLoading => 1,
            Self::ViewerReady => 2,
            Self::ZoomPhase => 3,
            Self::SettleA => 4,
            Self::RotatePhaseA => 5,
            Self::SettleB => 6,
            Self::RotatePhaseB => 7,
            Self::SettleC => 8,
            Self::Summarizing => 9,
            Self::DownloadPhase => 10,
            Self::Done => 11,
            Self::Failed | Self::Cancelled => return None,
        };
        Some(n)
    }

    /// Whether a run in `self` may move to `next`.
    pub fn can_transition_to(&self, next: ExtractionPhase) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Cancelled => true,
            Self::Failed => matches!(
                self,
                Self::PageLoading | Self::ViewerReady | Self::DownloadPhase
            ),
            _ => match (self.ordinal(), next.ordinal()) {
                (Some(from), Some(to)) => to == from + 1,
                _ => false,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PageLoading => "page_loading",
            Self::ViewerReady => "viewer_ready",
            Self::ZoomPhase => "zoom_phase",
            Self::SettleA => "settle_a",
            Self::RotatePhaseA => "rotate_phase_a",
            Self::SettleB => "settle_b",
            Self::RotatePhaseB => "rotate_phase_b",
            Self::SettleC => "settle_c",
            Self::Summarizing => "summarizing",
            Self::DownloadPhase => "download_phase",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ExtractionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that end an extraction run.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The page could not be loaded.
    #[error("page_loading failed: {0}")]
    NavigationFailure(#[source] BrowserError),

    /// The viewer never signalled readiness.
    #[error("viewer_ready failed: {0}")]
    ViewerNotReady(#[source] BrowserError),

    /// The browser failed outside navigation and readiness.
    #[error("{phase} failed: {source}")]
    Browser {
        phase: ExtractionPhase,
        #[source]
        source: BrowserError,
    },

    /// The caller aborted the run.
    #[error("extraction cancelled during {0}")]
    Cancelled(ExtractionPhase),

    /// The download phase could not run at all.
    #[error("download_phase failed: {0}")]
    Download(#[from] DownloadError),

    /// The request could not be turned into a run.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The run's task died without producing a result.
    #[error("extraction task aborted: {0}")]
    Aborted(String),
}

impl ExtractionError {
    /// Phase the run was in when it ended.
    pub fn phase(&self) -> ExtractionPhase {
        match self {
            Self::NavigationFailure(_) => ExtractionPhase::PageLoading,
            Self::ViewerNotReady(_) => ExtractionPhase::ViewerReady,
            Self::Browser { phase, .. } => *phase,
            Self::Cancelled(phase) => *phase,
            Self::Download(_) => ExtractionPhase::DownloadPhase,
            Self::InvalidRequest(_) | Self::Aborted(_) => ExtractionPhase::Idle,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Metrics label for the run result.
    pub fn result_label(&self) -> &'static str {
        if self.is_cancelled() {
            "cancelled"
        } else {
            "failed"
        }
    }
}

/// Tile counts of a finished extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionCounts {
    /// Every qualifying tile observed.
    pub observed: usize,
    /// Observed tiles not classified high.
    pub basic: usize,
    pub high: usize,
}

/// Outcomes of the three interaction phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionReport {
    pub zoom: PhaseOutcome,
    pub sweep_a: PhaseOutcome,
    pub sweep_b: PhaseOutcome,
}

/// What the browser-side part of a run produced.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub counts: ExtractionCounts,
    pub interaction: InteractionReport,
    /// The observed set, frozen when collection stopped.
    pub tiles: ObservedTiles,
}

/// Result of a complete run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub id: String,
    pub page_url: String,
    pub counts: ExtractionCounts,
    pub interaction: InteractionReport,
    pub download: DownloadReport,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORWARD: [ExtractionPhase; 12] = [
        ExtractionPhase::Idle,
        ExtractionPhase::PageLoading,
        ExtractionPhase::ViewerReady,
        ExtractionPhase::ZoomPhase,
        ExtractionPhase::SettleA,
        ExtractionPhase::RotatePhaseA,
        ExtractionPhase::SettleB,
        ExtractionPhase::RotatePhaseB,
        ExtractionPhase::SettleC,
        ExtractionPhase::Summarizing,
        ExtractionPhase::DownloadPhase,
        ExtractionPhase::Done,
    ];

    #[test]
    fn test_forward_sequence_is_valid() {
        for pair in FORWARD.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        assert!(!ExtractionPhase::PageLoading.can_transition_to(ExtractionPhase::ZoomPhase));
        assert!(!ExtractionPhase::SettleB.can_transition_to(ExtractionPhase::RotatePhaseA));
        assert!(!ExtractionPhase::Done.can_transition_to(ExtractionPhase::Idle));
    }

    #[test]
    fn test_failure_only_from_loading_ready_and_download() {
        assert!(ExtractionPhase::PageLoading.can_transition_to(ExtractionPhase::Failed));
        assert!(ExtractionPhase::ViewerReady.can_transition_to(ExtractionPhase::Failed));
        assert!(ExtractionPhase::DownloadPhase.can_transition_to(ExtractionPhase::Failed));
        assert!(!ExtractionPhase::ZoomPhase.can_transition_to(ExtractionPhase::Failed));
        assert!(!ExtractionPhase::Done.can_transition_to(ExtractionPhase::Failed));
    }

    #[test]
    fn test_cancel_from_any_non_terminal() {
        for phase in FORWARD.iter().filter(|p| !p.is_terminal()) {
            assert!(phase.can_transition_to(ExtractionPhase::Cancelled));
        }
        assert!(!ExtractionPhase::Failed.can_transition_to(ExtractionPhase::Cancelled));
    }

    #[test]
    fn test_error_names_phase() {
        let err = ExtractionError::ViewerNotReady(BrowserError::SelectorTimeout {
            selector: "#object2vr".to_string(),
            timeout_ms: 30000,
        });
        assert_eq!(err.phase(), ExtractionPhase::ViewerReady);
        assert_eq!(
            err.to_string(),
            "viewer_ready failed: selector '#object2vr' not found within 30000ms"
        );

        let err = ExtractionError::Cancelled(ExtractionPhase::RotatePhaseA);
        assert_eq!(err.to_string(), "extraction cancelled during rotate_phase_a");
        assert_eq!(err.result_label(), "cancelled");
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&ExtractionPhase::RotatePhaseB).unwrap();
        assert_eq!(json, "\"rotate_phase_b\"");
    }
}
