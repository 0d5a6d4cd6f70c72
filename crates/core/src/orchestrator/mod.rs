//! Extraction orchestrator.
//!
//! Owns the per-run state machine. Each run gets an [`ExtractionSession`]
//! holding its page and observed tiles; [`TileExtractor`] moves the session
//! through its phases and finally hands the frozen tile set to the download
//! pipeline.

mod config;
mod runner;
mod session;
mod types;

pub use config::{SettleConfig, ViewerConfig};
pub use runner::TileExtractor;
pub use session::{ExtractionSession, PhaseCallback};
pub use types::{
    Extraction, ExtractionCounts, ExtractionError, ExtractionPhase, ExtractionSummary,
    InteractionReport,
};
