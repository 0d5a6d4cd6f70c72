//! Caller-facing extraction service.
//!
//! Resolves requests to viewer pages, runs each extraction on its own task
//! and keeps a status record per run.

#[allow(clippy::module_inception)]
mod service;
mod types;

pub use service::{ExtractionHandle, ExtractionService};
pub use types::{ExtractionRecord, ExtractionRequest, ExtractionStatus};
