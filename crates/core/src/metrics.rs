//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Observation (tiles seen per tier)
//! - Extraction runs (outcome, duration)
//! - Downloads (per-file outcome, bytes written)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Observation Metrics
// =============================================================================

/// Distinct tiles observed, by tier.
pub static TILES_OBSERVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tileharvest_tiles_observed_total",
            "Total distinct tiles observed",
        ),
        &["tier"], // "basic", "high"
    )
    .unwrap()
});

// =============================================================================
// Extraction Metrics
// =============================================================================

/// Extraction runs by result.
pub static EXTRACTION_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tileharvest_extraction_runs_total", "Total extraction runs"),
        &["result"], // "completed", "failed", "cancelled"
    )
    .unwrap()
});

/// Extraction duration in seconds, page load through download.
pub static EXTRACTION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tileharvest_extraction_duration_seconds",
            "Duration of extraction runs",
        )
        .buckets(vec![5.0, 15.0, 30.0, 45.0, 60.0, 120.0, 300.0, 600.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Download Metrics
// =============================================================================

/// Tile downloads by outcome.
pub static TILE_DOWNLOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tileharvest_tile_downloads_total", "Total tile downloads"),
        &["outcome"], // "downloaded", "skipped", "failed"
    )
    .unwrap()
});

/// Bytes written to the destination directory.
pub static BYTES_WRITTEN: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tileharvest_bytes_written_total",
        "Total tile bytes written to disk",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TILES_OBSERVED.clone()),
        Box::new(EXTRACTION_RUNS.clone()),
        Box::new(EXTRACTION_DURATION.clone()),
        Box::new(TILE_DOWNLOADS.clone()),
        Box::new(BYTES_WRITTEN.clone()),
    ]
}
