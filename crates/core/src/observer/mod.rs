//! Request observation and tile classification.
//!
//! The observer watches every request a controlled page issues and keeps the
//! ones that look like viewer tiles, graded into a basic and a high tier.
//! Grading is a URL-shape heuristic; see [`ClassifierConfig`] for the marker
//! sets and their limits.

mod classifier;
mod config;
#[allow(clippy::module_inception)]
mod observer;
mod tiles;

pub use classifier::{file_name_for, ResolutionTier, TileClassifier, TileRecord};
pub use config::ClassifierConfig;
pub use observer::RequestObserver;
pub use tiles::ObservedTiles;
