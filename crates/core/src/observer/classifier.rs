//! Tile recognition, tier grading and file naming.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::config::ClassifierConfig;

/// Coarse quality class of a tile, inferred from its URL shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionTier {
    Basic,
    High,
}

impl ResolutionTier {
    /// File-name prefix for this tier.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// An observed tile together with its derived attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRecord {
    pub url: String,
    pub tier: ResolutionTier,
    pub file_name: String,
}

impl TileRecord {
    pub fn new(url: impl Into<String>, tier: ResolutionTier) -> Self {
        let url = url.into();
        let file_name = file_name_for(&url, tier);
        Self {
            url,
            tier,
            file_name,
        }
    }
}

/// Derive the on-disk name of a tile: `{tier}_{last path segment}` with any
/// query string removed. Pure in `(url, tier)`.
pub fn file_name_for(url: &str, tier: ResolutionTier) -> String {
    let last_segment = url.rsplit('/').next().unwrap_or(url);
    let base = last_segment.split('?').next().unwrap_or(last_segment);
    format!("{}_{}", tier.prefix(), base)
}

/// Marker-based tile classifier.
#[derive(Debug, Clone)]
pub struct TileClassifier {
    config: ClassifierConfig,
    reserved_frame: Option<String>,
}

impl TileClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        let reserved_frame = match (&config.frame_marker, &config.reserved_frame_index) {
            (Some(marker), Some(index)) => Some(format!("{}{}", marker, index)),
            _ => None,
        };
        Self {
            config,
            reserved_frame,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ClassifierConfig::default())
    }

    /// Whether the URL looks like a viewer tile at all.
    pub fn is_tile(&self, url: &str) -> bool {
        let has_extension = self.config.extensions.iter().any(|ext| url.contains(ext));
        has_extension
            && self
                .config
                .tile_markers
                .iter()
                .any(|marker| url.contains(marker))
    }

    /// Whether an accepted tile grades as high resolution. Any single
    /// qualifying marker is enough.
    pub fn is_high(&self, url: &str) -> bool {
        if self
            .config
            .high_markers
            .iter()
            .any(|marker| url.contains(marker))
        {
            return true;
        }

        match &self.config.frame_marker {
            Some(marker) if url.contains(marker.as_str()) => match &self.reserved_frame {
                Some(reserved) => !url.contains(reserved.as_str()),
                None => true,
            },
            _ => false,
        }
    }

    /// Classify a request URL. Returns `None` for non-tile requests.
    pub fn classify(&self, url: &str) -> Option<ResolutionTier> {
        if !self.is_tile(url) {
            return None;
        }
        if self.is_high(url) {
            Some(ResolutionTier::High)
        } else {
            Some(ResolutionTier::Basic)
        }
    }

    /// Classify and build the record in one step.
    pub fn record(&self, url: &str) -> Option<TileRecord> {
        self.classify(url).map(|tier| TileRecord::new(url, tier))
    }
}

impl Default for TileClassifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}
